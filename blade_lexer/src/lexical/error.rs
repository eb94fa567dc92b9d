//! Lexer errors

use crate::logging::{codes, Code};
use crate::utils::{SourceMap, Span};
use std::fmt;
use std::sync::Arc;

/// Construct that can be left open at end of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Construct {
    Comment,
    EscapedData,
    UnescapedData,
    ArgumentList,
    RawBlock(String),
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construct::Comment => write!(f, "comment, expected '--}}}}'"),
            Construct::EscapedData => write!(f, "echo, expected '}}}}'"),
            Construct::UnescapedData => write!(f, "raw echo, expected '!!}}'"),
            Construct::ArgumentList => write!(f, "argument list, expected ')'"),
            Construct::RawBlock(name) => write!(f, "@{} block, expected '@end{}'", name, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerErrorKind {
    #[error("expected {expected:?}, got {found:?}")]
    BracketMismatch { expected: char, found: char },

    #[error("unterminated {construct}")]
    UnterminatedBlock { construct: Construct },

    #[error("brackets nested too deep: {depth} (max {max})")]
    NestingTooDeep { depth: usize, max: usize },

    #[error("too many tokens: {count} (max {max})")]
    TooManyTokens { count: usize, max: usize },
}

impl LexerErrorKind {
    pub fn error_code(&self) -> Code {
        match self {
            LexerErrorKind::BracketMismatch { .. } => codes::lexical::BRACKET_MISMATCH,
            LexerErrorKind::UnterminatedBlock { .. } => codes::lexical::UNTERMINATED_BLOCK,
            LexerErrorKind::NestingTooDeep { .. } => codes::lexical::NESTING_TOO_DEEP,
            LexerErrorKind::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
        }
    }
}

/// A lexing failure with its location and the text it occurred in
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {}", .span.start)]
pub struct LexerError {
    kind: LexerErrorKind,
    span: Span,
    source_text: Arc<str>,
}

impl LexerError {
    pub fn new(kind: LexerErrorKind, span: Span, source_text: Arc<str>) -> Self {
        Self {
            kind,
            span,
            source_text,
        }
    }

    pub fn kind(&self) -> &LexerErrorKind {
        &self.kind
    }

    /// Location of the error; start equals end for point errors
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn error_code(&self) -> Code {
        self.kind.error_code()
    }

    /// Caret diagnostic pointing at the error location
    pub fn render(&self) -> String {
        SourceMap::new(self.source_text.to_string()).format_error(&self.span, &self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Position;

    fn mismatch_at(source: &str, offset: usize) -> LexerError {
        let position = SourceMap::new(source.to_string()).position_at(offset);
        LexerError::new(
            LexerErrorKind::BracketMismatch {
                expected: ')',
                found: '}',
            },
            Span::point(position),
            Arc::from(source),
        )
    }

    #[test]
    fn test_bracket_mismatch_message() {
        let error = mismatch_at("@if(a})", 5);
        assert_eq!(error.message(), "expected ')', got '}'");
        assert_eq!(error.to_string(), "expected ')', got '}' at 1:6");
        assert_eq!(error.error_code(), codes::lexical::BRACKET_MISMATCH);
        assert_eq!(error.span().start, Position::new(5, 1, 6));
    }

    #[test]
    fn test_render_points_at_offending_char() {
        let rendered = mismatch_at("@if(a})", 5).render();
        assert!(rendered.starts_with("error: expected ')', got '}'\n"));
        assert!(rendered.contains("--> 1:6"));
        assert!(rendered.contains("1 | @if(a})"));
    }

    #[test]
    fn test_construct_messages() {
        let kind = LexerErrorKind::UnterminatedBlock {
            construct: Construct::RawBlock("js".to_string()),
        };
        assert_eq!(kind.to_string(), "unterminated @js block, expected '@endjs'");
        assert_eq!(
            LexerErrorKind::UnterminatedBlock {
                construct: Construct::Comment
            }
            .to_string(),
            "unterminated comment, expected '--}}'"
        );
        assert_eq!(kind.error_code(), codes::lexical::UNTERMINATED_BLOCK);
    }
}
