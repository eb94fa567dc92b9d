//! Materialized token stream with comment-skipping navigation
//!
//! All tokens keep their original spans; navigation only visits significant
//! tokens, so a parser never sees comments but diagnostics still point at
//! the right place.

use crate::{
    tokens::token::{Token, TokenKind},
    utils::{SourceMap, Span, Spanned},
};

/// A token with span information
pub type SpannedToken = Spanned<Token>;

#[derive(Debug, Clone)]
pub struct TokenStream {
    /// Every token, comments included, in source order
    all_tokens: Vec<SpannedToken>,
    /// Indices into all_tokens for significant (non-comment) tokens
    significant_indices: Vec<usize>,
    /// Current position in significant_indices
    position: usize,
    source_map: Option<SourceMap>,
}

impl TokenStream {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        let significant_indices = tokens
            .iter()
            .enumerate()
            .filter(|(_, spanned)| spanned.value.is_significant())
            .map(|(i, _)| i)
            .collect();

        Self {
            all_tokens: tokens,
            significant_indices,
            position: 0,
            source_map: None,
        }
    }

    /// Create stream with source map for caret diagnostics
    pub fn with_source_map(tokens: Vec<SpannedToken>, source_map: SourceMap) -> Self {
        let mut stream = Self::new(tokens);
        stream.source_map = Some(source_map);
        stream
    }

    // === CORE NAVIGATION ===

    pub fn current(&self) -> Option<&SpannedToken> {
        self.peek_ahead(0)
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.current().map(|spanned| &spanned.value)
    }

    pub fn current_span(&self) -> Option<Span> {
        self.current().map(|spanned| spanned.span)
    }

    /// Next significant token after the current one
    pub fn peek(&self) -> Option<&SpannedToken> {
        self.peek_ahead(1)
    }

    pub fn peek_ahead(&self, n: usize) -> Option<&SpannedToken> {
        self.significant_indices
            .get(self.position + n)
            .and_then(|&original_index| self.all_tokens.get(original_index))
    }

    /// Move to the next significant token and return it
    pub fn advance(&mut self) -> Option<&SpannedToken> {
        if self.position < self.significant_indices.len() {
            self.position += 1;
        }
        self.current()
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.significant_indices.len()
    }

    /// Number of significant tokens
    pub fn len(&self) -> usize {
        self.significant_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.significant_indices.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining_count(&self) -> usize {
        self.significant_indices.len().saturating_sub(self.position)
    }

    // === PARSER INTEGRATION ===

    pub fn check_kind(&self, kind: TokenKind) -> bool {
        self.current_token()
            .map(|token| token.kind() == kind)
            .unwrap_or(false)
    }

    /// Consume the current token if it matches predicate
    pub fn consume_if<F>(&mut self, predicate: F) -> Option<SpannedToken>
    where
        F: FnOnce(&Token) -> bool,
    {
        let matched = self.current().filter(|spanned| predicate(&spanned.value)).cloned();
        if matched.is_some() {
            self.advance();
        }
        matched
    }

    pub fn expect_kind(&mut self, kind: TokenKind) -> Result<SpannedToken, TokenStreamError> {
        match self.current() {
            Some(current) if current.value.kind() == kind => {
                let result = current.clone();
                self.advance();
                Ok(result)
            }
            Some(current) => Err(TokenStreamError::UnexpectedToken {
                expected: kind,
                found: current.value.kind(),
                span: current.span,
            }),
            None => Err(TokenStreamError::UnexpectedEndOfStream { expected: kind }),
        }
    }

    // === ITERATION ===

    pub fn iter_significant(&self) -> impl Iterator<Item = &SpannedToken> {
        self.significant_indices
            .iter()
            .filter_map(|&i| self.all_tokens.get(i))
    }

    /// All tokens, comments included
    pub fn all_tokens(&self) -> &[SpannedToken] {
        &self.all_tokens
    }

    pub fn into_tokens(self) -> Vec<SpannedToken> {
        self.all_tokens
    }

    pub fn has_eof(&self) -> bool {
        self.all_tokens
            .last()
            .map(|spanned| spanned.value.is_eof())
            .unwrap_or(false)
    }

    // === ERROR REPORTING ===

    pub fn format_error(&self, span: Span, message: &str) -> String {
        match &self.source_map {
            Some(source_map) => source_map.format_error(&span, message),
            None => format!("Error at {}: {}", span, message),
        }
    }

    pub fn source_text(&self, span: &Span) -> Option<&str> {
        self.source_map.as_ref().map(|sm| sm.span_text(span))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenStreamError {
    #[error("Expected {expected}, found {found} at {span}")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        span: Span,
    },

    #[error("Expected {expected}, but reached end of input")]
    UnexpectedEndOfStream { expected: TokenKind },
}

/// Checks that each token starts exactly where the previous one ended
pub fn validate_contiguous_spans(tokens: &[SpannedToken]) -> Result<(), String> {
    for window in tokens.windows(2) {
        let current = window[0].span;
        let next = window[1].span;

        if current.end != next.start {
            return Err(format!(
                "Span gap: token ending at {} is followed by token starting at {}",
                current.end, next.start
            ));
        }
    }
    Ok(())
}
