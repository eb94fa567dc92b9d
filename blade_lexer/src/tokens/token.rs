//! Blade token types
//!
//! The lexer produces a flat sequence of these; nesting (sections, loops,
//! raw block pairing) is left to the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `| name:arg, arg` segment of an output expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub args: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.name, self.args.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Token {
    /// Text between `{{--` and `--}}`, untrimmed
    Comment { value: String },

    /// Literal output; never empty
    Text { value: String },

    /// `{{ expr }}` (escaped) or `{!! expr !!}` (unescaped)
    Data {
        escaped: bool,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filters: Option<Vec<Filter>>,
    },

    /// `@name` or `@name(args)`
    Function {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Vec<String>>,
    },

    /// Body of a raw directive up to its `@end<name>`
    RawFunction {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Vec<String>>,
        content: String,
    },

    Eof,
}

/// Payload-free discriminant, used for metrics and stream navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Comment,
    Text,
    Data,
    Function,
    RawFunction,
    Eof,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Comment => "comment",
            TokenKind::Text => "text",
            TokenKind::Data => "data",
            TokenKind::Function => "function",
            TokenKind::RawFunction => "raw-function",
            TokenKind::Eof => "eof",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Token {
    pub fn text(value: impl Into<String>) -> Self {
        Token::Text {
            value: value.into(),
        }
    }

    pub fn comment(value: impl Into<String>) -> Self {
        Token::Comment {
            value: value.into(),
        }
    }

    /// Bare directive without an argument list
    pub fn function(name: impl Into<String>) -> Self {
        Token::Function {
            name: name.into(),
            args: None,
        }
    }

    pub fn function_with_args<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Token::Function {
            name: name.into(),
            args: Some(args.into_iter().map(Into::into).collect()),
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Comment { .. } => TokenKind::Comment,
            Token::Text { .. } => TokenKind::Text,
            Token::Data { .. } => TokenKind::Data,
            Token::Function { .. } => TokenKind::Function,
            Token::RawFunction { .. } => TokenKind::RawFunction,
            Token::Eof => TokenKind::Eof,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Token::Eof)
    }

    /// Comments carry no meaning for the parser
    pub fn is_significant(&self) -> bool {
        !matches!(self, Token::Comment { .. })
    }

    /// Directive name for function and raw-function tokens
    pub fn name(&self) -> Option<&str> {
        match self {
            Token::Function { name, .. } | Token::RawFunction { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn args(&self) -> Option<&[String]> {
        match self {
            Token::Function { args, .. } | Token::RawFunction { args, .. } => args.as_deref(),
            _ => None,
        }
    }

    /// Blade source that would produce this token again
    pub fn as_blade_string(&self) -> String {
        match self {
            Token::Comment { value } => format!("{{{{--{}--}}}}", value),
            Token::Text { value } => value.clone(),
            Token::Data {
                escaped,
                value,
                filters,
            } => {
                let mut inner = value.clone();
                for filter in filters.iter().flatten() {
                    inner.push_str(&format!(" | {}", filter));
                }
                if *escaped {
                    format!("{{{{ {} }}}}", inner)
                } else {
                    format!("{{!! {} !!}}", inner)
                }
            }
            Token::Function { name, args } => match args {
                Some(args) => format!("@{}({})", name, args.join(", ")),
                None => format!("@{}", name),
            },
            Token::RawFunction {
                name,
                args,
                content,
            } => match args {
                Some(args) => format!("@{}({}){}@end{}", name, args.join(", "), content, name),
                None => format!("@{}{}@end{}", name, content, name),
            },
            Token::Eof => String::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "<EOF>"),
            other => write!(f, "{}", other.as_blade_string()),
        }
    }
}
