//! Token types and the materialized token stream

pub mod token;
pub mod token_stream;

pub use token::{Filter, Token, TokenKind};
pub use token_stream::{validate_contiguous_spans, SpannedToken, TokenStream, TokenStreamError};

pub use crate::utils::{Position, SourceMap, Span, Spanned};
