//! Shared primitive types for the template lexer
//!
//! Source positions, spans and the source map used to render diagnostics.

pub mod span;

pub use span::{Position, SourceMap, Span, Spanned};
