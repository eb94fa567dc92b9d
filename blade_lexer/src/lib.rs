pub mod config;
pub mod file_processor;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod tokens;
pub mod utils;

pub use lexical::{tokenize_str, CharStream, Lexer, LexerError, LexerErrorKind, LexicalMetrics};
pub use tokens::{Filter, Token, TokenKind, TokenStream};
pub use utils::{Position, Span, Spanned};
