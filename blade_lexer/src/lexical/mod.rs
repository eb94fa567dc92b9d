//! Lexical analysis of Blade templates
//!
//! [`Lexer`] is the pull-based tokenizer. The functions here run it over a
//! whole source or a loaded template file, with logging around the run.

pub mod arguments;
pub mod char_stream;
pub mod error;
pub mod filters;
pub mod lexer;

use crate::config::runtime::LexicalPreferences;
use crate::file_processor::FileProcessingResult;
use crate::logging::{codes, with_file_context};
use crate::tokens::TokenStream;
use crate::{log_debug, log_performance};
use std::time::Instant;

pub use arguments::{scan_argument_list, split_top_level, ArgumentList};
pub use char_stream::CharStream;
pub use error::{Construct, LexerError, LexerErrorKind};
pub use filters::parse_data_expression;
pub use lexer::{Lexer, LexicalMetrics};

/// Tokenize a source string with default preferences
pub fn tokenize_str(source: &str) -> Result<TokenStream, LexerError> {
    Lexer::from_source(source).tokenize()
}

pub fn tokenize_str_with_preferences(
    source: &str,
    preferences: LexicalPreferences,
) -> Result<TokenStream, LexerError> {
    Lexer::with_preferences(CharStream::new(source), preferences).tokenize()
}

/// Tokenize a loaded template with default preferences
pub fn tokenize_file_result(
    file_result: FileProcessingResult,
) -> Result<(TokenStream, LexicalMetrics), LexerError> {
    tokenize_file_result_with_preferences(file_result, LexicalPreferences::default())
}

/// Tokenize a loaded template; events logged during the run carry the
/// template's path
pub fn tokenize_file_result_with_preferences(
    file_result: FileProcessingResult,
    preferences: LexicalPreferences,
) -> Result<(TokenStream, LexicalMetrics), LexerError> {
    let path = file_result.metadata.path.clone();

    with_file_context(path.clone(), || -> Result<_, LexerError> {
        let start = Instant::now();

        log_debug!("Starting lexical analysis",
            "file" => path.display(),
            "chars" => file_result.char_count(),
            "lines" => file_result.metadata.line_count,
            "strict" => preferences.strict_termination
        );

        let mut lexer = Lexer::with_preferences(CharStream::new(file_result.source), preferences);
        let stream = lexer.collect_tokens()?;
        let metrics = lexer.metrics().clone();

        log_performance!(codes::success::TOKENIZATION_COMPLETE, "Tokenization complete",
            duration = start.elapsed(),
            "file" => path.display(),
            "tokens" => metrics.total_tokens,
            "text" => metrics.text_tokens,
            "data" => metrics.data_tokens,
            "comments" => metrics.comment_tokens,
            "functions" => metrics.function_tokens,
            "raw_functions" => metrics.raw_function_tokens,
            "filters" => metrics.filter_count,
            "max_bracket_depth" => metrics.max_bracket_depth,
            "longest_raw_block" => metrics.longest_raw_block
        );

        Ok((stream, metrics))
    })
}
