//! Blade lexer: a pull-based state machine over a `CharStream`
//!
//! Each pull runs the machine until at least one token is ready. Text runs
//! are buffered and flushed right before the next special token, so spans
//! stay contiguous across the whole input. Once input is exhausted every
//! pull yields the same `Eof` token.

use super::arguments;
use super::char_stream::CharStream;
use super::error::{Construct, LexerError, LexerErrorKind};
use super::filters;
use crate::config::compile_time::lexical::MAX_TOKEN_COUNT;
use crate::config::runtime::LexicalPreferences;
use crate::tokens::{Token, TokenStream};
use crate::utils::{Position, SourceMap, Span, Spanned};
use crate::{log_debug, log_error};
use serde::Serialize;
use std::collections::VecDeque;

/// Token counts and shape statistics gathered while lexing
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub text_tokens: usize,
    pub data_tokens: usize,
    pub comment_tokens: usize,
    pub function_tokens: usize,
    pub raw_function_tokens: usize,
    pub filter_count: usize,
    /// Deepest bracket nesting in any argument list
    pub max_bracket_depth: usize,
    /// Longest raw block body, in characters
    pub longest_raw_block: usize,
}

impl LexicalMetrics {
    pub(crate) fn record_token(&mut self, token: &Token, preferences: &LexicalPreferences) {
        self.total_tokens += 1;

        if !preferences.collect_detailed_metrics {
            return;
        }

        match token {
            Token::Text { .. } => self.text_tokens += 1,
            Token::Comment { .. } => self.comment_tokens += 1,
            Token::Data { filters, .. } => {
                self.data_tokens += 1;
                self.filter_count += filters.as_ref().map_or(0, Vec::len);
            }
            Token::Function { .. } => self.function_tokens += 1,
            Token::RawFunction { content, .. } => {
                self.raw_function_tokens += 1;
                self.longest_raw_block = self.longest_raw_block.max(content.chars().count());
            }
            Token::Eof => {}
        }
    }

    pub(crate) fn record_bracket_depth(&mut self, depth: usize) {
        self.max_bracket_depth = self.max_bracket_depth.max(depth);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Inside a raw directive; everything up to `@end<name>` is content
    Raw {
        name: String,
        args: Option<Vec<String>>,
        opened_at: Position,
    },
}

pub struct Lexer {
    input: CharStream,
    preferences: LexicalPreferences,
    mode: Mode,
    /// Pending literal text
    text: String,
    /// Where the last emitted token ended
    last_flush: Position,
    queue: VecDeque<Spanned<Token>>,
    peeked: Option<Spanned<Token>>,
    eof: Option<Spanned<Token>>,
    error: Option<LexerError>,
    metrics: LexicalMetrics,
}

impl Lexer {
    /// Lexer with the default raw directives (`js`, `verbatim`)
    pub fn new(input: CharStream) -> Self {
        Self::with_preferences(input, LexicalPreferences::default())
    }

    pub fn with_preferences(input: CharStream, preferences: LexicalPreferences) -> Self {
        let start = input.position();
        Self {
            input,
            preferences,
            mode: Mode::Normal,
            text: String::new(),
            last_flush: start,
            queue: VecDeque::new(),
            peeked: None,
            eof: None,
            error: None,
            metrics: LexicalMetrics::default(),
        }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(CharStream::new(source))
    }

    pub fn preferences(&self) -> &LexicalPreferences {
        &self.preferences
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn source(&self) -> &str {
        self.input.source()
    }

    /// Next token without advancing
    pub fn peek(&mut self) -> Result<&Spanned<Token>, LexerError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.produce()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// The token `peek` would return, advancing past it
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Spanned<Token>, LexerError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.produce(),
        }
    }

    /// Drain the lexer up to and including the first `Eof`
    pub fn tokenize(mut self) -> Result<TokenStream, LexerError> {
        self.collect_tokens()
    }

    /// Like `tokenize` but keeps the lexer, and its metrics, around
    pub fn collect_tokens(&mut self) -> Result<TokenStream, LexerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next()?;
            if token.value.is_eof() {
                tokens.push(token);
                break;
            }

            if tokens.len() >= MAX_TOKEN_COUNT {
                let error = LexerError::new(
                    LexerErrorKind::TooManyTokens {
                        count: tokens.len() + 1,
                        max: MAX_TOKEN_COUNT,
                    },
                    token.span,
                    self.input.shared_source(),
                );
                return Err(self.fail(error));
            }
            tokens.push(token);
        }

        let source_map = SourceMap::new(self.input.source().to_string());
        Ok(TokenStream::with_source_map(tokens, source_map))
    }

    fn produce(&mut self) -> Result<Spanned<Token>, LexerError> {
        loop {
            if let Some(token) = self.queue.pop_front() {
                return Ok(token);
            }
            if let Some(error) = &self.error {
                return Err(error.clone());
            }
            if let Some(eof) = &self.eof {
                return Ok(eof.clone());
            }
            if let Err(error) = self.step() {
                return Err(self.fail(error));
            }
        }
    }

    /// Record the error so every later pull returns it
    fn fail(&mut self, error: LexerError) -> LexerError {
        log_error!(error.error_code(), &error.message(),
            span = error.span(),
            "position" => error.span().start
        );
        self.error = Some(error.clone());
        error
    }

    fn step(&mut self) -> Result<(), LexerError> {
        let Some(c) = self.input.peek(0) else {
            return self.finish();
        };

        if matches!(self.mode, Mode::Raw { .. }) && c != '@' {
            self.text.push(c);
            self.input.skip(1);
            return Ok(());
        }

        match c {
            '{' if self.input.starts_with("!!", 1) => self.lex_data(false),
            '{' if self.input.starts_with("{--", 1) => self.lex_comment(),
            '{' if self.input.peek(1) == Some('{') => self.lex_data(true),
            '@' => self.lex_directive(),
            _ => {
                self.text.push(c);
                self.input.skip(1);
                Ok(())
            }
        }
    }

    fn finish(&mut self) -> Result<(), LexerError> {
        if let Mode::Raw {
            name, opened_at, ..
        } = &self.mode
        {
            if self.preferences.strict_termination {
                return Err(self.unterminated(Construct::RawBlock(name.clone()), *opened_at));
            }
            self.close_raw();
        }

        let end = self.input.position();
        self.flush_text(end);
        self.eof = Some(Spanned::new(Token::Eof, Span::point(end)));
        Ok(())
    }

    fn lex_comment(&mut self) -> Result<(), LexerError> {
        let start = self.input.position();
        self.input.skip(4);

        let value = self.scan_until("--}}", Construct::Comment, start)?;
        self.flush_text(start);
        self.emit(Token::Comment { value });
        Ok(())
    }

    fn lex_data(&mut self, escaped: bool) -> Result<(), LexerError> {
        let start = self.input.position();
        let (opener, terminator, construct) = if escaped {
            (2, "}}", Construct::EscapedData)
        } else {
            (3, "!!}", Construct::UnescapedData)
        };
        self.input.skip(opener);

        let interior = self.scan_until(terminator, construct, start)?;
        let (value, filters) = filters::parse_data_expression(&interior);
        self.flush_text(start);
        self.emit(Token::Data {
            escaped,
            value,
            filters,
        });
        Ok(())
    }

    /// Copy input up to `terminator` and skip it; input running out is
    /// accepted unless termination is strict
    fn scan_until(
        &mut self,
        terminator: &str,
        construct: Construct,
        start: Position,
    ) -> Result<String, LexerError> {
        let mut interior = String::new();

        while let Some(ch) = self.input.peek(0) {
            if self.input.starts_with(terminator, 0) {
                self.input.skip(terminator.chars().count());
                return Ok(interior);
            }
            interior.push(ch);
            self.input.skip(1);
        }

        if self.preferences.strict_termination {
            return Err(self.unterminated(construct, start));
        }
        Ok(interior)
    }

    fn lex_directive(&mut self) -> Result<(), LexerError> {
        let start = self.input.position();
        self.input.skip(1);

        if !self.input.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
            self.lex_escape();
            return Ok(());
        }

        let name = self.read_name();

        if let Mode::Raw { name: open, .. } = &self.mode {
            if name.strip_prefix("end") == Some(open.as_str()) {
                self.close_raw();
            } else {
                self.text.push('@');
                self.text.push_str(&name);
            }
            return Ok(());
        }

        if self.preferences.is_raw_function(&name) {
            return self.open_raw(name, start);
        }

        let args = self.scan_arguments(start, char::is_whitespace)?;
        self.flush_text(start);
        self.emit(Token::Function { name, args });
        Ok(())
    }

    /// `@` not followed by a letter; the `@` has been consumed
    fn lex_escape(&mut self) {
        if matches!(self.mode, Mode::Raw { .. }) {
            self.text.push('@');
            return;
        }

        while let Some(ch) = self.input.peek(0) {
            if ch.is_whitespace() {
                break;
            }
            self.text.push(ch);
            self.input.skip(1);
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.input.peek(0).filter(char::is_ascii_alphabetic) {
            name.push(ch);
            self.input.skip(1);
        }
        name
    }

    /// Parse `(...)` if it follows the name after only `gap` characters;
    /// the gap is left alone when there is no list
    fn scan_arguments(
        &mut self,
        start: Position,
        gap: fn(char) -> bool,
    ) -> Result<Option<Vec<String>>, LexerError> {
        let mut lookahead = 0;
        while self.input.peek(lookahead).is_some_and(gap) {
            lookahead += 1;
        }
        if self.input.peek(lookahead) != Some('(') {
            return Ok(None);
        }

        self.input.skip(lookahead + 1);
        let list = arguments::scan_argument_list(&mut self.input)?;
        if !list.terminated && self.preferences.strict_termination {
            return Err(self.unterminated(Construct::ArgumentList, start));
        }

        self.metrics.record_bracket_depth(list.max_depth);
        Ok(Some(list.args))
    }

    fn open_raw(&mut self, name: String, start: Position) -> Result<(), LexerError> {
        self.flush_text(start);
        // a list must sit on the opener's line; the body may start with `(`
        let args = self.scan_arguments(start, |ch| matches!(ch, ' ' | '\t'))?;

        log_debug!("Entering raw block",
            "name" => name.as_str(),
            "position" => start
        );

        self.mode = Mode::Raw {
            name,
            args,
            opened_at: start,
        };
        Ok(())
    }

    fn close_raw(&mut self) {
        let Mode::Raw { name, args, .. } = std::mem::replace(&mut self.mode, Mode::Normal) else {
            return;
        };

        if self.preferences.is_transparent(&name) {
            self.flush_text(self.input.position());
        } else {
            let content = std::mem::take(&mut self.text);
            self.emit(Token::RawFunction {
                name,
                args,
                content,
            });
        }
    }

    fn unterminated(&self, construct: Construct, start: Position) -> LexerError {
        LexerError::new(
            LexerErrorKind::UnterminatedBlock { construct },
            Span::new(start, self.input.position()),
            self.input.shared_source(),
        )
    }

    /// Emit pending text as a token ending at `end`; empty text is dropped
    fn flush_text(&mut self, end: Position) {
        if self.text.is_empty() {
            return;
        }
        let value = std::mem::take(&mut self.text);
        let span = Span::new(self.last_flush, end);
        self.last_flush = end;
        self.push(Spanned::new(Token::Text { value }, span));
    }

    /// Emit a token spanning from the last flush to the cursor
    fn emit(&mut self, token: Token) {
        let end = self.input.position();
        let span = Span::new(self.last_flush, end);
        self.last_flush = end;
        self.push(Spanned::new(token, span));
    }

    fn push(&mut self, token: Spanned<Token>) {
        self.metrics.record_token(&token.value, &self.preferences);
        self.queue.push_back(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_time::lexical::MAX_BRACKET_DEPTH;
    use crate::tokens::{validate_contiguous_spans, Filter, TokenKind};
    use assert_matches::assert_matches;

    fn preferences(raw: &[&str]) -> LexicalPreferences {
        LexicalPreferences {
            raw_functions: raw.iter().map(|name| name.to_string()).collect(),
            transparent_raw_function: "verbatim".to_string(),
            strict_termination: false,
            collect_detailed_metrics: true,
        }
    }

    fn lexer(source: &str) -> Lexer {
        Lexer::with_preferences(CharStream::new(source), preferences(&["js", "verbatim"]))
    }

    fn strict_lexer(source: &str) -> Lexer {
        Lexer::with_preferences(
            CharStream::new(source),
            preferences(&["js", "verbatim"]).strict(true),
        )
    }

    /// All tokens up to and including eof
    fn drain(mut lexer: Lexer) -> Vec<Spanned<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next().unwrap();
            let done = token.value.is_eof();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn values(tokens: Vec<Spanned<Token>>) -> Vec<Token> {
        tokens
            .into_iter()
            .map(Spanned::into_inner)
            .filter(|token| !token.is_eof())
            .collect()
    }

    fn lex(source: &str) -> Vec<Token> {
        values(drain(lexer(source)))
    }

    fn lex_raw(source: &str, raw: &[&str]) -> Vec<Token> {
        values(drain(Lexer::with_preferences(
            CharStream::new(source),
            preferences(raw),
        )))
    }

    fn data(escaped: bool, value: &str, filters: Option<Vec<Filter>>) -> Token {
        Token::Data {
            escaped,
            value: value.to_string(),
            filters,
        }
    }

    fn filter(name: &str, args: &[&str]) -> Filter {
        Filter::new(name, args.iter().map(|arg| arg.to_string()).collect())
    }

    fn raw_function(name: &str, args: Option<&[&str]>, content: &str) -> Token {
        Token::RawFunction {
            name: name.to_string(),
            args: args.map(|args| args.iter().map(|arg| arg.to_string()).collect()),
            content: content.to_string(),
        }
    }

    const LAYOUT: &str = concat!(
        "{{-- this example is taken from https://laravel.com/docs/5.8/blade#template-inheritance --}}\n",
        "\n",
        "<!-- Stored in resources/views/layouts/app.blade.php -->\n",
        "\n",
        "<html>\n",
        "    <head>\n",
        "        <title>App Name - @yield('title')</title>\n",
        "    </head>\n",
        "    <body>\n",
        "        @section('sidebar')\n",
        "            This is the master sidebar.\n",
        "        @show\n",
        "\n",
        "        <div class=\"container\">\n",
        "            @yield('content')\n",
        "        </div>\n",
        "    </body>\n",
        "</html>",
    );

    const NESTED_ARGUMENTS: &str = concat!(
        "@include('view.name', {\n",
        "  'foo': ['hello )))', '(( world'],\n",
        "  'bar': 5 * (3 + 4 * (5 - 2)),\n",
        "})",
    );

    const ECHOES: &str = concat!(
        "<div>\n",
        "  Username: {{ user.name }}\n",
        "  Status: {{ user.status }}\n",
        "  Badge: {!! user.badge !!}\n",
        "</div>",
    );

    const ESCAPED_ECHOES: &str = concat!(
        "<div>\n",
        "  Username: @{{ user.name }}\n",
        "  Status: @{{ user.status }}\n",
        "  Badge: @{!! user.badge !!}\n",
        "</div>",
    );

    const RAW_BLOCKS: &str = concat!(
        "@verbatim\n",
        "Hello World\n",
        "@endverbatim\n",
        "\n",
        "@js\n",
        "for (let i = 0; i < 10; ++i) {\n",
        "  print(i);\n",
        "}\n",
        "@endjs\n",
        "\n",
        "@markdown('default')\n",
        "\n",
        "Profile info:\n",
        "- Name: Bill\n",
        "- Number: *+1234567890*\n",
        "- Email: example@example.com\n",
        "\n",
        "@endmarkdown",
    );

    const FILTERS: &str = concat!(
        "{{ 'test' | ucfirst }}\n",
        "{{ 'hello' | ucfirst | uclast }}\n",
        "{{ ' HeLlO ' | trim }}\n",
        "{{ name | ucfirst | substr:0,1 }}\n",
        "{!! time | format-time:'Y-m-d H:i:s' !!}",
    );

    // === CURSOR BEHAVIOR ===

    #[test]
    fn test_empty_input_is_eof() {
        let mut lexer = lexer("");
        let token = lexer.peek().unwrap();
        assert_eq!(token.value, Token::Eof);
        assert_eq!(token.span, Span::point(Position::start()));
    }

    #[test]
    fn test_eof_is_stable() {
        let mut lexer = lexer("Hello");
        assert_eq!(lexer.next().unwrap().value, Token::text("Hello"));

        let first = lexer.next().unwrap();
        assert_eq!(first.value, Token::Eof);
        assert_eq!(first.span, Span::point(Position::new(5, 1, 6)));

        for _ in 0..100 {
            assert_eq!(lexer.peek().unwrap(), &first);
            assert_eq!(lexer.next().unwrap(), first);
        }
    }

    #[test]
    fn test_peek_is_idempotent() {
        let mut lexer = lexer("Hello World");
        let first = lexer.peek().unwrap().clone();
        let second = lexer.peek().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(lexer.next().unwrap(), first);
    }

    #[test]
    fn test_peek_then_next_return_the_first_token() {
        let mut lexer = lexer("@for(let i = 0; i < 10; ++i)\n@endfor");
        let peeked = lexer.peek().unwrap().clone();
        let next = lexer.next().unwrap();
        assert_eq!(peeked, next);
        assert_eq!(
            next.value,
            Token::function_with_args("for", ["let i = 0; i < 10; ++i"])
        );
        assert_eq!(lexer.next().unwrap().value, Token::text("\n"));
        assert_eq!(lexer.next().unwrap().value, Token::function("endfor"));
    }

    // === SCENARIOS ===

    #[test]
    fn test_text_then_function() {
        let tokens = drain(lexer("Hello World\n@section('a', 'b')"));

        assert_eq!(tokens[0].value, Token::text("Hello World\n"));
        assert_eq!(
            tokens[0].span,
            Span::new(Position::new(0, 1, 1), Position::new(12, 2, 1))
        );

        assert_eq!(
            tokens[1].value,
            Token::function_with_args("section", ["'a'", "'b'"])
        );
        assert_eq!(
            tokens[1].span,
            Span::new(Position::new(12, 2, 1), Position::new(30, 2, 19))
        );

        assert_eq!(tokens[2].value, Token::Eof);
        assert_eq!(tokens[2].span, Span::point(Position::new(30, 2, 19)));
    }

    #[test]
    fn test_object_literal_argument() {
        let tokens = lex("@include('view.name', {'foo': ['x',')'], 'bar': 5*(3+4)})");
        assert_eq!(
            tokens,
            vec![Token::function_with_args(
                "include",
                ["'view.name'", "{'foo': ['x',')'], 'bar': 5*(3+4)}"]
            )]
        );
    }

    #[test]
    fn test_filters_on_escaped_data() {
        assert_eq!(
            lex("{{ name | ucfirst | substr:0,1 }}"),
            vec![data(
                true,
                "name",
                Some(vec![filter("ucfirst", &[]), filter("substr", &["0", "1"])])
            )]
        );
    }

    #[test]
    fn test_empty_filter_pieces_are_dropped() {
        assert_eq!(
            lex("{{ a | f:1, }}{{ b | }}"),
            vec![
                data(true, "a", Some(vec![filter("f", &["1"])])),
                data(true, "b", None),
            ]
        );
    }

    #[test]
    fn test_escaped_echo_is_text() {
        assert_eq!(lex("@{{ user.name }}"), vec![Token::text("{{ user.name }}")]);
    }

    #[test]
    fn test_raw_js_block() {
        assert_eq!(
            lex("@js\nfoo();\n@endjs"),
            vec![raw_function("js", None, "\nfoo();\n")]
        );
    }

    #[test]
    fn test_raw_block_body_starting_with_paren_is_content() {
        assert_eq!(
            lex("@js\n(function () { go(); })();\n@endjs"),
            vec![raw_function("js", None, "\n(function () { go(); })();\n")]
        );
        assert_eq!(
            lex("@js \t('mod')\nrun();\n@endjs"),
            vec![raw_function("js", Some(&["'mod'"]), "\nrun();\n")]
        );
    }

    // === TEMPLATE SAMPLES ===

    #[test]
    fn test_layout_sample() {
        assert_eq!(
            lex(LAYOUT),
            vec![
                Token::comment(
                    " this example is taken from https://laravel.com/docs/5.8/blade#template-inheritance "
                ),
                Token::text(concat!(
                    "\n\n<!-- Stored in resources/views/layouts/app.blade.php -->",
                    "\n\n<html>\n    <head>\n        <title>App Name - "
                )),
                Token::function_with_args("yield", ["'title'"]),
                Token::text("</title>\n    </head>\n    <body>\n        "),
                Token::function_with_args("section", ["'sidebar'"]),
                Token::text("\n            This is the master sidebar.\n        "),
                Token::function("show"),
                Token::text("\n\n        <div class=\"container\">\n            "),
                Token::function_with_args("yield", ["'content'"]),
                Token::text("\n        </div>\n    </body>\n</html>"),
            ]
        );
    }

    #[test]
    fn test_nested_arguments_sample() {
        assert_eq!(
            lex(NESTED_ARGUMENTS),
            vec![Token::function_with_args(
                "include",
                [
                    "'view.name'",
                    "{\n  'foo': ['hello )))', '(( world'],\n  'bar': 5 * (3 + 4 * (5 - 2)),\n}",
                ]
            )]
        );
    }

    #[test]
    fn test_echo_sample() {
        assert_eq!(
            lex(ECHOES),
            vec![
                Token::text("<div>\n  Username: "),
                data(true, "user.name", None),
                Token::text("\n  Status: "),
                data(true, "user.status", None),
                Token::text("\n  Badge: "),
                data(false, "user.badge", None),
                Token::text("\n</div>"),
            ]
        );
    }

    #[test]
    fn test_escape_sample() {
        assert_eq!(
            lex(ESCAPED_ECHOES),
            vec![Token::text(
                "<div>\n  Username: {{ user.name }}\n  Status: {{ user.status }}\n  Badge: {!! user.badge !!}\n</div>"
            )]
        );
    }

    #[test]
    fn test_raw_blocks_sample() {
        assert_eq!(
            lex_raw(RAW_BLOCKS, &["verbatim", "js", "markdown"]),
            vec![
                Token::text("\nHello World\n"),
                Token::text("\n\n"),
                raw_function(
                    "js",
                    None,
                    "\nfor (let i = 0; i < 10; ++i) {\n  print(i);\n}\n"
                ),
                Token::text("\n\n"),
                raw_function(
                    "markdown",
                    Some(&["'default'"]),
                    "\n\nProfile info:\n- Name: Bill\n- Number: *+1234567890*\n- Email: example@example.com\n\n"
                ),
            ]
        );
    }

    #[test]
    fn test_filters_sample() {
        let newline = || Token::text("\n");
        assert_eq!(
            lex(FILTERS),
            vec![
                data(true, "'test'", Some(vec![filter("ucfirst", &[])])),
                newline(),
                data(
                    true,
                    "'hello'",
                    Some(vec![filter("ucfirst", &[]), filter("uclast", &[])])
                ),
                newline(),
                data(true, "' HeLlO '", Some(vec![filter("trim", &[])])),
                newline(),
                data(
                    true,
                    "name",
                    Some(vec![filter("ucfirst", &[]), filter("substr", &["0", "1"])])
                ),
                newline(),
                data(
                    false,
                    "time",
                    Some(vec![filter("format-time", &["'Y-m-d H:i:s'"])])
                ),
            ]
        );
    }

    // === SPAN AND TEXT INVARIANTS ===

    #[test]
    fn test_spans_are_contiguous_and_text_is_never_empty() {
        let samples = [LAYOUT, NESTED_ARGUMENTS, ECHOES, ESCAPED_ECHOES, FILTERS];
        for sample in samples {
            let tokens = drain(lexer(sample));
            assert!(validate_contiguous_spans(&tokens).is_ok(), "{}", sample);
            assert_eq!(tokens.last().unwrap().span.end.offset, sample.len());
            for token in &tokens {
                if let Token::Text { value } = &token.value {
                    assert!(!value.is_empty());
                }
                assert_eq!(
                    token.span.slice(sample).is_empty(),
                    token.value.is_eof(),
                    "only eof may have an empty span"
                );
            }
        }

        let raw = drain(Lexer::with_preferences(
            CharStream::new(RAW_BLOCKS),
            preferences(&["verbatim", "js", "markdown"]),
        ));
        assert!(validate_contiguous_spans(&raw).is_ok());
    }

    #[test]
    fn test_token_spans_cover_their_source() {
        let source = "a\n{{ b }}@if($x) {{-- c --}}";
        let tokens = drain(lexer(source));
        let slices: Vec<&str> = tokens.iter().map(|t| t.span.slice(source)).collect();
        assert_eq!(slices, vec!["a\n", "{{ b }}", "@if($x)", " ", "{{-- c --}}", ""]);
        assert_eq!(tokens[1].span.start, Position::new(2, 2, 1));
        assert_eq!(tokens[1].span.end, Position::new(9, 2, 8));
    }

    #[test]
    fn test_raw_function_span_starts_at_opener() {
        let source = "x @js a @endjs";
        let tokens = drain(lexer(source));
        assert_eq!(tokens[0].value, Token::text("x "));
        assert_eq!(tokens[1].span.slice(source), "@js a @endjs");
        assert_eq!(tokens[1].value, raw_function("js", None, " a "));
    }

    // === DIRECTIVES ===

    #[test]
    fn test_function_argument_forms() {
        assert_eq!(lex("@csrf()"), vec![Token::function_with_args("csrf", Vec::<String>::new())]);
        assert_eq!(
            lex("@include ('a')"),
            vec![Token::function_with_args("include", ["'a'"])]
        );
        assert_eq!(
            lex("@endif \n"),
            vec![Token::function("endif"), Token::text(" \n")]
        );
    }

    #[test]
    fn test_directive_names_are_ascii_letters() {
        assert_eq!(
            lex("@café"),
            vec![Token::function("caf"), Token::text("é")]
        );
        assert_eq!(
            lex("@if2"),
            vec![Token::function("if"), Token::text("2")]
        );
    }

    #[test]
    fn test_escape_rules() {
        assert_eq!(lex("@@if"), vec![Token::text("@if")]);
        assert_eq!(lex("a @ b"), vec![Token::text("a  b")]);
        assert_eq!(lex("a@"), vec![Token::text("a")]);
    }

    #[test]
    fn test_at_signs_inside_raw_blocks() {
        assert_eq!(
            lex("@js a@b @@ @endjsx @endjs"),
            vec![raw_function("js", None, " a@b @@ @endjsx ")]
        );
    }

    #[test]
    fn test_braces_inside_raw_blocks_are_content() {
        assert_eq!(
            lex("@verbatim{{ x }}{!! y !!}{{-- z --}}@endverbatim"),
            vec![Token::text("{{ x }}{!! y !!}{{-- z --}}")]
        );
    }

    #[test]
    fn test_lone_brace_is_text() {
        assert_eq!(lex("{ a } {!"), vec![Token::text("{ a } {!")]);
    }

    #[test]
    fn test_empty_raw_blocks() {
        assert_eq!(lex("@js@endjs"), vec![raw_function("js", None, "")]);
        assert_eq!(lex("a@verbatim@endverbatim b"), vec![Token::text("a"), Token::text(" b")]);
    }

    // === UNTERMINATED CONSTRUCTS ===

    #[test]
    fn test_unterminated_constructs_are_accepted_by_default() {
        assert_eq!(lex("{{ name"), vec![data(true, "name", None)]);
        assert_eq!(lex("{!! html"), vec![data(false, "html", None)]);
        assert_eq!(lex("{{-- note"), vec![Token::comment(" note")]);
        assert_eq!(
            lex("@include('a', b"),
            vec![Token::function_with_args("include", ["'a'", "b"])]
        );
        assert_eq!(lex("@js foo"), vec![raw_function("js", None, " foo")]);
        assert_eq!(lex("@verbatim hi"), vec![Token::text(" hi")]);
    }

    #[test]
    fn test_strict_termination() {
        let error = strict_lexer("ab {{ name").next().unwrap_err();
        assert_matches!(
            error.kind(),
            LexerErrorKind::UnterminatedBlock {
                construct: Construct::EscapedData
            }
        );
        assert_eq!(error.span().start.offset, 3);
        assert_eq!(error.span().end.offset, 10);

        assert_matches!(
            strict_lexer("{{-- note").next().unwrap_err().kind(),
            LexerErrorKind::UnterminatedBlock {
                construct: Construct::Comment
            }
        );
        assert_matches!(
            strict_lexer("@if($a").next().unwrap_err().kind(),
            LexerErrorKind::UnterminatedBlock {
                construct: Construct::ArgumentList
            }
        );

        let mut lexer = strict_lexer("x @js foo");
        assert_eq!(lexer.next().unwrap().value, Token::text("x "));
        let error = lexer.next().unwrap_err();
        assert_matches!(
            error.kind(),
            LexerErrorKind::UnterminatedBlock {
                construct: Construct::RawBlock(name)
            } if name == "js"
        );
        assert_eq!(error.span().start.offset, 2);
    }

    #[test]
    fn test_strict_mode_accepts_closed_constructs() {
        let tokens = values(drain(strict_lexer(ECHOES)));
        assert_eq!(tokens.len(), 7);
    }

    // === ERRORS ===

    #[test]
    fn test_bracket_mismatch() {
        let mut lexer = lexer("@if(a})");
        let error = lexer.next().unwrap_err();

        assert_matches!(
            error.kind(),
            LexerErrorKind::BracketMismatch {
                expected: ')',
                found: '}'
            }
        );
        assert_eq!(error.message(), "expected ')', got '}'");
        assert_eq!(error.span(), Span::point(Position::new(5, 1, 6)));
        assert_eq!(error.source_text(), "@if(a})");
        assert!(error.render().contains("--> 1:6"));
    }

    #[test]
    fn test_bracket_mismatch_inside_nested_list() {
        let error = lexer("@each([1, (2]))").next().unwrap_err();
        assert_matches!(
            error.kind(),
            LexerErrorKind::BracketMismatch {
                expected: ')',
                found: ']'
            }
        );
        assert_eq!(error.span().start.offset, 12);
    }

    #[test]
    fn test_errors_are_sticky() {
        let mut lexer = lexer("Hello @if(a}) world {{ x }}");
        let first = lexer.next().unwrap_err();
        assert_eq!(lexer.peek().unwrap_err(), first);
        for _ in 0..10 {
            assert_eq!(lexer.next().unwrap_err(), first);
        }
    }

    #[test]
    fn test_nesting_too_deep() {
        let source = format!("@f({}", "[".repeat(MAX_BRACKET_DEPTH + 1));
        let error = lexer(&source).next().unwrap_err();
        assert_matches!(error.kind(), LexerErrorKind::NestingTooDeep { .. });
    }

    // === STREAM AND METRICS ===

    #[test]
    fn test_tokenize_builds_stream() {
        let stream = lexer("{{-- c --}}Hi {{ name }}").tokenize().unwrap();
        assert!(stream.has_eof());
        assert_eq!(stream.all_tokens().len(), 4);
        assert_eq!(stream.len(), 3);
        assert!(stream.check_kind(TokenKind::Text));
    }

    #[test]
    fn test_tokenize_propagates_errors() {
        assert_matches!(
            lexer("ok @if(]").tokenize(),
            Err(error) if matches!(error.kind(), LexerErrorKind::BracketMismatch { .. })
        );
    }

    #[test]
    fn test_metrics() {
        let mut lexer = lexer(FILTERS);
        lexer.collect_tokens().unwrap();
        let metrics = lexer.metrics();
        assert_eq!(metrics.data_tokens, 5);
        assert_eq!(metrics.text_tokens, 4);
        assert_eq!(metrics.filter_count, 7);
        assert_eq!(metrics.total_tokens, 9);

        let mut nested = Lexer::with_preferences(
            CharStream::new(NESTED_ARGUMENTS),
            preferences(&["js", "verbatim"]),
        );
        nested.collect_tokens().unwrap();
        assert_eq!(nested.metrics().max_bracket_depth, 4);
        assert_eq!(nested.metrics().function_tokens, 1);

        let mut raw = Lexer::with_preferences(
            CharStream::new("@js abc @endjs @js a @endjs"),
            preferences(&["js"]),
        );
        raw.collect_tokens().unwrap();
        assert_eq!(raw.metrics().raw_function_tokens, 2);
        assert_eq!(raw.metrics().longest_raw_block, 5);
    }

    #[test]
    fn test_metrics_can_be_limited_to_totals() {
        let mut prefs = preferences(&["js"]);
        prefs.collect_detailed_metrics = false;
        let mut lexer = Lexer::with_preferences(CharStream::new("a {{ b }}"), prefs);
        lexer.collect_tokens().unwrap();
        assert_eq!(lexer.metrics().total_tokens, 2);
        assert_eq!(lexer.metrics().data_tokens, 0);
    }
}
