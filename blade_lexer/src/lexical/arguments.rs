//! Directive argument lists and top-level expression splitting

use super::char_stream::CharStream;
use super::error::{LexerError, LexerErrorKind};
use crate::config::compile_time::lexical::MAX_BRACKET_DEPTH;
use crate::utils::Span;

/// Result of scanning `( ... )` after a directive name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentList {
    pub args: Vec<String>,
    /// Deepest bracket nesting seen, the enclosing parentheses count as 1
    pub max_depth: usize,
    /// False when input ended before the closing `)`
    pub terminated: bool,
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '{' => '}',
        _ => ']',
    }
}

/// Scan an argument list; the cursor must sit just past the opening `(`
///
/// Commas split arguments only outside nested brackets and quotes. A closing
/// bracket that does not match the innermost open one is an error reported
/// at that bracket.
pub fn scan_argument_list(input: &mut CharStream) -> Result<ArgumentList, LexerError> {
    let mut args = Vec::new();
    let mut braces = vec![')'];
    let mut arg = String::new();
    let mut max_depth = 1;
    let mut terminated = false;

    loop {
        let position = input.position();
        let Some(ch) = input.next() else {
            break;
        };

        if ch == ')' && braces.len() == 1 {
            terminated = true;
            break;
        }

        match ch {
            '\'' | '"' | '`' => {
                arg.push(ch);
                if !scan_quoted(input, ch, &mut arg) {
                    break;
                }
            }
            ',' if braces.len() == 1 => {
                args.push(arg.trim().to_string());
                arg.clear();
            }
            '(' | '{' | '[' => {
                if braces.len() >= MAX_BRACKET_DEPTH {
                    return Err(LexerError::new(
                        LexerErrorKind::NestingTooDeep {
                            depth: braces.len() + 1,
                            max: MAX_BRACKET_DEPTH,
                        },
                        Span::point(position),
                        input.shared_source(),
                    ));
                }
                arg.push(ch);
                braces.push(closer_for(ch));
                max_depth = max_depth.max(braces.len());
            }
            ')' | '}' | ']' => match braces.pop() {
                Some(expected) if expected == ch => arg.push(ch),
                expected => {
                    return Err(LexerError::new(
                        LexerErrorKind::BracketMismatch {
                            expected: expected.unwrap_or(')'),
                            found: ch,
                        },
                        Span::point(position),
                        input.shared_source(),
                    ));
                }
            },
            _ => arg.push(ch),
        }
    }

    let tail = arg.trim();
    if !tail.is_empty() {
        args.push(tail.to_string());
    }

    Ok(ArgumentList {
        args,
        max_depth,
        terminated,
    })
}

/// Copy a quoted string, closing quote included; false if input ran out
fn scan_quoted(input: &mut CharStream, quote: char, arg: &mut String) -> bool {
    let mut escape = false;
    while let Some(ch) = input.next() {
        arg.push(ch);
        if ch == quote && !escape {
            return true;
        }
        escape = ch == '\\' && !escape;
    }
    false
}

/// Quote and bracket state while walking an expression
#[derive(Debug, Default)]
pub(crate) struct Nesting {
    quote: Option<char>,
    escape: bool,
    depth: usize,
}

impl Nesting {
    /// Feed one character; true if it sits outside every quote and bracket
    pub(crate) fn feed(&mut self, ch: char) -> bool {
        if let Some(quote) = self.quote {
            if ch == quote && !self.escape {
                self.quote = None;
            }
            self.escape = ch == '\\' && !self.escape;
            return false;
        }

        match ch {
            '\'' | '"' | '`' => {
                self.quote = Some(ch);
                self.escape = false;
                false
            }
            '(' | '[' | '{' => {
                self.depth += 1;
                false
            }
            ')' | ']' | '}' => {
                self.depth = self.depth.saturating_sub(1);
                false
            }
            _ => self.depth == 0,
        }
    }
}

/// Split on `separator` where it appears outside quotes and brackets
pub fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut nesting = Nesting::default();
    let mut parts = Vec::new();
    let mut start = 0;

    for (offset, ch) in input.char_indices() {
        if nesting.feed(ch) && ch == separator {
            parts.push(&input[start..offset]);
            start = offset + ch.len_utf8();
        }
    }
    parts.push(&input[start..]);
    parts
}
