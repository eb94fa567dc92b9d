//! Character cursor over template source with position tracking

use crate::utils::Position;
use std::sync::Arc;

/// Cursor over the characters of a template
///
/// Lookahead is by character, positions are tracked as byte offset plus
/// line and column.
#[derive(Debug, Clone)]
pub struct CharStream {
    source: Arc<str>,
    chars: Vec<char>,
    index: usize,
    position: Position,
}

impl CharStream {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        let source: Arc<str> = source.into();
        let chars = source.chars().collect();
        Self {
            source,
            chars,
            index: 0,
            position: Position::start(),
        }
    }

    /// Character `offset` places ahead of the cursor
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    /// Up to `length` characters starting `offset` places ahead; shorter
    /// near the end of input
    pub fn sub(&self, length: usize, offset: usize) -> String {
        let start = (self.index + offset).min(self.chars.len());
        let end = (start + length).min(self.chars.len());
        self.chars[start..end].iter().collect()
    }

    /// Whether the input at `offset` places ahead reads `pattern`
    pub fn starts_with(&self, pattern: &str, offset: usize) -> bool {
        let mut index = self.index + offset;
        for expected in pattern.chars() {
            if self.chars.get(index) != Some(&expected) {
                return false;
            }
            index += 1;
        }
        true
    }

    /// Advance past up to `n` characters
    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            if self.next().is_none() {
                break;
            }
        }
    }

    pub fn eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Shared handle to the source, cheap to clone into errors
    pub fn shared_source(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    pub fn remaining(&self) -> usize {
        self.chars.len().saturating_sub(self.index)
    }

    /// Consume one character
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<char> {
        let ch = self.chars.get(self.index).copied()?;
        self.index += 1;
        self.position = self.position.advance(ch);
        Some(ch)
    }
}

impl From<&str> for CharStream {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for CharStream {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_and_sub() {
        let stream = CharStream::new("{{-- x --}}");
        assert_eq!(stream.peek(0), Some('{'));
        assert_eq!(stream.peek(3), Some('-'));
        assert_eq!(stream.peek(42), None);
        assert_eq!(stream.sub(2, 2), "--");
        assert_eq!(stream.sub(10, 8), "-}}");
        assert_eq!(stream.sub(3, 100), "");
        assert!(stream.starts_with("{{--", 0));
        assert!(!stream.starts_with("--}}", 0));
        assert!(!stream.starts_with("}}}", 9));
    }

    #[test]
    fn test_consumption_tracks_position() {
        let mut stream = CharStream::new("a\nßc");
        assert_eq!(stream.next(), Some('a'));
        assert_eq!(stream.next(), Some('\n'));
        assert_eq!(stream.position(), Position::new(2, 2, 1));

        stream.skip(1);
        assert_eq!(stream.position(), Position::new(4, 2, 2));
        assert_eq!(stream.remaining(), 1);

        stream.skip(5);
        assert!(stream.eof());
        assert_eq!(stream.next(), None);
        assert_eq!(stream.position(), Position::new(5, 2, 3));
        assert_eq!(stream.source(), "a\nßc");
    }
}
