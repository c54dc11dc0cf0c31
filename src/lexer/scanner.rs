//! External scanner for raw string literals.
//!
//! `R"delim(...)delim"` cannot be tokenized context-free: the closing
//! sequence is only known once the opening delimiter has been read. This
//! scanner is the one stateful corner of tokenization, and its state lives
//! entirely inside a single [`scan`] call; there is no cross-token memory.
//!
//! The machine has three states. `AwaitDelimiter` captures the optional
//! delimiter between the opening quote and `(`; `ScanContent` consumes
//! arbitrary bytes (newlines and quotes included) looking for
//! `)` + delimiter + `"`; `Emit` slices the pieces. Reaching end of input
//! before the closing sequence is a no-match, which the grammar layer turns
//! into a lexical error needing recovery.

use crate::tree::Span;

/// C++ caps raw string delimiters at 16 characters.
const MAX_DELIMITER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitDelimiter,
    ScanContent,
    Emit,
}

/// Byte spans of everything after the opening `R"`, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStringPieces {
    pub delimiter: Span,
    pub open_paren: Span,
    pub content: Span,
    pub close_paren: Span,
    pub close_delimiter: Span,
    pub close_quote: Span,
    /// First byte past the closing quote.
    pub end: usize,
}

/// Scans the tail of a raw string literal starting right after the opening
/// quote. Returns `None` if the delimiter is malformed or the closing
/// sequence never appears.
pub fn scan(src: &str, pos: usize) -> Option<RawStringPieces> {
    let bytes = src.as_bytes();
    let mut state = State::AwaitDelimiter;
    let mut cursor = pos;
    let mut delimiter = Span::empty(pos);
    let mut content = Span::empty(pos);
    let mut close_paren = 0usize;

    loop {
        match state {
            State::AwaitDelimiter => {
                let start = cursor;
                while cursor < bytes.len() && is_delimiter_byte(bytes[cursor]) {
                    cursor += 1;
                    if cursor - start > MAX_DELIMITER_LEN {
                        return None;
                    }
                }
                if bytes.get(cursor) != Some(&b'(') {
                    return None;
                }
                delimiter = Span::new(start, cursor);
                cursor += 1;
                state = State::ScanContent;
            }
            State::ScanContent => {
                let closing = format!("){}\"", &src[delimiter.start..delimiter.end]);
                match src[cursor..].find(&closing) {
                    Some(offset) => {
                        content = Span::new(cursor, cursor + offset);
                        close_paren = cursor + offset;
                        state = State::Emit;
                    }
                    None => return None,
                }
            }
            State::Emit => {
                let delim_len = delimiter.len();
                let close_delimiter = Span::new(close_paren + 1, close_paren + 1 + delim_len);
                let close_quote =
                    Span::new(close_delimiter.end, close_delimiter.end + 1);
                return Some(RawStringPieces {
                    delimiter,
                    open_paren: Span::new(delimiter.end, delimiter.end + 1),
                    content,
                    close_paren: Span::new(close_paren, close_paren + 1),
                    close_delimiter,
                    close_quote,
                    end: close_quote.end,
                });
            }
        }
    }
}

/// Any character except parentheses, backslash, and whitespace may appear in
/// a delimiter.
fn is_delimiter_byte(byte: u8) -> bool {
    !byte.is_ascii_whitespace() && !matches!(byte, b'(' | b')' | b'\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_delimiter_and_content() {
        // Input as the parser sees it after consuming `R"`.
        let src = r#"R"delim(a)not-end(b)delim""#;
        let pieces = scan(src, 2).unwrap();
        assert_eq!(&src[pieces.delimiter.start..pieces.delimiter.end], "delim");
        assert_eq!(
            &src[pieces.content.start..pieces.content.end],
            "a)not-end(b"
        );
        assert_eq!(pieces.end, src.len());
    }

    #[test]
    fn empty_delimiter_is_valid() {
        let src = r#"R"(hello "world")""#;
        let pieces = scan(src, 2).unwrap();
        assert_eq!(pieces.delimiter.len(), 0);
        assert_eq!(
            &src[pieces.content.start..pieces.content.end],
            r#"hello "world""#
        );
    }

    #[test]
    fn content_may_span_lines() {
        let src = "R\"x(line one\nline two)x\"";
        let pieces = scan(src, 2).unwrap();
        assert_eq!(
            &src[pieces.content.start..pieces.content.end],
            "line one\nline two"
        );
    }

    #[test]
    fn missing_close_falls_through() {
        assert_eq!(scan(r#"R"delim(never closed"#, 2), None);
    }

    #[test]
    fn mismatched_delimiter_falls_through() {
        assert_eq!(scan(r#"R"aa(content)bb""#, 2), None);
    }

    #[test]
    fn malformed_delimiter_falls_through() {
        // A backslash can never appear in a delimiter.
        assert_eq!(scan(r#"R"a\b(x)a\b""#, 2), None);
        // Overlong delimiter.
        assert_eq!(scan(r#"R"abcdefghijklmnopq(x)abcdefghijklmnopq""#, 2), None);
    }
}
