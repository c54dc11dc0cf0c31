//! On-demand tokenizer.
//!
//! There is no token stream: the engine asks for a specific terminal at a
//! byte position and the lexer answers, which is what makes the grammar's
//! context-sensitive spots (the `>` that closes a nested template, keywords
//! that are only reserved in some positions) fall out for free. Trivia
//! (whitespace and comments) is skipped before a match unless the terminal
//! is `immediate`, and travels on the returned token so the tree stays
//! lossless. Raw strings are not handled here at all; see [`scanner`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::grammar::{Grammar, Terminal, TerminalId};
use crate::tree::{Span, Token, Trivia, TriviaKind, ERROR};

pub mod scanner;

/// Reserved words of the base language. The `identifier` terminal never
/// matches one of these; the annotation dialect's keywords (`Blueprintable`,
/// `UCLASS`, ...) are deliberately absent so they stay usable as ordinary
/// identifiers outside macro positions.
pub const KEYWORDS: &[&str] = &[
    "alignas",
    "alignof",
    "auto",
    "bool",
    "break",
    "case",
    "catch",
    "char",
    "char16_t",
    "char32_t",
    "char8_t",
    "class",
    "concept",
    "const",
    "const_cast",
    "consteval",
    "constexpr",
    "constinit",
    "continue",
    "decltype",
    "default",
    "delete",
    "do",
    "double",
    "dynamic_cast",
    "else",
    "enum",
    "explicit",
    "export",
    "extern",
    "false",
    "float",
    "for",
    "friend",
    "goto",
    "if",
    "inline",
    "int",
    "long",
    "mutable",
    "namespace",
    "new",
    "noexcept",
    "nullptr",
    "operator",
    "private",
    "protected",
    "public",
    "register",
    "reinterpret_cast",
    "requires",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "static_assert",
    "static_cast",
    "struct",
    "switch",
    "template",
    "this",
    "thread_local",
    "throw",
    "true",
    "try",
    "typedef",
    "typeid",
    "typename",
    "union",
    "unsigned",
    "using",
    "virtual",
    "void",
    "volatile",
    "wchar_t",
    "while",
];

/// Multi-character punctuation for the recovery scanner, longest first.
const PUNCTUATION: &[&str] = &[
    "<<=", ">>=", "<=>", "...", "->*", "::", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=",
    "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "[[", "]]", "(", ")", "[", "]",
    "{", "}", ";", ",", ":", "=", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?",
    ".", "#",
];

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap());
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:0[xX][0-9a-fA-F']+|[0-9][0-9'.]*(?:[eE][+-]?[0-9]+)?)[uUlLfF]*").unwrap());
static STRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(?:[^"\\\n]|\\(?:.|\r?\n))*(?:"|$)"#).unwrap());
static CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'(?:[^'\\\n]|\\.)*(?:'|$)").unwrap());

pub struct Lexer<'s> {
    src: &'s str,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src }
    }

    pub fn source(&self) -> &'s str {
        self.src
    }

    /// Collects whitespace and comments starting at `pos`. An unterminated
    /// block comment counts as trivia to end of input.
    pub fn skip_trivia(&self, mut pos: usize) -> (Vec<Trivia>, usize) {
        let bytes = self.src.as_bytes();
        let mut trivia = Vec::new();
        loop {
            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos > start {
                trivia.push(Trivia {
                    kind: TriviaKind::Whitespace,
                    span: Span::new(start, pos),
                });
                continue;
            }
            if self.src[pos..].starts_with("//") {
                let end = self.src[pos..]
                    .find('\n')
                    .map(|i| pos + i)
                    .unwrap_or(self.src.len());
                trivia.push(Trivia {
                    kind: TriviaKind::LineComment,
                    span: Span::new(pos, end),
                });
                pos = end;
                continue;
            }
            if self.src[pos..].starts_with("/*") {
                let end = self.src[pos + 2..]
                    .find("*/")
                    .map(|i| pos + 2 + i + 2)
                    .unwrap_or(self.src.len());
                trivia.push(Trivia {
                    kind: TriviaKind::BlockComment,
                    span: Span::new(pos, end),
                });
                pos = end;
                continue;
            }
            return (trivia, pos);
        }
    }

    /// Matches one specific terminal at `pos`, or reports no match. Trivia is
    /// consumed first unless the grammar marked the terminal immediate.
    pub fn match_terminal(
        &self,
        grammar: &Grammar,
        pos: usize,
        id: TerminalId,
        immediate: bool,
    ) -> Option<Token> {
        let (leading, start) = if immediate {
            (Vec::new(), pos)
        } else {
            self.skip_trivia(pos)
        };
        let rest = &self.src[start..];
        match &grammar.terminals[id] {
            Terminal::Literal { text, word } => {
                if !rest.starts_with(text) {
                    return None;
                }
                if *word && is_ident_char(rest.as_bytes().get(text.len()).copied()) {
                    return None;
                }
                Some(Token {
                    kind: *text,
                    span: Span::new(start, start + text.len()),
                    named: false,
                    leading,
                })
            }
            Terminal::Pattern { kind, regex_index } => {
                let matched = grammar.patterns[*regex_index].find(rest)?;
                let text = &rest[..matched.end()];
                if *kind == "identifier" && KEYWORDS.contains(&text) {
                    return None;
                }
                Some(Token {
                    kind: *kind,
                    span: Span::new(start, start + matched.end()),
                    named: true,
                    leading,
                })
            }
        }
    }

    /// Matches a literal spelling at `pos` without going through the
    /// grammar's terminal table. Used for climb-table triggers and the fixed
    /// punctuation inside tail shapes.
    pub fn match_text(&self, pos: usize, text: &'static str) -> Option<Token> {
        let (leading, start) = self.skip_trivia(pos);
        let rest = &self.src[start..];
        if !rest.starts_with(text) {
            return None;
        }
        let word = text
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        if word && is_ident_char(rest.as_bytes().get(text.len()).copied()) {
            return None;
        }
        Some(Token {
            kind: text,
            span: Span::new(start, start + text.len()),
            named: false,
            leading,
        })
    }

    /// Grammar-independent scan of whatever token starts at `pos`, for error
    /// recovery and sync-point search. Returns `None` only at end of input.
    pub fn next_any_token(&self, pos: usize) -> Option<Token> {
        let (leading, start) = self.skip_trivia(pos);
        if start >= self.src.len() {
            return None;
        }
        let rest = &self.src[start..];
        let token = |kind: &'static str, len: usize, named: bool| Token {
            kind,
            span: Span::new(start, start + len),
            named,
            leading: leading.clone(),
        };
        if let Some(m) = IDENT_RE.find(rest) {
            return Some(token("identifier", m.end(), true));
        }
        if let Some(m) = NUMBER_RE.find(rest) {
            return Some(token("number_literal", m.end(), true));
        }
        if let Some(m) = STRING_RE.find(rest) {
            return Some(token("string_literal", m.end(), true));
        }
        if let Some(m) = CHAR_RE.find(rest) {
            return Some(token("char_literal", m.end(), true));
        }
        for punct in PUNCTUATION {
            if rest.starts_with(punct) {
                return Some(token(punct, punct.len(), false));
            }
        }
        // Unrecognized byte: take one whole character so the error node
        // still covers every byte.
        let len = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        Some(token(ERROR, len, false))
    }
}

fn is_ident_char(byte: Option<u8>) -> bool {
    matches!(byte, Some(b) if b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::grammar;

    fn match_literal(src: &str, text: &str) -> Option<Token> {
        let g = grammar();
        let id = g
            .terminals
            .iter()
            .position(|t| matches!(t, Terminal::Literal { text: t2, .. } if *t2 == text))
            .unwrap();
        Lexer::new(src).match_terminal(g, 0, id, false)
    }

    #[test]
    fn keyword_literals_respect_word_boundaries() {
        assert!(match_literal("class X", "class").is_some());
        assert!(match_literal("classy X", "class").is_none());
    }

    #[test]
    fn identifier_rejects_reserved_words() {
        let g = grammar();
        let id = g
            .terminals
            .iter()
            .position(|t| matches!(t, Terminal::Pattern { kind, .. } if *kind == "identifier"))
            .unwrap();
        let lexer = Lexer::new("while");
        assert!(lexer.match_terminal(g, 0, id, false).is_none());
        let lexer = Lexer::new("whiled");
        let token = lexer.match_terminal(g, 0, id, false).unwrap();
        assert_eq!(token.span, Span::new(0, 6));
    }

    #[test]
    fn trivia_collects_comments_and_whitespace() {
        let lexer = Lexer::new("  // line\n/* block */ x");
        let (trivia, pos) = lexer.skip_trivia(0);
        assert_eq!(pos, 22);
        let kinds: Vec<_> = trivia.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TriviaKind::Whitespace,
                TriviaKind::LineComment,
                TriviaKind::Whitespace,
                TriviaKind::BlockComment,
                TriviaKind::Whitespace,
            ]
        );
    }

    #[test]
    fn recovery_scan_prefers_longest_punctuation() {
        let lexer = Lexer::new("<<= x");
        let token = lexer.next_any_token(0).unwrap();
        assert_eq!(token.kind, "<<=");
    }

    #[test]
    fn recovery_scan_covers_unknown_bytes() {
        let lexer = Lexer::new("@");
        let token = lexer.next_any_token(0).unwrap();
        assert_eq!(token.kind, ERROR);
        assert_eq!(token.span, Span::new(0, 1));
    }
}
