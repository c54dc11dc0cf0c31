//! Resynchronization after lexical and syntactic errors.
//!
//! When an item inside a declaration/statement container cannot be parsed,
//! the engine skips forward to the next token that can legally start an item
//! at the current nesting depth, wraps the skipped tokens in an error node,
//! and resumes. Nested bracket runs are skipped as units so a `;` inside a
//! parenthesized mess never ends recovery early.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexer::{scanner, Lexer};
use crate::tree::Token;

/// Tokens that can begin a declaration or statement; recovery stops in front
/// of one once it has made progress.
const STARTERS: &[&str] = &[
    "if", "for", "while", "do", "switch", "return", "break", "continue", "case", "default",
    "class", "struct", "union", "enum", "namespace", "using", "template", "static_assert",
    "public", "private", "protected", "int", "bool", "char", "float", "double", "void", "long",
    "short", "signed", "unsigned", "auto", "const", "constexpr", "static", "extern", "inline",
    "typedef", "virtual", "explicit", "friend", "UCLASS", "USTRUCT", "UENUM", "UPROPERTY",
    "UFUNCTION", "GENERATED_BODY", "#",
];

static RAW_STRING_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:u8|[uUL])?R""#).unwrap());

/// How a scan decides it has reached a sync point.
pub enum SyncMode {
    /// Container recovery: consume at least one token, swallow a top-level
    /// `;`, stop in front of the container's closer or an item starter.
    Container { closer: Option<&'static str> },
    /// Targeted recovery for a missing construct: stop in front of any of
    /// the listed terminals, consuming nothing if one is already next.
    Until(&'static [&'static str]),
}

pub struct SyncResult {
    pub tokens: Vec<Token>,
    pub end: usize,
    /// The skipped region opened a raw string that never closes.
    pub unterminated_raw: bool,
}

pub fn scan(lexer: &Lexer<'_>, mode: SyncMode, start: usize) -> SyncResult {
    let src = lexer.source();

    // An unterminated raw string swallows the rest of the input: no sync
    // token can be trusted past its opener.
    let (_, lookahead) = lexer.skip_trivia(start);
    if let Some(m) = RAW_STRING_OPENER.find(&src[lookahead..]) {
        if scanner::scan(src, lookahead + m.end()).is_none() {
            let mut tokens = Vec::new();
            let mut pos = start;
            while let Some(token) = lexer.next_any_token(pos) {
                pos = token.span.end;
                tokens.push(token);
            }
            return SyncResult {
                tokens,
                end: pos,
                unterminated_raw: true,
            };
        }
    }

    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = start;
    let mut depth = 0usize;
    loop {
        let Some(token) = lexer.next_any_token(pos) else {
            break;
        };
        let text = token.text(src);
        if depth == 0 {
            match &mode {
                SyncMode::Container { closer } => {
                    if !tokens.is_empty()
                        && (matches!(closer, Some(c) if *c == text) || STARTERS.contains(&text))
                    {
                        break;
                    }
                }
                SyncMode::Until(sync) => {
                    if sync.contains(&text) || text == "}" {
                        break;
                    }
                    if !tokens.is_empty() && STARTERS.contains(&text) {
                        break;
                    }
                }
            }
        }
        match text {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => {
                if depth == 0 {
                    if let SyncMode::Container { closer: Some(c) } = &mode {
                        if *c == text && !tokens.is_empty() {
                            break;
                        }
                    }
                } else {
                    depth -= 1;
                }
            }
            _ => {}
        }
        pos = token.span.end;
        let done = depth == 0 && text == ";" && matches!(mode, SyncMode::Container { .. });
        tokens.push(token);
        if done {
            break;
        }
    }
    SyncResult {
        tokens,
        end: pos,
        unterminated_raw: false,
    }
}
