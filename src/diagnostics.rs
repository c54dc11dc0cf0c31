//! Carbide diagnostics.
//!
//! Two separate failure surfaces live here, and they never mix:
//!
//! - [`ParseDiagnostic`]: recorded on a [`crate::tree::Tree`] wherever the
//!   parser emitted an error node. Parsing itself is total, so these are data,
//!   not `Err` values. Wrap one in a [`RenderedDiagnostic`] to print it with
//!   full miette formatting.
//! - [`GrammarError`]: a defect in the authored rule tables, raised at grammar
//!   construction time and caught by grammar tests. End users of the parser
//!   never see one.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource};
use serde::Serialize;
use thiserror::Error;

use crate::tree::Span;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Names a piece of source text for error reporting.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// PARSE DIAGNOSTICS
// ============================================================================

/// What went wrong at one error node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosticKind {
    /// No terminal matched at this position.
    LexicalError,
    /// A required construct was absent; the error node is zero-width.
    MissingNode { expected: String },
    /// Tokens were skipped to resynchronize inside the named construct.
    SkippedTokens { context: String },
    /// A raw string literal reached end of input before its closing sequence.
    UnterminatedRawString,
    /// The deadline or node budget expired; the rest of the input is wrapped
    /// in a single error node.
    Cancelled,
}

impl DiagnosticKind {
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::LexicalError => "lexical_error",
            Self::MissingNode { .. } => "missing_node",
            Self::SkippedTokens { .. } => "skipped_tokens",
            Self::UnterminatedRawString => "unterminated_raw_string",
            Self::Cancelled => "cancelled",
        }
    }
}

/// One recorded parse error, tied to a byte span of the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseDiagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl ParseDiagnostic {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self { kind, span }
    }

    fn primary_label(&self) -> String {
        match &self.kind {
            DiagnosticKind::LexicalError => "unrecognized input".into(),
            DiagnosticKind::MissingNode { expected } => format!("expected {expected} here"),
            DiagnosticKind::SkippedTokens { .. } => "skipped while recovering".into(),
            DiagnosticKind::UnterminatedRawString => "raw string is never closed".into(),
            DiagnosticKind::Cancelled => "parse stopped here".into(),
        }
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::LexicalError => write!(f, "Lexical error: no token matches"),
            DiagnosticKind::MissingNode { expected } => {
                write!(f, "Syntax error: missing {expected}")
            }
            DiagnosticKind::SkippedTokens { context } => {
                write!(f, "Syntax error: unexpected tokens in {context}")
            }
            DiagnosticKind::UnterminatedRawString => {
                write!(f, "Lexical error: unterminated raw string literal")
            }
            DiagnosticKind::Cancelled => write!(f, "Parse cancelled before end of input"),
        }
    }
}

/// A [`ParseDiagnostic`] joined with its source for miette rendering.
#[derive(Debug)]
pub struct RenderedDiagnostic {
    diagnostic: ParseDiagnostic,
    source: Arc<NamedSource<String>>,
    code: String,
}

impl RenderedDiagnostic {
    pub fn new(diagnostic: ParseDiagnostic, context: &SourceContext) -> Self {
        let code = format!("carbide::parse::{}", diagnostic.kind.code_suffix());
        Self {
            diagnostic,
            source: context.to_named_source(),
            code,
        }
    }
}

impl fmt::Display for RenderedDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diagnostic)
    }
}

impl std::error::Error for RenderedDiagnostic {}

impl Diagnostic for RenderedDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.code))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = miette::SourceSpan::from(self.diagnostic.span.start..self.diagnostic.span.end);
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.diagnostic.primary_label()),
            span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source)
    }
}

/// Prints a diagnostic with full miette formatting to stderr.
pub fn print_diagnostic(diagnostic: ParseDiagnostic, context: &SourceContext) {
    let report = miette::Report::new(RenderedDiagnostic::new(diagnostic, context));
    eprintln!("{report:?}");
}

// ============================================================================
// GRAMMAR DEFECTS
// ============================================================================

/// A defect in the authored grammar tables, detected at construction time.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("rule `{rule}` references undefined symbol `{symbol}`")]
    UndefinedSymbol { rule: String, symbol: String },

    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),

    #[error("rule `{rule}` repeats content that can match empty input")]
    NullableRepeat { rule: String },

    #[error("conflict set [{0}] matches no choice point in the grammar")]
    UnmatchedConflict(String),

    #[error("conflict set [{0}] names fewer than two rules")]
    DegenerateConflict(String),

    #[error("pattern terminal `{name}` failed to compile")]
    BadPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("grammar has no `{0}` start rule")]
    MissingStartRule(String),
}
