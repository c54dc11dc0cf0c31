pub use crate::diagnostics::{GrammarError, ParseDiagnostic, RenderedDiagnostic, SourceContext};
pub use crate::engine::{ParseOptions, Parser};
pub use crate::tree::edit::InputEdit;
pub use crate::tree::{Child, Node, Span, Token, Tree};

pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod grammar;
pub mod lexer;
pub mod tree;
