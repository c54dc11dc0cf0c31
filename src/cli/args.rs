//! Defines the command-line arguments and subcommands for the Carbide CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "carbide",
    version,
    about = "A lossless CST parser for C++ with the Unreal Engine macro dialect."
)]
pub struct CarbideArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a file and print its concrete syntax tree as an outline.
    Parse {
        /// The path to the translation unit to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Parse a file and dump its concrete syntax tree as JSON.
    Json {
        /// The path to the translation unit to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Parse a file and report syntax errors with source context.
    Check {
        /// The path to the translation unit to check.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Rebuild the grammar tables and report authoring defects.
    ValidateGrammar,
}
