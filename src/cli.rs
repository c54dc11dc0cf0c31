//! The Carbide command-line interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::{fs, path::Path, process};

use clap::Parser as ClapParser;

use crate::cli::args::{CarbideArgs, Command};
use crate::diagnostics::{print_diagnostic, SourceContext};
use crate::engine::Parser;
use crate::grammar;

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = CarbideArgs::parse();

    let result = match args.command {
        Command::Parse { file } => handle_parse(&file),
        Command::Json { file } => handle_json(&file),
        Command::Check { file } => handle_check(&file),
        Command::ValidateGrammar => handle_validate_grammar(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn read_source(path: &Path) -> Result<(String, String), Box<dyn std::error::Error>> {
    let name = path.to_string_lossy().into_owned();
    let source = fs::read_to_string(path)?;
    Ok((name, source))
}

/// Handles the `parse` subcommand: print the CST as an indented outline.
fn handle_parse(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (_, source) = read_source(path)?;
    let tree = Parser::new().parse(&source);
    output::print_outline(&tree);
    Ok(())
}

/// Handles the `json` subcommand: dump the CST as JSON.
fn handle_json(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (_, source) = read_source(path)?;
    let tree = Parser::new().parse(&source);
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

/// Handles the `check` subcommand: print diagnostics, exit nonzero when the
/// tree contains error nodes.
fn handle_check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (name, source) = read_source(path)?;
    let tree = Parser::new().parse(&source);
    let context = SourceContext::from_file(name, source);
    for diagnostic in tree.diagnostics() {
        print_diagnostic(diagnostic.clone(), &context);
    }
    if tree.has_errors() {
        process::exit(1);
    }
    output::print_ok(tree.root().children().len());
    Ok(())
}

/// Handles the `validate-grammar` subcommand: rebuild the grammar tables and
/// report authoring defects.
fn handle_validate_grammar() -> Result<(), Box<dyn std::error::Error>> {
    match grammar::try_grammar() {
        Ok(g) => {
            println!(
                "grammar `{}` ok: {} rules, {} terminals, {} conflict sets",
                g.name,
                g.rules.len(),
                g.terminals.len(),
                g.conflicts.len()
            );
            Ok(())
        }
        Err(defect) => Err(Box::new(defect)),
    }
}
