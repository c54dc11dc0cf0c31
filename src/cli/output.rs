//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for pretty-printing and colorizing trees.
//! Centralizing output logic here keeps the experience consistent across
//! commands.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::tree::{Child, Node, Tree, ERROR};

/// Prints the tree as an indented outline: one named node or leaf per line,
/// error nodes highlighted.
pub fn print_outline(tree: &Tree) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    print_node(&mut stdout, tree.root(), tree.source(), 0);
}

fn print_node(out: &mut StandardStream, node: &Node, source: &str, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.kind() == ERROR {
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    }
    println!(
        "{indent}{} [{}..{}]",
        node.kind(),
        node.span().start,
        node.span().end
    );
    let _ = out.reset();
    for (index, child) in node.children().iter().enumerate() {
        let label = node
            .fields
            .iter()
            .find(|(_, i)| *i == index)
            .map(|(name, _)| *name);
        match child {
            Child::Node(n) => {
                if let Some(label) = label {
                    let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
                    println!("{indent}  {label}:");
                    let _ = out.reset();
                }
                print_node(out, n, source, depth + 1);
            }
            Child::Token(t) if t.named => {
                let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                println!("{indent}  {} {:?}", t.kind, t.text(source));
                let _ = out.reset();
            }
            Child::Token(_) => {}
        }
    }
}

/// Success line for `check`.
pub fn print_ok(items: usize) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    println!("ok: {items} top-level items, no syntax errors");
    let _ = stdout.reset();
}
