// tests/properties_tests.rs
//
// The cross-cutting guarantees: losslessness, determinism, cancellation
// safety, and incremental subtree reuse.

use std::sync::Arc;
use std::time::Duration;

use carbide::diagnostics::DiagnosticKind;
use carbide::{Child, InputEdit, Node, ParseOptions, Parser};

fn find<'t>(node: &'t Node, kind: &str) -> Option<&'t Node> {
    if node.kind() == kind {
        return Some(node);
    }
    for child in node.children() {
        if let Child::Node(n) = child {
            if let Some(found) = find(n, kind) {
                return Some(found);
            }
        }
    }
    None
}

const CORPUS: &[&str] = &[
    "",
    "   \n\t  ",
    "// only a comment\n",
    "int x = 1;",
    "#include <vector>\n#define WIDTH 640\n",
    "namespace a { namespace b { int c; } }",
    "template <typename T> T max(T a, T b) { return a < b ? b : a; }",
    "class A : public B, private C { public: virtual ~A(); };",
    "enum class E : int { X = 1, Y };",
    "void f() { for (int i = 0; i < 10; i++) { g(i); } }",
    "auto s = R\"(raw \"content\")\";",
    "auto t = R\"delim(a)not-end(b)delim\";",
    "int x = a<b>c;",
    "UCLASS(Blueprintable) class FOO : public Base { GENERATED_BODY() };",
    "UCLASS() class A { GENERATED_BODY() UPROPERTY(EditAnywhere) int H; };",
    // Malformed inputs must round-trip too.
    "int x = ; int y = 2;",
    "$$$ ???",
    "class A { int a;",
    "R\"x(never closed",
];

#[test]
fn test_losslessness_over_corpus() {
    let parser = Parser::new();
    for source in CORPUS {
        let tree = parser.parse(source);
        assert_eq!(
            tree.reconstruct(),
            *source,
            "leaf concatenation must reproduce the input"
        );
    }
}

#[test]
fn test_every_byte_is_covered_exactly_once() {
    let parser = Parser::new();
    for source in CORPUS {
        let tree = parser.parse(source);
        let mut pos = 0;
        for token in tree.tokens() {
            for trivia in &token.leading {
                assert_eq!(trivia.span.start, pos, "gap before trivia in {source:?}");
                pos = trivia.span.end;
            }
            assert_eq!(token.span.start, pos, "gap before token in {source:?}");
            pos = token.span.end;
        }
        for trivia in tree.trailing_trivia() {
            assert_eq!(trivia.span.start, pos);
            pos = trivia.span.end;
        }
        assert_eq!(pos, source.len(), "uncovered tail in {source:?}");
    }
}

#[test]
fn test_parsing_is_deterministic() {
    let parser = Parser::new();
    for source in CORPUS {
        let first = parser.parse(source);
        let second = parser.parse(source);
        assert_eq!(first.root(), second.root(), "for {source:?}");
        assert_eq!(first.diagnostics(), second.diagnostics());
    }
}

#[test]
fn test_raw_string_round_trip() {
    let source = "auto t = R\"delim(a)not-end(b)delim\";";
    let tree = Parser::new().parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    let literal = find(tree.root(), "raw_string_literal").unwrap();
    let content = literal
        .children()
        .iter()
        .filter_map(Child::as_token)
        .find(|t| t.kind == "raw_string_content")
        .unwrap();
    assert_eq!(content.text(source), "a)not-end(b");
    // One literal node, one content token.
    let delimiters = literal
        .children()
        .iter()
        .filter_map(Child::as_token)
        .filter(|t| t.kind == "raw_string_delimiter")
        .count();
    assert_eq!(delimiters, 2);
}

#[test]
fn test_node_budget_returns_partial_tree() {
    let source = "int a = 1; int b = 2; int c = 3; int d = 4;";
    let options = ParseOptions {
        node_budget: Some(40),
        ..Default::default()
    };
    let tree = Parser::new().parse_with_options(source, &options);
    assert!(tree.has_errors());
    assert!(tree
        .diagnostics()
        .iter()
        .any(|d| matches!(d.kind, DiagnosticKind::Cancelled)));
    // Partial, but still lossless and well formed.
    assert_eq!(tree.reconstruct(), source);
    let last = tree.root().children().last().unwrap();
    assert!(last.is_error());
}

#[test]
fn test_zero_deadline_still_returns_a_tree() {
    let source = "int a = 1; int b = 2;";
    let options = ParseOptions {
        deadline: Some(Duration::ZERO),
        ..Default::default()
    };
    let tree = Parser::new().parse_with_options(source, &options);
    assert_eq!(tree.reconstruct(), source);
}

#[test]
fn test_incremental_reuses_untouched_prefix_by_reference() {
    let parser = Parser::new();
    let old_source = "int a = 1;\nint b = 2;\n";
    let old_tree = parser.parse(old_source);
    assert!(!old_tree.has_errors());

    let new_source = "int a = 1;\nint b = 2;\nint c = 3;\n";
    let edit = InputEdit::insert(old_source.len(), "int c = 3;\n".len());
    let new_tree = parser.reparse(new_source, &old_tree, &edit);

    assert!(!new_tree.has_errors(), "{}", new_tree.root().sexp());
    assert_eq!(new_tree.root().children().len(), 3);
    assert_eq!(new_tree.reconstruct(), new_source);

    // The untouched declarations are shared, not re-derived.
    for i in 0..2 {
        let old_child = old_tree.root().child(i).unwrap().as_node().unwrap();
        let new_child = new_tree.root().child(i).unwrap().as_node().unwrap();
        assert!(
            Arc::ptr_eq(old_child, new_child),
            "prefix subtree {i} must be reused by reference"
        );
    }
}

#[test]
fn test_incremental_edit_in_the_middle_reparses_suffix() {
    let parser = Parser::new();
    let old_source = "int a = 1; int b = 2; int c = 3;";
    let old_tree = parser.parse(old_source);

    // Change `b` to `bb`.
    let at = old_source.find('b').unwrap();
    let new_source = old_source.replacen('b', "bb", 1);
    let edit = InputEdit::replace(at, at + 1, 2);
    let new_tree = parser.reparse(&new_source, &old_tree, &edit);

    assert!(!new_tree.has_errors());
    assert_eq!(new_tree.root().children().len(), 3);
    assert_eq!(new_tree.reconstruct(), new_source);
    // Only the first declaration precedes the edit.
    let old_first = old_tree.root().child(0).unwrap().as_node().unwrap();
    let new_first = new_tree.root().child(0).unwrap().as_node().unwrap();
    assert!(Arc::ptr_eq(old_first, new_first));
}

#[test]
fn test_edit_at_origin_reuses_nothing_and_still_parses() {
    let parser = Parser::new();
    let old_tree = parser.parse("int a = 1;");
    let new_source = "long a = 1;";
    let edit = InputEdit::replace(0, 3, 4);
    let new_tree = parser.reparse(new_source, &old_tree, &edit);
    assert!(!new_tree.has_errors());
    assert_eq!(new_tree.reconstruct(), new_source);
}
