// tests/parser_tests.rs

use carbide::{Child, Node, Parser, Tree};

fn parse(source: &str) -> Tree {
    Parser::new().parse(source)
}

/// First descendant node with the given kind, depth first.
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

fn count(node: &Node, kind: &str) -> usize {
    let mut n = usize::from(node.kind() == kind);
    for child in node.children() {
        if let Child::Node(c) = child {
            n += count(c, kind);
        }
    }
    n
}

fn assert_clean(tree: &Tree, source: &str) {
    assert!(
        !tree.has_errors(),
        "unexpected error nodes for {source:?}:\n{}",
        tree.root().sexp()
    );
}

// ---
// Declarations
// ---

#[test]
fn test_parse_simple_declaration() {
    let source = "int x = 1;";
    let tree = parse(source);
    assert_clean(&tree, source);

    let decl = find(tree.root(), "declaration").expect("declaration");
    assert_eq!(decl.field("type").unwrap().kind(), "primitive_type");
    let init = find(decl, "init_declarator").unwrap();
    assert_eq!(init.field("declarator").unwrap().kind(), "identifier");
    assert_eq!(init.field("value").unwrap().kind(), "number_literal");
}

#[test]
fn test_declaration_list_with_multiple_declarators() {
    let tree = parse("int a = 1, b, *c;");
    assert_clean(&tree, "int a = 1, b, *c;");
    let decl = find(tree.root(), "declaration").unwrap();
    assert_eq!(decl.fields("declarator").count(), 3);
    assert!(find(decl, "pointer_declarator").is_some());
}

#[test]
fn test_pointer_to_function_declarator_nesting() {
    // `*f()` is a function returning a pointer: the pointer declarator
    // wraps the function declarator.
    let tree = parse("int *f();");
    assert_clean(&tree, "int *f();");
    let pointer = find(tree.root(), "pointer_declarator").unwrap();
    assert!(find(pointer, "function_declarator").is_some());
}

#[test]
fn test_function_definition_vs_declaration() {
    let tree = parse("int f() { return 0; }");
    assert_clean(&tree, "fn def");
    assert_eq!(count(tree.root(), "function_definition"), 1);
    assert_eq!(count(tree.root(), "declaration"), 0);

    let tree = parse("int f();");
    assert_clean(&tree, "fn decl");
    assert_eq!(count(tree.root(), "function_definition"), 0);
    assert_eq!(count(tree.root(), "declaration"), 1);
}

#[test]
fn test_constructor_definition_aliases_to_function_definition() {
    let source = "Foo::Foo(int x) : x_(x) {}";
    let tree = parse(source);
    assert_clean(&tree, source);
    // The constructor shape surfaces under the canonical kind.
    assert_eq!(count(tree.root(), "function_definition"), 1);
    assert!(find(tree.root(), "field_initializer_list").is_some());
}

#[test]
fn test_class_with_members_and_access_specifiers() {
    let source = r#"
class Widget : public Base {
public:
    Widget();
    int size() const;
private:
    int size_;
};
"#;
    let tree = parse(source);
    assert_clean(&tree, source);
    let class = find(tree.root(), "class_specifier").unwrap();
    assert_eq!(class.field("name").unwrap().kind(), "type_identifier");
    assert_eq!(count(class, "access_specifier"), 2);
    assert!(find(class, "base_class_clause").is_some());
    assert_eq!(count(class, "field_declaration"), 2);
}

#[test]
fn test_namespace_using_alias_static_assert() {
    let source = r#"
namespace game {
using core::Thing;
using Alias = core::Other;
static_assert(1, "always");
}
"#;
    let tree = parse(source);
    assert_clean(&tree, source);
    let ns = find(tree.root(), "namespace_definition").unwrap();
    assert!(find(ns, "using_declaration").is_some());
    assert!(find(ns, "alias_declaration").is_some());
    assert!(find(ns, "static_assert_declaration").is_some());
}

#[test]
fn test_enum_with_base_and_values() {
    let source = "enum class Color : int { Red, Green = 2, Blue };";
    let tree = parse(source);
    assert_clean(&tree, source);
    let spec = find(tree.root(), "enum_specifier").unwrap();
    assert_eq!(count(spec, "enumerator"), 3);
}

#[test]
fn test_preproc_directives() {
    let source = "#include <vector>\n#include \"local.h\"\n#define MAX 64\n#pragma once\n";
    let tree = parse(source);
    assert_clean(&tree, source);
    assert_eq!(count(tree.root(), "preproc_include"), 2);
    assert_eq!(count(tree.root(), "preproc_def"), 1);
    assert_eq!(count(tree.root(), "preproc_call"), 1);
    assert_eq!(tree.reconstruct(), source);
}

// ---
// Statements
// ---

#[test]
fn test_statement_kinds() {
    let source = r#"
void f(int n) {
    if (n) { g(); } else { h(); }
    while (n) n--;
    do { n++; } while (n);
    for (int i = 0; i < n; i++) g();
    for (int x : xs) g();
    switch (n) { case 1: break; default: break; }
    return;
}
"#;
    let tree = parse(source);
    assert_clean(&tree, source);
    for kind in [
        "if_statement",
        "while_statement",
        "do_statement",
        "for_statement",
        "for_range_loop",
        "switch_statement",
        "case_statement",
        "return_statement",
    ] {
        assert!(find(tree.root(), kind).is_some(), "missing {kind}");
    }
}

#[test]
fn test_dangling_else_attaches_to_nearest_if() {
    let tree = parse("void f() { if (a) if (b) g(); else h(); }");
    assert_clean(&tree, "dangling else");
    let outer = find(tree.root(), "if_statement").unwrap();
    assert!(outer.field("alternative").is_none());
    let inner = find(outer.field("consequence").unwrap().as_node().unwrap(), "if_statement").unwrap();
    assert!(inner.field("alternative").is_some());
}

// ---
// Expressions and precedence
// ---

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let tree = parse("int x = 1 + 2 * 3;");
    assert_clean(&tree, "precedence");
    let outer = find(tree.root(), "binary_expression").unwrap();
    assert_eq!(outer.field("left").unwrap().kind(), "number_literal");
    let right = outer.field("right").unwrap().as_node().unwrap();
    assert_eq!(right.kind(), "binary_expression");
}

#[test]
fn test_subtraction_groups_left() {
    let tree = parse("int x = a - b - c;");
    assert_clean(&tree, "left assoc");
    let outer = find(tree.root(), "binary_expression").unwrap();
    assert_eq!(outer.field("left").unwrap().kind(), "binary_expression");
    assert_eq!(outer.field("right").unwrap().kind(), "identifier");
}

#[test]
fn test_assignment_groups_right() {
    let tree = parse("void f() { a = b = c; }");
    assert_clean(&tree, "right assoc");
    let outer = find(tree.root(), "assignment_expression").unwrap();
    assert_eq!(outer.field("left").unwrap().kind(), "identifier");
    assert_eq!(outer.field("right").unwrap().kind(), "assignment_expression");
}

#[test]
fn test_postfix_chains() {
    let tree = parse("void f() { obj.items[0]->next(1, 2); }");
    assert_clean(&tree, "postfix chain");
    let call = find(tree.root(), "call_expression").unwrap();
    let callee = call.field("function").unwrap().as_node().unwrap();
    assert_eq!(callee.kind(), "field_expression");
    assert!(find(tree.root(), "subscript_expression").is_some());
}

#[test]
fn test_conditional_and_comma_expressions() {
    let tree = parse("void f() { x = a ? b : c; g(), h(); }");
    assert_clean(&tree, "ternary/comma");
    let cond = find(tree.root(), "conditional_expression").unwrap();
    assert!(cond.field("condition").is_some());
    assert!(cond.field("consequence").is_some());
    assert!(cond.field("alternative").is_some());
    assert!(find(tree.root(), "comma_expression").is_some());
}

#[test]
fn test_casts_new_delete_sizeof() {
    let source = r#"
void f() {
    int a = (int)x;
    int b = static_cast<int>(y);
    Foo* p = new Foo(1);
    int* q = new int[8];
    delete p;
    delete[] q;
    int n = sizeof(int);
}
"#;
    let tree = parse(source);
    assert_clean(&tree, source);
    assert!(find(tree.root(), "cast_expression").is_some());
    assert!(find(tree.root(), "named_cast_expression").is_some());
    assert_eq!(count(tree.root(), "new_expression"), 2);
    assert_eq!(count(tree.root(), "delete_expression"), 2);
    assert!(find(tree.root(), "sizeof_expression").is_some());
}

#[test]
fn test_parenthesized_wins_over_cast_until_it_cannot() {
    // `(a)` is an expression, so the subtraction reading wins.
    let tree = parse("int x = (a) - b;");
    assert_clean(&tree, "paren minus");
    assert!(find(tree.root(), "cast_expression").is_none());
    assert!(find(tree.root(), "binary_expression").is_some());
}

// ---
// Templates
// ---

#[test]
fn test_template_declaration_and_nested_arguments() {
    let source = "template <typename T, int N> map<string, vector<T>> make();";
    let tree = parse(source);
    assert_clean(&tree, source);
    assert!(find(tree.root(), "template_declaration").is_some());
    assert!(find(tree.root(), "type_parameter_declaration").is_some());
    // `vector<T>>` closes both lists; `>` splits off `>>`.
    assert_eq!(count(tree.root(), "template_type"), 2);
}

#[test]
fn test_template_call_in_value_context() {
    // With a value expected, `a<b>(c)` is a call of the template function.
    let tree = parse("auto y = a<b>(c);");
    assert_clean(&tree, "template call");
    let call = find(tree.root(), "call_expression").unwrap();
    assert_eq!(call.field("function").unwrap().kind(), "template_function");
}

#[test]
fn test_comparison_chain_when_template_reading_dies() {
    // No call follows, so `a<b>c` can only be two comparisons.
    let tree = parse("int x = a<b>c;");
    assert_clean(&tree, "comparisons");
    assert_eq!(count(tree.root(), "template_function"), 0);
    assert_eq!(count(tree.root(), "binary_expression"), 2);
}

#[test]
fn test_declaration_with_initializer_list_is_not_a_statement() {
    // The classic `A b{};` ambiguity resolves to a declaration whose value
    // is an initializer list, never a compound statement.
    let tree = parse("void f() { A b{}; }");
    assert_clean(&tree, "A b{}");
    let body = find(tree.root(), "compound_statement").unwrap();
    let decl = find(body, "declaration").expect("declaration, not expression statement");
    let init = find(decl, "init_declarator").unwrap();
    assert_eq!(init.field("value").unwrap().kind(), "initializer_list");
    assert_eq!(count(body, "compound_statement"), 1);
}

#[test]
fn test_pointer_declaration_not_multiplication() {
    let tree = parse("void f() { a * b; }");
    assert_clean(&tree, "a * b");
    let body = find(tree.root(), "compound_statement").unwrap();
    assert!(find(body, "declaration").is_some());
    assert!(find(body, "binary_expression").is_none());
}

// ---
// Qualified names and operators
// ---

#[test]
fn test_qualified_identifiers_unify_across_contexts() {
    let source = "std::vector<int> v = std::make();";
    let tree = parse(source);
    assert_clean(&tree, source);
    // Both the type and the value spellings surface as qualified_identifier.
    assert_eq!(count(tree.root(), "qualified_identifier"), 2);
}

#[test]
fn test_operator_overload_definition() {
    let source = "bool operator==(const Foo& a, const Foo& b) { return true; }";
    let tree = parse(source);
    assert_clean(&tree, source);
    assert!(find(tree.root(), "operator_name").is_some());
    assert_eq!(count(tree.root(), "function_definition"), 1);
}

// ---
// Trivia and string literals
// ---

#[test]
fn test_comments_ride_as_trivia() {
    let source = "// header\nint x = 1; /* tail */ int y = 2;\n";
    let tree = parse(source);
    assert_clean(&tree, source);
    assert_eq!(count(tree.root(), "declaration"), 2);
    assert_eq!(tree.reconstruct(), source);
    // Comments are attached to tokens, never structural children.
    let tokens = tree.tokens();
    assert!(tokens.iter().all(|t| t.kind != "comment"));
}

#[test]
fn test_string_literal_prefixes() {
    let cases = vec![
        r#"const char* a = "plain";"#,
        r#"const char* b = u8"utf8";"#,
        r#"const wchar_t* c = L"wide";"#,
        r#"const char16_t* d = u"sixteen";"#,
    ];
    for source in cases {
        let tree = parse(source);
        assert_clean(&tree, source);
        assert!(find(tree.root(), "declaration").is_some(), "{source}");
    }
}

#[test]
fn test_empty_input_yields_empty_tree() {
    let tree = parse("");
    assert!(!tree.has_errors());
    assert_eq!(tree.root().children().len(), 0);
    assert_eq!(tree.reconstruct(), "");
}
