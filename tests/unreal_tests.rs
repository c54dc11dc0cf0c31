// tests/unreal_tests.rs
//
// The annotation dialect: macro-annotated declarations must win over the
// plain readings whenever the macro keyword is present, and specifier lists
// must keep their key/value structure.

use carbide::{Child, Node, Parser, Tree};

fn parse(source: &str) -> Tree {
    Parser::new().parse(source)
}

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

#[test]
fn test_annotated_class_never_degrades_to_plain_class() {
    let source = "UCLASS(Blueprintable) class FOO : public Base { GENERATED_BODY() };";
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());

    // One annotated-class node, not an ordinary class plus stray tokens.
    assert_eq!(tree.root().children().len(), 1);
    let class = find(tree.root(), "unreal_class_declaration").expect("annotated class");
    assert_eq!(count(tree.root(), "class_specifier"), 0);

    // Exactly one key-only specifier in the macro.
    let macro_node = find(class, "uclass_macro").unwrap();
    let list = find(macro_node, "unreal_specifier_list").unwrap();
    assert_eq!(count(list, "unreal_specifier"), 1);
    let spec = find(list, "unreal_specifier").unwrap();
    assert!(find(spec, "unreal_specifier_keyword").is_some());
    assert!(spec.field("value").is_none(), "key-only specifier has no value");

    // Base clause lists Base; the body holds the marker node.
    let base = find(class, "base_class_clause").unwrap();
    assert_eq!(
        base.children()
            .iter()
            .filter(|c| c.kind() == "type_identifier")
            .count(),
        1
    );
    let body = class.field("body").unwrap().as_node().unwrap();
    assert!(find(body, "unreal_body_macro").is_some());

    assert_eq!(tree.reconstruct(), source);
}

#[test]
fn test_annotated_struct_and_enum() {
    let source = r#"
USTRUCT(BlueprintType) struct CORE_API FVec { GENERATED_BODY() int X; };
UENUM(BlueprintType) enum class EColor : uint8 { Red UMETA(DisplayName="R"), Green };
"#;
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    assert!(find(tree.root(), "unreal_struct_declaration").is_some());
    let enum_decl = find(tree.root(), "unreal_enum_declaration").unwrap();
    assert_eq!(count(enum_decl, "enumerator"), 2);
    assert_eq!(count(enum_decl, "umeta_macro"), 1);
}

#[test]
fn test_uproperty_field_with_key_value_specifiers() {
    let source = r#"
UCLASS() class AHero {
    GENERATED_BODY()
    UPROPERTY(EditAnywhere, Category="Stats") int Health;
};
"#;
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    let field = find(tree.root(), "field_declaration").unwrap();
    let prop = find(field, "uproperty_macro").expect("property macro rides the field");
    let specs = find(prop, "unreal_specifier_list").unwrap();
    assert_eq!(count(specs, "unreal_specifier"), 2);
    // Category="Stats" keeps its key and value.
    let with_value = specs
        .children()
        .iter()
        .filter_map(Child::as_node)
        .find(|n| n.field("value").is_some())
        .expect("key=value specifier");
    assert_eq!(with_value.field("value").unwrap().kind(), "string_literal");
}

#[test]
fn test_meta_group_aliases_to_expression_shapes() {
    let source = r#"UCLASS() class A { GENERATED_BODY() UPROPERTY(meta=(ClampMin="0", Bitflags)) int X; };"#;
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    // The meta group surfaces as a parenthesized expression of assignments.
    let group = find(tree.root(), "parenthesized_expression").expect("aliased meta group");
    assert_eq!(count(group, "assignment_expression"), 2);
    let assignment = find(group, "assignment_expression").unwrap();
    assert_eq!(assignment.field("left").unwrap().kind(), "unreal_meta_key");
}

#[test]
fn test_ufunction_prototype_inside_class() {
    let source = r#"
UCLASS() class AHero {
    GENERATED_BODY()
    UFUNCTION(BlueprintCallable, Category="Combat")
    void Attack(int Damage);
};
"#;
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    let decl = find(tree.root(), "unreal_function_declaration").unwrap();
    assert!(find(decl, "ufunction_macro").is_some());
    assert!(find(decl, "function_declarator").is_some());
}

#[test]
fn test_api_specifier_and_forceinline_as_storage_classes() {
    let source = "CORE_API void Startup();\nFORCEINLINE int Get() { return 1; }\n";
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    let classes: Vec<_> = (0..tree.root().children().len())
        .filter_map(|i| tree.root().child(i))
        .collect();
    assert_eq!(classes.len(), 2);
    assert!(find(tree.root(), "storage_class_specifier").is_some());
    let tokens = tree.tokens();
    assert!(tokens.iter().any(|t| t.kind == "unreal_api_specifier"));
    assert!(tokens.iter().any(|t| t.kind == "unreal_force_inline"));
}

#[test]
fn test_api_specifier_in_plain_class_head() {
    let source = "class ENGINE_API FThing { int a; };";
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    let class = find(tree.root(), "class_specifier").unwrap();
    assert_eq!(class.field("name").unwrap().kind(), "type_identifier");
}

#[test]
fn test_declaration_macros_and_deprecation() {
    let source = r#"
DECLARE_LOG_CATEGORY_EXTERN(LogCombat, Log, All);
UE_DEPRECATED(5.1, "Use Attack instead") void OldAttack();
"#;
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    let macro_decl = find(tree.root(), "unreal_declaration_macro").unwrap();
    // The macro name presents as an ordinary identifier.
    assert_eq!(macro_decl.field("name").unwrap().kind(), "identifier");
    assert!(find(tree.root(), "unreal_deprecated_macro").is_some());
}

#[test]
fn test_unreal_keywords_stay_ordinary_identifiers_elsewhere() {
    // Outside macro positions the specifier keywords are plain identifiers.
    let source = "int Blueprintable = 1; void f() { Category = 2; }";
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    assert_eq!(count(tree.root(), "unreal_specifier"), 0);
}

#[test]
fn test_generated_body_with_trailing_semicolon() {
    let source = "UCLASS() class A { GENERATED_BODY(); int x; };";
    let tree = parse(source);
    assert!(!tree.has_errors(), "{}", tree.root().sexp());
    assert_eq!(count(tree.root(), "unreal_body_macro"), 1);
    assert_eq!(tree.reconstruct(), source);
}
