// tests/grammar_tests.rs
//
// Construction-time guarantees: the shipped tables compile cleanly, every
// declared conflict set governs a real choice point, and the precedence
// ladder stays consistent.

use carbide::grammar::precedence::prec;
use carbide::grammar::{self, Terminal};

#[test]
fn test_shipped_grammar_compiles_without_defects() {
    let grammar = grammar::try_grammar().expect("authored tables must be defect free");
    assert_eq!(grammar.name, "cpp_unreal");
    assert!(grammar.symbol("translation_unit").is_some());
    assert!(grammar.symbol("_expression").is_some());
    assert!(grammar.symbol("unreal_class_declaration").is_some());
}

#[test]
fn test_conflict_sets_are_all_declared_and_attached() {
    // try_grammar validates attachment; this pins the authored set so an
    // accidental deletion shows up as a test diff, not silent behavior drift.
    let grammar = grammar::try_grammar().unwrap();
    assert_eq!(grammar.conflicts.len(), 9);
    assert!(grammar
        .conflicts
        .iter()
        .any(|set| set.contains(&"template_function") && set.contains(&"identifier")));
    assert!(grammar
        .conflicts
        .iter()
        .any(|set| set.contains(&"unreal_class_declaration")));
}

#[test]
fn test_macro_declarations_outrank_plain_declarations() {
    let grammar = grammar::try_grammar().unwrap();
    for name in [
        "unreal_class_declaration",
        "unreal_struct_declaration",
        "unreal_enum_declaration",
        "unreal_function_declaration",
    ] {
        let id = grammar.symbol(name).unwrap();
        assert_eq!(
            grammar.rule(id).static_prec,
            prec::UNREAL_DECLARATION,
            "{name} must keep elevated precedence"
        );
    }
    let declaration = grammar.symbol("declaration").unwrap();
    assert_eq!(grammar.rule(declaration).static_prec, 0);
}

#[test]
fn test_precedence_ladder_orders_operators() {
    assert!(prec::MULTIPLY > prec::ADD);
    assert!(prec::ADD > prec::SHIFT);
    assert!(prec::SHIFT > prec::RELATIONAL);
    assert!(prec::RELATIONAL > prec::LOGICAL_AND);
    assert!(prec::LOGICAL_AND > prec::ASSIGN);
    assert!(prec::TEMPLATE_ARG_FLOOR > prec::SHIFT);
    assert!(prec::ARG_FLOOR > prec::COMMA);
}

#[test]
fn test_keyword_terminals_are_word_bounded() {
    let grammar = grammar::try_grammar().unwrap();
    let class_terminal = grammar
        .terminals
        .iter()
        .find(|t| matches!(t, Terminal::Literal { text, .. } if *text == "class"))
        .unwrap();
    assert!(matches!(class_terminal, Terminal::Literal { word: true, .. }));
    let brace = grammar
        .terminals
        .iter()
        .find(|t| matches!(t, Terminal::Literal { text, .. } if *text == "{"))
        .unwrap();
    assert!(matches!(brace, Terminal::Literal { word: false, .. }));
}

#[test]
fn test_hidden_rules_follow_naming_convention() {
    let grammar = grammar::try_grammar().unwrap();
    for rule in &grammar.rules {
        assert_eq!(
            rule.hidden,
            rule.name.starts_with('_'),
            "hidden flag out of sync for {}",
            rule.name
        );
    }
}
