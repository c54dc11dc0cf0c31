//! Grammar-construction validation.
//!
//! Undeclared unresolvable ambiguity is a defect in the authored tables, not
//! a runtime condition; the checks here run once at compile time and turn
//! authoring mistakes into [`GrammarError`]s before any parse can happen.

use rustc_hash::FxHashMap;

use crate::diagnostics::GrammarError;
use crate::grammar::{CompiledRule, CRule, SymbolId};

pub fn check(
    rules: &[CompiledRule],
    index: &FxHashMap<&'static str, SymbolId>,
    conflicts: &[&'static [&'static str]],
    attached: &[usize],
) -> Result<(), GrammarError> {
    for (i, set) in conflicts.iter().enumerate() {
        if set.len() < 2 {
            return Err(GrammarError::DegenerateConflict(set.join(", ")));
        }
        for member in set.iter() {
            if !index.contains_key(member) {
                return Err(GrammarError::UndefinedSymbol {
                    rule: "conflicts".into(),
                    symbol: (*member).to_string(),
                });
            }
        }
        if attached[i] == 0 {
            return Err(GrammarError::UnmatchedConflict(set.join(", ")));
        }
    }

    let nullable = nullability(rules);
    for rule in rules {
        check_repeats(rule.name, &rule.body, &nullable)?;
    }
    Ok(())
}

/// Fixpoint nullability per symbol: can the rule match without consuming
/// input? A repeat over nullable content would loop forever in the engine.
fn nullability(rules: &[CompiledRule]) -> Vec<bool> {
    let mut nullable = vec![false; rules.len()];
    loop {
        let mut changed = false;
        for (id, rule) in rules.iter().enumerate() {
            if !nullable[id] && rule_nullable(&rule.body, &nullable) {
                nullable[id] = true;
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn rule_nullable(rule: &CRule, nullable: &[bool]) -> bool {
    match rule {
        CRule::Blank | CRule::Recover { .. } => true,
        CRule::Repeat(_) => true,
        CRule::Terminal { .. } | CRule::External(_) => false,
        CRule::Symbol(id) | CRule::Subexpr { symbol: id, .. } => nullable[*id],
        CRule::Seq(items) => items.iter().all(|r| rule_nullable(r, nullable)),
        CRule::Choice(choice) => choice
            .alts
            .iter()
            .any(|alt| rule_nullable(&alt.rule, nullable)),
        CRule::Repeat1(inner) => rule_nullable(inner, nullable),
        CRule::Field(_, inner) | CRule::Alias(_, inner) => rule_nullable(inner, nullable),
    }
}

fn check_repeats(
    rule_name: &str,
    rule: &CRule,
    nullable: &[bool],
) -> Result<(), GrammarError> {
    match rule {
        CRule::Repeat(inner) | CRule::Repeat1(inner) => {
            if rule_nullable(inner, nullable) {
                return Err(GrammarError::NullableRepeat {
                    rule: rule_name.to_string(),
                });
            }
            check_repeats(rule_name, inner, nullable)
        }
        CRule::Seq(items) => {
            for item in items {
                check_repeats(rule_name, item, nullable)?;
            }
            Ok(())
        }
        CRule::Choice(choice) => {
            for alt in &choice.alts {
                check_repeats(rule_name, &alt.rule, nullable)?;
            }
            Ok(())
        }
        CRule::Field(_, inner) | CRule::Alias(_, inner) => {
            check_repeats(rule_name, inner, nullable)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::GrammarError;
    use crate::grammar::{lit, optional, repeat, seq, sym, GrammarBuilder};

    fn minimal(g: &mut GrammarBuilder) {
        // The well-known symbols every grammar must define.
        g.rule("_expression", lit("x"));
        g.rule("argument_list", seq(vec![lit("("), lit(")")]));
        g.rule("initializer_list", seq(vec![lit("{"), lit("}")]));
        g.rule("_field_name", lit("f"));
        g.rule("parameter_list", seq(vec![lit("("), lit(")")]));
        g.rule("_method_qualifier", lit("const"));
    }

    #[test]
    fn nullable_repeat_is_a_defect() {
        let mut g = GrammarBuilder::new("test", "start");
        g.rule("start", repeat(optional(lit("a"))));
        minimal(&mut g);
        assert!(matches!(
            g.compile(),
            Err(GrammarError::NullableRepeat { .. })
        ));
    }

    #[test]
    fn unmatched_conflict_is_a_defect() {
        let mut g = GrammarBuilder::new("test", "start");
        g.rule("start", repeat(sym("item")));
        g.rule("item", lit("a"));
        minimal(&mut g);
        let set: &'static [&'static str] = &["item", "_expression"];
        g.conflicts(vec![set]);
        assert!(matches!(
            g.compile(),
            Err(GrammarError::UnmatchedConflict(_))
        ));
    }

    #[test]
    fn undefined_symbol_is_a_defect() {
        let mut g = GrammarBuilder::new("test", "start");
        g.rule("start", sym("ghost"));
        minimal(&mut g);
        assert!(matches!(
            g.compile(),
            Err(GrammarError::UndefinedSymbol { .. })
        ));
    }

    #[test]
    fn duplicate_rule_is_a_defect() {
        let mut g = GrammarBuilder::new("test", "start");
        g.rule("start", lit("a"));
        g.rule("start", lit("b"));
        minimal(&mut g);
        assert!(matches!(g.compile(), Err(GrammarError::DuplicateRule(_))));
    }
}
