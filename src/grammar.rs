//! The grammar rule table, as data.
//!
//! Rules are authored with a small builder DSL (`seq`, `choice`, `field`,
//! `alias`, `prec`, ...) that mirrors the shape of the constructs it encodes,
//! then compiled once into an immutable [`Grammar`]: symbols interned,
//! terminals deduplicated, pattern regexes compiled, precedence metadata
//! extracted, and declared conflict sets attached to the choice points they
//! govern. Compilation validates the tables and reports defects as
//! [`GrammarError`]s; a compiled grammar is immutable and shared freely
//! across parses.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::diagnostics::GrammarError;

pub mod conflicts;
pub mod precedence;
pub mod rules;
pub mod unreal;
pub mod validate;

use precedence::TailEntry;

// ============================================================================
// AUTHORING MODEL
// ============================================================================

/// Operator associativity, used by the climb tables and `prec_left`/`prec_right`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    None,
}

/// Terminals produced by the external raw-string scanner rather than the
/// pattern/literal tokenizer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExternalKind {
    /// The full `delimiter ( content ) delimiter "` tail of a raw string
    /// literal, scanned with delimiter matching the tokenizer cannot express.
    RawStringTail,
}

/// A grammar rule expression in authoring form.
#[derive(Debug, Clone)]
pub enum Rule {
    Blank,
    Literal(&'static str),
    Pattern {
        kind: &'static str,
        pattern: &'static str,
    },
    Symbol(&'static str),
    /// Reference to a climbing rule with an explicit minimum binding power.
    Subexpr {
        symbol: &'static str,
        min: i32,
    },
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    Repeat(Box<Rule>),
    Repeat1(Box<Rule>),
    Field(&'static str, Box<Rule>),
    Alias {
        kind: &'static str,
        rule: Box<Rule>,
    },
    Prec {
        level: i32,
        assoc: Assoc,
        rule: Box<Rule>,
    },
    DynPrec {
        score: i32,
        rule: Box<Rule>,
    },
    Immediate(Box<Rule>),
    External(ExternalKind),
    /// Error fallback: consumes tokens (possibly none) up to one of the sync
    /// terminals and yields an error node. Always matches.
    Recover {
        until: &'static [&'static str],
        expected: &'static str,
    },
}

pub fn lit(text: &'static str) -> Rule {
    Rule::Literal(text)
}

pub fn sym(name: &'static str) -> Rule {
    Rule::Symbol(name)
}

pub fn pattern(kind: &'static str, pattern: &'static str) -> Rule {
    Rule::Pattern { kind, pattern }
}

pub fn seq(items: Vec<Rule>) -> Rule {
    Rule::Seq(items)
}

pub fn choice(items: Vec<Rule>) -> Rule {
    Rule::Choice(items)
}

pub fn repeat(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

pub fn repeat1(rule: Rule) -> Rule {
    Rule::Repeat1(Box::new(rule))
}

pub fn optional(rule: Rule) -> Rule {
    Rule::Choice(vec![rule, Rule::Blank])
}

pub fn field(name: &'static str, rule: Rule) -> Rule {
    Rule::Field(name, Box::new(rule))
}

pub fn alias(rule: Rule, kind: &'static str) -> Rule {
    Rule::Alias {
        kind,
        rule: Box::new(rule),
    }
}

pub fn prec(level: i32, rule: Rule) -> Rule {
    Rule::Prec {
        level,
        assoc: Assoc::None,
        rule: Box::new(rule),
    }
}

pub fn prec_right(level: i32, rule: Rule) -> Rule {
    Rule::Prec {
        level,
        assoc: Assoc::Right,
        rule: Box::new(rule),
    }
}

pub fn prec_dyn(score: i32, rule: Rule) -> Rule {
    Rule::DynPrec {
        score,
        rule: Box::new(rule),
    }
}

pub fn immediate(rule: Rule) -> Rule {
    Rule::Immediate(Box::new(rule))
}

/// Parse the expression symbol with a minimum binding power, so surrounding
/// separators (`,` in argument lists, `>` in template arguments) are never
/// taken as operators.
pub fn subexpr(min: i32) -> Rule {
    Rule::Subexpr {
        symbol: "_expression",
        min,
    }
}

pub fn recover_until(until: &'static [&'static str], expected: &'static str) -> Rule {
    Rule::Recover { until, expected }
}

/// One or more occurrences of `rule`, comma separated.
pub fn comma_sep1(rule: Rule) -> Rule {
    seq(vec![rule.clone(), repeat(seq(vec![lit(","), rule]))])
}

pub fn comma_sep(rule: Rule) -> Rule {
    optional(comma_sep1(rule))
}

// ============================================================================
// COMPILED MODEL
// ============================================================================

pub type SymbolId = usize;
pub type TerminalId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    Literal {
        text: &'static str,
        /// Literal ends in an identifier character: matching requires a word
        /// boundary so `class` never matches a prefix of `classy`.
        word: bool,
    },
    Pattern {
        kind: &'static str,
        regex_index: usize,
    },
}

impl Terminal {
    pub fn kind(&self) -> &'static str {
        match self {
            Terminal::Literal { text, .. } => text,
            Terminal::Pattern { kind, .. } => kind,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Terminal::Pattern { .. })
    }

    /// Human-readable name for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Terminal::Literal { text, .. } => format!("`{text}`"),
            Terminal::Pattern { kind, .. } => (*kind).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CRule {
    Blank,
    Terminal {
        id: TerminalId,
        immediate: bool,
    },
    Symbol(SymbolId),
    Subexpr {
        symbol: SymbolId,
        min: i32,
    },
    Seq(Vec<CRule>),
    Choice(CompiledChoice),
    Repeat(Box<CRule>),
    Repeat1(Box<CRule>),
    Field(&'static str, Box<CRule>),
    Alias(&'static str, Box<CRule>),
    External(ExternalKind),
    Recover {
        until: &'static [&'static str],
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledChoice {
    /// Stable identity of this choice point, for the engine's replay
    /// bookkeeping.
    pub id: usize,
    /// Alternatives sorted by static precedence (descending), declaration
    /// order preserved within a level.
    pub alts: Vec<CompiledAlt>,
    /// Index into [`Grammar::conflicts`] when a declared conflict set governs
    /// this choice point.
    pub conflict: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CompiledAlt {
    pub rule: CRule,
    pub static_prec: i32,
    pub dynamic_prec: i32,
    /// Position in the authored alternative list; the final tie-breaker.
    pub order: usize,
    /// Rule name this alternative resolves to, for conflict-set matching.
    pub name: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: &'static str,
    /// Hidden rules (leading `_`) splice their children into the parent node.
    pub hidden: bool,
    pub body: CRule,
    /// Postfix/infix continuations climbed after the body matches.
    pub tails: Option<&'static [TailEntry]>,
    pub static_prec: i32,
    pub dynamic_prec: i32,
}

/// Symbols the engine needs direct access to when interpreting climb tails.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    pub expression: SymbolId,
    pub argument_list: SymbolId,
    pub initializer_list: SymbolId,
    pub field_name: SymbolId,
    pub parameter_list: SymbolId,
    pub method_qualifier: SymbolId,
}

#[derive(Debug)]
pub struct Grammar {
    pub name: &'static str,
    pub rules: Vec<CompiledRule>,
    pub names: Vec<&'static str>,
    index: FxHashMap<&'static str, SymbolId>,
    pub terminals: Vec<Terminal>,
    pub patterns: Vec<Regex>,
    /// Declared conflict sets, in authored order.
    pub conflicts: Vec<&'static [&'static str]>,
    /// Rules whose repeat loops recover from failed items instead of
    /// stopping (declaration/statement containers).
    pub recovery: Vec<SymbolId>,
    pub start: SymbolId,
    pub well_known: WellKnown,
}

impl Grammar {
    pub fn symbol(&self, name: &str) -> Option<SymbolId> {
        self.index.get(name).copied()
    }

    pub fn rule(&self, id: SymbolId) -> &CompiledRule {
        &self.rules[id]
    }

    pub fn recovers(&self, id: SymbolId) -> bool {
        self.recovery.contains(&id)
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct GrammarBuilder {
    name: &'static str,
    rules: Vec<(&'static str, Rule)>,
    tails: FxHashMap<&'static str, &'static [TailEntry]>,
    conflicts: Vec<&'static [&'static str]>,
    recovery: Vec<&'static str>,
    start: &'static str,
}

impl GrammarBuilder {
    pub fn new(name: &'static str, start: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
            tails: FxHashMap::default(),
            conflicts: Vec::new(),
            recovery: Vec::new(),
            start,
        }
    }

    /// Defines a rule. Later definitions of the same name are a defect
    /// reported at compile time.
    pub fn rule(&mut self, name: &'static str, body: Rule) -> &mut Self {
        self.rules.push((name, body));
        self
    }

    /// Defines a rule whose matches continue through a precedence-climbing
    /// tail table (expressions, declarator suffixes).
    pub fn climb(&mut self, name: &'static str, prefix: Rule, tails: &'static [TailEntry]) -> &mut Self {
        self.rules.push((name, prefix));
        self.tails.insert(name, tails);
        self
    }

    /// Replaces a previously defined rule body. Used by the dialect layer to
    /// add alternatives at existing choice points.
    pub fn extend_rule(&mut self, name: &'static str, rebuild: impl FnOnce(Rule) -> Rule) -> &mut Self {
        if let Some(entry) = self.rules.iter_mut().find(|(n, _)| *n == name) {
            let old = std::mem::replace(&mut entry.1, Rule::Blank);
            entry.1 = rebuild(old);
        }
        self
    }

    pub fn conflicts(&mut self, sets: Vec<&'static [&'static str]>) -> &mut Self {
        self.conflicts.extend(sets);
        self
    }

    /// Marks a container rule whose item loop resynchronizes after errors.
    pub fn recover(&mut self, name: &'static str) -> &mut Self {
        self.recovery.push(name);
        self
    }

    pub fn compile(self) -> Result<Grammar, GrammarError> {
        Compiler::new(self).run()
    }
}

// ============================================================================
// COMPILATION
// ============================================================================

struct Compiler {
    builder: GrammarBuilder,
    index: FxHashMap<&'static str, SymbolId>,
    terminals: Vec<Terminal>,
    terminal_index: FxHashMap<&'static str, TerminalId>,
    patterns: Vec<(&'static str, &'static str)>,
    /// Rule-level precedence, scanned before lowering so alternatives written
    /// as bare symbol references inherit their target rule's precedence.
    rule_prec: FxHashMap<&'static str, (i32, i32)>,
    next_choice_id: usize,
}

impl Compiler {
    fn new(builder: GrammarBuilder) -> Self {
        Self {
            builder,
            index: FxHashMap::default(),
            terminals: Vec::new(),
            terminal_index: FxHashMap::default(),
            patterns: Vec::new(),
            rule_prec: FxHashMap::default(),
            next_choice_id: 0,
        }
    }

    fn run(mut self) -> Result<Grammar, GrammarError> {
        for (i, (name, _)) in self.builder.rules.iter().enumerate() {
            if self.index.insert(*name, i).is_some() {
                return Err(GrammarError::DuplicateRule(name.to_string()));
            }
        }
        let prec_scan: Vec<(&'static str, (i32, i32))> = self
            .builder
            .rules
            .iter()
            .map(|(name, body)| (*name, rule_level_prec(body)))
            .collect();
        self.rule_prec.extend(prec_scan);

        let authored = std::mem::take(&mut self.builder.rules);
        let mut rules = Vec::with_capacity(authored.len());
        for (name, body) in &authored {
            let name: &'static str = *name;
            let lowered = self.lower(name, body, false)?;
            let (static_prec, dynamic_prec) = self.rule_prec[name];
            rules.push(CompiledRule {
                name,
                hidden: name.starts_with('_'),
                body: lowered,
                tails: self.builder.tails.get(name).copied(),
                static_prec,
                dynamic_prec,
            });
        }

        let conflicts = std::mem::take(&mut self.builder.conflicts);
        let attached = attach_conflicts(&mut rules, &conflicts)?;
        validate::check(&rules, &self.index, &conflicts, &attached)?;

        let mut patterns = Vec::with_capacity(self.patterns.len());
        for (kind, source) in &self.patterns {
            let anchored = format!("^(?:{source})");
            patterns.push(Regex::new(&anchored).map_err(|e| GrammarError::BadPattern {
                name: (*kind).to_string(),
                source: e,
            })?);
        }

        let start = *self
            .index
            .get(self.builder.start)
            .ok_or_else(|| GrammarError::MissingStartRule(self.builder.start.to_string()))?;
        let well_known = self.well_known()?;
        let recovery = self
            .builder
            .recovery
            .iter()
            .filter_map(|n| self.index.get(n).copied())
            .collect();

        Ok(Grammar {
            name: self.builder.name,
            rules,
            names: authored.iter().map(|(n, _)| *n).collect(),
            index: self.index,
            terminals: self.terminals,
            patterns,
            conflicts,
            recovery,
            start,
            well_known,
        })
    }

    fn well_known(&self) -> Result<WellKnown, GrammarError> {
        let get = |name: &'static str| {
            self.index
                .get(name)
                .copied()
                .ok_or_else(|| GrammarError::MissingStartRule(name.to_string()))
        };
        Ok(WellKnown {
            expression: get("_expression")?,
            argument_list: get("argument_list")?,
            initializer_list: get("initializer_list")?,
            field_name: get("_field_name")?,
            parameter_list: get("parameter_list")?,
            method_qualifier: get("_method_qualifier")?,
        })
    }

    fn intern_literal(&mut self, text: &'static str) -> TerminalId {
        if let Some(id) = self.terminal_index.get(text) {
            return *id;
        }
        let word = text
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        let id = self.terminals.len();
        self.terminals.push(Terminal::Literal { text, word });
        self.terminal_index.insert(text, id);
        id
    }

    fn intern_pattern(&mut self, kind: &'static str, pattern: &'static str) -> TerminalId {
        if let Some(id) = self.terminal_index.get(kind) {
            return *id;
        }
        let regex_index = self.patterns.len();
        self.patterns.push((kind, pattern));
        let id = self.terminals.len();
        self.terminals.push(Terminal::Pattern { kind, regex_index });
        self.terminal_index.insert(kind, id);
        id
    }

    fn lower(&mut self, rule_name: &str, rule: &Rule, imm: bool) -> Result<CRule, GrammarError> {
        Ok(match rule {
            Rule::Blank => CRule::Blank,
            Rule::Literal(text) => CRule::Terminal {
                id: self.intern_literal(*text),
                immediate: imm,
            },
            Rule::Pattern { kind, pattern } => CRule::Terminal {
                id: self.intern_pattern(*kind, *pattern),
                immediate: imm,
            },
            Rule::Symbol(name) => CRule::Symbol(self.resolve(rule_name, *name)?),
            Rule::Subexpr { symbol, min } => CRule::Subexpr {
                symbol: self.resolve(rule_name, *symbol)?,
                min: *min,
            },
            Rule::Seq(items) => CRule::Seq(
                items
                    .iter()
                    .map(|r| self.lower(rule_name, r, imm))
                    .collect::<Result<_, _>>()?,
            ),
            Rule::Choice(items) => {
                let id = self.next_choice_id;
                self.next_choice_id += 1;
                let mut alts = Vec::with_capacity(items.len());
                for (order, item) in items.iter().enumerate() {
                    let (static_prec, dynamic_prec) = self.alt_prec(item);
                    alts.push(CompiledAlt {
                        name: alt_name(item),
                        rule: self.lower(rule_name, strip_prec(item), imm)?,
                        static_prec,
                        dynamic_prec,
                        order,
                    });
                }
                alts.sort_by(|a, b| {
                    b.static_prec
                        .cmp(&a.static_prec)
                        .then(b.dynamic_prec.cmp(&a.dynamic_prec))
                        .then(a.order.cmp(&b.order))
                });
                CRule::Choice(CompiledChoice {
                    id,
                    alts,
                    conflict: None,
                })
            }
            Rule::Repeat(inner) => CRule::Repeat(Box::new(self.lower(rule_name, inner, imm)?)),
            Rule::Repeat1(inner) => CRule::Repeat1(Box::new(self.lower(rule_name, inner, imm)?)),
            Rule::Field(name, inner) => {
                CRule::Field(*name, Box::new(self.lower(rule_name, inner, imm)?))
            }
            Rule::Alias { kind, rule } => {
                CRule::Alias(*kind, Box::new(self.lower(rule_name, rule, imm)?))
            }
            Rule::Prec { rule, .. } | Rule::DynPrec { rule, .. } => {
                self.lower(rule_name, rule, imm)?
            }
            Rule::Immediate(inner) => self.lower(rule_name, inner, true)?,
            Rule::External(kind) => CRule::External(*kind),
            Rule::Recover { until, expected } => CRule::Recover {
                until: *until,
                expected: *expected,
            },
        })
    }

    fn resolve(&self, rule_name: &str, name: &'static str) -> Result<SymbolId, GrammarError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GrammarError::UndefinedSymbol {
                rule: rule_name.to_string(),
                symbol: name.to_string(),
            })
    }

    /// Effective precedence of a choice alternative: an explicit wrapper wins,
    /// otherwise a bare symbol reference inherits its rule's precedence.
    fn alt_prec(&self, alt: &Rule) -> (i32, i32) {
        match alt {
            Rule::Prec { level, rule, .. } => {
                let (_, d) = self.alt_prec(rule);
                (*level, d)
            }
            Rule::DynPrec { score, rule } => {
                let (s, _) = self.alt_prec(rule);
                (s, *score)
            }
            Rule::Field(_, inner) | Rule::Alias { rule: inner, .. } => self.alt_prec(inner),
            Rule::Symbol(name) => self.rule_prec.get(name).copied().unwrap_or((0, 0)),
            _ => (0, 0),
        }
    }
}

/// Precedence wrappers around a whole rule body.
fn rule_level_prec(body: &Rule) -> (i32, i32) {
    match body {
        Rule::Prec { level, rule, .. } => {
            let (_, d) = rule_level_prec(rule);
            (*level, d)
        }
        Rule::DynPrec { score, rule } => {
            let (s, _) = rule_level_prec(rule);
            (s, *score)
        }
        _ => (0, 0),
    }
}

fn strip_prec(rule: &Rule) -> &Rule {
    match rule {
        Rule::Prec { rule, .. } | Rule::DynPrec { rule, .. } => strip_prec(rule),
        _ => rule,
    }
}

/// Rule name a choice alternative resolves to, for conflict-set matching.
/// Pattern terminals count under their token kind, so a conflict set can
/// name `identifier` directly.
fn alt_name(alt: &Rule) -> Option<&'static str> {
    match alt {
        Rule::Symbol(name) => Some(*name),
        Rule::Subexpr { symbol, .. } => Some(*symbol),
        Rule::Pattern { kind, .. } => Some(*kind),
        Rule::Prec { rule, .. } | Rule::DynPrec { rule, .. } => alt_name(rule),
        Rule::Field(_, inner) => alt_name(inner),
        Rule::Alias { rule, .. } => alt_name(rule),
        _ => None,
    }
}

/// Attaches each declared conflict set to every choice point whose
/// alternatives include all of its members. Returns a per-set attachment
/// count for validation.
fn attach_conflicts(
    rules: &mut [CompiledRule],
    conflicts: &[&'static [&'static str]],
) -> Result<Vec<usize>, GrammarError> {
    let mut attached = vec![0usize; conflicts.len()];
    for rule in rules.iter_mut() {
        attach_in(&mut rule.body, conflicts, &mut attached);
    }
    Ok(attached)
}

fn attach_in(rule: &mut CRule, conflicts: &[&'static [&'static str]], attached: &mut Vec<usize>) {
    match rule {
        CRule::Choice(choice) => {
            for alt in &mut choice.alts {
                attach_in(&mut alt.rule, conflicts, attached);
            }
            let names: Vec<&str> = choice.alts.iter().filter_map(|a| a.name).collect();
            for (i, set) in conflicts.iter().enumerate() {
                if set.iter().all(|member| names.contains(member)) {
                    if choice.conflict.is_none() {
                        choice.conflict = Some(i);
                    }
                    attached[i] += 1;
                }
            }
        }
        CRule::Seq(items) => {
            for item in items {
                attach_in(item, conflicts, attached);
            }
        }
        CRule::Repeat(inner) | CRule::Repeat1(inner) => attach_in(inner, conflicts, attached),
        CRule::Field(_, inner) | CRule::Alias(_, inner) => attach_in(inner, conflicts, attached),
        _ => {}
    }
}

// ============================================================================
// THE COMPILED GRAMMAR
// ============================================================================

static GRAMMAR: Lazy<Grammar> = Lazy::new(|| {
    // Defects in the authored tables are caught by the grammar tests; a
    // failure here is a bug in this crate, not in caller input.
    match rules::build() {
        Ok(grammar) => grammar,
        Err(defect) => panic!("grammar tables failed to compile: {defect}"),
    }
});

/// The compiled C++/Unreal grammar, built once per process.
pub fn grammar() -> &'static Grammar {
    &GRAMMAR
}

/// Builds a fresh copy of the grammar, surfacing defects as errors.
/// Used by grammar tests and the `validate-grammar` CLI command.
pub fn try_grammar() -> Result<Grammar, GrammarError> {
    rules::build()
}
