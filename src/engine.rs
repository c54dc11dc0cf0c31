//! The conflict-resolving parse engine.
//!
//! A backtracking interpreter over the compiled rule table, with three
//! mechanisms layered on top of plain recursive descent:
//!
//! - **Precedence climbing.** Rules registered with a tail table
//!   (`_expression`, `_declarator`) parse a prefix form and then climb infix
//!   and postfix continuations whose level clears the caller's minimum
//!   binding power. Associativity picks the right-hand minimum, so the
//!   climb is the whole operator-precedence story.
//! - **Conflict replay.** Declared-conflict choice points record which
//!   ranked alternative they committed to. When an item later fails, the
//!   deepest recorded decision is bumped and the item re-parses: a
//!   depth-first search that only branches where the grammar declared
//!   ambiguity. Memoized subtrees replay their recorded decisions, so the
//!   search and the cache stay consistent.
//! - **Recovery.** Item loops in declaration/statement containers wrap
//!   unparseable spans in error nodes and resynchronize, so a full tree
//!   comes back for any finite input. Deadline and node-budget expiry wrap
//!   the remaining input the same way.
//!
//! Parsing owns no shared mutable state; one `Run` lives per parse call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::diagnostics::{DiagnosticKind, ParseDiagnostic};
use crate::grammar::precedence::{prec, TailEntry, TailShape};
use crate::grammar::{self, Assoc, CRule, CompiledChoice, ExternalKind, Grammar, SymbolId};
use crate::lexer::{scanner, Lexer};
use crate::tree::edit::InputEdit;
use crate::tree::{Child, Node, Span, Token, Tree, Trivia, ERROR};

pub mod recovery;
pub mod resolver;

use recovery::{SyncMode, SyncResult};
use resolver::ReplaySchedule;

const NO_MIN: i32 = i32::MIN;

/// Per-parse limits. Both default to unlimited.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Wall-clock budget measured from the start of the parse.
    pub deadline: Option<Duration>,
    /// Maximum number of grammar-rule applications before cancellation.
    pub node_budget: Option<usize>,
}

/// The public parser handle. Cheap to create; safe to share across threads
/// (the grammar tables are immutable and each parse owns its own state).
pub struct Parser {
    grammar: &'static Grammar,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            grammar: grammar::grammar(),
        }
    }

    /// Parses one translation unit. Total: any finite input yields a tree,
    /// with malformed regions wrapped in error nodes.
    pub fn parse(&self, source: &str) -> Tree {
        self.parse_with_options(source, &ParseOptions::default())
    }

    pub fn parse_with_options(&self, source: &str, options: &ParseOptions) -> Tree {
        let mut run = Run::new(self.grammar, source, options);
        let (children, diags, trailing) = run.parse_unit(0);
        build_tree(source, children, trailing, diags)
    }

    /// Incremental re-parse: top-level subtrees that end before the edit are
    /// reused by reference; everything from the first affected item on is
    /// re-derived against the new source.
    pub fn reparse(&self, source: &str, old: &Tree, edit: &InputEdit) -> Tree {
        let cut = edit.start_byte.min(edit.old_end_byte).min(source.len());
        let mut children: Vec<Child> = Vec::new();
        let mut resume = 0usize;
        for child in old.root().children() {
            if child.span().end < cut {
                resume = child.span().end;
                children.push(child.clone());
            } else {
                break;
            }
        }
        let mut diags: Vec<ParseDiagnostic> = old
            .diagnostics()
            .iter()
            .filter(|d| d.span.end <= resume)
            .cloned()
            .collect();
        let mut run = Run::new(self.grammar, source, &ParseOptions::default());
        let (rest, new_diags, trailing) = run.parse_unit(resume);
        children.extend(rest);
        diags.extend(new_diags);
        build_tree(source, children, trailing, diags)
    }
}

fn build_tree(
    source: &str,
    children: Vec<Child>,
    trailing: Vec<Trivia>,
    diags: Vec<ParseDiagnostic>,
) -> Tree {
    let span = span_of(&children, 0);
    let root = Node::new("translation_unit", span, children, Vec::new(), false);
    Tree::new(Arc::from(source), Arc::new(root), trailing, diags)
}

// ============================================================================
// INTERNAL PARSE STATE
// ============================================================================

#[derive(Clone)]
struct RuleMatch {
    children: Vec<Child>,
    fields: Vec<(&'static str, usize)>,
    end: usize,
    diags: Vec<ParseDiagnostic>,
}

fn empty_match(pos: usize) -> RuleMatch {
    RuleMatch {
        children: Vec::new(),
        fields: Vec::new(),
        end: pos,
        diags: Vec::new(),
    }
}

fn token_match(token: Token) -> RuleMatch {
    let end = token.span.end;
    RuleMatch {
        children: vec![Child::Token(token)],
        fields: Vec::new(),
        end,
        diags: Vec::new(),
    }
}

fn append(base: &mut RuleMatch, part: RuleMatch) {
    let offset = base.children.len();
    base.children.extend(part.children);
    base.fields
        .extend(part.fields.into_iter().map(|(name, i)| (name, i + offset)));
    base.end = part.end;
    base.diags.extend(part.diags);
}

fn span_of(children: &[Child], fallback: usize) -> Span {
    match (children.first(), children.last()) {
        (Some(first), Some(last)) => Span::new(first.span().start, last.span().end),
        _ => Span::empty(fallback),
    }
}

fn error_node(tokens: Vec<Token>, span: Span) -> Child {
    let children = tokens.into_iter().map(Child::Token).collect();
    Child::Node(Arc::new(Node::new(ERROR, span, children, Vec::new(), true)))
}

struct Fail;
type PResult = Result<RuleMatch, Fail>;

#[derive(Clone)]
struct MemoEntry {
    result: Option<RuleMatch>,
    decisions: Vec<(usize, usize)>,
}

struct Run<'s> {
    grammar: &'static Grammar,
    src: &'s str,
    lexer: Lexer<'s>,
    memo: FxHashMap<(SymbolId, usize, i32, bool), MemoEntry>,
    active: FxHashSet<(SymbolId, usize, i32, bool)>,
    schedules: Vec<ReplaySchedule>,
    started: Instant,
    deadline: Option<Duration>,
    node_budget: Option<usize>,
    nodes: usize,
    cancelled: bool,
    /// Grammar-level `Recover` rules only fire on an item's last-resort
    /// attempt, after the conflict-replay search is exhausted. Otherwise an
    /// error-node fallback would mask failures that replay could fix.
    allow_recover: bool,
}

impl<'s> Run<'s> {
    fn new(grammar: &'static Grammar, src: &'s str, options: &ParseOptions) -> Self {
        Self {
            grammar,
            src,
            lexer: Lexer::new(src),
            memo: FxHashMap::default(),
            active: FxHashSet::default(),
            schedules: Vec::new(),
            started: Instant::now(),
            deadline: options.deadline,
            node_budget: options.node_budget,
            nodes: 0,
            cancelled: false,
            allow_recover: false,
        }
    }

    fn check_budget(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.nodes += 1;
        if let Some(budget) = self.node_budget {
            if self.nodes > budget {
                self.cancelled = true;
                return false;
            }
        }
        if self.nodes % 64 == 0 {
            if let Some(deadline) = self.deadline {
                if self.started.elapsed() >= deadline {
                    self.cancelled = true;
                    return false;
                }
            }
        }
        true
    }

    fn decisions_now(&self) -> usize {
        self.schedules.last().map_or(0, |s| s.decision_count())
    }

    /// Outside the forced prefix of the current replay, where memo entries
    /// may be recorded and replayed.
    fn default_region(&self) -> bool {
        self.schedules.last().map_or(true, |s| !s.in_forced_region())
    }

    // ------------------------------------------------------------------
    // Top level
    // ------------------------------------------------------------------

    fn parse_unit(&mut self, from: usize) -> (Vec<Child>, Vec<ParseDiagnostic>, Vec<Trivia>) {
        let start = self.grammar.start;
        let body = &self.grammar.rule(start).body;
        let mut m = match self.eval(body, from, start) {
            Ok(m) => m,
            Err(_) => empty_match(from),
        };
        // Reachable only on cancellation: the recovery loops otherwise
        // consume every byte. Wrap whatever remains in one error node.
        let (_, lookahead) = self.lexer.skip_trivia(m.end);
        if lookahead < self.src.len() {
            let mut tokens = Vec::new();
            let mut pos = m.end;
            while let Some(token) = self.lexer.next_any_token(pos) {
                pos = token.span.end;
                tokens.push(token);
            }
            if !tokens.is_empty() {
                let span = Span::new(tokens[0].span.start, pos);
                let kind = if self.cancelled {
                    DiagnosticKind::Cancelled
                } else {
                    DiagnosticKind::SkippedTokens {
                        context: "translation_unit".into(),
                    }
                };
                m.diags.push(ParseDiagnostic::new(kind, span));
                m.children.push(error_node(tokens, span));
                m.end = pos;
            }
        }
        let (trailing, _) = self.lexer.skip_trivia(m.end);
        (m.children, m.diags, trailing)
    }

    // ------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------

    fn parse_symbol(&mut self, sym: SymbolId, pos: usize, min_bp: i32) -> PResult {
        if !self.check_budget() {
            return Err(Fail);
        }
        let key = (sym, pos, min_bp, self.allow_recover);
        let memo_usable = self.default_region();
        if memo_usable {
            if let Some(entry) = self.memo.get(&key).cloned() {
                if let Some(schedule) = self.schedules.last_mut() {
                    schedule.replay_decisions(&entry.decisions);
                }
                return entry.result.ok_or(Fail);
            }
        }
        if !self.active.insert(key) {
            // Re-entry at the same position: refuse instead of looping.
            return Err(Fail);
        }
        let before = self.decisions_now();
        let depth = self.schedules.len();
        let result = self.parse_symbol_inner(sym, pos, min_bp);
        self.active.remove(&key);
        if memo_usable && !self.cancelled && self.schedules.len() == depth {
            let decisions = self
                .schedules
                .last()
                .map_or_else(Vec::new, |s| s.decisions_since(before));
            self.memo.insert(
                key,
                MemoEntry {
                    result: result.as_ref().ok().cloned(),
                    decisions,
                },
            );
        }
        result
    }

    fn parse_symbol_inner(&mut self, sym: SymbolId, pos: usize, min_bp: i32) -> PResult {
        let rule = self.grammar.rule(sym);
        let body = self.eval(&rule.body, pos, sym)?;
        let m = if rule.hidden {
            body
        } else {
            self.wrap(rule.name, body, pos)
        };
        match rule.tails {
            Some(tails) => self.climb(m, tails, min_bp),
            None => Ok(m),
        }
    }

    fn wrap(&mut self, kind: &'static str, m: RuleMatch, pos: usize) -> RuleMatch {
        let span = span_of(&m.children, pos);
        let node = Node::new(kind, span, m.children, m.fields, false);
        RuleMatch {
            children: vec![Child::Node(Arc::new(node))],
            fields: Vec::new(),
            end: m.end,
            diags: m.diags,
        }
    }

    // ------------------------------------------------------------------
    // Rule interpretation
    // ------------------------------------------------------------------

    fn eval(&mut self, rule: &CRule, pos: usize, ctx: SymbolId) -> PResult {
        if self.cancelled {
            return Err(Fail);
        }
        match rule {
            CRule::Blank => Ok(empty_match(pos)),
            CRule::Terminal { id, immediate } => self
                .lexer
                .match_terminal(self.grammar, pos, *id, *immediate)
                .map(token_match)
                .ok_or(Fail),
            CRule::Symbol(sym) => self.parse_symbol(*sym, pos, NO_MIN),
            CRule::Subexpr { symbol, min } => self.parse_symbol(*symbol, pos, *min),
            CRule::Seq(items) => {
                let mut m = empty_match(pos);
                for item in items {
                    let part = self.eval(item, m.end, ctx)?;
                    append(&mut m, part);
                }
                Ok(m)
            }
            CRule::Choice(choice) => self.eval_choice(choice, pos, ctx),
            CRule::Repeat(inner) => self.eval_repeat(inner, pos, ctx),
            CRule::Repeat1(inner) => {
                let mut m = self.eval(inner, pos, ctx)?;
                let rest = self.eval_repeat(inner, m.end, ctx)?;
                append(&mut m, rest);
                Ok(m)
            }
            CRule::Field(name, inner) => {
                let mut m = self.eval(inner, pos, ctx)?;
                mark_fields(&mut m, *name);
                Ok(m)
            }
            CRule::Alias(kind, inner) => {
                let mut m = self.eval(inner, pos, ctx)?;
                apply_alias(&mut m, *kind);
                Ok(m)
            }
            CRule::External(ExternalKind::RawStringTail) => self.eval_raw_string_tail(pos),
            CRule::Recover { until, expected } => self.eval_recover(pos, *until, *expected, ctx),
        }
    }

    fn eval_choice(&mut self, choice: &CompiledChoice, pos: usize, ctx: SymbolId) -> PResult {
        if choice.conflict.is_none() || self.schedules.is_empty() {
            for alt in &choice.alts {
                if let Ok(m) = self.eval(&alt.rule, pos, ctx) {
                    return Ok(m);
                }
                if self.cancelled {
                    return Err(Fail);
                }
            }
            return Err(Fail);
        }

        // Declared conflict: walk the ranked alternatives from the rank the
        // replay schedule dictates. A decision-free failure is safe to step
        // past; a failure that recorded nested decisions must surface so the
        // replay can bump those decisions first.
        let total = choice.alts.len();
        let (slot, start) = match self.schedules.last_mut() {
            Some(schedule) => schedule.open(total),
            None => return Err(Fail),
        };
        for rank in start..total {
            let before = self.decisions_now();
            match self.eval(&choice.alts[rank].rule, pos, ctx) {
                Ok(m) => {
                    if let Some(schedule) = self.schedules.last_mut() {
                        schedule.commit(slot, rank);
                    }
                    return Ok(m);
                }
                Err(_) => {
                    if self.cancelled {
                        return Err(Fail);
                    }
                    if self.decisions_now() > before {
                        if let Some(schedule) = self.schedules.last_mut() {
                            schedule.commit(slot, rank);
                        }
                        return Err(Fail);
                    }
                }
            }
        }
        if let Some(schedule) = self.schedules.last_mut() {
            schedule.commit(slot, total.saturating_sub(1));
        }
        Err(Fail)
    }

    fn eval_repeat(&mut self, inner: &CRule, pos: usize, ctx: SymbolId) -> PResult {
        let recovering = self.grammar.recovers(ctx);
        let closer = if recovering && self.grammar.rule(ctx).name != "translation_unit" {
            Some("}")
        } else {
            None
        };
        let mut m = empty_match(pos);
        loop {
            if self.cancelled {
                break;
            }
            let result = if recovering {
                self.parse_item(inner, m.end, ctx)
            } else {
                self.eval(inner, m.end, ctx)
            };
            match result {
                Ok(part) => {
                    if part.end == m.end {
                        break;
                    }
                    append(&mut m, part);
                }
                Err(_) => {
                    if !recovering || self.cancelled {
                        break;
                    }
                    let Some(next) = self.lexer.next_any_token(m.end) else {
                        break;
                    };
                    if closer == Some(next.text(self.src)) {
                        break;
                    }
                    let sync = recovery::scan(&self.lexer, SyncMode::Container { closer }, m.end);
                    if sync.tokens.is_empty() {
                        break;
                    }
                    let span = Span::new(sync.tokens[0].span.start, sync.end);
                    let kind = if sync.unterminated_raw {
                        DiagnosticKind::UnterminatedRawString
                    } else {
                        DiagnosticKind::SkippedTokens {
                            context: self.grammar.rule(ctx).name.to_string(),
                        }
                    };
                    m.diags.push(ParseDiagnostic::new(kind, span));
                    m.children.push(error_node(sync.tokens, span));
                    m.end = sync.end;
                }
            }
        }
        Ok(m)
    }

    /// One item of a recovery container, parsed under its own replay
    /// schedule: on failure the deepest conflict decision is bumped and the
    /// item re-parses, until the search space or the attempt cap runs out.
    fn parse_item(&mut self, inner: &CRule, pos: usize, ctx: SymbolId) -> PResult {
        let saved_recover = self.allow_recover;
        self.allow_recover = false;
        self.schedules.push(ReplaySchedule::new());
        let mut result = loop {
            match self.schedules.last_mut() {
                Some(schedule) => schedule.begin_attempt(),
                None => break Err(Fail),
            }
            match self.eval(inner, pos, ctx) {
                Ok(m) => break Ok(m),
                Err(fail) => {
                    if self.cancelled {
                        break Err(fail);
                    }
                    let keep_going = match self.schedules.last_mut() {
                        Some(schedule) => !schedule.attempts_exhausted() && schedule.advance(),
                        None => false,
                    };
                    if !keep_going {
                        break Err(fail);
                    }
                }
            }
        };
        // Last resort: one more default-path attempt with the grammar's
        // Recover fallbacks armed, so a missing construct degrades to a
        // zero-width error node instead of rejecting the whole item.
        if result.is_err() && !self.cancelled {
            if let Some(schedule) = self.schedules.last_mut() {
                *schedule = ReplaySchedule::new();
                schedule.begin_attempt();
            }
            self.allow_recover = true;
            result = self.eval(inner, pos, ctx);
        }
        self.schedules.pop();
        self.allow_recover = saved_recover;
        result
    }

    // ------------------------------------------------------------------
    // Precedence climbing
    // ------------------------------------------------------------------

    fn climb(&mut self, mut lhs: RuleMatch, tails: &'static [TailEntry], min_bp: i32) -> PResult {
        loop {
            if self.cancelled {
                return Ok(lhs);
            }
            let Some((entry, token)) = self.match_tail(lhs.end, tails, min_bp) else {
                return Ok(lhs);
            };
            lhs = self.apply_tail(lhs, entry, token)?;
        }
    }

    /// Longest trigger wins, so `->` is never read as `-` and `>>=` is
    /// never read as `>>`.
    fn match_tail(
        &self,
        pos: usize,
        tails: &'static [TailEntry],
        min_bp: i32,
    ) -> Option<(&'static TailEntry, Token)> {
        let mut best: Option<(&'static TailEntry, Token)> = None;
        for entry in tails {
            if entry.level < min_bp {
                continue;
            }
            let trigger = entry.shape.trigger();
            if best
                .as_ref()
                .is_some_and(|(b, _)| b.shape.trigger().len() >= trigger.len())
            {
                continue;
            }
            if let Some(token) = self.lexer.match_text(pos, trigger) {
                best = Some((entry, token));
            }
        }
        best
    }

    fn apply_tail(&mut self, lhs: RuleMatch, entry: &TailEntry, token: Token) -> PResult {
        let wk = self.grammar.well_known;
        let mut diags = lhs.diags;
        let mut children = lhs.children;
        let lhs_end = lhs.end;
        match entry.shape {
            TailShape::Binary { .. } => {
                let rhs_min = if entry.assoc == Assoc::Left {
                    entry.level + 1
                } else {
                    entry.level
                };
                let rhs = self.parse_symbol(wk.expression, token.span.end, rhs_min)?;
                children.push(Child::Token(token));
                let right = children.len();
                let end = rhs.end;
                diags.extend(rhs.diags);
                children.extend(rhs.children);
                finish_tail(
                    entry.kind,
                    children,
                    vec![("left", 0), ("operator", right - 1), ("right", right)],
                    end,
                    diags,
                )
            }
            TailShape::Assign { .. } => {
                let at = token.span.end;
                let rhs = match self.parse_symbol(wk.initializer_list, at, NO_MIN) {
                    Ok(m) => m,
                    Err(_) => self.parse_symbol(wk.expression, at, entry.level)?,
                };
                children.push(Child::Token(token));
                let right = children.len();
                let end = rhs.end;
                diags.extend(rhs.diags);
                children.extend(rhs.children);
                finish_tail(
                    entry.kind,
                    children,
                    vec![("left", 0), ("operator", right - 1), ("right", right)],
                    end,
                    diags,
                )
            }
            TailShape::Ternary => {
                let consequence = self.parse_symbol(wk.expression, token.span.end, NO_MIN)?;
                let colon = self.lexer.match_text(consequence.end, ":").ok_or(Fail)?;
                let alternative = self.parse_symbol(wk.expression, colon.span.end, entry.level)?;
                children.push(Child::Token(token));
                let cons_at = children.len();
                diags.extend(consequence.diags);
                children.extend(consequence.children);
                children.push(Child::Token(colon));
                let alt_at = children.len();
                let end = alternative.end;
                diags.extend(alternative.diags);
                children.extend(alternative.children);
                finish_tail(
                    entry.kind,
                    children,
                    vec![
                        ("condition", 0),
                        ("consequence", cons_at),
                        ("alternative", alt_at),
                    ],
                    end,
                    diags,
                )
            }
            TailShape::Update { .. } => {
                let end = token.span.end;
                children.push(Child::Token(token));
                let op = children.len() - 1;
                finish_tail(
                    entry.kind,
                    children,
                    vec![("argument", 0), ("operator", op)],
                    end,
                    diags,
                )
            }
            TailShape::Call => {
                let args = self.parse_symbol(wk.argument_list, lhs_end, NO_MIN)?;
                let at = children.len();
                let end = args.end;
                diags.extend(args.diags);
                children.extend(args.children);
                finish_tail(
                    entry.kind,
                    children,
                    vec![("function", 0), ("arguments", at)],
                    end,
                    diags,
                )
            }
            TailShape::Subscript => {
                let index = self.parse_symbol(wk.expression, token.span.end, NO_MIN)?;
                let close = self.lexer.match_text(index.end, "]").ok_or(Fail)?;
                children.push(Child::Token(token));
                let idx_at = children.len();
                diags.extend(index.diags);
                children.extend(index.children);
                let end = close.span.end;
                children.push(Child::Token(close));
                finish_tail(
                    entry.kind,
                    children,
                    vec![("argument", 0), ("index", idx_at)],
                    end,
                    diags,
                )
            }
            TailShape::Member { .. } => {
                let name = self.parse_symbol(wk.field_name, token.span.end, NO_MIN)?;
                children.push(Child::Token(token));
                let name_at = children.len();
                let end = name.end;
                diags.extend(name.diags);
                children.extend(name.children);
                finish_tail(
                    entry.kind,
                    children,
                    vec![("argument", 0), ("field", name_at)],
                    end,
                    diags,
                )
            }
            TailShape::Comma => {
                let rhs = self.parse_symbol(wk.expression, token.span.end, entry.level + 1)?;
                children.push(Child::Token(token));
                let right = children.len();
                let end = rhs.end;
                diags.extend(rhs.diags);
                children.extend(rhs.children);
                finish_tail(
                    entry.kind,
                    children,
                    vec![("left", 0), ("right", right)],
                    end,
                    diags,
                )
            }
            TailShape::Params => {
                let params = self.parse_symbol(wk.parameter_list, lhs_end, NO_MIN)?;
                let params_at = children.len();
                let mut end = params.end;
                diags.extend(params.diags);
                children.extend(params.children);
                loop {
                    match self.parse_symbol(wk.method_qualifier, end, NO_MIN) {
                        Ok(q) if q.end > end => {
                            end = q.end;
                            diags.extend(q.diags);
                            children.extend(q.children);
                        }
                        _ => break,
                    }
                }
                finish_tail(
                    entry.kind,
                    children,
                    vec![("declarator", 0), ("parameters", params_at)],
                    end,
                    diags,
                )
            }
            TailShape::ArraySuffix => {
                let size = self.parse_symbol(wk.expression, token.span.end, prec::ARG_FLOOR);
                let mut at = token.span.end;
                children.push(Child::Token(token));
                let mut fields = vec![("declarator", 0)];
                if let Ok(size) = size {
                    fields.push(("size", children.len()));
                    at = size.end;
                    diags.extend(size.diags.clone());
                    children.extend(size.children);
                }
                let close = self.lexer.match_text(at, "]").ok_or(Fail)?;
                let end = close.span.end;
                children.push(Child::Token(close));
                finish_tail(entry.kind, children, fields, end, diags)
            }
        }
    }

    // ------------------------------------------------------------------
    // External scanner and recovery rules
    // ------------------------------------------------------------------

    fn eval_raw_string_tail(&mut self, pos: usize) -> PResult {
        let Some(pieces) = scanner::scan(self.src, pos) else {
            return Err(Fail);
        };
        let token = |kind: &'static str, span: Span, named: bool| {
            Child::Token(Token {
                kind,
                span,
                named,
                leading: Vec::new(),
            })
        };
        let mut children = Vec::new();
        if !pieces.delimiter.is_empty() {
            children.push(token("raw_string_delimiter", pieces.delimiter, true));
        }
        children.push(token("(", pieces.open_paren, false));
        children.push(token("raw_string_content", pieces.content, true));
        children.push(token(")", pieces.close_paren, false));
        if !pieces.close_delimiter.is_empty() {
            children.push(token("raw_string_delimiter", pieces.close_delimiter, true));
        }
        children.push(token("\"", pieces.close_quote, false));
        Ok(RuleMatch {
            children,
            fields: Vec::new(),
            end: pieces.end,
            diags: Vec::new(),
        })
    }

    fn eval_recover(
        &mut self,
        pos: usize,
        until: &'static [&'static str],
        expected: &'static str,
        ctx: SymbolId,
    ) -> PResult {
        if !self.allow_recover {
            return Err(Fail);
        }
        let SyncResult { tokens, end, .. } =
            recovery::scan(&self.lexer, SyncMode::Until(until), pos);
        let (span, kind) = if tokens.is_empty() {
            (
                Span::empty(pos),
                DiagnosticKind::MissingNode {
                    expected: expected.to_string(),
                },
            )
        } else {
            (
                Span::new(tokens[0].span.start, end),
                DiagnosticKind::SkippedTokens {
                    context: self.grammar.rule(ctx).name.to_string(),
                },
            )
        };
        Ok(RuleMatch {
            children: vec![error_node(tokens, span)],
            fields: Vec::new(),
            end,
            diags: vec![ParseDiagnostic::new(kind, span)],
        })
    }
}

// ============================================================================
// MATCH POST-PROCESSING
// ============================================================================

fn finish_tail(
    kind: &'static str,
    children: Vec<Child>,
    fields: Vec<(&'static str, usize)>,
    end: usize,
    diags: Vec<ParseDiagnostic>,
) -> PResult {
    let span = span_of(&children, end);
    let node = Node::new(kind, span, children, fields, false);
    Ok(RuleMatch {
        children: vec![Child::Node(Arc::new(node))],
        fields: Vec::new(),
        end,
        diags,
    })
}

/// Marks the children produced by a `field(...)` rule. A single child is
/// always marked (operators are anonymous tokens); with several children
/// only nodes and named tokens are, so list separators never become fields.
fn mark_fields(m: &mut RuleMatch, name: &'static str) {
    if m.children.len() == 1 {
        m.fields.push((name, 0));
        return;
    }
    for (i, child) in m.children.iter().enumerate() {
        let named = match child {
            Child::Node(_) => true,
            Child::Token(t) => t.named,
        };
        if named {
            m.fields.push((name, i));
        }
    }
}

/// Re-kinds the single node or token an `alias(...)` rule matched.
fn apply_alias(m: &mut RuleMatch, kind: &'static str) {
    if let [child] = &mut m.children[..] {
        match child {
            Child::Token(token) => {
                token.kind = kind;
                token.named = true;
            }
            Child::Node(node) => {
                let rebuilt = Node::new(
                    kind,
                    node.span,
                    node.children.clone(),
                    node.fields.clone(),
                    node.is_error(),
                );
                *node = Arc::new(rebuilt);
            }
        }
    }
}
