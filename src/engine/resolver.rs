//! Conflict resolution bookkeeping.
//!
//! Alternatives at a declared-conflict choice point are ranked at grammar
//! compile time: static precedence first, then declared dynamic precedence,
//! then declaration order. At parse time the engine walks that ranking and
//! records which rank it committed to in a [`ReplaySchedule`]. When the
//! enclosing item later fails, [`ReplaySchedule::advance`] bumps the deepest
//! recorded decision that still has alternatives and the item re-parses with
//! that prefix forced: a depth-first search over conflict decisions, in
//! encounter order. The search only ever branches at declared conflicts, so
//! an undeclared ambiguity is never explored at parse time.

/// Decision state for one parse item. Decisions are identified by the order
/// in which an attempt encounters them, which is deterministic for a fixed
/// forced prefix.
#[derive(Debug, Default)]
pub struct ReplaySchedule {
    /// Alternative rank forced on the first `forced.len()` decisions.
    forced: Vec<usize>,
    /// `(rank committed, total alternatives)` per decision of this attempt.
    taken: Vec<(usize, usize)>,
    /// Next decision index within the current attempt.
    cursor: usize,
    attempts: usize,
}

/// Hard cap on re-parse attempts per item; a pathological decision tree
/// degrades to an error node instead of unbounded work.
pub const MAX_ATTEMPTS: usize = 4096;

impl ReplaySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_attempt(&mut self) {
        self.taken.clear();
        self.cursor = 0;
        self.attempts += 1;
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= MAX_ATTEMPTS
    }

    /// Opens the next conflict decision. Returns its slot and the rank the
    /// current attempt starts from; the engine commits the rank it actually
    /// took with [`Self::commit`].
    pub fn open(&mut self, total: usize) -> (usize, usize) {
        let rank = self.forced.get(self.cursor).copied().unwrap_or(0);
        self.taken.push((rank, total));
        self.cursor += 1;
        (self.taken.len() - 1, rank)
    }

    pub fn commit(&mut self, slot: usize, rank: usize) {
        if let Some(entry) = self.taken.get_mut(slot) {
            entry.0 = rank;
        }
    }

    /// Number of decisions recorded so far in the current attempt.
    pub fn decision_count(&self) -> usize {
        self.taken.len()
    }

    /// True while the cursor is inside the forced prefix; memoized subtrees
    /// recorded on the default path must not be replayed here.
    pub fn in_forced_region(&self) -> bool {
        self.cursor < self.forced.len()
    }

    /// The decisions recorded since `from`, for memoization.
    pub fn decisions_since(&self, from: usize) -> Vec<(usize, usize)> {
        self.taken[from..].to_vec()
    }

    /// Replays the decisions of a memoized subtree.
    pub fn replay_decisions(&mut self, decisions: &[(usize, usize)]) {
        self.taken.extend_from_slice(decisions);
        self.cursor += decisions.len();
    }

    /// Moves to the next point in the decision search space. Returns false
    /// when every combination has been tried.
    pub fn advance(&mut self) -> bool {
        while let Some((rank, total)) = self.taken.pop() {
            if rank + 1 < total {
                let mut forced: Vec<usize> = self.taken.iter().map(|(r, _)| *r).collect();
                forced.push(rank + 1);
                self.forced = forced;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_walks_the_decision_tree_depth_first() {
        let mut s = ReplaySchedule::new();
        s.begin_attempt();
        assert_eq!(s.open(2).1, 0);
        assert_eq!(s.open(3).1, 0);
        // Deepest decision bumps first.
        assert!(s.advance());
        s.begin_attempt();
        assert_eq!(s.open(2).1, 0);
        assert_eq!(s.open(3).1, 1);
        assert!(s.advance());
        s.begin_attempt();
        assert_eq!(s.open(2).1, 0);
        assert_eq!(s.open(3).1, 2);
        // Deepest exhausted: the shallower decision bumps next.
        assert!(s.advance());
        s.begin_attempt();
        assert_eq!(s.open(2).1, 1);
        assert_eq!(s.open(3).1, 0);
    }

    #[test]
    fn committed_ranks_shape_the_next_forced_prefix() {
        let mut s = ReplaySchedule::new();
        s.begin_attempt();
        let (slot, start) = s.open(4);
        assert_eq!(start, 0);
        // The attempt stepped past two dead alternatives before committing.
        s.commit(slot, 2);
        assert!(s.advance());
        s.begin_attempt();
        assert_eq!(s.open(4).1, 3);
    }

    #[test]
    fn advance_reports_exhaustion() {
        let mut s = ReplaySchedule::new();
        s.begin_attempt();
        s.open(1);
        assert!(!s.advance());
    }

    #[test]
    fn replayed_decisions_participate_in_the_search() {
        let mut s = ReplaySchedule::new();
        s.begin_attempt();
        s.open(2);
        s.replay_decisions(&[(0, 3)]);
        assert!(s.advance());
        s.begin_attempt();
        assert_eq!(s.open(2).1, 0);
        // The memoized decision is now forced past its recorded rank.
        assert_eq!(s.open(3).1, 1);
        assert!(s.in_forced_region() || s.decision_count() == 2);
    }
}
