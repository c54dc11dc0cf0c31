//! Incremental re-parse support.
//!
//! An edit is described the way editors deliver it: the byte where the
//! change starts, where the replaced range used to end, and where the new
//! text ends. [`crate::Parser::reparse`] uses the edit to decide which
//! leading top-level subtrees of the previous tree are untouched and can be
//! reused by reference; the rest of the unit is re-derived. Reuse is
//! structural sharing of `Arc`s, never mutation of the old tree.

use serde::Serialize;

/// A single contiguous text edit, in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
}

impl InputEdit {
    /// An insertion of `len` bytes at `at`.
    pub fn insert(at: usize, len: usize) -> Self {
        Self {
            start_byte: at,
            old_end_byte: at,
            new_end_byte: at + len,
        }
    }

    /// A deletion of the byte range `start..old_end`.
    pub fn delete(start: usize, old_end: usize) -> Self {
        Self {
            start_byte: start,
            old_end_byte: old_end,
            new_end_byte: start,
        }
    }

    /// Replacement of `start..old_end` with `new_len` bytes.
    pub fn replace(start: usize, old_end: usize, new_len: usize) -> Self {
        Self {
            start_byte: start,
            old_end_byte: old_end,
            new_end_byte: start + new_len,
        }
    }

    /// Signed growth of the text, for cursor bookkeeping in callers.
    pub fn delta(&self) -> isize {
        self.new_end_byte as isize - self.old_end_byte as isize
    }
}
