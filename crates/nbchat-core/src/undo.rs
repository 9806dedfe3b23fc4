// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

/// The most cells one action inserts: the instruction plus its code.
pub const MAX_INSERTED: usize = 2;

/// Bookkeeping of the most recent insertion, enough to reverse it once.
///
/// `inserted == 0` means nothing is pending.  The inserted block occupies
/// `end_index + 1 - inserted ..= end_index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRecord {
    pub inserted: usize,
    pub end_index: usize,
}

impl UndoRecord {
    pub fn inserted(count: usize, end_index: usize) -> Self {
        Self { inserted: count, end_index }
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    /// Whether the recorded block could have been inserted by one action and
    /// lies entirely inside a notebook of `len` cells.
    pub fn fits(&self, len: usize) -> bool {
        self.inserted <= MAX_INSERTED
            && self.end_index < len
            && self.end_index.saturating_add(1) >= self.inserted
    }

    /// First index of the inserted block, if any is pending.
    pub fn start_index(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.end_index.saturating_add(1).saturating_sub(self.inserted))
    }

    /// Where the cursor goes once the block is removed: just before it,
    /// clamped at the start of the notebook.
    pub fn cursor_after_undo(&self) -> usize {
        self.end_index
            .saturating_add(1)
            .saturating_sub(self.inserted)
            .saturating_sub(1)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
