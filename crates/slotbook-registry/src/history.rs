use std::collections::VecDeque;

use serde::Serialize;
use slotbook_types::ElementId;

use crate::delta::{Delta, DeltaAction};

/// Summary of one logged delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub index: usize,
    pub action: DeltaAction,
    pub element_id: Option<ElementId>,
    /// `true` for entries at or before the undo pointer.
    pub applied: bool,
}

/// Linear undo/redo log.
///
/// `applied` counts the entries currently in effect, so the classic pointer
/// is `applied - 1` and "before the first entry" is `applied == 0`.
#[derive(Clone, Debug)]
pub(crate) struct History {
    entries: VecDeque<Delta>,
    applied: usize,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            applied: 0,
            limit,
        }
    }

    /// Append after the pointer, discarding any redo entries, then drop the
    /// oldest entries beyond the limit.
    pub fn push(&mut self, delta: Delta) {
        self.entries.truncate(self.applied);
        self.entries.push_back(delta);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.applied = self.entries.len();
    }

    pub fn peek_undo(&self) -> Option<&Delta> {
        self.applied
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx))
    }

    pub fn peek_redo(&self) -> Option<&Delta> {
        self.entries.get(self.applied)
    }

    pub fn mark_undone(&mut self) {
        self.applied = self.applied.saturating_sub(1);
    }

    pub fn mark_redone(&mut self) {
        self.applied = (self.applied + 1).min(self.entries.len());
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Position of the last applied entry, `None` when nothing is applied.
    pub fn pointer(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied = 0;
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, delta)| HistoryEntry {
                index,
                action: delta.action,
                element_id: delta.element_id,
                applied: index < self.applied,
            })
            .collect()
    }
}
