use serde::{Deserialize, Serialize};
use slotbook_types::{ElementId, SlotPosition};

/// The current element and the slot positions walked from the root to reach
/// it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub current: ElementId,
    #[serde(default)]
    pub path: Vec<SlotPosition>,
}

impl Cursor {
    /// A cursor resting on `root`.
    pub fn at(root: ElementId) -> Self {
        Self {
            current: root,
            path: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn is_at_root(&self) -> bool {
        self.path.is_empty()
    }
}
