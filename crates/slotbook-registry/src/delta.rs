//! Invertible mutation records.

use std::fmt;

use serde::{Deserialize, Serialize};
use slotbook_element::Element;
use slotbook_types::ElementId;

use crate::cursor::Cursor;
use crate::error::{RegistryError, RegistryResult};
use crate::ids::IdAllocator;
use crate::state::RegistryState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaAction {
    Create,
    Delete,
    Update,
}

impl fmt::Display for DeltaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeltaAction::Create => "create",
            DeltaAction::Delete => "delete",
            DeltaAction::Update => "update",
        })
    }
}

/// Full before/after snapshots of one element. `None` means the element does
/// not exist on that side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementChange {
    pub id: ElementId,
    pub before: Option<Element>,
    pub after: Option<Element>,
}

/// One logged mutation. Navigation moves carry no element changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub action: DeltaAction,
    pub element_id: Option<ElementId>,
    pub changes: Vec<ElementChange>,
    pub cursor_before: Cursor,
    pub cursor_after: Cursor,
    pub ids_before: IdAllocator,
    pub ids_after: IdAllocator,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Before,
    After,
}

impl Delta {
    /// A delta that changes nothing yet; cursor and ids are the same on both
    /// sides.
    pub(crate) fn new(
        action: DeltaAction,
        element_id: Option<ElementId>,
        state: &RegistryState,
    ) -> Self {
        Self {
            action,
            element_id,
            changes: Vec::new(),
            cursor_before: state.cursor.clone(),
            cursor_after: state.cursor.clone(),
            ids_before: state.ids.clone(),
            ids_after: state.ids.clone(),
        }
    }

    pub(crate) fn with_change(
        mut self,
        id: ElementId,
        before: Option<Element>,
        after: Option<Element>,
    ) -> Self {
        self.changes.push(ElementChange { id, before, after });
        self
    }

    pub(crate) fn with_cursor_after(mut self, cursor: Cursor) -> Self {
        self.cursor_after = cursor;
        self
    }

    pub(crate) fn with_ids_after(mut self, ids: IdAllocator) -> Self {
        self.ids_after = ids;
        self
    }

    /// Install one side of this delta into `state`. Every snapshot is checked
    /// before anything is written.
    pub(crate) fn apply(&self, state: &mut RegistryState, side: Side) -> RegistryResult<()> {
        for change in &self.changes {
            let snapshot = match side {
                Side::Before => &change.before,
                Side::After => &change.after,
            };
            match snapshot {
                Some(el) if el.id != change.id => {
                    return Err(RegistryError::MalformedDelta(format!(
                        "snapshot for element {} carries id {}",
                        change.id, el.id
                    )));
                }
                None if change.id == state.root_id => {
                    return Err(RegistryError::MalformedDelta(
                        "delta would remove the root element".into(),
                    ));
                }
                _ => {}
            }
        }

        for change in &self.changes {
            let snapshot = match side {
                Side::Before => &change.before,
                Side::After => &change.after,
            };
            match snapshot {
                Some(el) => {
                    state.elements.insert(change.id, el.clone());
                }
                None => {
                    state.elements.remove(&change.id);
                }
            }
        }
        let (cursor, ids) = match side {
            Side::Before => (&self.cursor_before, &self.ids_before),
            Side::After => (&self.cursor_after, &self.ids_after),
        };
        state.cursor = cursor.clone();
        state.ids = ids.clone();
        Ok(())
    }
}
