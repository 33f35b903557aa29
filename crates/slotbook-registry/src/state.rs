use std::collections::{BTreeMap, BTreeSet, VecDeque};

use slotbook_element::Element;
use slotbook_types::{ElementId, SlotPosition};

use crate::cursor::Cursor;
use crate::error::{RegistryError, RegistryResult};
use crate::ids::IdAllocator;

/// Everything a delta can restore: the element arena, the cursor, and the id
/// allocator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RegistryState {
    pub elements: BTreeMap<ElementId, Element>,
    pub root_id: ElementId,
    pub cursor: Cursor,
    pub ids: IdAllocator,
}

impl RegistryState {
    pub fn element(&self, id: ElementId) -> RegistryResult<&Element> {
        self.elements
            .get(&id)
            .ok_or(RegistryError::UnknownElement(id))
    }

    /// Every `(owner, position)` whose slot holds `target`. Full scan.
    pub fn incoming_refs(&self, target: ElementId) -> Vec<(ElementId, SlotPosition)> {
        self.elements
            .values()
            .flat_map(|el| {
                el.occupied_slots()
                    .filter(move |(_, id)| *id == target)
                    .map(move |(pos, _)| (el.id, pos))
            })
            .collect()
    }

    /// Walk `path` from the root. Returns the element reached, or the depth
    /// of the first stale step.
    pub fn walk(&self, path: &[SlotPosition]) -> Result<ElementId, usize> {
        let mut current = self.root_id;
        if !self.elements.contains_key(&current) {
            return Err(0);
        }
        for (depth, &pos) in path.iter().enumerate() {
            let next = self
                .elements
                .get(&current)
                .and_then(|el| el.refs.get(pos).copied())
                .filter(|id| !id.is_empty() && self.elements.contains_key(id))
                .ok_or(depth)?;
            current = next;
        }
        Ok(current)
    }

    pub fn cursor_is_valid(&self) -> bool {
        self.walk(&self.cursor.path) == Ok(self.cursor.current)
    }

    /// Ids reachable from the root through occupied slots, breadth first.
    pub fn reachable_from_root(&self) -> BTreeSet<ElementId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([self.root_id]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(el) = self.elements.get(&id) {
                queue.extend(
                    el.occupied_slots()
                        .map(|(_, child)| child)
                        .filter(|child| !seen.contains(child)),
                );
            }
        }
        seen.retain(|id| self.elements.contains_key(id));
        seen
    }
}
