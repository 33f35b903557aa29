use std::collections::{BTreeMap, BTreeSet};

use slotbook_element::{Element, ElementBody, ElementKind, ElementSummary, Table};
use slotbook_types::{ElementId, SlotPosition};
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::cursor::Cursor;
use crate::delta::{Delta, DeltaAction, Side};
use crate::error::{RegistryError, RegistryResult};
use crate::history::{History, HistoryEntry};
use crate::ids::IdAllocator;
use crate::integrity::IntegrityReport;
use crate::slots;
use crate::state::RegistryState;

/// Owner of every element, the cursor, and the delta log.
///
/// All structural operations act on the element under the cursor. Every
/// successful mutating call, navigation included, appends exactly one delta.
#[derive(Debug)]
pub struct ElementRegistry {
    pub(crate) state: RegistryState,
    pub(crate) history: History,
    config: RegistryConfig,
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementRegistry {
    /// A registry holding only an empty `root` key/value element.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let mut ids = IdAllocator::new();
        let root_id = ids.allocate();
        let root = Element::empty(root_id, "root", ElementKind::KeyValuePair);
        Self {
            state: RegistryState {
                elements: BTreeMap::from([(root_id, root)]),
                root_id,
                cursor: Cursor::at(root_id),
                ids,
            },
            history: History::new(config.history_limit),
            config,
        }
    }

    // ---------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn root_id(&self) -> ElementId {
        self.state.root_id
    }

    pub fn current_id(&self) -> ElementId {
        self.state.cursor.current
    }

    pub fn path(&self) -> &[SlotPosition] {
        &self.state.cursor.path
    }

    pub fn cursor(&self) -> &Cursor {
        &self.state.cursor
    }

    /// Whether the cursor path still walks from the root to the current
    /// element. Clearing a slot the path runs through makes it stale.
    pub fn cursor_is_valid(&self) -> bool {
        self.state.cursor_is_valid()
    }

    pub fn id_allocator(&self) -> &IdAllocator {
        &self.state.ids
    }

    pub fn elements(&self) -> &BTreeMap<ElementId, Element> {
        &self.state.elements
    }

    pub fn len(&self) -> usize {
        self.state.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.elements.is_empty()
    }

    pub fn element(&self, id: ElementId) -> RegistryResult<&Element> {
        self.state.element(id)
    }

    /// The element under the cursor.
    pub fn current(&self) -> RegistryResult<&Element> {
        self.state.element(self.state.cursor.current)
    }

    pub fn find_by_name(&self, name: &str) -> Vec<&Element> {
        self.state
            .elements
            .values()
            .filter(|el| el.name == name)
            .collect()
    }

    pub fn list_elements(&self) -> Vec<ElementSummary> {
        self.state.elements.values().map(Element::summary).collect()
    }

    /// Every `(owner, slot)` that references `target`.
    pub fn incoming_refs(&self, target: ElementId) -> Vec<(ElementId, SlotPosition)> {
        self.state.incoming_refs(target)
    }

    pub fn reachable_from_root(&self) -> BTreeSet<ElementId> {
        self.state.reachable_from_root()
    }

    /// Elements no slot path reaches, and slots that point at missing ids.
    pub fn integrity_report(&self) -> IntegrityReport {
        IntegrityReport::scan(&self.state)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn list_history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    /// Index of the most recently applied delta.
    pub fn history_pointer(&self) -> Option<usize> {
        self.history.pointer()
    }

    // ---------------------------------------------------------------
    // Slots
    // ---------------------------------------------------------------

    /// Create an empty element of `kind` and link it into a slot of the
    /// current element. Returns the new id and the slot used.
    pub fn create_element(
        &mut self,
        kind: ElementKind,
        name: impl Into<String>,
        slot: Option<SlotPosition>,
    ) -> RegistryResult<(ElementId, SlotPosition)> {
        self.create_with_body(ElementBody::empty(kind), name, slot)
    }

    /// Create a table with the given columns.
    pub fn create_table<I, S>(
        &mut self,
        name: impl Into<String>,
        columns: I,
        slot: Option<SlotPosition>,
    ) -> RegistryResult<(ElementId, SlotPosition)>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = Table::with_columns(columns)?;
        self.create_with_body(ElementBody::Table(table), name, slot)
    }

    /// Create an element with a prepared body.
    pub fn create_with_body(
        &mut self,
        body: ElementBody,
        name: impl Into<String>,
        slot: Option<SlotPosition>,
    ) -> RegistryResult<(ElementId, SlotPosition)> {
        let parent_before = self.current()?.clone();
        let mut ids = self.state.ids.clone();
        let id = ids.allocate();

        let mut parent = parent_before.clone();
        let position = slots::place(&mut parent.refs, id, slot)?;
        let element = Element::new(id, name, body);
        debug!(%id, kind = %element.kind(), parent = %parent.id, position, "element created");

        let delta = Delta::new(DeltaAction::Create, Some(id), &self.state)
            .with_change(id, None, Some(element.clone()))
            .with_change(parent.id, Some(parent_before), Some(parent.clone()))
            .with_ids_after(ids.clone());
        self.state.elements.insert(id, element);
        self.state.elements.insert(parent.id, parent);
        self.state.ids = ids;
        self.history.push(delta);
        Ok((id, position))
    }

    /// Link an existing element into a slot of the current element.
    pub fn createref(
        &mut self,
        slot: Option<SlotPosition>,
        target: ElementId,
    ) -> RegistryResult<SlotPosition> {
        self.state.element(target)?;
        self.update_current(|el| slots::place(&mut el.refs, target, slot))
    }

    /// Point an occupied slot at a different element.
    pub fn updateref(&mut self, slot: SlotPosition, target: ElementId) -> RegistryResult<()> {
        let current = self.current()?;
        let old = slots::occupant(&current.refs, slot)?;
        self.state.element(target)?;
        if old != target {
            self.ensure_not_orphaned(current.id, slot, old)?;
        }
        self.update_current(|el| {
            el.refs[slot] = target;
            Ok(())
        })
    }

    /// Clear a slot. Fails unless the target stays referenced elsewhere.
    pub fn deleteref(&mut self, slot: SlotPosition) -> RegistryResult<()> {
        let current = self.current()?;
        let target = slots::occupant(&current.refs, slot)?;
        self.ensure_not_orphaned(current.id, slot, target)?;
        self.update_current(|el| {
            el.refs[slot] = ElementId::EMPTY;
            Ok(())
        })
    }

    /// Delete the leaf element in `slot`, clearing every reference to it.
    ///
    /// If the slot points at a missing element, the stale slot is cleared,
    /// that clear is logged, and [`RegistryError::DanglingReference`] is
    /// returned.
    pub fn delete(&mut self, slot: SlotPosition) -> RegistryResult<()> {
        let current = self.current()?;
        let target_id = slots::occupant(&current.refs, slot)?;
        if target_id == self.state.root_id {
            return Err(RegistryError::RootNotDeletable);
        }

        let Some(target) = self.state.elements.get(&target_id) else {
            warn!(position = slot, target = %target_id, "clearing dangling reference");
            self.update_current(|el| {
                el.refs[slot] = ElementId::EMPTY;
                Ok(())
            })?;
            return Err(RegistryError::DanglingReference {
                position: slot,
                target: target_id,
            });
        };
        if target.has_children() {
            return Err(RegistryError::HasChildren {
                target: target_id,
                children: target.child_count(),
            });
        }

        let owners: BTreeSet<ElementId> = self
            .state
            .incoming_refs(target_id)
            .into_iter()
            .map(|(owner, _)| owner)
            .collect();
        let mut ids = self.state.ids.clone();
        ids.release(target_id);

        let mut delta = Delta::new(DeltaAction::Delete, Some(target_id), &self.state)
            .with_change(target_id, Some(target.clone()), None);
        let mut updated = Vec::with_capacity(owners.len());
        for owner_id in owners {
            let before = self.state.element(owner_id)?.clone();
            let mut after = before.clone();
            for id in after.refs.iter_mut().filter(|id| **id == target_id) {
                *id = ElementId::EMPTY;
            }
            delta = delta.with_change(owner_id, Some(before), Some(after.clone()));
            updated.push(after);
        }
        let delta = delta.with_ids_after(ids.clone());

        debug!(target = %target_id, owners = updated.len(), "element deleted");
        self.state.elements.remove(&target_id);
        for el in updated {
            self.state.elements.insert(el.id, el);
        }
        self.state.ids = ids;
        self.history.push(delta);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    /// Move the cursor into the element held by `slot`.
    pub fn descend(&mut self, slot: SlotPosition) -> RegistryResult<ElementId> {
        let target = slots::occupant(&self.current()?.refs, slot)?;
        self.state.element(target)?;
        let mut cursor = self.state.cursor.clone();
        cursor.path.push(slot);
        cursor.current = target;
        self.move_cursor(cursor);
        Ok(target)
    }

    /// Move the cursor up one level, re-walking the remaining path from the
    /// root.
    pub fn ascend(&mut self) -> RegistryResult<ElementId> {
        let mut path = self.state.cursor.path.clone();
        if path.pop().is_none() {
            return Err(RegistryError::AtRoot);
        }
        let current = self
            .state
            .walk(&path)
            .map_err(|depth| RegistryError::InvalidPath { depth })?;
        self.move_cursor(Cursor { current, path });
        Ok(current)
    }

    fn move_cursor(&mut self, cursor: Cursor) {
        debug!(current = %cursor.current, depth = cursor.depth(), "cursor moved");
        let delta =
            Delta::new(DeltaAction::Update, None, &self.state).with_cursor_after(cursor.clone());
        self.state.cursor = cursor;
        self.history.push(delta);
    }

    // ---------------------------------------------------------------
    // Undo / redo
    // ---------------------------------------------------------------

    pub fn undo(&mut self) -> RegistryResult<()> {
        let delta = self.history.peek_undo().ok_or(RegistryError::NothingToUndo)?;
        delta.apply(&mut self.state, Side::Before)?;
        debug!(action = %delta.action, element = ?delta.element_id, "undo");
        self.history.mark_undone();
        Ok(())
    }

    pub fn redo(&mut self) -> RegistryResult<()> {
        let delta = self.history.peek_redo().ok_or(RegistryError::NothingToRedo)?;
        delta.apply(&mut self.state, Side::After)?;
        debug!(action = %delta.action, element = ?delta.element_id, "redo");
        self.history.mark_redone();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// Run `f` on a copy of the current element; install the copy and log an
    /// update only if `f` succeeds.
    pub(crate) fn update_current<T>(
        &mut self,
        f: impl FnOnce(&mut Element) -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        let before = self.current()?.clone();
        let mut after = before.clone();
        let out = f(&mut after)?;
        let id = before.id;
        let delta = Delta::new(DeltaAction::Update, Some(id), &self.state)
            .with_change(id, Some(before), Some(after.clone()));
        self.state.elements.insert(id, after);
        self.history.push(delta);
        Ok(out)
    }

    fn ensure_not_orphaned(
        &self,
        owner: ElementId,
        slot: SlotPosition,
        target: ElementId,
    ) -> RegistryResult<()> {
        if !self.state.elements.contains_key(&target) {
            return Ok(());
        }
        let others = self
            .state
            .incoming_refs(target)
            .into_iter()
            .filter(|&(id, pos)| !(id == owner && pos == slot))
            .count();
        if others == 0 {
            return Err(RegistryError::WouldOrphan { target });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<ElementId> {
        raw.iter().copied().map(ElementId::new).collect()
    }

    fn snapshot(reg: &ElementRegistry) -> RegistryState {
        reg.state.clone()
    }

    #[test]
    fn new_registry_has_root_kv() {
        let reg = ElementRegistry::new();
        let root = reg.current().unwrap();
        assert_eq!(root.id, ElementId::new(1));
        assert_eq!(root.kind(), ElementKind::KeyValuePair);
        assert_eq!(root.name, "root");
        assert!(reg.path().is_empty());
        assert!(!reg.can_undo());
    }

    #[test]
    fn create_element_links_into_current() {
        let mut reg = ElementRegistry::new();
        let (a, pos_a) = reg.create_element(ElementKind::Table, "a", None).unwrap();
        let (b, pos_b) = reg.create_element(ElementKind::Graph, "b", None).unwrap();
        assert_eq!((pos_a, pos_b), (0, 1));
        assert_eq!(reg.current().unwrap().refs, vec![a, b]);
        assert_eq!(reg.incoming_refs(b), vec![(reg.root_id(), 1)]);
        assert_eq!(reg.find_by_name("a")[0].id, a);
    }

    #[test]
    fn slot_stability_reuses_cleared_slot() {
        let mut reg = ElementRegistry::new();
        let (a, _) = reg.create_element(ElementKind::KeyValuePair, "a", None).unwrap();
        let (b, _) = reg.create_element(ElementKind::Table, "b", None).unwrap();
        let (c, _) = reg.create_element(ElementKind::Table, "c", None).unwrap();
        reg.descend(0).unwrap();
        reg.createref(None, b).unwrap();
        reg.ascend().unwrap();

        reg.deleteref(1).unwrap();
        assert_eq!(reg.current().unwrap().refs, vec![a, ElementId::EMPTY, c]);
        let (_, pos) = reg.create_element(ElementKind::Graph, "new", None).unwrap();
        assert_eq!(pos, 1);
        assert_eq!(reg.current().unwrap().refs.len(), 3);
    }

    #[test]
    fn explicit_slot_occupied_and_padding() {
        let mut reg = ElementRegistry::new();
        let (_, pos) = reg.create_element(ElementKind::Table, "t", Some(3)).unwrap();
        assert_eq!(pos, 3);
        assert_eq!(reg.current().unwrap().refs.len(), 4);
        let before = snapshot(&reg);
        let err = reg.create_element(ElementKind::Table, "u", Some(3)).unwrap_err();
        assert!(matches!(err, RegistryError::SlotOccupied { position: 3, .. }));
        assert_eq!(snapshot(&reg), before);
        assert_eq!(reg.list_history().len(), 1);
    }

    #[test]
    fn createref_requires_existing_target() {
        let mut reg = ElementRegistry::new();
        assert!(matches!(
            reg.createref(None, ElementId::new(42)),
            Err(RegistryError::UnknownElement(_))
        ));
        let (t, _) = reg.create_element(ElementKind::Table, "t", None).unwrap();
        assert_eq!(reg.createref(Some(4), t).unwrap(), 4);
        assert_eq!(reg.incoming_refs(t).len(), 2);
    }

    #[test]
    fn orphan_prevention() {
        let mut reg = ElementRegistry::new();
        let (a, _) = reg.create_element(ElementKind::KeyValuePair, "a", None).unwrap();
        let (t, _) = reg.create_element(ElementKind::Table, "t", Some(2)).unwrap();
        let before = snapshot(&reg);
        assert!(matches!(
            reg.deleteref(2),
            Err(RegistryError::WouldOrphan { target }) if target == t
        ));
        assert_eq!(snapshot(&reg), before);

        reg.descend(0).unwrap();
        assert_eq!(reg.current_id(), a);
        reg.createref(None, t).unwrap();
        reg.ascend().unwrap();
        reg.deleteref(2).unwrap();
        assert_eq!(reg.incoming_refs(t), vec![(a, 0)]);
    }

    #[test]
    fn deleteref_addressing_errors() {
        let mut reg = ElementRegistry::new();
        reg.create_element(ElementKind::Table, "t", Some(1)).unwrap();
        assert!(matches!(reg.deleteref(0), Err(RegistryError::SlotEmpty(0))));
        assert!(matches!(
            reg.deleteref(9),
            Err(RegistryError::SlotOutOfRange { position: 9, len: 2 })
        ));
    }

    #[test]
    fn updateref_retargets_slot() {
        let mut reg = ElementRegistry::new();
        let (a, _) = reg.create_element(ElementKind::Table, "a", None).unwrap();
        let (b, _) = reg.create_element(ElementKind::Table, "b", None).unwrap();
        // a is only referenced from slot 0.
        assert!(matches!(
            reg.updateref(0, b),
            Err(RegistryError::WouldOrphan { target }) if target == a
        ));
        reg.createref(None, a).unwrap();
        reg.updateref(0, b).unwrap();
        assert_eq!(reg.current().unwrap().refs, vec![b, b, a]);
        assert!(matches!(
            reg.updateref(0, ElementId::new(99)),
            Err(RegistryError::UnknownElement(_))
        ));
    }

    #[test]
    fn leaf_only_deletion_clears_all_incoming() {
        let mut reg = ElementRegistry::new();
        let (parent, _) = reg.create_element(ElementKind::Graph, "p", None).unwrap();
        reg.descend(0).unwrap();
        let (child, _) = reg.create_element(ElementKind::Table, "c", None).unwrap();
        reg.ascend().unwrap();
        reg.createref(None, child).unwrap();

        assert!(matches!(
            reg.delete(0),
            Err(RegistryError::HasChildren { target, children: 1 }) if target == parent
        ));

        // Delete the child from the root's slot; the parent's slot clears too.
        reg.delete(1).unwrap();
        assert!(reg.element(child).is_err());
        assert_eq!(reg.element(parent).unwrap().refs, vec![ElementId::EMPTY]);
        assert_eq!(reg.current().unwrap().refs, vec![parent, ElementId::EMPTY]);
        assert_eq!(reg.id_allocator().free_ids(), &[child.get()]);

        // Now the parent is a leaf.
        reg.delete(0).unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn delete_reuses_freed_id() {
        let mut reg = ElementRegistry::new();
        let (t, _) = reg.create_element(ElementKind::Table, "t", None).unwrap();
        reg.delete(0).unwrap();
        let (again, pos) = reg.create_element(ElementKind::Graph, "g", None).unwrap();
        assert_eq!((again, pos), (t, 0));
    }

    #[test]
    fn root_cannot_be_deleted() {
        let mut reg = ElementRegistry::new();
        let root = reg.root_id();
        reg.createref(None, root).unwrap();
        assert!(matches!(reg.delete(0), Err(RegistryError::RootNotDeletable)));
    }

    #[test]
    fn dangling_delete_clears_slot_and_logs() {
        let mut reg = ElementRegistry::new();
        let root = reg.root_id();
        reg.state.elements.get_mut(&root).unwrap().refs = ids(&[0, 33]);
        let err = reg.delete(1).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DanglingReference { position: 1, target } if target == ElementId::new(33)
        ));
        assert_eq!(reg.current().unwrap().refs, ids(&[0, 0]));
        assert_eq!(reg.list_history().len(), 1);
        reg.undo().unwrap();
        assert_eq!(reg.current().unwrap().refs, ids(&[0, 33]));
    }

    #[test]
    fn descend_and_ascend() {
        let mut reg = ElementRegistry::new();
        let root = reg.root_id();
        let (a, _) = reg.create_element(ElementKind::KeyValuePair, "a", Some(2)).unwrap();
        assert!(matches!(reg.ascend(), Err(RegistryError::AtRoot)));
        assert!(matches!(reg.descend(0), Err(RegistryError::SlotEmpty(0))));

        assert_eq!(reg.descend(2).unwrap(), a);
        let (b, _) = reg.create_element(ElementKind::Table, "b", None).unwrap();
        reg.descend(0).unwrap();
        assert_eq!(reg.current_id(), b);
        assert_eq!(reg.path(), &[2, 0]);

        assert_eq!(reg.ascend().unwrap(), a);
        assert_eq!(reg.ascend().unwrap(), root);
        assert!(reg.path().is_empty());
    }

    #[test]
    fn ascend_fails_fast_on_stale_path() {
        let mut reg = ElementRegistry::new();
        let root = reg.root_id();
        reg.create_element(ElementKind::KeyValuePair, "a", None).unwrap();
        reg.descend(0).unwrap();
        let (b, _) = reg.create_element(ElementKind::KeyValuePair, "b", None).unwrap();
        reg.descend(0).unwrap();
        assert_eq!(reg.current_id(), b);
        // Sever the first step of the path behind the cursor's back.
        reg.state.elements.get_mut(&root).unwrap().refs = vec![ElementId::EMPTY];
        let before = snapshot(&reg);
        assert!(matches!(
            reg.ascend(),
            Err(RegistryError::InvalidPath { depth: 0 })
        ));
        assert_eq!(snapshot(&reg), before);
    }

    #[test]
    fn undo_redo_inverse() {
        let mut reg = ElementRegistry::new();
        let start = snapshot(&reg);
        reg.create_element(ElementKind::Table, "t", None).unwrap();
        reg.create_element(ElementKind::Graph, "g", Some(3)).unwrap();
        reg.descend(3).unwrap();
        reg.ascend().unwrap();
        reg.delete(0).unwrap();
        let end = snapshot(&reg);

        for _ in 0..5 {
            reg.undo().unwrap();
        }
        assert_eq!(snapshot(&reg), start);
        assert!(matches!(reg.undo(), Err(RegistryError::NothingToUndo)));

        for _ in 0..5 {
            reg.redo().unwrap();
        }
        assert_eq!(snapshot(&reg), end);
        assert!(matches!(reg.redo(), Err(RegistryError::NothingToRedo)));
    }

    #[test]
    fn new_mutation_truncates_redo() {
        let mut reg = ElementRegistry::new();
        reg.create_element(ElementKind::Table, "a", None).unwrap();
        reg.create_element(ElementKind::Table, "b", None).unwrap();
        reg.create_element(ElementKind::Table, "c", None).unwrap();
        reg.undo().unwrap();
        reg.undo().unwrap();
        assert!(reg.can_redo());
        reg.create_element(ElementKind::Graph, "d", None).unwrap();
        assert!(matches!(reg.redo(), Err(RegistryError::NothingToRedo)));
        assert_eq!(reg.list_history().len(), 2);
    }

    #[test]
    fn history_limit_is_a_retention_cutoff() {
        let mut reg = ElementRegistry::with_config(RegistryConfig { history_limit: 2 });
        for name in ["a", "b", "c"] {
            reg.create_element(ElementKind::Table, name, None).unwrap();
        }
        reg.undo().unwrap();
        reg.undo().unwrap();
        assert!(matches!(reg.undo(), Err(RegistryError::NothingToUndo)));
        assert_eq!(reg.current().unwrap().child_count(), 1);
    }

    #[test]
    fn list_history_reports_actions() {
        let mut reg = ElementRegistry::new();
        let (t, _) = reg.create_element(ElementKind::Table, "t", None).unwrap();
        reg.descend(0).unwrap();
        let history = reg.list_history();
        assert_eq!(history[0].action, DeltaAction::Create);
        assert_eq!(history[0].element_id, Some(t));
        assert_eq!(history[1].element_id, None);
        assert_eq!(reg.history_pointer(), Some(1));
    }
}
