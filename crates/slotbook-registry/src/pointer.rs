//! Cross-element pointer validation and resolution.

use slotbook_element::ResolvedIndex;
use slotbook_types::IndexPointer;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::ElementRegistry;

impl ElementRegistry {
    /// Whether `pointer` names a live element with that key indexed.
    pub fn validate_pointer(&self, pointer: &IndexPointer) -> bool {
        self.state
            .elements
            .get(&pointer.target_element_id)
            .is_some_and(|el| el.has_index_key(&pointer.index_key))
    }

    /// The target's derived index for the pointer's key.
    pub fn resolve_pointer(&self, pointer: &IndexPointer) -> RegistryResult<ResolvedIndex> {
        self.state
            .elements
            .get(&pointer.target_element_id)
            .and_then(|el| el.resolve_index(&pointer.index_key))
            .ok_or_else(|| RegistryError::InvalidPointer(pointer.clone()))
    }
}
