use serde::{Deserialize, Serialize};
use slotbook_types::ElementId;

/// Issues element ids. Freed ids are reused, most recently freed first,
/// before the counter advances. Id `0` is never issued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next_id: u64,
    #[serde(default)]
    free_ids: Vec<u64>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_id: 1,
            free_ids: Vec::new(),
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted state. `next_id` is clamped to at least 1 and
    /// zero or out-of-range entries in the free pool are dropped.
    pub fn from_parts(next_id: u64, free_ids: Vec<u64>) -> Self {
        let next_id = next_id.max(1);
        let mut free: Vec<u64> = Vec::with_capacity(free_ids.len());
        for id in free_ids {
            if id != 0 && id < next_id && !free.contains(&id) {
                free.push(id);
            }
        }
        Self {
            next_id,
            free_ids: free,
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn free_ids(&self) -> &[u64] {
        &self.free_ids
    }

    pub fn allocate(&mut self) -> ElementId {
        if let Some(id) = self.free_ids.pop() {
            return ElementId::new(id);
        }
        let id = self.next_id;
        self.next_id += 1;
        ElementId::new(id)
    }

    /// Return `id` to the pool.
    pub fn release(&mut self, id: ElementId) {
        let raw = id.get();
        if raw == 0 || raw >= self.next_id || self.free_ids.contains(&raw) {
            return;
        }
        self.free_ids.push(raw);
    }

    /// Whether `id` has been issued and not released.
    pub fn is_issued(&self, id: ElementId) -> bool {
        let raw = id.get();
        raw != 0 && raw < self.next_id && !self.free_ids.contains(&raw)
    }
}
