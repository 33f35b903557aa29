//! Whole-registry save and load through the block container.
//!
//! Each element is one container item (id = element id, kind = variant tag,
//! payload = JSON). Registry-level state travels in a `meta` item stored
//! under the reserved id `0`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use slotbook_element::{Element, ElementKind};
use slotbook_pack::{PackItem, PackReader, PackWriter};
use slotbook_types::{ElementId, SlotPosition, MAX_VALUE_DEPTH};
use tracing::{info, warn};

use crate::cursor::Cursor;
use crate::error::{RegistryError, RegistryResult};
use crate::ids::IdAllocator;
use crate::registry::ElementRegistry;
use crate::state::RegistryState;

/// Directory id of the registry metadata item.
pub const META_ITEM_ID: u64 = 0;

/// Directory kind tag of the registry metadata item.
pub const META_KIND: &str = "meta";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct RegistryMeta {
    root_id: ElementId,
    current_element_id: ElementId,
    #[serde(default)]
    path_stack: Vec<SlotPosition>,
    next_id: u64,
    #[serde(default)]
    free_ids: Vec<u64>,
}

impl ElementRegistry {
    /// Write the full registry to `path`, replacing any existing file.
    pub fn save_to_file(&self, path: &Path) -> RegistryResult<()> {
        let writer = self.pack_writer()?;
        let file = writer.finish(path)?;
        info!(
            path = %path.display(),
            elements = self.len(),
            blocks = file.total_blocks,
            "registry saved"
        );
        Ok(())
    }

    /// Encode the full registry as container bytes.
    pub fn encode(&self) -> RegistryResult<Vec<u8>> {
        Ok(self.pack_writer()?.finish_to_bytes()?)
    }

    /// Replace the whole registry with the contents of `path`. History is
    /// cleared. On error the registry is left as it was.
    pub fn load_from_file(&mut self, path: &Path) -> RegistryResult<()> {
        let reader = PackReader::open(path)?;
        let state = decode_state(reader.into_items())?;
        info!(path = %path.display(), elements = state.elements.len(), "registry loaded");
        self.install(state);
        Ok(())
    }

    /// Replace the whole registry with decoded container bytes.
    pub fn decode_into(&mut self, bytes: &[u8]) -> RegistryResult<()> {
        let reader = PackReader::from_bytes(bytes)?;
        let state = decode_state(reader.into_items())?;
        self.install(state);
        Ok(())
    }

    /// A fresh registry decoded from container bytes.
    pub fn decode(bytes: &[u8]) -> RegistryResult<Self> {
        let mut reg = Self::new();
        reg.decode_into(bytes)?;
        Ok(reg)
    }

    /// A fresh registry loaded from `path`.
    pub fn open(path: &Path) -> RegistryResult<Self> {
        let mut reg = Self::new();
        reg.load_from_file(path)?;
        Ok(reg)
    }

    fn install(&mut self, state: RegistryState) {
        self.state = state;
        self.history.clear();
    }

    fn pack_writer(&self) -> RegistryResult<PackWriter> {
        if let Some(el) = self.state.elements.values().find(|el| !el.is_finite()) {
            return Err(RegistryError::UnrepresentableValue(el.id));
        }
        if let Some(el) = self
            .state
            .elements
            .values()
            .find(|el| el.max_value_depth() > MAX_VALUE_DEPTH)
        {
            return Err(RegistryError::ValueTooDeep {
                id: el.id,
                depth: el.max_value_depth(),
                max: MAX_VALUE_DEPTH,
            });
        }

        let meta = RegistryMeta {
            root_id: self.state.root_id,
            current_element_id: self.state.cursor.current,
            path_stack: self.state.cursor.path.clone(),
            next_id: self.state.ids.next_id(),
            free_ids: self.state.ids.free_ids().to_vec(),
        };
        let mut writer = PackWriter::new();
        writer.add_item(META_ITEM_ID, META_KIND, to_payload(META_ITEM_ID, &meta)?);
        for (id, el) in &self.state.elements {
            writer.add_item(id.get(), el.kind().tag(), to_payload(id.get(), el)?);
        }
        Ok(writer)
    }
}

fn to_payload<T: Serialize>(id: u64, value: &T) -> RegistryResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| RegistryError::MalformedPayload {
        id,
        reason: e.to_string(),
    })
}

fn decode_state(items: Vec<PackItem>) -> RegistryResult<RegistryState> {
    let mut meta = None;
    let mut elements = BTreeMap::new();

    for item in items {
        let malformed = |reason: String| RegistryError::MalformedPayload {
            id: item.id,
            reason,
        };
        if item.id == META_ITEM_ID {
            if item.kind != META_KIND {
                return Err(malformed(format!("reserved id 0 has kind {}", item.kind)));
            }
            let decoded: RegistryMeta =
                serde_json::from_slice(&item.payload).map_err(|e| malformed(e.to_string()))?;
            meta = Some(decoded);
            continue;
        }

        let el: Element =
            serde_json::from_slice(&item.payload).map_err(|e| malformed(e.to_string()))?;
        if el.id.get() != item.id {
            return Err(malformed(format!("payload carries element id {}", el.id)));
        }
        if ElementKind::from_tag(&item.kind) != Some(el.kind()) {
            return Err(malformed(format!(
                "directory kind {} does not match payload kind {}",
                item.kind,
                el.kind()
            )));
        }
        elements.insert(el.id, el);
    }

    let meta = meta.ok_or(RegistryError::MalformedPayload {
        id: META_ITEM_ID,
        reason: "missing registry metadata".into(),
    })?;
    if !elements.contains_key(&meta.root_id) {
        return Err(RegistryError::MalformedPayload {
            id: META_ITEM_ID,
            reason: format!("root element {} is not stored", meta.root_id),
        });
    }
    if let Some(&id) = elements.keys().find(|id| id.get() >= meta.next_id) {
        return Err(RegistryError::MalformedPayload {
            id: id.get(),
            reason: format!("element id is not below next_id {}", meta.next_id),
        });
    }

    let ids = IdAllocator::from_parts(
        meta.next_id,
        meta.free_ids
            .into_iter()
            .filter(|id| !elements.contains_key(&ElementId::new(*id)))
            .collect(),
    );
    let mut state = RegistryState {
        elements,
        root_id: meta.root_id,
        cursor: Cursor {
            current: meta.current_element_id,
            path: meta.path_stack,
        },
        ids,
    };
    if !state.cursor_is_valid() {
        warn!(
            current = %state.cursor.current,
            path = ?state.cursor.path,
            "stored cursor does not walk from the root; resetting to root"
        );
        state.cursor = Cursor::at(state.root_id);
    }
    Ok(state)
}
