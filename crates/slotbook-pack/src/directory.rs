use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};
use crate::header::trim_padding;
use crate::BLOCK_SIZE;

/// Where one item's payload lives: absolute block indices plus the exact
/// payload length in bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: u64,
    pub kind: String,
    pub blocks: Vec<u64>,
    pub size: u64,
}

/// The directory stored in the header blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Highest block index referenced by any entry.
    pub fn last_block(&self) -> Option<u64> {
        self.entries
            .iter()
            .flat_map(|e| e.blocks.iter().copied())
            .max()
    }

    pub fn encode(&self) -> PackResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| PackError::Serialization(e.to_string()))
    }

    /// Decode directory bytes read from the header blocks.
    pub fn decode(bytes: &[u8]) -> PackResult<Self> {
        let dir: Directory = serde_json::from_slice(trim_padding(bytes))
            .map_err(|e| PackError::MalformedDirectory(e.to_string()))?;
        for entry in &dir.entries {
            let capacity = entry.blocks.len() as u64 * BLOCK_SIZE as u64;
            if entry.size > capacity {
                return Err(PackError::MalformedDirectory(format!(
                    "item {} declares {} bytes but only {} blocks",
                    entry.id,
                    entry.size,
                    entry.blocks.len()
                )));
            }
        }
        Ok(dir)
    }
}

/// Blocks needed for `len` bytes. Every record occupies at least one block.
pub fn blocks_for(len: usize) -> u64 {
    len.div_ceil(BLOCK_SIZE).max(1) as u64
}
