use serde::{Deserialize, Serialize};

use crate::error::{PackError, PackResult};
use crate::{BLOCK_SIZE, FORMAT_VERSION, MAGIC};

/// Contents of block 0: magic tag, format version, and the number of
/// directory blocks that follow it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperHeader {
    pub magic: String,
    pub version: u32,
    pub header_blocks: u64,
}

impl SuperHeader {
    /// Super header for the current format.
    pub fn current(header_blocks: u64) -> Self {
        Self {
            magic: MAGIC.to_string(),
            version: FORMAT_VERSION,
            header_blocks,
        }
    }

    /// Encode as one zero-padded block.
    pub fn to_block(&self) -> PackResult<Vec<u8>> {
        let mut block =
            serde_json::to_vec(self).map_err(|e| PackError::Serialization(e.to_string()))?;
        if block.len() > BLOCK_SIZE {
            return Err(PackError::Serialization(format!(
                "super header is {} bytes, larger than one block",
                block.len()
            )));
        }
        block.resize(BLOCK_SIZE, 0);
        Ok(block)
    }

    /// Decode block 0, checking magic and version.
    pub fn from_block(block: &[u8]) -> PackResult<Self> {
        let text = trim_padding(block);
        let header: SuperHeader = serde_json::from_slice(text).map_err(|e| {
            if text.starts_with(b"{") {
                PackError::MalformedHeader(e.to_string())
            } else {
                PackError::UnrecognizedFile {
                    found: String::from_utf8_lossy(&text[..text.len().min(16)]).into_owned(),
                }
            }
        })?;
        if header.magic != MAGIC {
            return Err(PackError::UnrecognizedFile {
                found: header.magic,
            });
        }
        if header.version != FORMAT_VERSION {
            return Err(PackError::UnsupportedVersion(header.version));
        }
        if header.header_blocks == 0 {
            return Err(PackError::MalformedHeader(
                "header_blocks must be at least 1".into(),
            ));
        }
        Ok(header)
    }
}

/// Strip the zero padding that fills out the final block of a record.
pub(crate) fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}
