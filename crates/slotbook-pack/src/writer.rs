use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::directory::{blocks_for, Directory, DirectoryEntry};
use crate::error::{PackError, PackResult};
use crate::header::SuperHeader;
use crate::{PackItem, BLOCK_SIZE, MAX_LAYOUT_PASSES};

/// Result of writing a container to disk.
#[derive(Clone, Debug)]
pub struct PackFile {
    pub path: PathBuf,
    pub item_count: usize,
    pub header_blocks: u64,
    pub total_blocks: u64,
}

/// A fully laid-out container, ready to be written block by block.
struct Layout {
    header_blocks: u64,
    directory_bytes: Vec<u8>,
    directory: Directory,
}

/// Builds a container from opaque items.
pub struct PackWriter {
    items: Vec<PackItem>,
    max_passes: usize,
}

impl Default for PackWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PackWriter {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            max_passes: MAX_LAYOUT_PASSES,
        }
    }

    /// Override the layout pass bound.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    /// Queue an item. Items are laid out in insertion order.
    pub fn add_item(&mut self, id: u64, kind: impl Into<String>, payload: Vec<u8>) {
        self.items.push(PackItem {
            id,
            kind: kind.into(),
            payload,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Write the container to `path`.
    pub fn finish(self, path: &Path) -> PackResult<PackFile> {
        let item_count = self.items.len();
        let (bytes, header_blocks) = self.build()?;
        let total_blocks = (bytes.len() / BLOCK_SIZE) as u64;
        {
            let mut out = BufWriter::new(File::create(path)?);
            out.write_all(&bytes)?;
            out.flush()?;
        }
        debug!(path = %path.display(), item_count, total_blocks, "container written");
        Ok(PackFile {
            path: path.to_path_buf(),
            item_count,
            header_blocks,
            total_blocks,
        })
    }

    /// Build the container in memory.
    pub fn finish_to_bytes(self) -> PackResult<Vec<u8>> {
        self.build().map(|(bytes, _)| bytes)
    }

    fn build(self) -> PackResult<(Vec<u8>, u64)> {
        let mut seen = BTreeSet::new();
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(PackError::DuplicateItem(item.id));
            }
        }

        let layout = self.layout()?;
        let payload_blocks: u64 = layout
            .directory
            .entries()
            .iter()
            .map(|e| e.blocks.len() as u64)
            .sum();
        let total_blocks = 1 + layout.header_blocks + payload_blocks;
        let mut bytes = Vec::with_capacity(total_blocks as usize * BLOCK_SIZE);

        bytes.extend(SuperHeader::current(layout.header_blocks).to_block()?);
        push_padded(&mut bytes, &layout.directory_bytes, layout.header_blocks);

        // Payload blocks are assigned contiguously in item order, so writing
        // items sequentially matches their absolute indices.
        for (item, entry) in self.items.iter().zip(layout.directory.entries()) {
            debug_assert_eq!(
                bytes.len() as u64 / BLOCK_SIZE as u64,
                entry.blocks.first().copied().unwrap_or_default()
            );
            push_padded(&mut bytes, &item.payload, entry.blocks.len() as u64);
        }

        Ok((bytes, layout.header_blocks))
    }

    /// Solve for the directory size. The directory records absolute payload
    /// block indices, which shift with the number of blocks the directory
    /// itself occupies.
    fn layout(&self) -> PackResult<Layout> {
        let mut header_blocks = 1u64;
        for pass in 1..=self.max_passes {
            let mut next = 1 + header_blocks;
            let entries = self
                .items
                .iter()
                .map(|item| {
                    let count = blocks_for(item.payload.len());
                    let entry = DirectoryEntry {
                        id: item.id,
                        kind: item.kind.clone(),
                        blocks: (next..next + count).collect(),
                        size: item.payload.len() as u64,
                    };
                    next += count;
                    entry
                })
                .collect();
            let directory = Directory::new(entries);
            let directory_bytes = directory.encode()?;
            let needed = blocks_for(directory_bytes.len());
            debug!(pass, header_blocks, needed, "container layout pass");
            if needed == header_blocks {
                return Ok(Layout {
                    header_blocks,
                    directory_bytes,
                    directory,
                });
            }
            header_blocks = needed;
        }
        Err(PackError::HeaderDidNotConverge {
            passes: self.max_passes,
        })
    }
}

/// Append `data` split into `blocks` zero-padded blocks.
fn push_padded(out: &mut Vec<u8>, data: &[u8], blocks: u64) {
    let start = out.len();
    out.extend_from_slice(data);
    out.resize(start + blocks as usize * BLOCK_SIZE, 0);
}
