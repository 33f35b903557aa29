use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::directory::Directory;
use crate::error::{PackError, PackResult};
use crate::header::SuperHeader;
use crate::{PackItem, BLOCK_SIZE};

/// A decoded container: super header, directory, and every item's payload.
#[derive(Debug)]
pub struct PackReader {
    header: SuperHeader,
    directory: Directory,
    items: Vec<PackItem>,
}

impl PackReader {
    /// Open and decode a container file. The file handle is closed before
    /// this returns, on success and on every error path.
    pub fn open(path: &Path) -> PackResult<Self> {
        if !path.exists() {
            return Err(PackError::FileNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let pack = Self::read_from(&mut reader, size)?;
        debug!(
            path = %path.display(),
            items = pack.items.len(),
            header_blocks = pack.header.header_blocks,
            "container read"
        );
        Ok(pack)
    }

    /// Decode a container held in memory.
    pub fn from_bytes(bytes: &[u8]) -> PackResult<Self> {
        let size = bytes.len() as u64;
        Self::read_from(&mut Cursor::new(bytes), size)
    }

    /// Decode from any seekable source of `size` bytes.
    pub fn read_from<R: Read + Seek>(reader: &mut R, size: u64) -> PackResult<Self> {
        let block = BLOCK_SIZE as u64;
        if size == 0 || size % block != 0 {
            return Err(PackError::MisalignedSize { size });
        }
        let total = size / block;

        let mut buf = vec![0u8; BLOCK_SIZE];
        reader.seek(SeekFrom::Start(0))?;
        reader.read_exact(&mut buf)?;
        let header = SuperHeader::from_block(&buf)?;
        let payload_start = header
            .header_blocks
            .checked_add(1)
            .filter(|&end| end <= total)
            .ok_or_else(|| {
                PackError::MalformedHeader(format!(
                    "{} directory blocks declared but file has {} blocks",
                    header.header_blocks, total
                ))
            })?;

        // Bounded by the file size checked above.
        let mut dir_bytes = vec![0u8; (payload_start - 1) as usize * BLOCK_SIZE];
        reader.read_exact(&mut dir_bytes)?;
        let directory = Directory::decode(&dir_bytes)?;

        let mut seen = BTreeSet::new();
        let mut items = Vec::with_capacity(directory.len());
        for entry in directory.entries() {
            if !seen.insert(entry.id) {
                return Err(PackError::DuplicateItem(entry.id));
            }
            let mut payload = Vec::with_capacity(entry.blocks.len() * BLOCK_SIZE);
            for &index in &entry.blocks {
                if index < payload_start || index >= total {
                    return Err(PackError::BlockOutOfRange {
                        id: entry.id,
                        block: index,
                        total,
                    });
                }
                reader.seek(SeekFrom::Start(index * block))?;
                reader.read_exact(&mut buf)?;
                payload.extend_from_slice(&buf);
            }
            payload.truncate(entry.size as usize);
            items.push(PackItem {
                id: entry.id,
                kind: entry.kind.clone(),
                payload,
            });
        }

        Ok(Self {
            header,
            directory,
            items,
        })
    }

    pub fn header(&self) -> &SuperHeader {
        &self.header
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn items(&self) -> &[PackItem] {
        &self.items
    }

    pub fn item(&self, id: u64) -> Option<&PackItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn into_items(self) -> Vec<PackItem> {
        self.items
    }
}
