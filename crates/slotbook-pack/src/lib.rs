//! Fixed-block container format for slotbook.
//!
//! A container is a sequence of [`BLOCK_SIZE`]-byte blocks:
//!
//! - **Block 0**: the [`SuperHeader`] (magic, version, directory block count)
//! - **Blocks 1..=N**: the [`Directory`], one entry per item with its kind tag,
//!   absolute payload block indices, and exact payload length
//! - **Remaining blocks**: each item's payload, zero-padded to a block boundary
//!
//! The directory stores absolute block indices, so its encoded size depends on
//! where the payload area starts, which in turn depends on the directory size.
//! [`PackWriter`] solves this by fixed-point iteration, bounded by
//! [`MAX_LAYOUT_PASSES`].
//!
//! Items are opaque to this crate: an id, a kind tag, and payload bytes.

pub mod directory;
pub mod error;
pub mod header;
pub mod reader;
pub mod writer;

pub use directory::{blocks_for, Directory, DirectoryEntry};
pub use error::{PackError, PackResult};
pub use header::SuperHeader;
pub use reader::PackReader;
pub use writer::{PackFile, PackWriter};

/// Size of every block in a container, in bytes.
pub const BLOCK_SIZE: usize = 1024;

/// Magic tag stored in the super header.
pub const MAGIC: &str = "SLOTBOOK";

/// Current container format version.
pub const FORMAT_VERSION: u32 = 1;

/// Upper bound on directory layout passes before giving up.
pub const MAX_LAYOUT_PASSES: usize = 16;

/// One stored item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackItem {
    pub id: u64,
    pub kind: String,
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_writer() -> PackWriter {
        let mut writer = PackWriter::new();
        writer.add_item(0, "meta", br#"{"root_id":1}"#.to_vec());
        writer.add_item(1, "KeyValuePair", br#"{"store":{}}"#.to_vec());
        writer.add_item(2, "Table", vec![b'r'; 3 * BLOCK_SIZE + 1]);
        writer
    }

    #[test]
    fn write_read_roundtrip() {
        let bytes = sample_writer().finish_to_bytes().unwrap();
        assert_eq!(bytes.len() % BLOCK_SIZE, 0);

        let reader = PackReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.header(), &SuperHeader::current(1));
        assert_eq!(reader.items().len(), 3);
        assert_eq!(reader.item(0).unwrap().payload, br#"{"root_id":1}"#);
        assert_eq!(reader.item(2).unwrap().payload.len(), 3 * BLOCK_SIZE + 1);
        assert_eq!(reader.directory().get(2).unwrap().blocks, vec![4, 5, 6, 7]);
    }

    #[test]
    fn multi_block_directory_roundtrip() {
        let mut writer = PackWriter::new();
        for id in 0..300u64 {
            writer.add_item(id, "Graph", format!("payload-{id}").into_bytes());
        }
        let bytes = writer.finish_to_bytes().unwrap();
        let reader = PackReader::from_bytes(&bytes).unwrap();
        assert!(reader.header().header_blocks > 1);
        assert_eq!(reader.items().len(), 300);
        assert_eq!(reader.item(299).unwrap().payload, b"payload-299");
    }

    #[test]
    fn disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.slot");
        let file = sample_writer().finish(&path).unwrap();
        assert_eq!(file.item_count, 3);
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            file.total_blocks * BLOCK_SIZE as u64
        );

        let reader = PackReader::open(&path).unwrap();
        assert_eq!(reader.into_items().len(), 3);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PackReader::open(&dir.path().join("absent.slot")).unwrap_err();
        assert!(matches!(err, PackError::FileNotFound(_)));
    }

    #[test]
    fn misaligned_size_rejected() {
        let mut bytes = sample_writer().finish_to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            PackReader::from_bytes(&bytes),
            Err(PackError::MisalignedSize { .. })
        ));
    }

    #[test]
    fn truncated_file_rejected() {
        let bytes = sample_writer().finish_to_bytes().unwrap();
        let cut = &bytes[..bytes.len() - BLOCK_SIZE];
        assert!(matches!(
            PackReader::from_bytes(cut),
            Err(PackError::BlockOutOfRange { id: 2, .. })
        ));
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = sample_writer().finish_to_bytes().unwrap();
        let mut header = SuperHeader::current(1);
        header.magic = "NOTABOOK".into();
        bytes[..BLOCK_SIZE].copy_from_slice(&header.to_block().unwrap());
        assert!(matches!(
            PackReader::from_bytes(&bytes),
            Err(PackError::UnrecognizedFile { .. })
        ));
    }

    #[test]
    fn oversized_header_count_rejected() {
        let mut bytes = sample_writer().finish_to_bytes().unwrap();
        let total = (bytes.len() / BLOCK_SIZE) as u64;
        for declared in [u64::MAX, u64::MAX - 1, total] {
            let header = SuperHeader::current(declared);
            bytes[..BLOCK_SIZE].copy_from_slice(&header.to_block().unwrap());
            assert!(matches!(
                PackReader::from_bytes(&bytes),
                Err(PackError::MalformedHeader(_))
            ));
        }
    }
}
