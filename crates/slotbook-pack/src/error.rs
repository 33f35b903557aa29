use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("file size {size} is not a multiple of the block size")]
    MisalignedSize { size: u64 },

    #[error("not a recognized container file (magic {found:?})")]
    UnrecognizedFile { found: String },

    #[error("unsupported container version: {0}")]
    UnsupportedVersion(u32),

    #[error("malformed super header: {0}")]
    MalformedHeader(String),

    #[error("malformed directory: {0}")]
    MalformedDirectory(String),

    #[error("item {id} references block {block}, outside the payload area (file has {total} blocks)")]
    BlockOutOfRange { id: u64, block: u64, total: u64 },

    #[error("duplicate item id in container: {0}")]
    DuplicateItem(u64),

    #[error("directory size did not converge after {passes} layout passes")]
    HeaderDidNotConverge { passes: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type PackResult<T> = Result<T, PackError>;
