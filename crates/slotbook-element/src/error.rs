use thiserror::Error;

/// Errors from element-level mutations and queries.
///
/// Every mutator validates its inputs and returns one of these before touching
/// any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("unknown element kind: {0}")]
    UnknownKind(String),

    #[error("column already exists: {0}")]
    ColumnExists(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("column {0} is not a list column")]
    NotAListColumn(String),

    #[error("list column {column} requires a sequence, found {found}")]
    NotASequence { column: String, found: &'static str },

    #[error("row {row} out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("list index {index} out of range (cell has {len} items)")]
    ListIndexOutOfRange { index: usize, len: usize },

    #[error("wrong number of values: expected {expected}, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("node already exists: {0}")]
    NodeExists(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("no edge from {from} to {to}")]
    UnknownEdge { from: String, to: String },

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("{0} is not indexed")]
    NotIndexed(String),
}

/// Result alias for element operations.
pub type ElementResult<T> = Result<T, ElementError>;
