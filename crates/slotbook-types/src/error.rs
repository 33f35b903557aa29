use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid pointer literal {literal:?}: {reason}")]
    InvalidPointerLiteral { literal: String, reason: String },

    #[error("invalid element id: {0}")]
    InvalidElementId(String),
}
