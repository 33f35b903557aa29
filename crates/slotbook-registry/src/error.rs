use slotbook_element::{ElementError, ElementKind};
use slotbook_pack::PackError;
use slotbook_types::{ElementId, IndexPointer, SlotPosition};
use thiserror::Error;

/// Errors produced by registry operations.
///
/// Apart from [`RegistryError::DanglingReference`], a call that returns an
/// error has left elements, cursor, id allocator, and history unchanged.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no such element: {0}")]
    UnknownElement(ElementId),

    #[error("slot {position} out of range (element has {len} slots)")]
    SlotOutOfRange { position: SlotPosition, len: usize },

    #[error("slot {position} already occupied by element {occupant}")]
    SlotOccupied {
        position: SlotPosition,
        occupant: ElementId,
    },

    #[error("slot {0} is empty")]
    SlotEmpty(SlotPosition),

    #[error("clearing this reference would orphan element {target}")]
    WouldOrphan { target: ElementId },

    #[error("element {target} still has {children} occupied slots")]
    HasChildren { target: ElementId, children: usize },

    #[error("slot {position} referenced missing element {target}; the slot has been cleared")]
    DanglingReference {
        position: SlotPosition,
        target: ElementId,
    },

    #[error("the root element cannot be deleted")]
    RootNotDeletable,

    #[error("already at root")]
    AtRoot,

    #[error("cursor path is stale at depth {depth}")]
    InvalidPath { depth: usize },

    #[error("expected a {expected} element, found {found}")]
    WrongVariant {
        expected: ElementKind,
        found: ElementKind,
    },

    #[error(transparent)]
    Element(#[from] ElementError),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    #[error("invalid index pointer: {0}")]
    InvalidPointer(IndexPointer),

    #[error("container error: {0}")]
    Pack(#[from] PackError),

    #[error("malformed payload for item {id}: {reason}")]
    MalformedPayload { id: u64, reason: String },

    #[error("element {0} holds a non-finite float, which cannot be saved")]
    UnrepresentableValue(ElementId),

    #[error("element {id} holds a value nested {depth} levels deep (limit {max})")]
    ValueTooDeep {
        id: ElementId,
        depth: usize,
        max: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
