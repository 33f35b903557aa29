//! Foundation types for slotbook.
//!
//! This crate provides the identifiers and the closed value model shared by
//! every other slotbook crate. Everything that is persisted or recorded in the
//! delta log is built from these types.
//!
//! # Key Types
//!
//! - [`ElementId`]: Registry-issued element identifier; `0` is the empty slot
//! - [`SlotPosition`]: Index into an element's reference array
//! - [`Value`]: Closed tagged union of storable scalars and composites
//! - [`IndexPointer`]: Typed reference to another element's indexed key

pub mod error;
pub mod id;
pub mod pointer;
pub mod value;

pub use error::TypeError;
pub use id::{ElementId, SlotPosition};
pub use pointer::IndexPointer;
pub use value::{Row, Value, MAX_VALUE_DEPTH};
