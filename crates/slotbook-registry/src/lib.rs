//! Element registry for slotbook.
//!
//! [`ElementRegistry`] owns a rooted hierarchy of elements linked through
//! stable positional slots. It enforces reference integrity by full-graph
//! scans, keeps a cursor into the hierarchy, records every successful
//! mutation as an invertible [`Delta`], and persists the whole graph to the
//! fixed-block container from `slotbook-pack`.
//!
//! # Guarantees
//!
//! - A failed call leaves elements, cursor, id allocator, and history as they
//!   were. The one exception is `delete` on a dangling slot, which clears the
//!   slot before returning [`RegistryError::DanglingReference`].
//! - Slots are never renumbered. Emptied slots stay in place as id `0`.
//! - N successful calls are undone by N calls to `undo`, and redone by N
//!   calls to `redo`.
//! - Loading replaces the registry wholesale and clears history.

pub mod config;
pub mod cursor;
pub mod delta;
pub mod error;
pub mod history;
pub mod ids;
pub mod integrity;
mod mutators;
pub mod persist;
mod pointer;
pub mod registry;
mod slots;
mod state;

pub use config::{RegistryConfig, DEFAULT_HISTORY_LIMIT};
pub use cursor::Cursor;
pub use delta::{Delta, DeltaAction, ElementChange};
pub use error::{RegistryError, RegistryResult};
pub use history::HistoryEntry;
pub use ids::IdAllocator;
pub use integrity::{DanglingSlot, IntegrityReport};
pub use persist::{META_ITEM_ID, META_KIND};
pub use registry::ElementRegistry;
