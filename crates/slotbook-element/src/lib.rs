//! Element variants for slotbook.
//!
//! An [`Element`] is a shared header (`id`, `name`, slot array `refs`) plus
//! one [`ElementBody`] variant:
//!
//! - [`Table`] -- ordered columns and rows, list columns, column indexes
//! - [`Graph`] -- adjacency map of nodes and edges, attribute indexes
//! - [`KeyValuePair`] -- key to value map, indexed keys
//!
//! # Design Rules
//!
//! 1. Mutators are pure transformations of the variant's own state.
//! 2. Every mutator validates before it changes anything.
//! 3. Derived index maps are caches. They are never serialized and are
//!    rebuilt wholesale from primary data after each change and on decode.

pub mod element;
pub mod error;
pub mod graph;
pub mod kv;
pub mod table;

pub use element::{Element, ElementBody, ElementKind, ElementSummary, ResolvedIndex};
pub use error::{ElementError, ElementResult};
pub use graph::{Attrs, Graph, Node, NodeIndex};
pub use kv::KeyValuePair;
pub use table::{RowIndex, Table};
