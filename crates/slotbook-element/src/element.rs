//! The shared element header and the closed set of element variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use slotbook_types::{ElementId, SlotPosition, Value};

use crate::error::ElementError;
use crate::graph::{Graph, NodeIndex};
use crate::kv::KeyValuePair;
use crate::table::{RowIndex, Table};

/// Variant tag of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    Table,
    Graph,
    KeyValuePair,
}

impl ElementKind {
    /// Tag written to container directories.
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Table => "Table",
            ElementKind::Graph => "Graph",
            ElementKind::KeyValuePair => "KeyValuePair",
        }
    }

    /// Parse a tag or one of the short aliases (`table`, `graph`, `kv`,
    /// `kvp`), case-insensitively.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "table" => Some(ElementKind::Table),
            "graph" => Some(ElementKind::Graph),
            "keyvaluepair" | "kvp" | "kv" => Some(ElementKind::KeyValuePair),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ElementKind {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| ElementError::UnknownKind(s.to_string()))
    }
}

/// Variant-specific element state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementBody {
    Table(Table),
    Graph(Graph),
    KeyValuePair(KeyValuePair),
}

impl ElementBody {
    /// An empty body of the given kind.
    pub fn empty(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Table => ElementBody::Table(Table::new()),
            ElementKind::Graph => ElementBody::Graph(Graph::new()),
            ElementKind::KeyValuePair => ElementBody::KeyValuePair(KeyValuePair::new()),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ElementBody::Table(_) => ElementKind::Table,
            ElementBody::Graph(_) => ElementKind::Graph,
            ElementBody::KeyValuePair(_) => ElementKind::KeyValuePair,
        }
    }
}

/// The derived index a pointer resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedIndex {
    /// Column value to row positions.
    Rows(RowIndex),
    /// Attribute value to node ids.
    Nodes(NodeIndex),
    /// The single indexed key and its current value.
    Entry { key: String, value: Value },
}

/// An element owned by the registry.
///
/// `refs` is the element's slot array: each entry is either
/// [`ElementId::EMPTY`] or the id of a live element. Slots are never
/// renumbered; emptied slots stay in place as `EMPTY`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    #[serde(default)]
    pub refs: Vec<ElementId>,
    pub body: ElementBody,
}

impl Element {
    pub fn new(id: ElementId, name: impl Into<String>, body: ElementBody) -> Self {
        Self {
            id,
            name: name.into(),
            refs: Vec::new(),
            body,
        }
    }

    /// An element with an empty body of the given kind.
    pub fn empty(id: ElementId, name: impl Into<String>, kind: ElementKind) -> Self {
        Self::new(id, name, ElementBody::empty(kind))
    }

    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }

    /// Occupied slots as `(position, target)`.
    pub fn occupied_slots(&self) -> impl Iterator<Item = (SlotPosition, ElementId)> + '_ {
        self.refs
            .iter()
            .enumerate()
            .filter(|(_, id)| !id.is_empty())
            .map(|(pos, id)| (pos, *id))
    }

    pub fn has_children(&self) -> bool {
        self.refs.iter().any(|id| !id.is_empty())
    }

    pub fn child_count(&self) -> usize {
        self.refs.iter().filter(|id| !id.is_empty()).count()
    }

    pub fn as_table(&self) -> Option<&Table> {
        match &self.body {
            ElementBody::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match &mut self.body {
            ElementBody::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match &self.body {
            ElementBody::Graph(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_graph_mut(&mut self) -> Option<&mut Graph> {
        match &mut self.body {
            ElementBody::Graph(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_kv(&self) -> Option<&KeyValuePair> {
        match &self.body {
            ElementBody::KeyValuePair(kv) => Some(kv),
            _ => None,
        }
    }

    pub fn as_kv_mut(&mut self) -> Option<&mut KeyValuePair> {
        match &mut self.body {
            ElementBody::KeyValuePair(kv) => Some(kv),
            _ => None,
        }
    }

    /// Names of the columns, attributes, or keys currently indexed.
    pub fn indexed_keys(&self) -> Vec<String> {
        match &self.body {
            ElementBody::Table(t) => t.indexed_columns().iter().cloned().collect(),
            ElementBody::Graph(g) => g.indexed_attrs().iter().cloned().collect(),
            ElementBody::KeyValuePair(kv) => kv.indexed_keys().iter().cloned().collect(),
        }
    }

    pub fn has_index_key(&self, key: &str) -> bool {
        match &self.body {
            ElementBody::Table(t) => t.is_indexed(key),
            ElementBody::Graph(g) => g.is_indexed(key),
            ElementBody::KeyValuePair(kv) => kv.is_indexed(key),
        }
    }

    /// The derived index for `key`, or `None` if `key` is not indexed.
    pub fn resolve_index(&self, key: &str) -> Option<ResolvedIndex> {
        match &self.body {
            ElementBody::Table(t) => t.index_map(key).cloned().map(ResolvedIndex::Rows),
            ElementBody::Graph(g) => g.index_map(key).cloned().map(ResolvedIndex::Nodes),
            ElementBody::KeyValuePair(kv) => kv.lookup(key).ok().map(|value| ResolvedIndex::Entry {
                key: key.to_string(),
                value: value.clone(),
            }),
        }
    }

    /// Rebuild every derived index from primary state.
    pub fn rebuild_indexes(&mut self) {
        match &mut self.body {
            ElementBody::Table(t) => t.rebuild_indexes(),
            ElementBody::Graph(g) => g.rebuild_indexes(),
            ElementBody::KeyValuePair(_) => {}
        }
    }

    /// Returns `false` if the element stores a NaN or infinite float.
    pub fn is_finite(&self) -> bool {
        match &self.body {
            ElementBody::Table(t) => t.values().all(Value::is_finite),
            ElementBody::Graph(g) => g.values().all(Value::is_finite),
            ElementBody::KeyValuePair(kv) => kv.values().all(Value::is_finite),
        }
    }

    /// Deepest value nesting stored anywhere in the body, 0 when empty.
    pub fn max_value_depth(&self) -> usize {
        let deepest = match &self.body {
            ElementBody::Table(t) => t.values().map(Value::depth).max(),
            ElementBody::Graph(g) => g.values().map(Value::depth).max(),
            ElementBody::KeyValuePair(kv) => kv.values().map(Value::depth).max(),
        };
        deepest.unwrap_or(0)
    }

    pub fn summary(&self) -> ElementSummary {
        let detail = match &self.body {
            ElementBody::Table(t) => format!("cols={:?}, rows={}", t.columns(), t.len()),
            ElementBody::Graph(g) => format!("nodes={}, edges={}", g.node_count(), g.edge_count()),
            ElementBody::KeyValuePair(kv) => format!("keys={}", kv.len()),
        };
        ElementSummary {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind(),
            slots: self.refs.len(),
            children: self.child_count(),
            detail,
        }
    }
}

/// One-line description of an element for listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ElementSummary {
    pub id: ElementId,
    pub name: String,
    pub kind: ElementKind,
    pub slots: usize,
    pub children: usize,
    pub detail: String,
}

impl fmt::Display for ElementSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(id={}, name={}, {}, slots={}, children={})",
            self.kind, self.id, self.name, self.detail, self.slots, self.children
        )
    }
}
