//! Adjacency-map graph element with attribute indexes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use slotbook_types::Value;

use crate::error::{ElementError, ElementResult};

/// Attribute or edge metadata map.
pub type Attrs = BTreeMap<String, Value>;

/// Derived index for one node attribute: attribute value to node ids.
pub type NodeIndex = BTreeMap<Value, Vec<String>>;

/// A graph node: its attributes and outgoing edges keyed by target node id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub edges: BTreeMap<String, Attrs>,
}

/// A directed graph stored as an adjacency map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GraphState", into = "GraphState")]
pub struct Graph {
    nodes: BTreeMap<String, Node>,
    indexed_attrs: BTreeSet<String>,
    index_maps: BTreeMap<String, NodeIndex>,
}

#[derive(Clone, Serialize, Deserialize)]
struct GraphState {
    #[serde(default)]
    nodes: BTreeMap<String, Node>,
    #[serde(default)]
    indexed_attrs: BTreeSet<String>,
}

impl From<GraphState> for Graph {
    fn from(state: GraphState) -> Self {
        let mut graph = Graph {
            nodes: state.nodes,
            indexed_attrs: state.indexed_attrs,
            index_maps: BTreeMap::new(),
        };
        graph.rebuild_indexes();
        graph
    }
}

impl From<Graph> for GraphState {
    fn from(graph: Graph) -> Self {
        GraphState {
            nodes: graph.nodes,
            indexed_attrs: graph.indexed_attrs,
        }
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &BTreeMap<String, Node> {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> ElementResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| ElementError::UnknownNode(id.to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.edges.len()).sum()
    }

    /// All edges as `(from, to, meta)`, ordered by source then target.
    pub fn edges(&self) -> Vec<(&str, &str, &Attrs)> {
        self.nodes
            .iter()
            .flat_map(|(from, node)| {
                node.edges
                    .iter()
                    .map(move |(to, meta)| (from.as_str(), to.as_str(), meta))
            })
            .collect()
    }

    pub fn indexed_attrs(&self) -> &BTreeSet<String> {
        &self.indexed_attrs
    }

    pub fn is_indexed(&self, attr: &str) -> bool {
        self.indexed_attrs.contains(attr)
    }

    pub fn index_map(&self, attr: &str) -> Option<&NodeIndex> {
        self.index_maps.get(attr)
    }

    // ---------------------------------------------------------------
    // Nodes and edges
    // ---------------------------------------------------------------

    pub fn add_node(&mut self, id: impl Into<String>, attrs: Attrs) -> ElementResult<()> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(ElementError::NodeExists(id));
        }
        self.nodes.insert(
            id,
            Node {
                attrs,
                edges: BTreeMap::new(),
            },
        );
        self.rebuild_indexes();
        Ok(())
    }

    /// Remove a node together with every edge pointing at it.
    pub fn del_node(&mut self, id: &str) -> ElementResult<Node> {
        let removed = self
            .nodes
            .remove(id)
            .ok_or_else(|| ElementError::UnknownNode(id.to_string()))?;
        for node in self.nodes.values_mut() {
            node.edges.remove(id);
        }
        self.rebuild_indexes();
        Ok(removed)
    }

    /// Merge `attrs` into the node's attributes.
    pub fn update_node(&mut self, id: &str, attrs: Attrs) -> ElementResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ElementError::UnknownNode(id.to_string()))?;
        node.attrs.extend(attrs);
        self.rebuild_indexes();
        Ok(())
    }

    /// Add or replace the edge `from -> to`.
    pub fn add_edge(&mut self, from: &str, to: &str, meta: Attrs) -> ElementResult<()> {
        if !self.nodes.contains_key(to) {
            return Err(ElementError::UnknownNode(to.to_string()));
        }
        let node = self
            .nodes
            .get_mut(from)
            .ok_or_else(|| ElementError::UnknownNode(from.to_string()))?;
        node.edges.insert(to.to_string(), meta);
        Ok(())
    }

    pub fn del_edge(&mut self, from: &str, to: &str) -> ElementResult<Attrs> {
        self.nodes
            .get_mut(from)
            .and_then(|node| node.edges.remove(to))
            .ok_or_else(|| ElementError::UnknownEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    // ---------------------------------------------------------------
    // Indexes
    // ---------------------------------------------------------------

    /// Index nodes by `attr`. Nodes without the attribute are not indexed.
    pub fn set_index(&mut self, attr: &str) -> ElementResult<()> {
        self.indexed_attrs.insert(attr.to_string());
        self.rebuild_indexes();
        Ok(())
    }

    pub fn unset_index(&mut self, attr: &str) -> ElementResult<()> {
        if !self.indexed_attrs.remove(attr) {
            return Err(ElementError::NotIndexed(attr.to_string()));
        }
        self.index_maps.remove(attr);
        Ok(())
    }

    /// Nodes whose `attr` equals `value`, ordered by node id.
    pub fn lookup_nodes(&self, attr: &str, value: &Value) -> ElementResult<Vec<(&str, &Node)>> {
        let index = self
            .index_maps
            .get(attr)
            .ok_or_else(|| ElementError::NotIndexed(attr.to_string()))?;
        Ok(index
            .get(value)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get_key_value(id))
            .map(|(id, node)| (id.as_str(), node))
            .collect())
    }

    pub fn rebuild_indexes(&mut self) {
        self.index_maps = self
            .indexed_attrs
            .iter()
            .map(|attr| {
                let mut index = NodeIndex::new();
                for (id, node) in &self.nodes {
                    if let Some(value) = node.attrs.get(attr) {
                        index.entry(value.clone()).or_default().push(id.clone());
                    }
                }
                (attr.clone(), index)
            })
            .collect();
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Value> {
        self.nodes.values().flat_map(|node| {
            node.attrs
                .values()
                .chain(node.edges.values().flat_map(|meta| meta.values()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Value)]) -> Attrs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn city_graph() -> Graph {
        let mut g = Graph::new();
        g.add_node("a", attrs(&[("country", "nz".into())])).unwrap();
        g.add_node("b", attrs(&[("country", "au".into())])).unwrap();
        g.add_node("c", attrs(&[("country", "nz".into())])).unwrap();
        g.add_edge("a", "b", Attrs::new()).unwrap();
        g.add_edge("c", "b", attrs(&[("km", Value::Int(2000))])).unwrap();
        g
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut g = city_graph();
        assert_eq!(
            g.add_node("a", Attrs::new()),
            Err(ElementError::NodeExists("a".into()))
        );
    }

    #[test]
    fn edges_require_both_nodes() {
        let mut g = city_graph();
        assert_eq!(
            g.add_edge("a", "zz", Attrs::new()),
            Err(ElementError::UnknownNode("zz".into()))
        );
        assert_eq!(
            g.add_edge("zz", "a", Attrs::new()),
            Err(ElementError::UnknownNode("zz".into()))
        );
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn deleting_node_drops_incoming_edges() {
        let mut g = city_graph();
        g.del_node("b").unwrap();
        assert_eq!(g.edge_count(), 0);
        assert!(g.edges().is_empty());
    }

    #[test]
    fn del_edge_reports_missing_edge() {
        let mut g = city_graph();
        assert!(g.del_edge("b", "a").is_err());
        let meta = g.del_edge("c", "b").unwrap();
        assert_eq!(meta.get("km"), Some(&Value::Int(2000)));
    }

    #[test]
    fn attribute_index_follows_updates() {
        let mut g = city_graph();
        g.set_index("country").unwrap();
        let ids: Vec<&str> = g
            .lookup_nodes("country", &"nz".into())
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);

        g.update_node("a", attrs(&[("country", "au".into())])).unwrap();
        assert_eq!(g.lookup_nodes("country", &"nz".into()).unwrap().len(), 1);
        assert_eq!(g.lookup_nodes("country", &"au".into()).unwrap().len(), 2);

        g.del_node("c").unwrap();
        assert!(g.lookup_nodes("country", &"nz".into()).unwrap().is_empty());
    }

    #[test]
    fn lookup_requires_index() {
        let g = city_graph();
        assert_eq!(
            g.lookup_nodes("country", &"nz".into()).unwrap_err(),
            ElementError::NotIndexed("country".into())
        );
    }

    #[test]
    fn serde_rebuilds_indexes() {
        let mut g = city_graph();
        g.set_index("country").unwrap();
        let json = serde_json::to_string(&g).unwrap();
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
        assert!(back.index_map("country").is_some());
    }
}
