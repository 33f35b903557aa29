//! Variant mutators and read-only queries on the element under the cursor.
//!
//! Each mutator runs against a copy of the current element and logs one
//! `update` delta on success. Queries never log.

use slotbook_element::{Attrs, ElementKind, ElementResult, Graph, KeyValuePair, Node, Table};
use slotbook_types::{Row, Value};

use crate::error::{RegistryError, RegistryResult};
use crate::registry::ElementRegistry;

impl ElementRegistry {
    fn update_table<T>(
        &mut self,
        f: impl FnOnce(&mut Table) -> ElementResult<T>,
    ) -> RegistryResult<T> {
        self.update_current(|el| {
            let found = el.kind();
            let table = el.as_table_mut().ok_or(RegistryError::WrongVariant {
                expected: ElementKind::Table,
                found,
            })?;
            Ok(f(table)?)
        })
    }

    fn update_graph<T>(
        &mut self,
        f: impl FnOnce(&mut Graph) -> ElementResult<T>,
    ) -> RegistryResult<T> {
        self.update_current(|el| {
            let found = el.kind();
            let graph = el.as_graph_mut().ok_or(RegistryError::WrongVariant {
                expected: ElementKind::Graph,
                found,
            })?;
            Ok(f(graph)?)
        })
    }

    fn update_kv<T>(
        &mut self,
        f: impl FnOnce(&mut KeyValuePair) -> ElementResult<T>,
    ) -> RegistryResult<T> {
        self.update_current(|el| {
            let found = el.kind();
            let kv = el.as_kv_mut().ok_or(RegistryError::WrongVariant {
                expected: ElementKind::KeyValuePair,
                found,
            })?;
            Ok(f(kv)?)
        })
    }

    /// The current element as a table.
    pub fn current_table(&self) -> RegistryResult<&Table> {
        let el = self.current()?;
        el.as_table().ok_or(RegistryError::WrongVariant {
            expected: ElementKind::Table,
            found: el.kind(),
        })
    }

    pub fn current_graph(&self) -> RegistryResult<&Graph> {
        let el = self.current()?;
        el.as_graph().ok_or(RegistryError::WrongVariant {
            expected: ElementKind::Graph,
            found: el.kind(),
        })
    }

    pub fn current_kv(&self) -> RegistryResult<&KeyValuePair> {
        let el = self.current()?;
        el.as_kv().ok_or(RegistryError::WrongVariant {
            expected: ElementKind::KeyValuePair,
            found: el.kind(),
        })
    }

    // ---------------------------------------------------------------
    // Table
    // ---------------------------------------------------------------

    pub fn table_add_column(&mut self, column: &str) -> RegistryResult<()> {
        self.update_table(|t| t.add_column(column))
    }

    pub fn table_del_column(&mut self, column: &str) -> RegistryResult<()> {
        self.update_table(|t| t.del_column(column))
    }

    pub fn table_rename_column(&mut self, old: &str, new: &str) -> RegistryResult<()> {
        self.update_table(|t| t.rename_column(old, new))
    }

    pub fn table_add_list_column(&mut self, column: &str) -> RegistryResult<()> {
        self.update_table(|t| t.add_list_column(column))
    }

    pub fn table_del_list_column(&mut self, column: &str) -> RegistryResult<()> {
        self.update_table(|t| t.del_list_column(column))
    }

    /// Append a row. Returns its position.
    pub fn table_insert_row(&mut self, row: Row) -> RegistryResult<usize> {
        self.update_table(|t| t.insert_row(row))
    }

    /// Append a row given one value per column, in column order.
    pub fn table_append_values(&mut self, values: Vec<Value>) -> RegistryResult<usize> {
        self.update_table(|t| t.append_values(values))
    }

    pub fn table_update_row(&mut self, row: usize, updates: Row) -> RegistryResult<()> {
        self.update_table(|t| t.update_row(row, updates))
    }

    pub fn table_delete_row(&mut self, row: usize) -> RegistryResult<Row> {
        self.update_table(|t| t.delete_row(row))
    }

    pub fn table_list_append(
        &mut self,
        row: usize,
        column: &str,
        value: Value,
    ) -> RegistryResult<()> {
        self.update_table(|t| t.list_append(row, column, value))
    }

    pub fn table_list_insert(
        &mut self,
        row: usize,
        column: &str,
        index: usize,
        value: Value,
    ) -> RegistryResult<()> {
        self.update_table(|t| t.list_insert(row, column, index, value))
    }

    pub fn table_list_update(
        &mut self,
        row: usize,
        column: &str,
        index: usize,
        value: Value,
    ) -> RegistryResult<()> {
        self.update_table(|t| t.list_update(row, column, index, value))
    }

    pub fn table_list_delete(
        &mut self,
        row: usize,
        column: &str,
        index: usize,
    ) -> RegistryResult<Value> {
        self.update_table(|t| t.list_delete(row, column, index))
    }

    pub fn table_set_index(&mut self, column: &str) -> RegistryResult<()> {
        self.update_table(|t| t.set_index(column))
    }

    pub fn table_unset_index(&mut self, column: &str) -> RegistryResult<()> {
        self.update_table(|t| t.unset_index(column))
    }

    /// Rows whose indexed `column` equals `value`, as `(position, row)`.
    pub fn table_lookup(&self, column: &str, value: &Value) -> RegistryResult<Vec<(usize, Row)>> {
        let hits = self.current_table()?.lookup(column, value)?;
        Ok(hits.into_iter().map(|(pos, row)| (pos, row.clone())).collect())
    }

    // ---------------------------------------------------------------
    // Graph
    // ---------------------------------------------------------------

    pub fn graph_add_node(&mut self, id: &str, attrs: Attrs) -> RegistryResult<()> {
        self.update_graph(|g| g.add_node(id, attrs))
    }

    pub fn graph_del_node(&mut self, id: &str) -> RegistryResult<Node> {
        self.update_graph(|g| g.del_node(id))
    }

    /// Merge `attrs` into a node's attributes.
    pub fn graph_update_node(&mut self, id: &str, attrs: Attrs) -> RegistryResult<()> {
        self.update_graph(|g| g.update_node(id, attrs))
    }

    pub fn graph_add_edge(&mut self, from: &str, to: &str, meta: Attrs) -> RegistryResult<()> {
        self.update_graph(|g| g.add_edge(from, to, meta))
    }

    pub fn graph_del_edge(&mut self, from: &str, to: &str) -> RegistryResult<Attrs> {
        self.update_graph(|g| g.del_edge(from, to))
    }

    pub fn graph_set_index(&mut self, attr: &str) -> RegistryResult<()> {
        self.update_graph(|g| g.set_index(attr))
    }

    pub fn graph_unset_index(&mut self, attr: &str) -> RegistryResult<()> {
        self.update_graph(|g| g.unset_index(attr))
    }

    /// Node ids whose indexed `attr` equals `value`.
    pub fn graph_lookup_nodes(
        &self,
        attr: &str,
        value: &Value,
    ) -> RegistryResult<Vec<(String, Node)>> {
        let hits = self.current_graph()?.lookup_nodes(attr, value)?;
        Ok(hits
            .into_iter()
            .map(|(id, node)| (id.to_string(), node.clone()))
            .collect())
    }

    // ---------------------------------------------------------------
    // Key/value
    // ---------------------------------------------------------------

    /// Insert or overwrite `key`. Returns the previous value.
    pub fn kv_set(&mut self, key: &str, value: Value) -> RegistryResult<Option<Value>> {
        self.update_kv(|kv| Ok(kv.set(key, value)))
    }

    pub fn kv_get(&self, key: &str) -> RegistryResult<Value> {
        Ok(self.current_kv()?.get(key)?.clone())
    }

    pub fn kv_delete(&mut self, key: &str) -> RegistryResult<Value> {
        self.update_kv(|kv| kv.delete(key))
    }

    pub fn kv_set_index(&mut self, key: &str) -> RegistryResult<()> {
        self.update_kv(|kv| kv.set_index(key))
    }

    pub fn kv_unset_index(&mut self, key: &str) -> RegistryResult<()> {
        self.update_kv(|kv| kv.unset_index(key))
    }

    /// Value of an indexed key.
    pub fn kv_lookup(&self, key: &str) -> RegistryResult<Value> {
        Ok(self.current_kv()?.lookup(key)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use slotbook_element::ElementError;

    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn registry_in_table() -> ElementRegistry {
        let mut reg = ElementRegistry::new();
        reg.create_table("t", ["name", "team"], None).unwrap();
        reg.descend(0).unwrap();
        reg
    }

    #[test]
    fn index_tracks_insert_and_delete() {
        let mut reg = registry_in_table();
        reg.table_set_index("team").unwrap();
        reg.table_insert_row(row(&[("name", "a".into()), ("team", "red".into())]))
            .unwrap();
        reg.table_insert_row(row(&[("name", "b".into()), ("team", "blue".into())]))
            .unwrap();
        reg.table_insert_row(row(&[("name", "c".into()), ("team", "red".into())]))
            .unwrap();
        reg.table_delete_row(1).unwrap();

        let hits = reg.table_lookup("team", &"red".into()).unwrap();
        let positions: Vec<usize> = hits.iter().map(|(pos, _)| *pos).collect();
        assert_eq!(positions, vec![0, 1]);
        assert_eq!(hits[1].1.get("name"), Some(&Value::from("c")));
        assert!(reg.table_lookup("team", &"blue".into()).unwrap().is_empty());
    }

    #[test]
    fn wrong_variant_is_rejected_without_logging() {
        let mut reg = ElementRegistry::new();
        let logged = reg.list_history().len();
        assert!(matches!(
            reg.table_add_column("x"),
            Err(RegistryError::WrongVariant {
                expected: ElementKind::Table,
                found: ElementKind::KeyValuePair
            })
        ));
        assert!(matches!(
            reg.graph_add_node("n", Attrs::new()),
            Err(RegistryError::WrongVariant { .. })
        ));
        assert_eq!(reg.list_history().len(), logged);
    }

    #[test]
    fn element_errors_leave_state_untouched() {
        let mut reg = registry_in_table();
        let before = reg.current().unwrap().clone();
        let err = reg
            .table_append_values(vec![Value::Int(1)])
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Element(ElementError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert_eq!(reg.current().unwrap(), &before);
    }

    #[test]
    fn table_mutations_undo_individually() {
        let mut reg = registry_in_table();
        reg.table_add_list_column("tags").unwrap();
        let pos = reg
            .table_append_values(vec!["a".into(), "red".into(), Value::Seq(vec![])])
            .unwrap();
        reg.table_list_append(pos, "tags", "x".into()).unwrap();
        reg.table_list_insert(pos, "tags", 0, "w".into()).unwrap();
        assert_eq!(
            reg.current_table().unwrap().row(pos).unwrap().get("tags"),
            Some(&Value::Seq(vec!["w".into(), "x".into()]))
        );
        reg.undo().unwrap();
        assert_eq!(
            reg.current_table().unwrap().row(pos).unwrap().get("tags"),
            Some(&Value::Seq(vec!["x".into()]))
        );
        reg.table_rename_column("team", "squad").unwrap();
        assert_eq!(reg.current_table().unwrap().columns(), &["name", "squad", "tags"]);
    }

    #[test]
    fn graph_mutators_and_lookup() {
        let mut reg = ElementRegistry::new();
        reg.create_element(ElementKind::Graph, "g", None).unwrap();
        reg.descend(0).unwrap();
        reg.graph_add_node("a", [("kind".to_string(), Value::from("hub"))].into())
            .unwrap();
        reg.graph_add_node("b", Attrs::new()).unwrap();
        reg.graph_add_edge("a", "b", Attrs::new()).unwrap();
        reg.graph_set_index("kind").unwrap();

        let hits = reg.graph_lookup_nodes("kind", &"hub".into()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "a");

        reg.graph_update_node("b", [("kind".to_string(), Value::from("hub"))].into())
            .unwrap();
        assert_eq!(reg.graph_lookup_nodes("kind", &"hub".into()).unwrap().len(), 2);

        reg.graph_del_node("b").unwrap();
        assert_eq!(reg.current_graph().unwrap().edge_count(), 0);
        assert!(reg.graph_del_edge("a", "b").is_err());
    }

    #[test]
    fn kv_mutators_and_queries() {
        let mut reg = ElementRegistry::new();
        assert_eq!(reg.kv_set("k", Value::Int(1)).unwrap(), None);
        assert_eq!(reg.kv_set("k", Value::Int(2)).unwrap(), Some(Value::Int(1)));
        assert_eq!(reg.kv_get("k").unwrap(), Value::Int(2));
        assert!(reg.kv_lookup("k").is_err());
        reg.kv_set_index("k").unwrap();
        assert_eq!(reg.kv_lookup("k").unwrap(), Value::Int(2));

        let logged = reg.list_history().len();
        reg.kv_get("k").unwrap();
        reg.kv_lookup("k").unwrap();
        assert_eq!(reg.list_history().len(), logged);

        reg.kv_unset_index("k").unwrap();
        assert_eq!(reg.kv_delete("k").unwrap(), Value::Int(2));
        assert!(matches!(
            reg.kv_get("k"),
            Err(RegistryError::Element(ElementError::UnknownKey(_)))
        ));
    }
}
