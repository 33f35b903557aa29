//! Tabular element: ordered columns, ordered rows, list columns, and
//! per-column value indexes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use slotbook_types::{Row, Value};

use crate::error::{ElementError, ElementResult};

/// Derived index for one column: cell value to the positions of the rows
/// holding it.
pub type RowIndex = BTreeMap<Value, BTreeSet<usize>>;

/// A table of rows keyed by column name.
///
/// Cells of a list column always hold [`Value::Seq`]. Unset cells of other
/// columns are simply absent from the row. Index maps are caches: they are
/// not persisted and are rebuilt from the rows after every structural change
/// and on decode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TableState", into = "TableState")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
    list_columns: BTreeSet<String>,
    indexed_columns: BTreeSet<String>,
    index_maps: BTreeMap<String, RowIndex>,
}

/// Persisted form of a [`Table`].
#[derive(Clone, Serialize, Deserialize)]
struct TableState {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Row>,
    #[serde(default)]
    list_columns: BTreeSet<String>,
    #[serde(default)]
    indexed_columns: BTreeSet<String>,
}

impl From<TableState> for Table {
    fn from(state: TableState) -> Self {
        let mut table = Table {
            columns: state.columns,
            rows: state.rows,
            list_columns: state.list_columns,
            indexed_columns: state.indexed_columns,
            index_maps: BTreeMap::new(),
        };
        table.rebuild_indexes();
        table
    }
}

impl From<Table> for TableState {
    fn from(table: Table) -> Self {
        TableState {
            columns: table.columns,
            rows: table.rows,
            list_columns: table.list_columns,
            indexed_columns: table.indexed_columns,
        }
    }
}

impl Table {
    /// Create an empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with the given plain columns.
    pub fn with_columns<I, S>(columns: I) -> ElementResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn list_columns(&self) -> &BTreeSet<String> {
        &self.list_columns
    }

    pub fn indexed_columns(&self) -> &BTreeSet<String> {
        &self.indexed_columns
    }

    pub fn is_indexed(&self, column: &str) -> bool {
        self.indexed_columns.contains(column)
    }

    /// The derived index for `column`, if it is indexed.
    pub fn index_map(&self, column: &str) -> Option<&RowIndex> {
        self.index_maps.get(column)
    }

    pub fn row(&self, row: usize) -> ElementResult<&Row> {
        self.rows.get(row).ok_or(ElementError::RowOutOfRange {
            row,
            len: self.rows.len(),
        })
    }

    fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    // ---------------------------------------------------------------
    // Columns
    // ---------------------------------------------------------------

    pub fn add_column(&mut self, column: impl Into<String>) -> ElementResult<()> {
        let column = column.into();
        if self.has_column(&column) {
            return Err(ElementError::ColumnExists(column));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Add a column whose cells hold sequences. Existing rows get an empty
    /// sequence.
    pub fn add_list_column(&mut self, column: impl Into<String>) -> ElementResult<()> {
        let column = column.into();
        if self.has_column(&column) {
            return Err(ElementError::ColumnExists(column));
        }
        for row in &mut self.rows {
            row.insert(column.clone(), Value::Seq(Vec::new()));
        }
        self.list_columns.insert(column.clone());
        self.columns.push(column);
        self.rebuild_indexes();
        Ok(())
    }

    /// Remove a column, its cells, and any index on it.
    pub fn del_column(&mut self, column: &str) -> ElementResult<()> {
        if !self.has_column(column) {
            return Err(ElementError::UnknownColumn(column.to_string()));
        }
        self.columns.retain(|c| c != column);
        for row in &mut self.rows {
            row.remove(column);
        }
        self.list_columns.remove(column);
        self.indexed_columns.remove(column);
        self.index_maps.remove(column);
        Ok(())
    }

    pub fn del_list_column(&mut self, column: &str) -> ElementResult<()> {
        if !self.has_column(column) {
            return Err(ElementError::UnknownColumn(column.to_string()));
        }
        if !self.list_columns.contains(column) {
            return Err(ElementError::NotAListColumn(column.to_string()));
        }
        self.del_column(column)
    }

    /// Rename a column in place, keeping its position, list flag, and index.
    pub fn rename_column(&mut self, old: &str, new: impl Into<String>) -> ElementResult<()> {
        let new = new.into();
        let position = self
            .columns
            .iter()
            .position(|c| c == old)
            .ok_or_else(|| ElementError::UnknownColumn(old.to_string()))?;
        if self.has_column(&new) {
            return Err(ElementError::ColumnExists(new));
        }

        self.columns[position] = new.clone();
        for row in &mut self.rows {
            if let Some(cell) = row.remove(old) {
                row.insert(new.clone(), cell);
            }
        }
        if self.list_columns.remove(old) {
            self.list_columns.insert(new.clone());
        }
        if self.indexed_columns.remove(old) {
            self.indexed_columns.insert(new);
        }
        self.rebuild_indexes();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Rows
    // ---------------------------------------------------------------

    fn validate_cells(&self, cells: &Row) -> ElementResult<()> {
        for (column, value) in cells {
            if !self.has_column(column) {
                return Err(ElementError::UnknownColumn(column.clone()));
            }
            if self.list_columns.contains(column) && value.as_seq().is_none() {
                return Err(ElementError::NotASequence {
                    column: column.clone(),
                    found: value.kind_name(),
                });
            }
        }
        Ok(())
    }

    /// Append a row built from named cells. Returns the new row's position.
    pub fn insert_row(&mut self, cells: Row) -> ElementResult<usize> {
        self.validate_cells(&cells)?;

        let mut row: Row = self
            .list_columns
            .iter()
            .map(|c| (c.clone(), Value::Seq(Vec::new())))
            .collect();
        row.extend(cells);

        self.rows.push(row);
        self.rebuild_indexes();
        Ok(self.rows.len() - 1)
    }

    /// Append a row from positional values, one per column in column order.
    pub fn append_values(&mut self, values: Vec<Value>) -> ElementResult<usize> {
        if values.len() != self.columns.len() {
            return Err(ElementError::ArityMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        let cells: Row = self.columns.iter().cloned().zip(values).collect();
        self.insert_row(cells)
    }

    /// Overwrite the named cells of an existing row.
    pub fn update_row(&mut self, row: usize, updates: Row) -> ElementResult<()> {
        self.row(row)?;
        self.validate_cells(&updates)?;
        self.rows[row].extend(updates);
        self.rebuild_indexes();
        Ok(())
    }

    /// Remove a row. Later rows shift down by one.
    pub fn delete_row(&mut self, row: usize) -> ElementResult<Row> {
        self.row(row)?;
        let removed = self.rows.remove(row);
        self.rebuild_indexes();
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // List cells
    // ---------------------------------------------------------------

    fn list_cell_mut(&mut self, row: usize, column: &str) -> ElementResult<&mut Vec<Value>> {
        if !self.has_column(column) {
            return Err(ElementError::UnknownColumn(column.to_string()));
        }
        if !self.list_columns.contains(column) {
            return Err(ElementError::NotAListColumn(column.to_string()));
        }
        let len = self.rows.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(ElementError::RowOutOfRange { row, len })?;
        let cell = cells
            .entry(column.to_string())
            .or_insert_with(|| Value::Seq(Vec::new()));
        let found = cell.kind_name();
        cell.as_seq_mut().ok_or_else(|| ElementError::NotASequence {
            column: column.to_string(),
            found,
        })
    }

    pub fn list_append(&mut self, row: usize, column: &str, value: Value) -> ElementResult<()> {
        self.list_cell_mut(row, column)?.push(value);
        self.rebuild_indexes();
        Ok(())
    }

    /// Insert into a list cell; `index` may equal the cell length.
    pub fn list_insert(
        &mut self,
        row: usize,
        column: &str,
        index: usize,
        value: Value,
    ) -> ElementResult<()> {
        let items = self.list_cell_mut(row, column)?;
        if index > items.len() {
            return Err(ElementError::ListIndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        items.insert(index, value);
        self.rebuild_indexes();
        Ok(())
    }

    pub fn list_update(
        &mut self,
        row: usize,
        column: &str,
        index: usize,
        value: Value,
    ) -> ElementResult<()> {
        let items = self.list_cell_mut(row, column)?;
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or(ElementError::ListIndexOutOfRange { index, len })?;
        *slot = value;
        self.rebuild_indexes();
        Ok(())
    }

    pub fn list_delete(&mut self, row: usize, column: &str, index: usize) -> ElementResult<Value> {
        let items = self.list_cell_mut(row, column)?;
        if index >= items.len() {
            return Err(ElementError::ListIndexOutOfRange {
                index,
                len: items.len(),
            });
        }
        let removed = items.remove(index);
        self.rebuild_indexes();
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // Indexes
    // ---------------------------------------------------------------

    pub fn set_index(&mut self, column: &str) -> ElementResult<()> {
        if !self.has_column(column) {
            return Err(ElementError::UnknownColumn(column.to_string()));
        }
        self.indexed_columns.insert(column.to_string());
        self.rebuild_indexes();
        Ok(())
    }

    pub fn unset_index(&mut self, column: &str) -> ElementResult<()> {
        if !self.indexed_columns.remove(column) {
            return Err(ElementError::NotIndexed(column.to_string()));
        }
        self.index_maps.remove(column);
        Ok(())
    }

    /// Rows whose `column` cell equals `value`, in row order.
    pub fn lookup(&self, column: &str, value: &Value) -> ElementResult<Vec<(usize, &Row)>> {
        let index = self
            .index_maps
            .get(column)
            .ok_or_else(|| ElementError::NotIndexed(column.to_string()))?;
        Ok(index
            .get(value)
            .into_iter()
            .flatten()
            .map(|&pos| (pos, &self.rows[pos]))
            .collect())
    }

    /// Recompute every index map from the rows.
    pub fn rebuild_indexes(&mut self) {
        self.index_maps = self
            .indexed_columns
            .iter()
            .map(|column| {
                let mut index = RowIndex::new();
                for (pos, row) in self.rows.iter().enumerate() {
                    if let Some(value) = row.get(column) {
                        index.entry(value.clone()).or_default().insert(pos);
                    }
                }
                (column.clone(), index)
            })
            .collect();
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Value> {
        self.rows.iter().flat_map(|row| row.values())
    }
}
