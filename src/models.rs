//! Data models for board reconciliation.
//!
//! This module contains the column-oriented table used for every stage of
//! the pipeline (raw board records, normalized tables, aligned tables) and
//! the canonical column names shared by the aligner and the analysis tools.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Item-name field every board row carries.
pub const ITEM_NAME: &str = "item_name";

/// Canonical join key shared by both aligned tables.
pub const DEAL_ID: &str = "deal_id";

/// Canonical sector column.
pub const SECTOR: &str = "sector";

/// Canonical revenue column.
pub const REVENUE: &str = "revenue";

/// Deal stage column on the deals board.
pub const DEAL_STAGE: &str = "Deal Stage";

/// Execution status column on the work-order board.
pub const EXECUTION_STATUS: &str = "Execution Status";

/// Typed storage for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum ColumnValues {
    /// Free text; `None` is a missing cell.
    Text(Vec<Option<String>>),
    /// Coerced numbers. Never null.
    Number(Vec<f64>),
    /// Coerced timestamps; `None` means the source text did not parse.
    Date(Vec<Option<NaiveDateTime>>),
}

impl ColumnValues {
    /// Number of cells in the column.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Number(v) => v.len(),
            ColumnValues::Date(v) => v.len(),
        }
    }

    /// Whether the cell at `row` is null.
    pub fn is_null(&self, row: usize) -> bool {
        matches!(self.get(row), Cell::Null)
    }

    /// Whether every cell is null (vacuously true for an empty column).
    pub fn all_null(&self) -> bool {
        (0..self.len()).all(|row| self.is_null(row))
    }

    /// Borrow the cell at `row`. Out-of-range rows read as null.
    pub fn get(&self, row: usize) -> Cell<'_> {
        match self {
            ColumnValues::Text(v) => match v.get(row) {
                Some(Some(s)) => Cell::Text(s),
                _ => Cell::Null,
            },
            ColumnValues::Number(v) => v.get(row).map_or(Cell::Null, |n| Cell::Number(*n)),
            ColumnValues::Date(v) => match v.get(row) {
                Some(Some(d)) => Cell::Date(*d),
                _ => Cell::Null,
            },
        }
    }

    /// Build a new column from the given row indices, in order.
    pub fn select(&self, rows: &[usize]) -> ColumnValues {
        match self {
            ColumnValues::Text(v) => {
                ColumnValues::Text(rows.iter().map(|&r| v.get(r).cloned().flatten()).collect())
            }
            ColumnValues::Number(v) => {
                ColumnValues::Number(rows.iter().map(|&r| v.get(r).copied().unwrap_or(0.0)).collect())
            }
            ColumnValues::Date(v) => {
                ColumnValues::Date(rows.iter().map(|&r| v.get(r).copied().flatten()).collect())
            }
        }
    }

    /// Short type label used in logs and exports.
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValues::Text(_) => "text",
            ColumnValues::Number(_) => "number",
            ColumnValues::Date(_) => "date",
        }
    }
}

/// A borrowed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Date(NaiveDateTime),
    Null,
}

impl Cell<'_> {
    /// Grouping key for the cell; nulls have no key.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Convert to a JSON value for exports.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Text(s) => Value::String((*s).to_string()),
            Cell::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Cell::Date(_) => Value::String(self.to_string()),
            Cell::Null => Value::Null,
        }
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Date(d) if d.num_seconds_from_midnight() == 0 && d.nanosecond() == 0 => {
                write!(f, "{}", d.format("%Y-%m-%d"))
            }
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Cell::Null => Ok(()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column title as defined by the board (or a canonical name after alignment).
    pub name: String,
    /// Cell values, one per row.
    pub values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Convenience constructor for a text column.
    pub fn text<S: Into<String>>(name: impl Into<String>, cells: Vec<Option<S>>) -> Self {
        Self::new(
            name,
            ColumnValues::Text(cells.into_iter().map(|c| c.map(Into::into)).collect()),
        )
    }

    /// Convenience constructor for a numeric column.
    pub fn number(name: impl Into<String>, cells: Vec<f64>) -> Self {
        Self::new(name, ColumnValues::Number(cells))
    }
}

/// An ordered, column-oriented table.
///
/// Column order is significant: keyword searches over column names walk the
/// columns in this order, so the first matching column wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a raw text table from row records.
    ///
    /// Columns appear in the order their names are first seen. A row that
    /// lacks a column gets a null cell; a name repeated within one row keeps
    /// the last value.
    pub fn from_records<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (String, Option<String>)>,
    {
        let mut names: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut cells: Vec<Vec<Option<String>>> = Vec::new();
        let mut row_count = 0;

        for record in records {
            for (name, value) in record {
                let idx = match positions.get(&name) {
                    Some(&idx) => idx,
                    None => {
                        let idx = names.len();
                        positions.insert(name.clone(), idx);
                        names.push(name);
                        cells.push(vec![None; row_count]);
                        idx
                    }
                };
                let column = &mut cells[idx];
                column.resize(row_count + 1, None);
                column[row_count] = value;
            }
            row_count += 1;
            for column in cells.iter_mut() {
                column.resize(row_count, None);
            }
        }

        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, ColumnValues::Text(values)))
            .collect();

        Self { columns }
    }

    /// Builder-style column append, replacing any column with the same name.
    pub fn with_column(mut self, column: Column) -> Self {
        self.push_column(column);
        self
    }

    /// Append a column, replacing any column with the same name in place.
    pub fn push_column(&mut self, column: Column) {
        debug_assert!(
            self.columns.is_empty() || column.values.len() == self.num_rows(),
            "column '{}' has {} cells, table has {} rows",
            column.name,
            column.values.len(),
            self.num_rows()
        );
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// A table with no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Rename a column. Returns false when `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.columns.iter_mut().find(|c| c.name == from) {
            Some(column) => {
                column.name = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a column by name.
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Build a new table holding only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values.select(rows)))
                .collect(),
        }
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json_rows(&self) -> Vec<Value> {
        (0..self.num_rows())
            .map(|row| {
                let mut object = Map::new();
                for column in &self.columns {
                    object.insert(column.name.clone(), column.values.get(row).to_json());
                }
                Value::Object(object)
            })
            .collect()
    }
}
