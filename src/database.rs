//! Store-facing types shared by the SQLite layer, the assistant and the renderers
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised while talking to the relational store
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Column metadata as reported by `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// A single value read back from SQLite.
///
/// SQLite is dynamically typed, so the variant reflects the storage class of
/// the value itself rather than the declared column type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Real(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Integer(v) => write!(f, "{v}"),
            CellValue::Real(v) => write!(f, "{v}"),
            CellValue::Text(v) => f.write_str(v),
            CellValue::Blob(v) => write!(f, "\\x{}", hex::encode(v)),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Real(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

/// Tabular result of a query: ordered columns and ordered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryRows {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of `column` in row `row`, if both exist
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Iterate one row as (column, value) pairs in column order
    pub fn row(&self, row: usize) -> impl Iterator<Item = (&str, &CellValue)> {
        self.rows
            .get(row)
            .into_iter()
            .flat_map(move |r| self.columns.iter().map(String::as_str).zip(r.iter()))
    }

    /// Header-first string grid, the shape the psql formatter consumes
    pub fn to_string_grid(&self) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.columns.clone());
        for row in &self.rows {
            grid.push(row.iter().map(ToString::to_string).collect());
        }
        grid
    }
}

/// Outcome of running generated SQL: rows or a description of what went wrong.
///
/// Zero rows is `Rows` with an empty `QueryRows`, never `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(QueryRows),
    Error(String),
}

impl QueryResult {
    pub fn rows(&self) -> Option<&QueryRows> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryResult::Rows(_) => None,
            QueryResult::Error(msg) => Some(msg),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryRows {
        QueryRows::new(
            vec!["city_name".to_string(), "trips".to_string()],
            vec![
                vec!["Boston".into(), 42i64.into()],
                vec!["Denver".into(), CellValue::Null],
            ],
        )
    }

    #[test]
    fn test_get_by_column_name() {
        let rows = sample();
        assert_eq!(rows.get(0, "trips"), Some(&CellValue::Integer(42)));
        assert_eq!(rows.get(1, "city_name").and_then(|v| v.as_str()), Some("Denver"));
        assert_eq!(rows.get(0, "missing"), None);
        assert_eq!(rows.get(5, "trips"), None);
    }

    #[test]
    fn test_row_iteration_keeps_column_order() {
        let rows = sample();
        let pairs: Vec<(&str, String)> = rows.row(0).map(|(c, v)| (c, v.to_string())).collect();
        assert_eq!(
            pairs,
            vec![("city_name", "Boston".to_string()), ("trips", "42".to_string())]
        );
        assert_eq!(rows.row(9).count(), 0);
    }

    #[test]
    fn test_string_grid_has_header_first() {
        let grid = sample().to_string_grid();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0], vec!["city_name", "trips"]);
        assert_eq!(grid[2], vec!["Denver", ""]);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Blob(vec![0xde, 0xad]).to_string(), "\\xdead");
        assert_eq!(CellValue::Real(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
    }

    #[test]
    fn test_query_result_accessors() {
        let ok = QueryResult::Rows(QueryRows::default());
        assert!(!ok.is_error());
        assert!(ok.rows().is_some_and(|r| r.is_empty()));

        let err = QueryResult::Error("no such table: nowhere".to_string());
        assert!(err.is_error());
        assert_eq!(err.error(), Some("no such table: nowhere"));
        assert!(err.rows().is_none());
    }
}
