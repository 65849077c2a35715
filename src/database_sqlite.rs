//! SQLite access for the assistant.
//!
//! The store is read-only from the assistant's point of view. Every operation
//! opens its own connection and closes it before returning; nothing is pooled.
use crate::database::{CellValue, ColumnInfo, DatabaseError, QueryResult, QueryRows};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, TypeInfo, ValueRef};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Handle on the SQLite file backing the assistant
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name of the store (file stem), used in the prompt
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "database".to_string())
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true)
            .create_if_missing(false)
    }

    /// Open a fresh read-only connection
    pub async fn open(&self) -> Result<SqliteConnection, DatabaseError> {
        if !self.path.exists() {
            return Err(DatabaseError::ConnectionError(format!(
                "database file not found: {} (run `navigator --generate-data` to create it)",
                self.path.display()
            )));
        }

        debug!("[SqliteStore::open] Opening {}", self.path.display());
        self.connect_options().connect().await.map_err(|e| {
            DatabaseError::ConnectionError(format!(
                "failed to open {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// User tables, in creation order
    pub async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let mut conn = self.open().await?;
        let result = sqlx::query(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY rowid
            "#,
        )
        .fetch_all(&mut conn)
        .await;
        close_quietly(conn).await;

        let tables: Vec<String> = result?
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<_, _>>()?;

        debug!("[SqliteStore::list_tables] Found {} tables", tables.len());
        Ok(tables)
    }

    /// Column metadata for `table`, in declaration order
    pub async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, DatabaseError> {
        let query = format!("PRAGMA table_info({})", quote_identifier(table));

        let mut conn = self.open().await?;
        let result = sqlx::query(&query).fetch_all(&mut conn).await;
        close_quietly(conn).await;

        let mut columns = Vec::new();
        for row in result? {
            columns.push(ColumnInfo {
                name: row.try_get("name")?,
                data_type: row.try_get("type")?,
                not_null: row.try_get::<i64, _>("notnull")? != 0,
                primary_key: row.try_get::<i64, _>("pk")? != 0,
            });
        }

        debug!(
            "[SqliteStore::table_columns] Table '{}' has {} columns",
            table,
            columns.len()
        );
        Ok(columns)
    }

    /// Run `sql` exactly as given and collect every row
    pub async fn execute_query(&self, sql: &str) -> Result<QueryRows, DatabaseError> {
        debug!("[SqliteStore::execute_query] Executing query");

        if !has_statement(sql) {
            return Err(DatabaseError::QueryError(
                "query contains no SQL statement".to_string(),
            ));
        }

        let mut conn = self.open().await?;
        let fetched = sqlx::query(sql).fetch_all(&mut conn).await;

        // Zero rows carry no column metadata; ask the planner for the names instead.
        let described: Option<Result<Vec<String>, sqlx::Error>> = match &fetched {
            Ok(rows) if rows.is_empty() => Some(
                (&mut conn)
                    .describe(sql)
                    .await
                    .map(|d| d.columns().iter().map(|c| c.name().to_string()).collect()),
            ),
            _ => None,
        };
        close_quietly(conn).await;

        let rows = fetched?;
        let columns: Vec<String> = match rows.first() {
            Some(first) => first
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            None => match described {
                Some(Ok(names)) if !names.is_empty() => names,
                Some(Err(e)) => {
                    return Err(DatabaseError::QueryError(format!(
                        "could not determine result columns: {}",
                        e
                    )));
                }
                _ => {
                    return Err(DatabaseError::QueryError(
                        "query did not produce a result set".to_string(),
                    ));
                }
            },
        };

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(row.len());
            for i in 0..row.len() {
                cells.push(decode_sqlite_value(row, i)?);
            }
            values.push(cells);
        }

        debug!(
            "[SqliteStore::execute_query] Query completed with {} rows",
            values.len()
        );
        Ok(QueryRows::new(columns, values))
    }

    /// Run `sql` and fold every failure into `QueryResult::Error`.
    ///
    /// This never returns an `Err` and never panics on bad input: syntax
    /// errors, unknown tables and decode problems all come back as text.
    pub async fn execute(&self, sql: &str) -> QueryResult {
        match self.execute_query(sql).await {
            Ok(rows) => QueryResult::Rows(rows),
            Err(e) => {
                warn!(error = %e, "Query execution failed");
                let message = e.to_string();
                if message.trim().is_empty() {
                    QueryResult::Error("query failed without an error message".to_string())
                } else {
                    QueryResult::Error(message)
                }
            }
        }
    }
}

async fn close_quietly(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        debug!("[SqliteStore] Error while closing connection: {}", e);
    }
}

/// Whether `sql` holds anything besides whitespace, semicolons and comments
fn has_statement(sql: &str) -> bool {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        if let Some(line_comment) = rest.strip_prefix("--") {
            rest = line_comment.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(block_comment) = rest.strip_prefix("/*") {
            rest = block_comment.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            return !rest.is_empty();
        }
    }
}

/// Quote an identifier for use inside a PRAGMA or statement
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Decode a column by the storage class of its value
fn decode_sqlite_value(row: &SqliteRow, column_index: usize) -> Result<CellValue, DatabaseError> {
    let type_name = {
        let value_ref = row.try_get_raw(column_index)?;
        if value_ref.is_null() {
            return Ok(CellValue::Null);
        }
        value_ref.type_info().name().to_string()
    };

    match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Ok(CellValue::Integer(row.try_get::<i64, _>(column_index)?)),
        "REAL" => Ok(CellValue::Real(row.try_get::<f64, _>(column_index)?)),
        "TEXT" => Ok(CellValue::Text(row.try_get::<String, _>(column_index)?)),
        "BLOB" => Ok(CellValue::Blob(row.try_get::<Vec<u8>, _>(column_index)?)),
        other => {
            // Declared-type names (DATE, DATETIME, ...) can still show up; try
            // the storage classes in order of likelihood.
            if let Ok(val) = row.try_get::<i64, _>(column_index) {
                return Ok(CellValue::Integer(val));
            }
            if let Ok(val) = row.try_get::<f64, _>(column_index) {
                return Ok(CellValue::Real(val));
            }
            if let Ok(val) = row.try_get::<String, _>(column_index) {
                return Ok(CellValue::Text(val));
            }
            if let Ok(val) = row.try_get::<Vec<u8>, _>(column_index) {
                return Ok(CellValue::Blob(val));
            }
            Err(DatabaseError::QueryError(format!(
                "Unable to decode SQLite {other} value at column {column_index}"
            )))
        }
    }
}
