//! Schema and PII snapshots used as prompt context.
//!
//! Both snapshots are read once through [`SchemaCache::load`] and then shared
//! by reference. The store is not written by the assistant, so the cache only
//! changes when [`SchemaCache::refresh`] is called explicitly.

use crate::ai_sql::error::AiResult;
use crate::database::DatabaseError;
pub use crate::database::ColumnInfo;
use crate::database_sqlite::SqliteStore;
use serde::Serialize;
use sqlx::{Connection, Row};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use tracing::{debug, info};

pub const PII_TABLE: &str = "pii_metadata";

/// One table and its columns in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Read-only snapshot of the store's tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaInfo {
    pub tables: Vec<TableSchema>,
}

impl SchemaInfo {
    pub async fn introspect(store: &SqliteStore) -> Result<Self, DatabaseError> {
        let mut tables = Vec::new();
        for name in store.list_tables().await? {
            let columns = store.table_columns(&name).await?;
            tables.push(TableSchema { name, columns });
        }
        debug!("[SchemaInfo::introspect] Captured {} tables", tables.len());
        Ok(Self { tables })
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Flattened listing, one `table: col (TYPE), ...` line per table
    pub fn listing(&self) -> String {
        let mut text = String::new();
        for table in &self.tables {
            let cols = table
                .columns
                .iter()
                .map(|c| format!("{} ({})", c.name, c.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = write!(text, "\n{}: {}", table.name, cols);
        }
        text
    }
}

/// One row of the PII reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PiiRecord {
    pub table_name: String,
    pub column_name: String,
    pub pii_type: String,
    pub requires_masking: bool,
    pub access_level: i64,
}

impl PiiRecord {
    pub async fn load_all(store: &SqliteStore) -> Result<Vec<Self>, DatabaseError> {
        let query = format!(
            "SELECT table_name, column_name, pii_type, requires_masking, access_level FROM {}",
            PII_TABLE
        );

        let mut conn = store.open().await?;
        let result = sqlx::query(&query).fetch_all(&mut conn).await;
        if let Err(e) = conn.close().await {
            debug!("[PiiRecord::load_all] Error while closing connection: {}", e);
        }

        let rows = result.map_err(|e| {
            DatabaseError::SchemaError(format!("failed to read {}: {}", PII_TABLE, e))
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(PiiRecord {
                table_name: row.try_get::<Option<String>, _>("table_name")?.unwrap_or_default(),
                column_name: row.try_get::<Option<String>, _>("column_name")?.unwrap_or_default(),
                pii_type: row.try_get::<Option<String>, _>("pii_type")?.unwrap_or_default(),
                requires_masking: row
                    .try_get::<Option<i64>, _>("requires_masking")?
                    .unwrap_or(0)
                    != 0,
                access_level: row.try_get::<Option<i64>, _>("access_level")?.unwrap_or(0),
            });
        }
        debug!("[PiiRecord::load_all] Loaded {} PII records", records.len());
        Ok(records)
    }
}

/// Fixed-width text rendering of the PII catalog for prompts
pub fn pii_listing(records: &[PiiRecord]) -> String {
    let headers = ["table_name", "column_name", "pii_type", "requires_masking", "access_level"];
    let rows: Vec<[String; 5]> = records
        .iter()
        .map(|r| {
            [
                r.table_name.clone(),
                r.column_name.clone(),
                r.pii_type.clone(),
                if r.requires_masking { "True" } else { "False" }.to_string(),
                r.access_level.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut text = String::new();
    let header_line = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect::<Vec<_>>()
        .join("  ");
    text.push_str(header_line.trim_end());
    for row in &rows {
        text.push('\n');
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ");
        text.push_str(line.trim_end());
    }
    text
}

/// Distinct table names that hold at least one PII column, sorted
pub fn pii_tables(records: &[PiiRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.table_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Schema and PII snapshots held for the life of the process
#[derive(Debug, Clone)]
pub struct SchemaCache {
    schema: SchemaInfo,
    pii: Vec<PiiRecord>,
}

impl SchemaCache {
    pub fn new(schema: SchemaInfo, pii: Vec<PiiRecord>) -> Self {
        Self { schema, pii }
    }

    pub async fn load(store: &SqliteStore) -> AiResult<Self> {
        let schema = SchemaInfo::introspect(store).await?;
        let pii = PiiRecord::load_all(store).await?;
        info!(
            tables = schema.tables.len(),
            pii_columns = pii.len(),
            "Loaded schema snapshot"
        );
        Ok(Self::new(schema, pii))
    }

    /// Re-read both snapshots; the previous ones are kept if the reload fails
    pub async fn refresh(&mut self, store: &SqliteStore) -> AiResult<()> {
        *self = Self::load(store).await?;
        Ok(())
    }

    pub fn schema(&self) -> &SchemaInfo {
        &self.schema
    }

    pub fn pii(&self) -> &[PiiRecord] {
        &self.pii
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{self, SeedOptions};
    use tempfile::TempDir;

    fn column(name: &str, data_type: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            not_null: false,
            primary_key: false,
        }
    }

    fn record(table: &str, column: &str, pii_type: &str, masking: bool, level: i64) -> PiiRecord {
        PiiRecord {
            table_name: table.to_string(),
            column_name: column.to_string(),
            pii_type: pii_type.to_string(),
            requires_masking: masking,
            access_level: level,
        }
    }

    async fn seeded_store(dir: &TempDir) -> SqliteStore {
        let options = SeedOptions {
            cities: 3,
            drivers: 5,
            riders: 5,
            trips: 10,
            ..SeedOptions::new(dir.path().join("uber_data.db")).with_seed(1)
        };
        seed::generate(&options).await.unwrap();
        SqliteStore::new(options.path)
    }

    #[test]
    fn test_listing_format() {
        let schema = SchemaInfo {
            tables: vec![
                TableSchema {
                    name: "cities".to_string(),
                    columns: vec![column("city_id", "INTEGER"), column("city_name", "TEXT")],
                },
                TableSchema {
                    name: "trips".to_string(),
                    columns: vec![column("fare_amount", "REAL")],
                },
            ],
        };
        assert_eq!(
            schema.listing(),
            "\ncities: city_id (INTEGER), city_name (TEXT)\ntrips: fare_amount (REAL)"
        );
        assert_eq!(schema.table_names().collect::<Vec<_>>(), vec!["cities", "trips"]);
        assert!(schema.table("trips").is_some());
        assert!(schema.table("nope").is_none());
    }

    #[test]
    fn test_pii_listing_is_aligned() {
        let records = vec![
            record("drivers", "driver_email", "EMAIL", true, 2),
            record("riders", "payment_method", "PAYMENT_INFO", false, 2),
        ];
        let text = pii_listing(&records);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("table_name"));
        assert!(lines[1].contains("driver_email") && lines[1].contains("True"));
        assert!(lines[2].contains("PAYMENT_INFO") && lines[2].contains("False"));
        // Columns line up
        assert_eq!(lines[1].find("EMAIL"), lines[2].find("PAYMENT_INFO"));
    }

    #[test]
    fn test_pii_tables_are_distinct() {
        let records = vec![
            record("riders", "phone", "PHONE", true, 2),
            record("drivers", "phone", "PHONE", true, 2),
            record("riders", "rider_name", "NAME", true, 1),
        ];
        assert_eq!(pii_tables(&records), vec!["drivers", "riders"]);
    }

    #[tokio::test]
    async fn test_cache_load_from_seeded_store() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir).await;

        let cache = SchemaCache::load(&store).await.unwrap();
        let names: Vec<&str> = cache.schema().table_names().collect();
        assert_eq!(names, vec!["cities", "drivers", "riders", "trips", "pii_metadata"]);

        let trips = cache.schema().table("trips").unwrap();
        assert_eq!(trips.columns.len(), 13);
        assert!(trips.columns[0].primary_key);

        assert_eq!(cache.pii().len(), 7);
        assert!(cache
            .pii()
            .iter()
            .any(|r| r.table_name == "riders" && r.column_name == "payment_method" && !r.requires_masking));
        assert_eq!(pii_tables(cache.pii()), vec!["drivers", "riders"]);
    }

    #[tokio::test]
    async fn test_missing_pii_table_is_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.db");
        std::fs::File::create(&path).unwrap();
        let store = SqliteStore::new(&path);

        let err = PiiRecord::load_all(&store).await.unwrap_err();
        assert!(matches!(err, DatabaseError::SchemaError(_)));
        assert!(SchemaCache::load(&store).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_keeps_snapshot_on_failure() {
        let dir = TempDir::new().unwrap();
        let store = seeded_store(&dir).await;
        let mut cache = SchemaCache::load(&store).await.unwrap();

        let missing = SqliteStore::new(dir.path().join("gone.db"));
        assert!(cache.refresh(&missing).await.is_err());
        assert_eq!(cache.pii().len(), 7);

        cache.refresh(&store).await.unwrap();
        assert_eq!(cache.schema().tables.len(), 5);
    }
}
