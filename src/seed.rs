//! Synthetic ride-sharing data for the assistant's SQLite store.
//!
//! Builds the `cities`, `drivers`, `riders`, `trips` and `pii_metadata`
//! tables into a temporary file next to the target and moves it into place
//! once everything is committed, so a half-written store never appears.
use chrono::{Local, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

const CITY_NAMES: [&str; 20] = [
    "San Francisco",
    "Los Angeles",
    "New York",
    "Chicago",
    "Seattle",
    "Boston",
    "Austin",
    "Denver",
    "Miami",
    "Atlanta",
    "Portland",
    "San Diego",
    "Phoenix",
    "Dallas",
    "Houston",
    "Philadelphia",
    "Detroit",
    "Minneapolis",
    "Las Vegas",
    "Nashville",
];

const STATES: [&str; 16] = [
    "CA", "NY", "IL", "WA", "MA", "TX", "CO", "FL", "GA", "OR", "AZ", "PA", "MI", "MN", "NV", "TN",
];

const FIRST_NAMES: [&str; 10] = [
    "John", "Sarah", "Mike", "Emily", "David", "Lisa", "Chris", "Anna", "James", "Maria",
];

const LAST_NAMES: [&str; 10] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez",
];

const VEHICLE_TYPES: [&str; 4] = ["UberX", "UberXL", "Uber Comfort", "Uber Black"];

const PAYMENT_METHODS: [&str; 5] = ["Credit Card", "Debit Card", "PayPal", "Apple Pay", "Google Pay"];

// Weighted: 80% completed, 75% paid.
const TRIP_STATUSES: [&str; 5] = ["completed", "completed", "completed", "completed", "cancelled"];
const PAYMENT_STATUSES: [&str; 4] = ["paid", "paid", "paid", "pending"];

/// (table, column, pii_type, requires_masking, access_level)
pub const PII_CATALOG: [(&str, &str, &str, bool, i64); 7] = [
    ("drivers", "driver_email", "EMAIL", true, 2),
    ("drivers", "phone", "PHONE", true, 2),
    ("drivers", "driver_name", "NAME", true, 1),
    ("riders", "rider_email", "EMAIL", true, 2),
    ("riders", "phone", "PHONE", true, 2),
    ("riders", "rider_name", "NAME", true, 1),
    ("riders", "payment_method", "PAYMENT_INFO", false, 2),
];

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cities (
    city_id INTEGER PRIMARY KEY,
    city_name TEXT NOT NULL,
    state TEXT,
    population INTEGER,
    avg_fare_multiplier REAL
);

CREATE TABLE IF NOT EXISTS drivers (
    driver_id INTEGER PRIMARY KEY,
    driver_name TEXT NOT NULL,
    driver_email TEXT,
    phone TEXT,
    city_id INTEGER,
    rating REAL,
    total_trips INTEGER,
    join_date DATE,
    vehicle_type TEXT,
    FOREIGN KEY (city_id) REFERENCES cities(city_id)
);

CREATE TABLE IF NOT EXISTS riders (
    rider_id INTEGER PRIMARY KEY,
    rider_name TEXT NOT NULL,
    rider_email TEXT,
    phone TEXT,
    payment_method TEXT,
    total_rides INTEGER,
    signup_date DATE,
    preferred_city_id INTEGER,
    FOREIGN KEY (preferred_city_id) REFERENCES cities(city_id)
);

CREATE TABLE IF NOT EXISTS trips (
    trip_id INTEGER PRIMARY KEY,
    rider_id INTEGER,
    driver_id INTEGER,
    city_id INTEGER,
    pickup_time TIMESTAMP,
    dropoff_time TIMESTAMP,
    distance_miles REAL,
    duration_minutes INTEGER,
    fare_amount REAL,
    tip_amount REAL,
    total_amount REAL,
    payment_status TEXT,
    trip_status TEXT,
    FOREIGN KEY (rider_id) REFERENCES riders(rider_id),
    FOREIGN KEY (driver_id) REFERENCES drivers(driver_id),
    FOREIGN KEY (city_id) REFERENCES cities(city_id)
);

CREATE TABLE IF NOT EXISTS pii_metadata (
    table_name TEXT,
    column_name TEXT,
    pii_type TEXT,
    requires_masking BOOLEAN,
    access_level INTEGER
);
"#;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not move generated store into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid seed options: {0}")]
    InvalidOptions(String),
}

/// What to generate and where
#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub path: PathBuf,
    /// Fixed RNG seed for reproducible data; `None` draws from the thread RNG
    pub seed: Option<u64>,
    pub cities: usize,
    pub drivers: usize,
    pub riders: usize,
    pub trips: usize,
}

impl SeedOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: None,
            cities: CITY_NAMES.len(),
            drivers: 200,
            riders: 500,
            trips: 2000,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<(), SeedError> {
        if self.cities == 0 || self.cities > CITY_NAMES.len() {
            return Err(SeedError::InvalidOptions(format!(
                "cities must be between 1 and {}",
                CITY_NAMES.len()
            )));
        }
        if self.drivers == 0 || self.riders == 0 {
            return Err(SeedError::InvalidOptions(
                "drivers and riders must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Row counts written by [`generate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub cities: usize,
    pub drivers: usize,
    pub riders: usize,
    pub trips: usize,
    pub pii_records: usize,
}

/// Generate a fresh store at `options.path`, replacing any existing file
pub async fn generate(options: &SeedOptions) -> Result<SeedSummary, SeedError> {
    options.validate()?;

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let dir = target_dir(&options.path);
    std::fs::create_dir_all(&dir)?;
    let staging = NamedTempFile::new_in(&dir)?;
    debug!("[seed::generate] Staging store at {}", staging.path().display());

    // Rollback journal keeps the finished file self-contained for read-only opens.
    let mut conn = SqliteConnectOptions::new()
        .filename(staging.path())
        .journal_mode(SqliteJournalMode::Delete)
        .connect()
        .await?;
    let summary = populate(&mut conn, options, &mut rng).await;
    conn.close().await?;
    let summary = summary?;

    staging.persist(&options.path)?;
    info!(
        path = %options.path.display(),
        trips = summary.trips,
        "Generated synthetic ride-sharing store"
    );
    Ok(summary)
}

fn target_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn person_name(rng: &mut StdRng) -> String {
    format!("{} {}", pick(rng, &FIRST_NAMES), pick(rng, &LAST_NAMES))
}

fn email_for(name: &str) -> String {
    format!("{}@email.com", name.to_lowercase().replace(' ', "."))
}

fn phone(rng: &mut StdRng) -> String {
    format!("+1-555-{}", rng.random_range(1000..=9999))
}

fn days_ago(now: NaiveDateTime, rng: &mut StdRng) -> String {
    (now - TimeDelta::days(rng.random_range(30..=1095)))
        .date()
        .format("%Y-%m-%d")
        .to_string()
}

fn timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

async fn populate(
    conn: &mut SqliteConnection,
    options: &SeedOptions,
    rng: &mut StdRng,
) -> Result<SeedSummary, SeedError> {
    let now = Local::now().naive_local();
    let mut tx = conn.begin().await?;

    sqlx::raw_sql(SCHEMA_SQL).execute(&mut *tx).await?;

    for (i, city) in CITY_NAMES.iter().take(options.cities).enumerate() {
        sqlx::query("INSERT INTO cities VALUES (?, ?, ?, ?, ?)")
            .bind((i + 1) as i64)
            .bind(*city)
            .bind(pick(rng, &STATES))
            .bind(rng.random_range(500_000i64..=5_000_000))
            .bind(round2(rng.random_range(0.8..1.3)))
            .execute(&mut *tx)
            .await?;
    }

    for i in 0..options.drivers {
        let name = person_name(rng);
        sqlx::query("INSERT INTO drivers VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)")
            .bind((i + 1) as i64)
            .bind(&name)
            .bind(email_for(&name))
            .bind(phone(rng))
            .bind(rng.random_range(1..=options.cities as i64))
            .bind(round2(rng.random_range(4.0..5.0)))
            .bind(rng.random_range(50i64..=5000))
            .bind(days_ago(now, rng))
            .bind(pick(rng, &VEHICLE_TYPES))
            .execute(&mut *tx)
            .await?;
    }

    for i in 0..options.riders {
        let name = person_name(rng);
        sqlx::query("INSERT INTO riders VALUES (?, ?, ?, ?, ?, ?, ?, ?)")
            .bind((i + 1) as i64)
            .bind(&name)
            .bind(email_for(&name))
            .bind(phone(rng))
            .bind(pick(rng, &PAYMENT_METHODS))
            .bind(rng.random_range(1i64..=500))
            .bind(days_ago(now, rng))
            .bind(rng.random_range(1..=options.cities as i64))
            .execute(&mut *tx)
            .await?;
    }

    for i in 0..options.trips {
        let distance = round2(rng.random_range(1.0..30.0));
        let duration = (distance * rng.random_range(2.0..5.0)) as i64;
        let base_fare = distance * rng.random_range(1.5..3.0);
        let tip = round2(rng.random_range(0.0..=base_fare * 0.2));
        let pickup = now
            - TimeDelta::days(rng.random_range(0..=30))
            - TimeDelta::hours(rng.random_range(0..=23));
        let dropoff = pickup + TimeDelta::minutes(duration);

        sqlx::query("INSERT INTO trips VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)")
            .bind((i + 1) as i64)
            .bind(rng.random_range(1..=options.riders as i64))
            .bind(rng.random_range(1..=options.drivers as i64))
            .bind(rng.random_range(1..=options.cities as i64))
            .bind(timestamp(pickup))
            .bind(timestamp(dropoff))
            .bind(distance)
            .bind(duration)
            .bind(round2(base_fare))
            .bind(tip)
            .bind(round2(base_fare + tip))
            .bind(pick(rng, &PAYMENT_STATUSES))
            .bind(pick(rng, &TRIP_STATUSES))
            .execute(&mut *tx)
            .await?;
    }

    for (table, column, pii_type, masking, level) in PII_CATALOG {
        sqlx::query("INSERT INTO pii_metadata VALUES (?, ?, ?, ?, ?)")
            .bind(table)
            .bind(column)
            .bind(pii_type)
            .bind(masking)
            .bind(level)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(SeedSummary {
        cities: options.cities,
        drivers: options.drivers,
        riders: options.riders,
        trips: options.trips,
        pii_records: PII_CATALOG.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CellValue;
    use crate::database_sqlite::SqliteStore;
    use tempfile::TempDir;

    fn small_options(dir: &TempDir) -> SeedOptions {
        SeedOptions {
            cities: 5,
            drivers: 10,
            riders: 20,
            trips: 100,
            ..SeedOptions::new(dir.path().join("uber_data.db")).with_seed(7)
        }
    }

    #[tokio::test]
    async fn test_generate_creates_all_tables() {
        let dir = TempDir::new().unwrap();
        let options = small_options(&dir);

        let summary = generate(&options).await.unwrap();
        assert_eq!(summary.trips, 100);
        assert_eq!(summary.pii_records, 7);

        let store = SqliteStore::new(&options.path);
        let tables = store.list_tables().await.unwrap();
        assert_eq!(
            tables,
            vec!["cities", "drivers", "riders", "trips", "pii_metadata"]
        );

        let counts = store
            .execute_query(
                "SELECT (SELECT COUNT(*) FROM cities) AS c, (SELECT COUNT(*) FROM trips) AS t",
            )
            .await
            .unwrap();
        assert_eq!(counts.get(0, "c"), Some(&CellValue::Integer(5)));
        assert_eq!(counts.get(0, "t"), Some(&CellValue::Integer(100)));
    }

    #[tokio::test]
    async fn test_foreign_keys_stay_in_range() {
        let dir = TempDir::new().unwrap();
        let options = small_options(&dir);
        generate(&options).await.unwrap();

        let store = SqliteStore::new(&options.path);
        let orphans = store
            .execute_query(
                "SELECT COUNT(*) AS n FROM trips t
                 LEFT JOIN cities c ON c.city_id = t.city_id
                 LEFT JOIN drivers d ON d.driver_id = t.driver_id
                 LEFT JOIN riders r ON r.rider_id = t.rider_id
                 WHERE c.city_id IS NULL OR d.driver_id IS NULL OR r.rider_id IS NULL",
            )
            .await
            .unwrap();
        assert_eq!(orphans.get(0, "n"), Some(&CellValue::Integer(0)));
    }

    #[tokio::test]
    async fn test_same_seed_same_data() {
        let dir = TempDir::new().unwrap();
        let first = small_options(&dir);
        let second = SeedOptions {
            path: dir.path().join("again.db"),
            ..first.clone()
        };
        generate(&first).await.unwrap();
        generate(&second).await.unwrap();

        let sql = "SELECT driver_name, rating, vehicle_type FROM drivers ORDER BY driver_id";
        let a = SqliteStore::new(&first.path).execute_query(sql).await.unwrap();
        let b = SqliteStore::new(&second.path).execute_query(sql).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_regenerate_replaces_existing_store() {
        let dir = TempDir::new().unwrap();
        let options = small_options(&dir);
        generate(&options).await.unwrap();
        generate(&options).await.unwrap();

        let store = SqliteStore::new(&options.path);
        let count = store
            .execute_query("SELECT COUNT(*) AS n FROM pii_metadata")
            .await
            .unwrap();
        assert_eq!(count.get(0, "n"), Some(&CellValue::Integer(7)));
    }

    #[tokio::test]
    async fn test_rejects_too_many_cities() {
        let dir = TempDir::new().unwrap();
        let options = SeedOptions {
            cities: 50,
            ..small_options(&dir)
        };
        assert!(matches!(
            generate(&options).await,
            Err(SeedError::InvalidOptions(_))
        ));
    }
}
