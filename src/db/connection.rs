use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".medsched";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "medsched.sqlite";

/// Where the database lives. The struct is injected into `ensure_schema` so
/// tests can run against an in-memory store while the binary keeps using the
/// per-user file, instead of both sharing a hard-coded connection string.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    /// Explicit database file location. `None` resolves to the per-user
    /// default under the home directory.
    pub path: Option<PathBuf>,
    /// Open a throwaway in-memory database instead of a file.
    pub in_memory: bool,
}

impl DbConfig {
    /// Configuration for tests: a private in-memory database per connection.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            in_memory: true,
        }
    }
}

/// Ensure the database file exists, run lazy migrations, and return a live
/// connection. The function also toggles `PRAGMA foreign_keys = ON` so the
/// referential integrity checks in our schema behave the same during tests
/// and production runs.
pub fn ensure_schema(config: &DbConfig) -> Result<Connection> {
    let conn = if config.in_memory {
        Connection::open_in_memory().context("failed to open in-memory database")?
    } else {
        let db_path = match &config.path {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
        Connection::open(&db_path).context("failed to open SQLite database")?
    };

    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS doctors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            specialty TEXT NOT NULL,
            available INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )
    .context("failed to create doctors table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create patients table")?;

    // UNIQUE(doctor_id, scheduled_at) backs the slot-conflict rule at the
    // store level, so two writers racing past the pre-insert check cannot
    // both land a row.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS appointments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            doctor_id INTEGER NOT NULL REFERENCES doctors(id),
            patient_id INTEGER NOT NULL REFERENCES patients(id),
            scheduled_at TEXT NOT NULL,
            notes TEXT,
            UNIQUE (doctor_id, scheduled_at)
        )",
        [],
    )
    .context("failed to create appointments table")?;

    Ok(conn)
}

/// Seed the reference tables with a starter roster when they are empty.
/// Doctors and patients have no create flow in the UI, so a brand new
/// database would otherwise leave every screen permanently blank.
pub fn seed_reference_data(conn: &Connection) -> Result<()> {
    let doctor_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))
        .context("failed to count doctors")?;

    if doctor_count == 0 {
        conn.execute_batch(
            "INSERT INTO doctors (full_name, specialty, available) VALUES
                ('Dr. Alice Hart', 'Cardiology', 1),
                ('Dr. Brian Osei', 'Dermatology', 1),
                ('Dr. Carmen Silva', 'Pediatrics', 1),
                ('Dr. David Lin', 'Orthopedics', 0);",
        )
        .context("failed to seed doctors")?;
    }

    let patient_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
        .context("failed to count patients")?;

    if patient_count == 0 {
        conn.execute_batch(
            "INSERT INTO patients (full_name, email) VALUES
                ('Grace Miller', 'grace.miller@example.com'),
                ('Hassan Ali', 'hassan.ali@example.com'),
                ('Ivy Chen', 'ivy.chen@example.com');",
        )
        .context("failed to seed patients")?;
    }

    Ok(())
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
