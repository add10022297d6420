use super::models::Category;
use crate::category;
use crate::error::Error;
use rusqlite::{params, Connection, InterruptHandle};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

pub const SCHEMA_VERSION: i64 = 1;

const MEMORY_PATH: &str = ":memory:";

pub struct Database {
    conn: Connection,
    category_ids: HashMap<String, i64>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self, Error> {
        Self::open_with_options(path, false)
    }

    /// Open `path`, removing any existing database file first when `wipe` is set.
    pub fn open_with_options(path: &str, wipe: bool) -> Result<Self, Error> {
        if wipe {
            remove_database_files(path)?;
        }
        let conn = Connection::open(path).map_err(|e| connection_error(path, e))?;
        Self::initialize(conn, path)
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().map_err(|e| connection_error(MEMORY_PATH, e))?;
        Self::initialize(conn, MEMORY_PATH)
    }

    fn initialize(conn: Connection, path: &str) -> Result<Self, Error> {
        let mut db = Database {
            conn,
            category_ids: HashMap::new(),
        };
        db.configure_pragmas()
            .and_then(|_| db.migrate_schema())
            .and_then(|_| db.seed_categories())
            .map_err(|e| connection_error(path, e))?;
        db.category_ids = db
            .load_categories()
            .and_then(check_catalog)
            .map_err(|e| connection_error(path, e))?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();
        debug!("Opened database {} ({} categories)", path, db.category_ids.len());
        Ok(db)
    }

    fn configure_pragmas(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;
             PRAGMA case_sensitive_like = ON;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, 64MB cache)");
        Ok(())
    }

    /// Check schema version and migrate if needed.
    /// Older versions are dropped and recreated; a re-scan rebuilds the data.
    /// Newer versions are refused.
    fn migrate_schema(&self) -> rusqlite::Result<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version > SCHEMA_VERSION {
            return Err(schema_mismatch(format!(
                "schema version {} is newer than supported version {}",
                version, SCHEMA_VERSION
            )));
        }
        if version < SCHEMA_VERSION {
            debug!(
                "Schema version {} < {}, dropping all tables and recreating",
                version, SCHEMA_VERSION
            );
            self.conn.execute_batch(
                "DROP TABLE IF EXISTS scan_info;
                 DROP TABLE IF EXISTS fileinfo;
                 DROP TABLE IF EXISTS categories;",
            )?;
        }

        self.conn.execute_batch(include_str!("schema.sql"))?;
        debug!("SQLite schema initialized (version {})", SCHEMA_VERSION);
        Ok(())
    }

    /// Insert the fixed category set into an empty catalog. A populated
    /// catalog is never modified.
    fn seed_categories(&self) -> rusqlite::Result<()> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached("INSERT OR IGNORE INTO categories (name) VALUES (?1)")?;
            for name in category::fixed_category_set() {
                stmt.execute(params![name])?;
            }
        }
        tx.commit()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn category_id(&self, name: &str) -> Result<i64, Error> {
        self.category_ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownCategory(name.to_string()))
    }

    /// Handle that aborts the statement currently running on this connection.
    /// Safe to use from another thread.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Delete every file record and the recorded scan metadata. The
    /// category catalog is kept.
    pub fn truncate_file_info(&self) -> Result<(), Error> {
        self.conn.execute_batch(
            "DELETE FROM fileinfo;
             DELETE FROM scan_info;",
        )?;
        debug!("All file data truncated");
        Ok(())
    }

    pub fn close(self) -> Result<(), Error> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }
}

fn connection_error(path: &str, source: rusqlite::Error) -> Error {
    Error::StoreConnection {
        path: path.to_string(),
        source,
    }
}

/// A stored catalog must hold exactly the fixed category set.
fn check_catalog(categories: Vec<Category>) -> rusqlite::Result<Vec<Category>> {
    if let Some(stray) = categories.iter().find(|c| !category::is_known_category(&c.name)) {
        return Err(schema_mismatch(format!("unknown category '{}' in catalog", stray.name)));
    }
    let expected = category::fixed_category_set().len();
    if categories.len() != expected {
        return Err(schema_mismatch(format!(
            "catalog holds {} categories, expected {}",
            categories.len(),
            expected
        )));
    }
    Ok(categories)
}

fn schema_mismatch(message: String) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISMATCH),
        Some(message),
    )
}

fn remove_database_files(path: &str) -> io::Result<()> {
    for candidate in [path.to_string(), format!("{}-wal", path), format!("{}-shm", path)] {
        if Path::new(&candidate).exists() {
            fs::remove_file(&candidate)?;
            debug!("Removed {}", candidate);
        }
    }
    Ok(())
}
