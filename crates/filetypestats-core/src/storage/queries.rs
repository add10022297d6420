use super::models::*;
use super::sqlite::Database;
use crate::error::Error;
use crate::predicate::PathPredicate;
use rusqlite::{params, params_from_iter};
use tracing::{debug, warn};

mod scan_keys {
    pub const ROOT_PATHS: &str = "root_paths";
    pub const STARTED_AT: &str = "started_at";
    pub const COMPLETED_AT: &str = "completed_at";
    pub const ENTRY_COUNT: &str = "entry_count";
}

const UPSERT_FILE_INFO: &str = "INSERT INTO fileinfo (path, catid, size) VALUES (?1, ?2, ?3) \
     ON CONFLICT(path) DO UPDATE SET catid = excluded.catid, size = excluded.size";

impl Database {
    // ── Categories ───────────────────────────────────────────────

    pub(crate) fn load_categories(&self) -> rusqlite::Result<Vec<Category>> {
        let mut stmt = self
            .connection()
            .prepare("SELECT id, name FROM categories ORDER BY name")?;
        let cats = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cats)
    }

    /// The category catalog ordered by name.
    pub fn categories(&self) -> Result<Vec<Category>, Error> {
        Ok(self.load_categories()?)
    }

    // ── File Info ────────────────────────────────────────────────

    /// Insert or overwrite the record for `path`.
    pub fn upsert_file_info(&self, path: &str, category: &str, size_bytes: u64) -> Result<(), Error> {
        let catid = self.category_id(category)?;
        self.connection()
            .prepare_cached(UPSERT_FILE_INFO)?
            .execute(params![path, catid, to_sql_size(size_bytes)])?;
        Ok(())
    }

    /// Upsert a batch of records in one transaction. Either every record is
    /// stored or none is.
    pub fn upsert_file_infos(&self, records: &[FileRecord]) -> Result<usize, Error> {
        let tx = self.connection().unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare_cached(UPSERT_FILE_INFO)?;
            for record in records {
                let catid = self.category_id(&record.category)?;
                count += stmt.execute(params![
                    record.path,
                    catid,
                    to_sql_size(record.size_bytes)
                ])?;
            }
        }
        tx.commit()?;
        debug!("Upserted {} file records", count);
        Ok(count)
    }

    pub fn get_file_record(&self, path: &str) -> Result<Option<FileRecord>, Error> {
        match self.connection().query_row(
            "SELECT fileinfo.path, categories.name, fileinfo.size \
             FROM fileinfo JOIN categories ON fileinfo.catid = categories.id \
             WHERE fileinfo.path = ?1",
            params![path],
            |row| {
                Ok(FileRecord {
                    path: row.get(0)?,
                    category: row.get(1)?,
                    size_bytes: from_sql_size(row.get(2)?),
                })
            },
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn file_count(&self) -> Result<u64, Error> {
        let count: i64 = self
            .connection()
            .query_row("SELECT COUNT(*) FROM fileinfo", [], |row| row.get(0))?;
        Ok(from_sql_size(count))
    }

    // ── Aggregation ──────────────────────────────────────────────

    /// Per-category match count and size sum over rows matching `predicate`,
    /// computed by SQLite in a single grouped query.
    pub fn aggregate_by_category(&self, predicate: &PathPredicate) -> Result<AggregateOutcome, Error> {
        if predicate.is_empty() {
            return Ok(AggregateOutcome::NoMatches);
        }
        let (clause, values) = predicate.to_sql();
        let sql = format!(
            "SELECT categories.name, COUNT(fileinfo.path), COALESCE(SUM(fileinfo.size), 0), \
                    MIN(fileinfo.path) \
             FROM fileinfo JOIN categories ON fileinfo.catid = categories.id \
             WHERE {} \
             GROUP BY categories.name \
             ORDER BY categories.name",
            clause
        );
        let mut stmt = self.connection().prepare(&sql).map_err(Error::Query)?;
        let groups = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(CategoryAggregate {
                    category: row.get(0)?,
                    match_count: from_sql_size(row.get(1)?),
                    total_size: from_sql_size(row.get(2)?),
                    sample_path: row.get(3)?,
                })
            })
            .map_err(Error::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::Query)?;
        debug!("Aggregated {} category groups for {}", groups.len(), predicate);
        Ok(AggregateOutcome::from_groups(groups))
    }

    // ── Scan Info ────────────────────────────────────────────────

    pub fn record_scan_start(&self, root_paths: &[String]) -> Result<(), Error> {
        let paths_json = serde_json::to_string(root_paths).unwrap_or_default();
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.connection().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM scan_info WHERE key = ?1",
            params![scan_keys::COMPLETED_AT],
        )?;
        set_scan_value(&tx, scan_keys::ROOT_PATHS, &paths_json)?;
        set_scan_value(&tx, scan_keys::STARTED_AT, &now)?;
        set_scan_value(&tx, scan_keys::ENTRY_COUNT, "0")?;
        tx.commit()?;
        Ok(())
    }

    pub fn record_scan_complete(&self, entry_count: u64) -> Result<(), Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.connection().unchecked_transaction()?;
        set_scan_value(&tx, scan_keys::COMPLETED_AT, &now)?;
        set_scan_value(&tx, scan_keys::ENTRY_COUNT, &entry_count.to_string())?;
        tx.commit()?;
        Ok(())
    }

    pub fn scan_info(&self) -> Result<ScanInfo, Error> {
        let mut stmt = self
            .connection()
            .prepare("SELECT key, value FROM scan_info")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut info = ScanInfo::default();
        for (key, value) in pairs {
            match key.as_str() {
                scan_keys::ROOT_PATHS => {
                    info.root_paths = serde_json::from_str(&value).unwrap_or_default()
                }
                scan_keys::STARTED_AT => info.started_at = Some(value),
                scan_keys::COMPLETED_AT => info.completed_at = Some(value),
                scan_keys::ENTRY_COUNT => info.entry_count = value.parse().unwrap_or(0),
                _ => {}
            }
        }
        Ok(info)
    }
}

fn set_scan_value(conn: &rusqlite::Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO scan_info (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

// SQLite integers are signed 64-bit.
fn to_sql_size(size: u64) -> i64 {
    i64::try_from(size).unwrap_or_else(|_| {
        warn!("Size {} exceeds the storable range, clamped to {}", size, i64::MAX);
        i64::MAX
    })
}

fn from_sql_size(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| {
        warn!("Negative stored size {} read back as 0", value);
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_conversion_saturates() {
        assert_eq!(to_sql_size(42), 42);
        assert_eq!(to_sql_size(u64::MAX), i64::MAX);
        assert_eq!(from_sql_size(42), 42);
        assert_eq!(from_sql_size(-5), 0);
    }
}
