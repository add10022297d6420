use crate::category::{DIR, TOTAL};
use crate::error::Error;
use crate::predicate::{PathPattern, PathPredicate};
use crate::stats::{FTypeStat, FileTypeStats};
use crate::storage::{AggregateOutcome, CategoryAggregate, Database};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Path reported for every entry when several patterns were queried.
pub const MULTI_PATTERN_PATH: &str = "*";

/// Answers per-category aggregate queries over path patterns.
pub struct StatsEngine<'db> {
    db: &'db Database,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'db> StatsEngine<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self { db, cancel: None }
    }

    /// Abort with [`Error::Cancelled`] once `flag` is set. The flag is checked
    /// right before and right after the aggregation query.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Summarize the stored entries matching any of `patterns`.
    ///
    /// Entries are keyed by category, plus `total` over the non-`dir`
    /// categories. With a single pattern, a category with exactly one match
    /// reports that row's stored path and everything else (including `total`)
    /// reports the pattern itself. With several patterns every path is `*`.
    ///
    /// Nothing matching, or an empty pattern list, yields an empty result.
    pub fn summarize<S: AsRef<str>>(&self, patterns: &[S]) -> Result<FileTypeStats, Error> {
        let parsed: Vec<PathPattern> = patterns.iter().map(|p| PathPattern::parse(p.as_ref())).collect();
        self.summarize_patterns(&parsed)
    }

    /// Same as [`StatsEngine::summarize`] over already parsed patterns.
    pub fn summarize_patterns(&self, patterns: &[PathPattern]) -> Result<FileTypeStats, Error> {
        let start = Instant::now();
        debug!("Summarizing {} pattern(s)", patterns.len());

        let predicate = PathPredicate::from_path_patterns(patterns);
        if predicate.is_empty() {
            return Ok(FileTypeStats::new());
        }

        self.check_cancelled()?;
        let outcome = self.db.aggregate_by_category(&predicate).map_err(|e| match e {
            Error::Query(ref source) if Error::is_interrupt(source) => Error::Cancelled,
            other => other,
        })?;
        self.check_cancelled()?;

        let groups = match outcome {
            AggregateOutcome::NoMatches => {
                debug!("No entries matched in {:?}", start.elapsed());
                return Ok(FileTypeStats::new());
            }
            AggregateOutcome::Matched(groups) => groups,
        };

        let attribution = Attribution::for_patterns(patterns);
        let mut stats = FileTypeStats::new();
        let mut total = FTypeStat::new(attribution.total_path(), TOTAL, 0, 0);
        let mut any_counted = false;

        for group in &groups {
            if group.category != DIR {
                total.file_count += group.match_count;
                total.num_bytes += group.total_size;
                any_counted = true;
            }
            stats.insert(FTypeStat::new(
                attribution.path_for(group),
                group.category.clone(),
                group.match_count,
                group.total_size,
            ));
        }
        if any_counted {
            stats.insert(total);
        }

        debug!(
            "Summarized {} categories in {:?}",
            stats.len(),
            start.elapsed()
        );
        Ok(stats)
    }

    fn check_cancelled(&self) -> Result<(), Error> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Which path string an aggregated entry reports.
enum Attribution<'p> {
    Single(&'p PathPattern),
    Multiple,
}

impl<'p> Attribution<'p> {
    fn for_patterns(patterns: &'p [PathPattern]) -> Self {
        match patterns {
            [only] => Attribution::Single(only),
            _ => Attribution::Multiple,
        }
    }

    fn path_for(&self, group: &CategoryAggregate) -> String {
        match self {
            Attribution::Single(_) if group.match_count == 1 => group.sample_path.clone(),
            Attribution::Single(pattern) => pattern.to_string(),
            Attribution::Multiple => MULTI_PATTERN_PATH.to_string(),
        }
    }

    fn total_path(&self) -> String {
        match self {
            Attribution::Single(pattern) => pattern.to_string(),
            Attribution::Multiple => MULTI_PATTERN_PATH.to_string(),
        }
    }
}

/// Convenience wrapper for a one-off query without cancellation.
pub fn summarize<S: AsRef<str>>(db: &Database, patterns: &[S]) -> Result<FileTypeStats, Error> {
    StatsEngine::new(db).summarize(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileRecord;

    fn scenario_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.upsert_file_infos(&[
            FileRecord::new("/a/f1.txt", "doc", 10),
            FileRecord::new("/a/f2.txt", "doc", 20),
            FileRecord::new("/a/f3.txt", "doc", 30),
            FileRecord::new("/a/", DIR, 0),
        ])
        .unwrap();
        db
    }

    #[test]
    fn test_subtree_scenario() {
        let db = scenario_db();
        let stats = summarize(&db, &["/a/**"]).unwrap();

        assert_eq!(stats.len(), 3);
        assert_eq!(stats.get("doc"), Some(&FTypeStat::new("/a/**", "doc", 3, 60)));
        assert_eq!(stats.get(DIR), Some(&FTypeStat::new("/a/", DIR, 1, 0)));
        assert_eq!(stats.total(), Some(&FTypeStat::new("/a/**", TOTAL, 3, 60)));
    }

    #[test]
    fn test_exact_single_match_reports_stored_path() {
        let db = scenario_db();
        let stats = summarize(&db, &["/a/f2.txt"]).unwrap();
        assert_eq!(stats.get("doc"), Some(&FTypeStat::new("/a/f2.txt", "doc", 1, 20)));
        // total is always attributed to the pattern
        assert_eq!(stats.total(), Some(&FTypeStat::new("/a/f2.txt", TOTAL, 1, 20)));
    }

    #[test]
    fn test_multiple_patterns_report_star() {
        let db = scenario_db();
        let stats = summarize(&db, &["/a/f1.txt", "/a/f3.txt"]).unwrap();
        assert_eq!(stats.get("doc"), Some(&FTypeStat::new("*", "doc", 2, 40)));
        assert_eq!(stats.total().unwrap().path, "*");
        assert!(stats.get(DIR).is_none());
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let db = scenario_db();
        assert!(summarize(&db, &["/nowhere/**"]).unwrap().is_empty());
        assert!(summarize::<&str>(&db, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_only_dirs_matched_has_no_total() {
        let db = scenario_db();
        let stats = summarize(&db, &["/a/"]).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.get(DIR), Some(&FTypeStat::new("/a/", DIR, 1, 0)));
        assert!(stats.total().is_none());
    }

    #[test]
    fn test_explicit_exact_pattern_matches_literal_marker() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_file_infos(&[
            FileRecord::new("/s/**", "text", 4),
            FileRecord::new("/s/a", "text", 8),
        ])
        .unwrap();

        let stats = StatsEngine::new(&db)
            .summarize_patterns(&[PathPattern::Exact("/s/**".to_string())])
            .unwrap();
        assert_eq!(stats.get("text"), Some(&FTypeStat::new("/s/**", "text", 1, 4)));

        let stats = summarize(&db, &["/s/**"]).unwrap();
        assert_eq!(stats.total().unwrap().file_count, 2);
    }

    #[test]
    fn test_cancel_flag_aborts() {
        let db = scenario_db();
        let flag = Arc::new(AtomicBool::new(true));
        let result = StatsEngine::new(&db)
            .with_cancel_flag(flag.clone())
            .summarize(&["/a/**"]);
        assert!(matches!(result, Err(Error::Cancelled)));

        flag.store(false, Ordering::Relaxed);
        let stats = StatsEngine::new(&db)
            .with_cancel_flag(flag)
            .summarize(&["/a/**"])
            .unwrap();
        assert_eq!(stats.total().unwrap().file_count, 3);
    }
}
