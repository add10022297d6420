use crate::category::{Classify, MagicClassifier};
use crate::config::{self, AppConfig};
use crate::engine::MULTI_PATTERN_PATH;
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::scanner;
use crate::stats::{FTypeStat, FileTypeStats};
use crate::storage::{Database, FileRecord};
use std::fs;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Records are written in transactions of this many rows.
const WRITE_BATCH_SIZE: usize = 10_000;

pub struct ScanEngine {
    config: AppConfig,
    classifier: Box<dyn Classify>,
}

#[derive(Debug)]
pub struct ScanResult {
    pub scan_duration: Duration,
    pub db_write_duration: Duration,
    pub total_entries: usize,
    pub stats: FileTypeStats,
}

impl ScanEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            classifier: Box::new(MagicClassifier),
        }
    }

    pub fn with_classifier(mut self, classifier: impl Classify + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Walk the configured roots and upsert every entry into `db`:
    /// 1. Parallel directory walk with classification
    /// 2. Batched upsert into SQLite
    /// 3. Merge per-file stats into the returned category totals
    pub fn scan(&self, db: &Database, reporter: &dyn ProgressReporter) -> Result<ScanResult, Error> {
        let roots = canonical_roots(&self.config.root_paths)?;
        info!("Processing directories: {:?}", roots);

        let root_path_slices: Vec<&str> = roots.iter().map(|s| s.as_str()).collect();
        let ignore_pattern_slices: Vec<&str> =
            self.config.ignore_patterns.iter().map(|s| s.as_str()).collect();

        db.record_scan_start(&roots)?;

        // Phase 1: Walk
        reporter.on_scan_start();
        let scan_start = Instant::now();
        let record_map = scanner::build_file_record_map(
            &root_path_slices,
            &ignore_pattern_slices,
            self.classifier.as_ref(),
            &|found| reporter.on_scan_progress(found),
        )?;
        let scan_duration = scan_start.elapsed();
        let total_entries = record_map.len();
        reporter.on_scan_complete(total_entries, scan_duration.as_secs_f64());
        debug!(
            "Walk completed in {:.2}s, {} entries",
            scan_duration.as_secs_f64(),
            total_entries,
        );

        let mut records: Vec<FileRecord> = record_map.into_iter().map(|(_, r)| r).collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));

        // Phase 2: Write to SQLite
        reporter.on_db_write_start();
        let db_start = Instant::now();
        let mut written = 0;
        for batch in records.chunks(WRITE_BATCH_SIZE) {
            written += db.upsert_file_infos(batch)?;
        }
        db.record_scan_complete(total_entries as u64)?;
        let db_write_duration = db_start.elapsed();
        reporter.on_db_write_complete(written, db_write_duration.as_secs_f64());
        debug!(
            "Database write completed in {:.2}s, {} rows",
            db_write_duration.as_secs_f64(),
            written,
        );

        // Phase 3: Totals
        let label = match roots.as_slice() {
            [only] => only.clone(),
            _ => MULTI_PATTERN_PATH.to_string(),
        };
        let file_stats: Vec<FTypeStat> = records
            .into_iter()
            .map(|r| FTypeStat::single(r.path, r.category, r.size_bytes))
            .collect();
        let stats = FileTypeStats::from_file_stats(&label, &file_stats);

        Ok(ScanResult {
            scan_duration,
            db_write_duration,
            total_entries,
            stats,
        })
    }
}

fn canonical_roots(root_paths: &[String]) -> Result<Vec<String>, Error> {
    let canonical = root_paths
        .iter()
        .map(|p| Ok(fs::canonicalize(p)?.to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(config::non_overlapping_directories(canonical))
}
