use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::tempdir;

use filetypestats_core::category::{Classify, DIR, TOTAL};
use filetypestats_core::scanner::dir_key;
use filetypestats_core::storage::Database;
use filetypestats_core::{summarize, AppConfig, ProgressReporter, ScanEngine, SilentReporter};

/// Create a temp directory tree with known categories.
/// Layout:
///   root/
///     docs/
///       a.txt          ("alpha", 5 bytes)
///       b.md           ("bravo!", 6 bytes)
///     media/
///       pic.png        (PNG header, 8 bytes)
///     blob.dat         (4 bytes of 0x00)
fn create_test_tree(root: &Path) {
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("media")).unwrap();
    fs::write(root.join("docs/a.txt"), "alpha").unwrap();
    fs::write(root.join("docs/b.md"), "bravo!").unwrap();
    fs::write(
        root.join("media/pic.png"),
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
    )
    .unwrap();
    fs::write(root.join("blob.dat"), [0u8; 4]).unwrap();
}

fn scan_tree(root: &Path, db: &Database) -> filetypestats_core::ScanResult {
    let config = AppConfig {
        root_paths: vec![root.to_string_lossy().into_owned()],
        ..AppConfig::default()
    };
    ScanEngine::new(config).scan(db, &SilentReporter).unwrap()
}

#[test]
fn test_full_scan_pipeline() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    create_test_tree(&root);
    let root = fs::canonicalize(&root).unwrap();

    let db = Database::open_in_memory().unwrap();
    let result = scan_tree(&root, &db);

    // root, docs, media + 4 files
    assert_eq!(result.total_entries, 7);
    assert_eq!(db.file_count().unwrap(), 7);

    let stats = &result.stats;
    assert_eq!(stats.get(DIR).unwrap().file_count, 3);
    assert_eq!(stats.get("text").unwrap().file_count, 2);
    assert_eq!(stats.get("text").unwrap().num_bytes, 11);
    assert_eq!(stats.get("image").unwrap().file_count, 1);
    assert_eq!(stats.get("unknown").unwrap().file_count, 1);
    let total = stats.total().unwrap();
    assert_eq!((total.file_count, total.num_bytes), (4, 23));

    // the stored data answers the same question
    let pattern = format!("{}**", dir_key(&root));
    let queried = summarize(&db, &[pattern.as_str()]).unwrap();
    assert_eq!(queried.clone().without_paths(), result.stats.clone().without_paths());
    assert_eq!(queried.get(TOTAL).unwrap().path, pattern);
    assert_eq!(
        queried.get("image").unwrap().path,
        root.join("media/pic.png").to_string_lossy()
    );

    let info = db.scan_info().unwrap();
    assert_eq!(info.root_paths, vec![root.to_string_lossy().into_owned()]);
    assert_eq!(info.entry_count, 7);
    assert!(info.completed_at.is_some());
}

#[test]
fn test_rescan_overwrites_changed_files() {
    let tmp = tempdir().unwrap();
    let root = fs::canonicalize(tmp.path()).unwrap();
    create_test_tree(&root);

    let db = Database::open_in_memory().unwrap();
    scan_tree(&root, &db);

    fs::write(root.join("docs/a.txt"), "alpha, now longer").unwrap();
    scan_tree(&root, &db);

    assert_eq!(db.file_count().unwrap(), 7);
    let record = db
        .get_file_record(root.join("docs/a.txt").to_str().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(record.size_bytes, 17);
}

#[test]
fn test_subdirectory_query_after_scan() {
    let tmp = tempdir().unwrap();
    let root = fs::canonicalize(tmp.path()).unwrap();
    create_test_tree(&root);

    let db = Database::open_in_memory().unwrap();
    scan_tree(&root, &db);

    let docs = format!("{}**", dir_key(&root.join("docs")));
    let stats = summarize(&db, &[docs.as_str()]).unwrap();
    assert_eq!(stats.get("text").unwrap().file_count, 2);
    assert_eq!(stats.get(DIR).unwrap().path, dir_key(&root.join("docs")));
    assert!(stats.get("image").is_none());

    let media = root.join("media/pic.png").to_string_lossy().into_owned();
    let both = summarize(&db, &[docs.as_str(), media.as_str()]).unwrap();
    assert_eq!(both.total().unwrap().file_count, 3);
    assert!(both.iter().all(|(_, s)| s.path == "*"));
}

struct FixedClassifier;

impl Classify for FixedClassifier {
    fn classify(&self, _path: &Path, meta: &fs::Metadata) -> String {
        let category = if meta.is_dir() { DIR } else { "archive" };
        category.to_string()
    }
}

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn on_scan_start(&self) {
        self.events.lock().unwrap().push("scan_start".into());
    }
    fn on_scan_complete(&self, total_entries: usize, _duration_secs: f64) {
        self.events.lock().unwrap().push(format!("scan_complete:{}", total_entries));
    }
    fn on_db_write_complete(&self, rows: usize, _duration_secs: f64) {
        self.events.lock().unwrap().push(format!("db_write_complete:{}", rows));
    }
}

#[test]
fn test_custom_classifier_and_reporter() {
    let tmp = tempdir().unwrap();
    let root = fs::canonicalize(tmp.path()).unwrap();
    create_test_tree(&root);

    let db = Database::open_in_memory().unwrap();
    let reporter = RecordingReporter::default();
    let config = AppConfig {
        root_paths: vec![root.to_string_lossy().into_owned()],
        ..AppConfig::default()
    };
    let result = ScanEngine::new(config)
        .with_classifier(FixedClassifier)
        .scan(&db, &reporter)
        .unwrap();

    assert_eq!(result.stats.get("archive").unwrap().file_count, 4);
    assert_eq!(
        *reporter.events.lock().unwrap(),
        vec![
            "scan_start".to_string(),
            "scan_complete:7".to_string(),
            "db_write_complete:7".to_string(),
        ]
    );
}

#[test]
fn test_missing_root_is_an_error() {
    let tmp = tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    let config = AppConfig {
        root_paths: vec![tmp.path().join("nope").to_string_lossy().into_owned()],
        ..AppConfig::default()
    };
    assert!(ScanEngine::new(config).scan(&db, &SilentReporter).is_err());
}
