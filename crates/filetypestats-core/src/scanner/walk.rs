use crate::category::Classify;
use crate::storage::FileRecord;
use dashmap::DashMap;
use glob::Pattern;
use rayon::prelude::*;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, MAIN_SEPARATOR};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::error;

/// Parallel directory traversal. Builds a map of path → classified record
/// for every file and directory under `root_paths`, filtering by glob ignore
/// patterns. Symlinks are skipped. Directory paths carry a trailing separator.
///
/// `on_entry` is called with the running entry count as entries are found.
pub fn build_file_record_map(
    root_paths: &[&str],
    ignore_globs: &[&str],
    classifier: &dyn Classify,
    on_entry: &(dyn Fn(usize) + Sync),
) -> io::Result<DashMap<String, FileRecord>> {
    let map: DashMap<String, FileRecord> = DashMap::new();
    let counter = AtomicUsize::new(0);

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let walker = Walker {
        map: &map,
        ignore_patterns: &ignore_patterns,
        classifier,
        counter: &counter,
        on_entry,
    };

    root_paths.par_iter().try_for_each(|root| {
        let root = Path::new(root);
        let metadata = fs::symlink_metadata(root).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error getting metadata for {}: {}", root.display(), err),
            )
        })?;
        walker.record(root, &metadata);
        if metadata.is_dir() {
            walker.visit_dirs(root)?;
        }
        Ok::<(), io::Error>(())
    })?;

    Ok(map)
}

struct Walker<'a> {
    map: &'a DashMap<String, FileRecord>,
    ignore_patterns: &'a [Pattern],
    classifier: &'a dyn Classify,
    counter: &'a AtomicUsize,
    on_entry: &'a (dyn Fn(usize) + Sync),
}

impl Walker<'_> {
    fn is_ignored(&self, path: &Path) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }

    fn record(&self, path: &Path, metadata: &Metadata) {
        if metadata.file_type().is_symlink() || self.is_ignored(path) {
            return;
        }
        let category = self.classifier.classify(path, metadata);
        let (key, size) = if metadata.is_dir() {
            (dir_key(path), 0)
        } else {
            (path.to_string_lossy().into_owned(), metadata.len())
        };
        self.map
            .insert(key.clone(), FileRecord::new(key, category, size));
        let found = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        (self.on_entry)(found);
    }

    fn visit_dirs(&self, dir: &Path) -> io::Result<()> {
        if self.is_ignored(dir) {
            return Ok(());
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() == io::ErrorKind::PermissionDenied {
                    error!(
                        "Access denied reading directory {}: {}",
                        dir.display(),
                        err
                    );
                    return Ok(());
                } else {
                    return Err(io::Error::new(
                        err.kind(),
                        format!("Error reading directory {}: {}", dir.display(), err),
                    ));
                }
            }
        };

        entries.par_bridge().try_for_each(|entry_result| {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    return Err(io::Error::new(
                        err.kind(),
                        format!(
                            "Error reading entry in directory {}: {}",
                            dir.display(),
                            err
                        ),
                    ));
                }
            };

            let path = entry.path();
            let metadata = match fs::symlink_metadata(&path) {
                Ok(metadata) => metadata,
                // removed between listing and stat
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(err) => {
                    return Err(io::Error::new(
                        err.kind(),
                        format!(
                            "Error getting metadata for {}: {}",
                            path.display(),
                            err
                        ),
                    ));
                }
            };

            self.record(&path, &metadata);
            if metadata.is_dir() {
                self.visit_dirs(&path)?;
            }
            Ok(())
        })?;

        Ok(())
    }
}

/// Store key for a directory: its path with exactly one trailing separator.
pub fn dir_key(path: &Path) -> String {
    let mut key = path.to_string_lossy().into_owned();
    if !key.ends_with(MAIN_SEPARATOR) {
        key.push(MAIN_SEPARATOR);
    }
    key
}
