use crate::category::{DIR, TOTAL};
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};

/// Aggregated statistics for one category. Computed, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FTypeStat {
    pub path: String,
    pub category: String,
    pub file_count: u64,
    pub num_bytes: u64,
}

impl FTypeStat {
    pub fn new(path: impl Into<String>, category: impl Into<String>, file_count: u64, num_bytes: u64) -> Self {
        Self {
            path: path.into(),
            category: category.into(),
            file_count,
            num_bytes,
        }
    }

    /// Stats for a single observed file.
    pub fn single(path: impl Into<String>, category: impl Into<String>, num_bytes: u64) -> Self {
        Self::new(path, category, 1, num_bytes)
    }
}

/// Category name to stats, iterated in category-name order. The reserved
/// [`TOTAL`] key sums every category except [`DIR`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileTypeStats(BTreeMap<String, FTypeStat>);

impl FileTypeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum individually computed stats per category and add the total.
    /// Every resulting entry is attributed to `path`.
    pub fn from_file_stats<'a, I>(path: &str, stats: I) -> Self
    where
        I: IntoIterator<Item = &'a FTypeStat>,
    {
        let mut summed = Self::new();
        for stat in stats {
            summed.add(path, stat);
        }
        summed.update_total(path);
        summed
    }

    /// Add `stat` into its category entry, creating the entry at `path` if absent.
    pub fn add(&mut self, path: &str, stat: &FTypeStat) {
        let entry = self
            .0
            .entry(stat.category.clone())
            .or_insert_with(|| FTypeStat::new(path, stat.category.clone(), 0, 0));
        entry.file_count += stat.file_count;
        entry.num_bytes += stat.num_bytes;
    }

    /// Merge another result into this one, category by category, then
    /// recompute the total.
    pub fn merge(&mut self, other: &FileTypeStats) {
        let total_path = self
            .total()
            .or_else(|| other.total())
            .map(|t| t.path.clone())
            .unwrap_or_default();
        for stat in other.categories() {
            let path = stat.path.clone();
            self.add(&path, stat);
        }
        self.update_total(&total_path);
    }

    /// Recompute the [`TOTAL`] entry from the non-`dir` categories. The entry
    /// is removed when no such category is present.
    pub fn update_total(&mut self, path: &str) {
        self.0.remove(TOTAL);
        let mut total = FTypeStat::new(path, TOTAL, 0, 0);
        let mut any = false;
        for stat in self.0.values().filter(|s| s.category != DIR) {
            total.file_count += stat.file_count;
            total.num_bytes += stat.num_bytes;
            any = true;
        }
        if any {
            self.0.insert(TOTAL.to_string(), total);
        }
    }

    pub fn insert(&mut self, stat: FTypeStat) {
        self.0.insert(stat.category.clone(), stat);
    }

    pub fn get(&self, category: &str) -> Option<&FTypeStat> {
        self.0.get(category)
    }

    pub fn total(&self) -> Option<&FTypeStat> {
        self.0.get(TOTAL)
    }

    /// Entries other than the total.
    pub fn categories(&self) -> impl Iterator<Item = &FTypeStat> {
        self.0.values().filter(|s| s.category != TOTAL)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FTypeStat> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Blank out every path, leaving only counts and sizes.
    pub fn without_paths(mut self) -> Self {
        for stat in self.0.values_mut() {
            stat.path.clear();
        }
        self
    }
}

impl<'a> IntoIterator for &'a FileTypeStats {
    type Item = (&'a String, &'a FTypeStat);
    type IntoIter = btree_map::Iter<'a, String, FTypeStat>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
