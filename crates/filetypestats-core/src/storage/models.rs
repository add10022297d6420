/// A row of the fixed category catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A path observed during a walk, keyed by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub category: String,
    pub size_bytes: u64,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, category: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            category: category.into(),
            size_bytes,
        }
    }
}

/// One group of the per-category aggregation.
///
/// `sample_path` is the smallest matched path of the group, which is the
/// only matched path when `match_count` is 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAggregate {
    pub category: String,
    pub match_count: u64,
    pub total_size: u64,
    pub sample_path: String,
}

/// Result of a grouped aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateOutcome {
    NoMatches,
    /// Groups ordered by category name, never empty.
    Matched(Vec<CategoryAggregate>),
}

impl AggregateOutcome {
    pub(crate) fn from_groups(groups: Vec<CategoryAggregate>) -> Self {
        if groups.is_empty() {
            AggregateOutcome::NoMatches
        } else {
            AggregateOutcome::Matched(groups)
        }
    }
}

/// Metadata about the most recent walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanInfo {
    pub root_paths: Vec<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub entry_count: u64,
}
