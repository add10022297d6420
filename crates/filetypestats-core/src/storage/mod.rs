pub mod models;
mod queries;
mod sqlite;

pub use models::{AggregateOutcome, Category, CategoryAggregate, FileRecord, ScanInfo};
pub use sqlite::{Database, SCHEMA_VERSION};
