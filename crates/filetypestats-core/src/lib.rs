pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod predicate;
pub mod progress;
pub mod scan;
pub mod scanner;
pub mod stats;
pub mod storage;

pub use config::AppConfig;
pub use engine::{summarize, StatsEngine};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use scan::{ScanEngine, ScanResult};
pub use stats::{FTypeStat, FileTypeStats};
