use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Opening or initializing the store failed.
    #[error("Cannot open database '{path}': {source}")]
    StoreConnection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The aggregation query failed; no partial result is produced.
    #[error("Query error: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unknown file category '{0}'")]
    UnknownCategory(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// True when the error came from an interrupted SQLite statement.
    pub(crate) fn is_interrupt(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::OperationInterrupted
        )
    }
}
