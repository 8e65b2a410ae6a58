use thiserror::Error;

use crate::storage::csv::CsvError;
use crate::storage::json::JsonError;

#[derive(Error, Debug)]
pub enum FqError {
    #[error("{0} is not supported file type.")]
    UnsupportedFormat(String),

    #[error("{0} is not exists.")]
    FileNotFound(String),

    #[error("{0} is Invalid file type.")]
    InvalidOutputFormat(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Rejected by the SQL engine while running the user's query.
    #[error("{0}")]
    Query(String),

    #[error("{path}: {source}")]
    Json { path: String, source: JsonError },

    #[error("{path}: {source}")]
    Csv { path: String, source: CsvError },

    #[error("{path}: invalid UTF-8 at byte {offset}")]
    Encoding { path: String, offset: usize },

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Table {0} has no columns")]
    EmptyTable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FqError {
    /// Errors raised by the engine for the query itself; these are reported
    /// verbatim rather than as internal failures.
    pub fn is_operational(&self) -> bool {
        matches!(self, FqError::Query(_))
    }

    /// User mistakes that need no diagnostic trace.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            FqError::UnsupportedFormat(_)
                | FqError::FileNotFound(_)
                | FqError::InvalidOutputFormat(_)
                | FqError::InvalidTableName(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FqError>;
