//! Writer trait and output errors

use crate::output::record::Record;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("File {path} already exists with a different header")]
    HeaderMismatch { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A sink for extracted records
///
/// The engine calls [`Writer::write`] once per record, in the order the writers
/// were registered on the task. [`Writer::exists`] is never called by the
/// engine; it is there for callers that want to skip duplicates (see
/// [`UniqueWriter`](crate::output::UniqueWriter)).
pub trait Writer: Send {
    /// Persists one record
    fn write(&mut self, record: &Record) -> OutputResult<()>;

    /// Checks whether a stored record has every field of `criteria` with an
    /// equal value
    fn exists(&self, criteria: &Record) -> OutputResult<bool>;
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write(&mut self, record: &Record) -> OutputResult<()> {
        (**self).write(record)
    }

    fn exists(&self, criteria: &Record) -> OutputResult<bool> {
        (**self).exists(criteria)
    }
}
