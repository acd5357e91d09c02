//! Writer that emits records as log events

use crate::output::record::Record;
use crate::output::traits::{OutputResult, Writer};

/// Logs each record as a JSON line at info level
///
/// Nothing is stored, so [`Writer::exists`] is always false.
#[derive(Debug, Default)]
pub struct LogWriter {
    written: u64,
}

impl LogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records logged so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Writer for LogWriter {
    fn write(&mut self, record: &Record) -> OutputResult<()> {
        let json = serde_json::to_string(record)?;
        tracing::info!(target: "scrapyard::record", "{}", json);
        self.written += 1;
        Ok(())
    }

    fn exists(&self, _criteria: &Record) -> OutputResult<bool> {
        Ok(false)
    }
}
