//! Dedup decorator for writers

use crate::output::record::Record;
use crate::output::traits::{OutputResult, Writer};

/// Skips records whose key fields are already stored in the inner writer
///
/// The key is the projection of the record onto `keys`; the inner writer's
/// [`Writer::exists`] decides whether it was seen before.
pub struct UniqueWriter<W> {
    inner: W,
    keys: Vec<String>,
    skipped: u64,
}

impl<W: Writer> UniqueWriter<W> {
    pub fn new(inner: W, keys: Vec<String>) -> Self {
        Self {
            inner,
            keys,
            skipped: 0,
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of records not forwarded because they were duplicates
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Writer> Writer for UniqueWriter<W> {
    fn write(&mut self, record: &Record) -> OutputResult<()> {
        let criteria = record.project(&self.keys);
        if self.inner.exists(&criteria)? {
            tracing::debug!("Skipping duplicate record {:?}", criteria);
            self.skipped += 1;
            return Ok(());
        }
        self.inner.write(record)
    }

    fn exists(&self, criteria: &Record) -> OutputResult<bool> {
        self.inner.exists(criteria)
    }
}
