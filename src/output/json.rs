//! JSON array file writer

use crate::output::record::Record;
use crate::output::traits::{OutputResult, Writer};
use std::fs;
use std::path::{Path, PathBuf};

/// Keeps records as a pretty-printed JSON array in a single file
///
/// The file is created with `[]` when missing. Every write reads the array,
/// appends the record and rewrites the file, so the file is valid JSON after
/// each record.
pub struct JsonWriter {
    path: PathBuf,
}

impl JsonWriter {
    /// Opens (or creates) the JSON file at `path`
    pub fn new(path: impl AsRef<Path>) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            fs::write(&path, "[]")?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> OutputResult<Vec<Record>> {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl Writer for JsonWriter {
    fn write(&mut self, record: &Record) -> OutputResult<()> {
        let mut records = self.load()?;
        records.push(record.clone());
        fs::write(&self.path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }

    fn exists(&self, criteria: &Record) -> OutputResult<bool> {
        Ok(self.load()?.iter().any(|record| record.matches(criteria)))
    }
}
