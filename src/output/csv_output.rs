//! CSV file writer

use crate::output::record::{value_to_text, Record};
use crate::output::traits::{OutputError, OutputResult, Writer};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Appends records as CSV rows
///
/// With a header, each row is laid out in header order and missing fields are
/// left empty. Without one, fields are written in record order. An existing
/// file is appended to only if its first line is the same header.
pub struct CsvWriter {
    path: PathBuf,
    header: Vec<String>,
    delimiter: u8,
    writer: csv::Writer<File>,
}

impl CsvWriter {
    /// Opens `path` with a comma delimiter
    pub fn new(path: impl AsRef<Path>, header: Vec<String>) -> OutputResult<Self> {
        Self::with_delimiter(path, header, b',')
    }

    /// Opens `path` with a custom single-byte delimiter
    pub fn with_delimiter(
        path: impl AsRef<Path>,
        header: Vec<String>,
        delimiter: u8,
    ) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();
        let existed = path.exists();

        if existed {
            let current = read_header(&path, delimiter)?;
            if current != header {
                return Err(OutputError::HeaderMismatch {
                    path: path.display().to_string(),
                });
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(file);

        if !existed && !header.is_empty() {
            writer.write_record(&header)?;
            writer.flush()?;
        }

        Ok(Self {
            path,
            header,
            delimiter,
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Lays a record out in header order
    pub fn order_data(&self, record: &Record) -> Vec<String> {
        if self.header.is_empty() {
            return record.iter().map(|(_, v)| value_to_text(v)).collect();
        }
        self.header
            .iter()
            .map(|key| record.get(key).map(value_to_text).unwrap_or_default())
            .collect()
    }
}

/// Reads the first row of an existing file, empty when the file is empty
fn read_header(path: &Path, delimiter: u8) -> OutputResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    match reader.records().next() {
        Some(row) => Ok(row?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

impl Writer for CsvWriter {
    fn write(&mut self, record: &Record) -> OutputResult<()> {
        let row = self.order_data(record);
        self.writer.write_record(&row)?;
        self.writer.flush()?;
        Ok(())
    }

    fn exists(&self, criteria: &Record) -> OutputResult<bool> {
        // Without a header there is no way to map criteria keys to columns.
        if self.header.is_empty() {
            return Ok(false);
        }

        let mut positions = Vec::with_capacity(criteria.len());
        for (key, value) in criteria.iter() {
            match self.header.iter().position(|h| h == key) {
                Some(index) => positions.push((index, value_to_text(value))),
                None => return Ok(false),
            }
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        for row in reader.records() {
            let row = row?;
            let matched = positions
                .iter()
                .all(|(index, expected)| row.get(*index) == Some(expected.as_str()));
            if matched {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
