//! Output module for storing scraped records
//!
//! This module handles:
//! - The [`Record`] type produced by scrapers
//! - The [`Writer`] trait every sink implements
//! - JSON, CSV, SQLite and log sinks, plus a dedup decorator

mod csv_output;
mod json;
mod log_output;
mod record;
mod sqlite_output;
mod traits;
mod unique;

pub use csv_output::CsvWriter;
pub use json::JsonWriter;
pub use log_output::LogWriter;
pub use record::{value_to_text, Record};
pub use sqlite_output::DatabaseWriter;
pub use traits::{OutputError, OutputResult, Writer};
pub use unique::UniqueWriter;

use crate::config::OutputConfig;
use std::path::Path;

/// Opens the writer described by an output entry
///
/// # Arguments
///
/// * `output` - The output entry from the configuration
/// * `fields` - Field names of the scrap, used as CSV header and table columns
/// * `unique_by` - When non-empty, wraps the writer in a [`UniqueWriter`]
///
/// # Returns
///
/// * `Ok(Box<dyn Writer>)` - Writer ready to receive records
/// * `Err(OutputError)` - The file or database could not be opened
pub fn open_writer(
    output: &OutputConfig,
    fields: &[String],
    unique_by: &[String],
) -> OutputResult<Box<dyn Writer>> {
    let writer: Box<dyn Writer> = match output {
        OutputConfig::Json { path } => Box::new(JsonWriter::new(path)?),
        OutputConfig::Csv { path, delimiter } => {
            let delimiter = delimiter.as_bytes().first().copied().unwrap_or(b',');
            Box::new(CsvWriter::with_delimiter(path, fields.to_vec(), delimiter)?)
        }
        OutputConfig::Sqlite { path, table } => {
            let writer = DatabaseWriter::open(Path::new(path), table.clone())?;
            writer.ensure_table(fields)?;
            Box::new(writer)
        }
        OutputConfig::Log => Box::new(LogWriter::new()),
    };

    if unique_by.is_empty() {
        Ok(writer)
    } else {
        Ok(Box::new(UniqueWriter::new(writer, unique_by.to_vec())))
    }
}
