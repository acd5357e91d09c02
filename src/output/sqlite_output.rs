//! SQLite table writer
//!
//! This module writes records as rows of an existing SQLite table. Column
//! names come from the record keys, so the table must already have a column
//! for every field the scraper emits.

use crate::output::record::Record;
use crate::output::traits::{OutputResult, Writer};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

/// Inserts records into a SQLite table
pub struct DatabaseWriter {
    conn: Connection,
    table: String,
}

impl DatabaseWriter {
    /// Creates a writer over an open connection
    ///
    /// # Arguments
    ///
    /// * `conn` - The SQLite connection
    /// * `table` - The table records are inserted into
    pub fn new(conn: Connection, table: impl Into<String>) -> Self {
        Self {
            conn,
            table: table.into(),
        }
    }

    /// Opens (or creates) the database file at `path`
    pub fn open(path: &Path, table: impl Into<String>) -> OutputResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(Self::new(conn, table))
    }

    /// Creates the table with untyped columns unless it already exists
    pub fn ensure_table(&self, columns: &[String]) -> OutputResult<()> {
        let columns: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.table),
            columns.join(", ")
        );
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Quotes an SQL identifier
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Maps a JSON value onto an SQLite storage class
fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

impl Writer for DatabaseWriter {
    fn write(&mut self, record: &Record) -> OutputResult<()> {
        if record.is_empty() {
            return Ok(());
        }

        let columns: Vec<String> = record.keys().map(|k| quote_ident(k)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {}({}) VALUES({})",
            quote_ident(&self.table),
            columns.join(","),
            placeholders.join(",")
        );

        let values: Vec<SqlValue> = record.iter().map(|(_, v)| to_sql(v)).collect();
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn exists(&self, criteria: &Record) -> OutputResult<bool> {
        let mut sql = format!("SELECT 1 FROM {}", quote_ident(&self.table));
        if !criteria.is_empty() {
            let conditions: Vec<String> = criteria
                .keys()
                .enumerate()
                .map(|(i, key)| format!("{} = ?{}", quote_ident(key), i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" LIMIT 1");

        let values: Vec<SqlValue> = criteria.iter().map(|(_, v)| to_sql(v)).collect();
        let found = self
            .conn
            .query_row(&sql, params_from_iter(values), |_| Ok(()))
            .optional()?;

        Ok(found.is_some())
    }
}
