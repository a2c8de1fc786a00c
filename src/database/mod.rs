//! # Database Module
//!
//! Schema inference from header rows and the DuckDB side of the import:
//! table creation, row insertion and foreign-key resolution.

pub(crate) mod column;
pub(crate) mod identifier;
pub(crate) mod reference;
pub(crate) mod table;

use duckdb::Connection;
use std::path::Path;
use thiserror::Error;

pub use column::Column;
pub use column::ForeignKey;
pub use column::Schema;
pub use reference::ReferenceResolver;
pub use table::StoredTable;

/// Errors related to schema inference and identifier handling.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Sheet '{0}' has no usable header columns")]
    NoColumnsError(String),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifierError(String),
}

/// Explicit database context threaded through the importer and the evaluator.
///
/// One connection serves both DDL and DML; statements auto-commit, so a sheet
/// that fails halfway keeps the rows already inserted.
pub struct Database {
    connection: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, duckdb::Error> {
        let connection = Connection::open(path)?;
        Ok(Database { connection })
    }

    pub fn open_in_memory() -> Result<Self, duckdb::Error> {
        let connection = Connection::open_in_memory()?;
        Ok(Database { connection })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns true if a table with exactly this name exists
    pub fn table_exists(&self, name: &str) -> Result<bool, duckdb::Error> {
        let count: i64 = self.connection.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Column names of a table in ordinal order, empty if the table is absent
    pub fn table_columns(&self, name: &str) -> Result<Vec<String>, duckdb::Error> {
        let mut statement = self.connection.prepare_cached(
            "SELECT column_name FROM information_schema.columns WHERE table_name = ? ORDER BY ordinal_position",
        )?;
        let columns = statement
            .query_map([name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}
