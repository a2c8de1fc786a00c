use serde::Deserialize;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// File extension of the DuckDB files the importer writes
const DATABASE_EXTENSION: &str = "db";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access configuration '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration '{path}': {source}")]
    FormatError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database name must not be empty")]
    EmptyDatabaseNameError,
}

/// Key-value configuration naming the active database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub db_name: String,
}

impl Config {
    pub fn for_database(database_name: &str) -> Result<Self, ConfigError> {
        let db_name = database_name.trim();
        if db_name.is_empty() {
            return Err(ConfigError::EmptyDatabaseNameError);
        }
        Ok(Config {
            db_name: db_name.to_owned(),
        })
    }

    /// Always `<db_name>.db`, dots in the name included
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.{DATABASE_EXTENSION}", self.db_name))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::FormatError {
            path: path.display().to_string(),
            source,
        })?;
        Config::for_database(&config.db_name)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|source| ConfigError::FormatError {
            path: path.display().to_string(),
            source,
        })
    }
}
