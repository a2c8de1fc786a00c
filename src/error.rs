use thiserror::Error;

/// Main error type for the importer and the method evaluator.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum OdsqlError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    DuckDBError(#[from] duckdb::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Helper module errors
    #[error("{0}")]
    FetchError(#[from] crate::helpers::reader::FetchError),

    #[error("{0}")]
    ArchiveError(#[from] crate::helpers::zip::ArchiveError),

    // Spreadsheet module errors
    #[error("{0}")]
    ParseError(#[from] crate::spreadsheet::ParseError),

    // Database module errors
    #[error("{0}")]
    SchemaError(#[from] crate::database::SchemaError),

    // Formula module errors
    #[error("{0}")]
    FormulaError(#[from] crate::formula::FormulaError),

    #[error("{0}")]
    MethodError(#[from] crate::formula::MethodError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, OdsqlError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| OdsqlError::WithContextError(format!("{}: {}", message, e)))
    }
}
