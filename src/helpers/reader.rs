use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Errors raised while retrieving the document bytes from a location.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Cannot open '{location}': {source}")]
    LocalFileError {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot fetch '{location}': {source}")]
    RemoteFileError {
        location: String,
        #[source]
        source: duckdb::Error,
    },

    #[error("No data from remote file: '{0}'")]
    RemoteFileNoDataError(String),

    #[error("Invalid file URL '{0}'")]
    FileUrlError(String),
}

/// A unified reader that can handle both local files and remote URLs
pub(crate) enum UnifiedReader {
    /// Local file reader
    Local(BufReader<File>),
    /// Remote URL reader (in-memory buffer)
    Remote(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a document from a local path, a `file://` URL or a remote URL.
    /// Remote content is fetched through DuckDB's `read_blob` and held in memory,
    /// so nothing is left on disk whichever way the import ends.
    pub(crate) fn new(location: &str) -> Result<UnifiedReader, FetchError> {
        if Self::is_remote_url(location) {
            Self::read_blob_with_duckdb(location)
        } else {
            let path = Self::local_path(location)?;
            let file = File::open(&path).map_err(|source| FetchError::LocalFileError {
                location: location.to_owned(),
                source,
            })?;
            Ok(UnifiedReader::Local(BufReader::new(file)))
        }
    }

    /// Checks if a location represents a remote URL
    pub(crate) fn is_remote_url(location: &str) -> bool {
        match Url::parse(location) {
            // Single letter schemes are Windows drive prefixes such as `C:\`
            Ok(url) => url.scheme() != "file" && url.scheme().len() > 1,
            Err(_) => false,
        }
    }

    /// Resolves a plain path or a `file://` URL to a filesystem path
    fn local_path(location: &str) -> Result<PathBuf, FetchError> {
        match Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| FetchError::FileUrlError(location.to_owned())),
            _ => Ok(PathBuf::from(location)),
        }
    }

    /// Reads a remote file using DuckDB's read_blob functionality
    fn read_blob_with_duckdb(location: &str) -> Result<UnifiedReader, FetchError> {
        let remote_error = |source| FetchError::RemoteFileError {
            location: location.to_owned(),
            source,
        };
        let connection = duckdb::Connection::open_in_memory().map_err(remote_error)?;
        let result: Result<Vec<u8>, _> =
            connection.query_row("SELECT content FROM read_blob(?)", [location], |row| row.get(0));
        connection.close().map_err(|(_, e)| remote_error(e))?;

        let bytes = result.map_err(remote_error)?;
        if bytes.is_empty() {
            Err(FetchError::RemoteFileNoDataError(location.to_owned()))?;
        }
        tracing::debug!(location, size = bytes.len(), "fetched remote document");

        Ok(UnifiedReader::Remote(Cursor::new(bytes)))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Remote(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Remote(reader) => reader.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote_url() {
        assert!(!UnifiedReader::is_remote_url("test.ods"));
        assert!(!UnifiedReader::is_remote_url("/path/to/test.ods"));
        assert!(!UnifiedReader::is_remote_url("./relative/test.ods"));
        assert!(!UnifiedReader::is_remote_url("C:\\sheets\\test.ods"));

        assert!(UnifiedReader::is_remote_url("http://example.com/test.ods"));
        assert!(UnifiedReader::is_remote_url("https://docs.google.com/spreadsheets/d/e/x/pub?output=ods"));
        assert!(UnifiedReader::is_remote_url("s3://bucket/test.ods"));

        assert!(!UnifiedReader::is_remote_url("file:///path/to/test.ods"));
    }

    #[test]
    fn test_open_local_file() {
        let result = UnifiedReader::new("Cargo.toml");
        assert!(result.is_ok(), "Failed to open local file: {:?}", result.err());

        let result = UnifiedReader::new("non_existent_file.ods");
        assert!(matches!(result, Err(FetchError::LocalFileError { .. })));
    }

    #[test]
    fn test_open_file_url() {
        let path = std::env::current_dir().unwrap().join("Cargo.toml");
        let url = Url::from_file_path(&path).unwrap();
        let result = UnifiedReader::new(url.as_str());
        assert!(result.is_ok(), "Failed to open file url: {:?}", result.err());
    }
}
