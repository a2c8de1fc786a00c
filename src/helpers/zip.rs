//! ZIP archive helper utilities for OpenDocument (.ods) packages
//! Provides convenient methods for accessing members within ZIP archives

use std::io::Read;
use std::io::Seek;
use thiserror::Error;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Errors raised while opening the package or reading one of its members
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Cannot open archive: {0}")]
    OpenError(#[source] ZipError),

    #[error("Cannot read archive member '{name}': {source}")]
    MemberReadError {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive member '{0}' not found")]
    MemberNotFoundError(String),

    #[error("Invalid ODS MIME type '{0}'")]
    MimeTypeError(String),
}

/// Helper trait for ZIP archive operations
pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Gets a member from the ZIP archive by name (case-insensitive, path separator agnostic)
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, ArchiveError>;

    /// Reads the whole content of a member, `None` if the member is absent
    fn read_member(&mut self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, ArchiveError> {
        let pattern = name.replace('\\', "/");
        let path = self.file_names()
            .find(|file_name| pattern.eq_ignore_ascii_case(*file_name))
            .map(|file_name| file_name.to_owned());
        match path.map(|file_name| self.by_name(&file_name)).transpose() {
            Ok(Some(file)) => Ok(Some(file)),
            Ok(None) | Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(ArchiveError::OpenError(error)),
        }
    }

    fn read_member(&mut self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let Some(mut file) = self.file(name)? else {
            return Ok(None);
        };
        let mut buffer = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buffer)
            .map_err(|source| ArchiveError::MemberReadError { name: name.to_owned(), source })?;
        Ok(Some(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive() -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("Content.XML", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<root/>").unwrap();
        let cursor = writer.finish().unwrap();
        ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn read_member_ignores_case() {
        let mut zip = archive();
        assert_eq!(zip.read_member("content.xml").unwrap(), Some(b"<root/>".to_vec()));
    }

    #[test]
    fn read_member_missing() {
        let mut zip = archive();
        assert_eq!(zip.read_member("styles.xml").unwrap(), None);
    }
}
