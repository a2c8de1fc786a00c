//! # Spreadsheet Model
//!
//! Fetches an OpenDocument package, extracts its `content.xml` and decodes it
//! into sheets, rows and cells. Cells keep their compression marker (repeat
//! count) and raw formula text so that later stages can expand and compile them.

pub(crate) mod cell;
pub(crate) mod ods;
pub(crate) mod sheet;

use crate::helpers::reader::UnifiedReader;
use crate::helpers::zip::ArchiveError;
use crate::helpers::zip::ZipHelper;
use quick_xml::events::attributes::AttrError;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;
use zip::ZipArchive;

pub use cell::Cell;
pub use sheet::Row;
pub use sheet::Sheet;

/// ODS MIME type identifier
const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
/// Archive member holding the sheet description
pub const CONTENT_MEMBER: &str = "content.xml";

/// Errors raised while decoding the sheet description
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed XML: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Malformed XML attribute: {0}")]
    AttributeError(#[from] AttrError),

    #[error("Malformed XML text: {0}")]
    EncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("Unknown entity reference '&{0};'")]
    EntityError(String),

    #[error("Invalid value '{value}' for attribute '{name}'")]
    AttributeValueError { name: String, value: String },

    #[error("Missing office:spreadsheet element")]
    MissingSpreadsheetError,

    #[error("Sheet without table:name attribute")]
    MissingSheetNameError,
}

/// A sheet that could not be decoded. Sheets without a name are labelled `#<n>`
/// by their position in the document.
#[derive(Error, Debug)]
#[error("{sheet}: {source}")]
pub struct SheetParseError {
    pub sheet: String,
    #[source]
    pub source: ParseError,
}

/// A fetched spreadsheet package reduced to its embedded sheet description.
/// Lives for one import invocation and is dropped once parsed.
pub struct Document {
    /// Where the package was fetched from
    pub location: String,
    /// Raw `content.xml` payload
    pub content: Vec<u8>,
}

impl Document {
    /// Retrieves the package at `location` and extracts `content.xml`.
    pub fn fetch(location: &str) -> Result<Self, crate::error::OdsqlError> {
        let reader: UnifiedReader = UnifiedReader::new(location)?;
        let content = Self::extract(reader)?;
        tracing::debug!(location, size = content.len(), "extracted {}", CONTENT_MEMBER);
        Ok(Document {
            location: location.to_owned(),
            content,
        })
    }

    /// Opens the archive, validates its MIME type and reads `content.xml`
    pub(crate) fn extract<RS: Read + Seek>(reader: RS) -> Result<Vec<u8>, ArchiveError> {
        let mut zip = ZipArchive::new(reader).map_err(ArchiveError::OpenError)?;
        check_mime(&mut zip)?;
        zip.read_member(CONTENT_MEMBER)?
            .ok_or_else(|| ArchiveError::MemberNotFoundError(CONTENT_MEMBER.to_owned()))
    }

    /// Decodes the sheet description into sheets, in document order.
    /// The outer error rejects the whole document; an inner one only its sheet.
    pub fn sheets(&self) -> Result<Vec<Result<Sheet, SheetParseError>>, ParseError> {
        ods::parse_sheets(&self.content)
    }
}

/// Validates the optional `mimetype` member of an OpenDocument package
fn check_mime<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(), ArchiveError> {
    if let Some(mime) = zip.read_member("mimetype")? {
        let mime = mime.trim_ascii();
        if mime != MIME_TYPE {
            Err(ArchiveError::MimeTypeError(String::from_utf8_lossy(mime).into_owned()))?;
        }
    }
    Ok(())
}
