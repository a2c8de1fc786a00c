//! Fixtures shared by the unit tests: in-process ODS packages and databases.

use crate::database::Database;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

pub(crate) const ODS_MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";

/// Wraps sheet markup into a complete `content.xml`
pub(crate) fn content_xml(tables: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" office:version="1.3"><office:body><office:spreadsheet>{tables}</office:spreadsheet></office:body></office:document-content>"#
    )
}

/// Builds a ZIP archive holding the given members, stored uncompressed
pub(crate) fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in members {
        writer.start_file(*name, options).expect("start zip member");
        writer.write_all(content).expect("write zip member");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Builds an ODS package around a raw `content.xml`
pub(crate) fn ods_bytes(content: &str) -> Vec<u8> {
    zip_bytes(&[("mimetype", ODS_MIME_TYPE), ("content.xml", content.as_bytes())])
}

/// Writes an ODS package with the given sheet markup into `directory`
pub(crate) fn write_ods(directory: &Path, file_name: &str, tables: &str) -> PathBuf {
    let path = directory.join(file_name);
    std::fs::write(&path, ods_bytes(&content_xml(tables))).expect("write ods fixture");
    path
}

/// Header or data cell markup
pub(crate) fn cell(text: &str) -> String {
    format!(r#"<table:table-cell office:value-type="string"><text:p>{text}</text:p></table:table-cell>"#)
}

pub(crate) fn formula_cell(formula: &str, text: &str) -> String {
    format!(r#"<table:table-cell office:value-type="float" table:formula="{formula}"><text:p>{text}</text:p></table:table-cell>"#)
}

pub(crate) fn row(cells: &[String]) -> String {
    format!("<table:table-row>{}</table:table-row>", cells.concat())
}

pub(crate) fn table(name: &str, rows: &[String]) -> String {
    format!(r#"<table:table table:name="{name}">{}</table:table>"#, rows.concat())
}

pub(crate) fn database() -> Database {
    init_tracing();
    Database::open_in_memory().expect("in-memory database")
}

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Counts rows of a table
pub(crate) fn count(database: &Database, table: &str) -> i64 {
    database
        .connection()
        .query_row(&format!(r#"SELECT count(*) FROM "{table}""#), [], |row| row.get(0))
        .expect("count rows")
}

/// Reads one text column of a table ordered by identity
pub(crate) fn column_values(database: &Database, table: &str, column: &str) -> Vec<Option<String>> {
    let mut statement = database
        .connection()
        .prepare(&format!(r#"SELECT CAST("{column}" AS VARCHAR) FROM "{table}" ORDER BY id"#))
        .expect("prepare select");
    statement
        .query_map([], |row| row.get(0))
        .expect("query column")
        .collect::<Result<_, _>>()
        .expect("collect column")
}
