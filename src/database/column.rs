use crate::database::identifier;
use crate::database::SchemaError;
use crate::spreadsheet::sheet::Row;
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Number of spreadsheet letters available to formula references (`A` … `Z`)
const LETTERS: usize = 26;

/// Foreign-key annotation inferred from a `Table_Display1_Display2…` header.
#[derive(Clone, Debug, PartialEq)]
pub struct ForeignKey {
    /// Referenced table name
    pub table: String,
    /// Ordered fields of the referenced table shown in place of its identity
    pub display_columns: Vec<String>,
}

impl ForeignKey {
    /// Detects the naming convention on a normalized label.
    ///
    /// Any label with two or more non-empty `_`-separated parts qualifies, so a
    /// plain column such as `Fecha_Alta` is read as a reference to `Fecha`.
    pub fn detect(label: &str) -> Option<Self> {
        let parts: Vec<String> = label
            .split('_')
            .filter(|part| !part.is_empty())
            .map(identifier::prefix_digit)
            .collect();
        let (table, displays) = parts.split_first()?;
        if displays.is_empty() {
            return None;
        }
        let mut display_columns: Vec<String> = Vec::with_capacity(displays.len());
        for display in displays {
            let name = identifier::deduplicate(display, &display_columns);
            display_columns.push(name);
        }
        Some(ForeignKey {
            table: table.to_owned(),
            display_columns,
        })
    }
}

/// A column inferred from the header row.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Normalized, unique within its sheet
    pub name: String,
    /// Cell position of the header (0-based)
    pub position: usize,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    /// SQL type used for the stored column
    pub fn sql_type(&self) -> &'static str {
        if self.foreign_key.is_some() {
            "BIGINT"
        } else {
            "VARCHAR"
        }
    }
}

/// Widest sheet an OpenDocument spreadsheet application writes; header cells beyond are ignored
const MAX_COLUMNS: usize = 16_384;

/// Columns of a sheet plus the map from cell position to column index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    pub columns: Vec<Column>,
    pub positions: BTreeMap<usize, usize>,
}

impl Schema {
    /// Builds the schema from the header row. Empty header cells are dropped.
    pub fn from_header(sheet_name: &str, header: &Row) -> Result<Self, SchemaError> {
        let mut schema = Schema::default();
        let mut names: Vec<String> = Vec::new();
        for (position, cell) in header.positions(MAX_COLUMNS) {
            if cell.is_empty() {
                continue;
            }
            let label = identifier::normalize(&cell.text);
            let foreign_key = ForeignKey::detect(&label);
            let name = identifier::deduplicate(&label, &names);
            names.push(name.to_owned());
            schema.positions.insert(position, schema.columns.len());
            schema.columns.push(Column {
                name,
                position,
                foreign_key,
            });
        }

        if schema.columns.is_empty() {
            Err(SchemaError::NoColumnsError(sheet_name.to_owned()))
        } else {
            Ok(schema)
        }
    }

    /// Position just past the last header column; data cells beyond are dropped
    pub fn width(&self) -> usize {
        self.positions.keys().next_back().map_or(0, |position| position + 1)
    }

    /// Spreadsheet letters `A`, `B`, … assigned to columns in order, capped at `Z`
    pub fn letters(&self) -> HashMap<String, String> {
        self.columns
            .iter()
            .take(LETTERS)
            .enumerate()
            .map(|(index, column)| {
                let letter = char::from(b'A' + index as u8);
                (letter.to_string(), column.name.to_owned())
            })
            .collect()
    }
}
