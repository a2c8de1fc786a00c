use crate::database::identifier;
use crate::database::Database;
use crate::database::ReferenceResolver;
use crate::database::Schema;
use crate::database::SchemaError;
use crate::database::StoredTable;
use crate::error::OdsqlError;
use crate::error::ResultMessage;
use crate::formula::FormulaCompiler;
use crate::formula::FormulaUnit;
use crate::formula::MethodStore;
use crate::spreadsheet::Document;
use crate::spreadsheet::Sheet;
use duckdb::types::Value;
use std::collections::BTreeMap;

/// Summary of one import run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportReport {
    pub location: String,
    /// Sheets turned into tables, in document order
    pub sheets: Vec<SheetReport>,
    /// Sheets left out, in document order
    pub skipped: Vec<SkippedSheet>,
}

impl ImportReport {
    pub fn rows(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.rows).sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SheetReport {
    /// Sheet name as written in the document
    pub sheet: String,
    pub table: String,
    pub rows: usize,
    /// Columns whose formula unit was stored
    pub formula_columns: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedSheet {
    pub sheet: String,
    pub reason: String,
}

/// Runs the import pipeline against one database.
///
/// Fetch, archive and document-level parse failures abort the import. Anything
/// that goes wrong inside a sheet, decoding included, only skips that sheet;
/// rows inserted before the failure are kept. A row marked as repeated is
/// inserted once.
pub struct Importer<'a> {
    database: &'a Database,
}

impl<'a> Importer<'a> {
    pub fn new(database: &'a Database) -> Self {
        Importer { database }
    }

    pub fn import(&self, location: &str) -> Result<ImportReport, OdsqlError> {
        let document = Document::fetch(location)?;
        let sheets = document.sheets()?;
        drop(document);
        let store = MethodStore::open(self.database)?;

        let mut report = ImportReport {
            location: location.to_owned(),
            ..ImportReport::default()
        };
        if sheets.is_empty() {
            tracing::warn!(location, "no sheets found in the document");
        }
        for sheet in &sheets {
            let sheet = match sheet {
                Ok(sheet) => sheet,
                Err(error) => {
                    tracing::warn!(sheet = %error.sheet, %error, "skipped sheet");
                    report.skipped.push(SkippedSheet {
                        sheet: error.sheet.to_owned(),
                        reason: error.to_string(),
                    });
                    continue;
                }
            };
            match self.ingest_sheet(sheet, &store).with_prefix(&sheet.name) {
                Ok(sheet_report) => {
                    tracing::info!(
                        sheet = %sheet_report.sheet,
                        table = %sheet_report.table,
                        rows = sheet_report.rows,
                        formulas = sheet_report.formula_columns.len(),
                        "processed sheet"
                    );
                    report.sheets.push(sheet_report);
                }
                Err(error) => {
                    tracing::warn!(sheet = %sheet.name, %error, "skipped sheet");
                    report.skipped.push(SkippedSheet {
                        sheet: sheet.name.to_owned(),
                        reason: error.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    fn ingest_sheet(&self, sheet: &Sheet, store: &MethodStore) -> Result<SheetReport, OdsqlError> {
        let table_name = identifier::normalize(&sheet.name);
        let header = sheet
            .header()
            .ok_or_else(|| SchemaError::NoColumnsError(sheet.name.to_owned()))?;
        let schema = Schema::from_header(&sheet.name, header)?;
        let table = StoredTable::new(&table_name, schema.columns.to_owned());
        table.create_if_missing(self.database)?;

        let mut resolver = ReferenceResolver::new(self.database);
        for foreign_key in schema.columns.iter().filter_map(|column| column.foreign_key.as_ref()) {
            resolver.prepare(foreign_key)?;
        }

        let width = schema.width();
        // Column index to the last formula seen in that column
        let mut formulas: BTreeMap<usize, &str> = BTreeMap::new();
        let mut rows = 0;
        for row in sheet.data_rows().iter().filter(|row| !row.is_blank()) {
            let mut texts = vec![""; schema.columns.len()];
            for (position, cell) in row.positions(width) {
                let Some(&index) = schema.positions.get(&position) else {
                    continue;
                };
                if let Some(formula) = &cell.formula {
                    formulas.insert(index, formula.as_str());
                }
                texts[index] = cell.text.as_str();
            }
            if texts.iter().all(|text| text.is_empty()) {
                continue;
            }

            let mut values = Vec::with_capacity(texts.len());
            for (column, text) in schema.columns.iter().zip(&texts) {
                let value = match &column.foreign_key {
                    Some(foreign_key) => resolver.resolve(foreign_key, text)?.map_or(Value::Null, Value::BigInt),
                    None => Value::Text(text.to_string()),
                };
                values.push(value);
            }
            let id = table.insert(self.database, &values)?;
            tracing::debug!(table = %table_name, id, "row inserted");
            rows += 1;
        }

        let letters = schema.letters();
        let compiler = FormulaCompiler::new(&letters);
        let mut formula_columns = Vec::with_capacity(formulas.len());
        for (index, formula) in formulas {
            let column = &schema.columns[index].name;
            match compiler.compile(formula) {
                Ok(expression) => {
                    store.save(&FormulaUnit {
                        table: table_name.to_owned(),
                        column: column.to_owned(),
                        formula: formula.to_owned(),
                        expression,
                    })?;
                    formula_columns.push(column.to_owned());
                }
                Err(error) => {
                    tracing::warn!(table = %table_name, column = %column, formula, %error, "formula not compiled");
                }
            }
        }

        Ok(SheetReport {
            sheet: sheet.name.to_owned(),
            table: table_name,
            rows,
            formula_columns,
        })
    }
}
