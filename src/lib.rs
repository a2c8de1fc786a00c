//! # ODS to SQL Importer
//!
//! Imports an OpenDocument spreadsheet into a DuckDB database and keeps its
//! formulas as re-evaluatable methods.
//!
//! ## Pipeline
//!
//! - **Fetch**: the package is read from a local path, a `file://` URL or a
//!   remote URL (through DuckDB's `read_blob`) and `content.xml` is extracted
//! - **Parse**: sheets, rows and cells are decoded with their repeat counts and
//!   formula text
//! - **Schema**: each sheet becomes a table named after the normalized sheet
//!   name; header labels become columns and `Table_Field1_Field2` labels become
//!   foreign keys to a `Table` holding `Field1`, `Field2`
//! - **Rows**: data rows are expanded, references resolved (inserting referenced
//!   rows on first sight) and stored; blank rows are skipped
//! - **Formulas**: the last formula seen in each column is compiled into an
//!   expression tree and stored in `_formula_units`
//!
//! [`run_method`] later recomputes a stored formula against one row.
//!
//! ## Logging
//!
//! Progress is reported through `tracing`; install a subscriber to see it.

pub mod config;
pub mod database;
pub mod error;
pub mod formula;
mod helpers;
pub mod importer;
pub mod spreadsheet;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use database::Database;
pub use error::OdsqlError;
pub use helpers::reader::FetchError;
pub use helpers::zip::ArchiveError;
pub use formula::MethodResult;
pub use importer::ImportReport;
pub use importer::Importer;

/// Imports the spreadsheet at `location` into the database `<database_name>.db`.
///
/// Returns the configuration naming the database together with the report.
/// Fetch, archive and document parse failures abort; failing sheets are
/// skipped and listed in the report.
pub fn import(location: &str, database_name: &str) -> Result<(Config, ImportReport), OdsqlError> {
    let config = Config::for_database(database_name)?;
    let database = Database::open(config.database_path())?;
    let report = Importer::new(&database).import(location)?;
    tracing::info!(
        location,
        database = %config.database_path().display(),
        sheets = report.sheets.len(),
        skipped = report.skipped.len(),
        rows = report.rows(),
        "import finished"
    );
    Ok((config, report))
}

/// Evaluates the stored formula of `table.column` against row `id`.
pub fn run_method(config: &Config, table: &str, column: &str, id: i64) -> Result<MethodResult, OdsqlError> {
    let database = Database::open(config.database_path())?;
    formula::MethodEvaluator::new(&database).run(table, column, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::MethodError;
    use crate::test_support::cell;
    use crate::test_support::formula_cell;
    use crate::test_support::row;
    use crate::test_support::table;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn import_then_run_method() {
        test_support::init_tracing();
        let directory = TempDir::new().unwrap();
        let sheet = table(
            "Productos",
            &[
                row(&[cell("Nombre"), cell("Cantidad"), cell("Precio"), cell("Total")]),
                row(&[cell("Mesa"), cell("2"), cell("34.00 €"), formula_cell("of:=ROUND([.B2]*[.C2]*1.21;2)", "82.28")]),
            ],
        );
        let path = test_support::write_ods(directory.path(), "productos.ods", &sheet);
        let database_name = directory.path().join("tienda");

        let (config, report) = import(path.to_str().unwrap(), database_name.to_str().unwrap()).unwrap();
        assert_eq!(config.database_path(), directory.path().join("tienda.db"));
        assert!(config.database_path().exists());
        assert_eq!(report.rows(), 1);

        let result = run_method(&config, "Productos", "Total", 1).unwrap();
        assert_eq!(result.formula, "of:=ROUND([.B2]*[.C2]*1.21;2)");
        assert!((result.value - 82.28).abs() < 1e-9);

        let missing = run_method(&config, "Productos", "Nombre", 1);
        assert!(matches!(
            missing,
            Err(OdsqlError::MethodError(MethodError::FormulaNotFoundError { .. }))
        ));
    }

    #[test]
    fn import_rejects_empty_database_name() {
        let result = import("missing.ods", " ");
        assert!(matches!(result, Err(OdsqlError::ConfigError(_))));
    }
}
