use crate::database::identifier;
use crate::database::identifier::IDENTITY;
use crate::database::Database;
use crate::error::OdsqlError;
use crate::formula::evaluator;
use crate::formula::store::MethodStore;
use crate::formula::MethodError;
use std::collections::HashMap;

/// Outcome of evaluating a stored formula against one row.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodResult {
    /// Formula text as found in the document
    pub formula: String,
    pub value: f64,
}

/// Read-time evaluation of stored formulas; never writes to the database.
pub struct MethodEvaluator<'a> {
    database: &'a Database,
}

impl<'a> MethodEvaluator<'a> {
    pub fn new(database: &'a Database) -> Self {
        MethodEvaluator { database }
    }

    pub fn run(&self, table: &str, column: &str, id: i64) -> Result<MethodResult, OdsqlError> {
        let unit = match MethodStore::existing(self.database)? {
            Some(store) => store.load(table, column)?,
            None => None,
        };
        let unit = unit.ok_or_else(|| MethodError::FormulaNotFoundError {
            table: table.to_owned(),
            column: column.to_owned(),
        })?;
        let row = self.fetch_row(table, id)?.ok_or_else(|| MethodError::RowNotFoundError {
            table: table.to_owned(),
            id,
        })?;
        let value = evaluator::evaluate(&unit.expression, &row);
        tracing::debug!(table, column, id, value, "formula evaluated");
        Ok(MethodResult {
            formula: unit.formula,
            value,
        })
    }

    /// Every field of the row as text, `None` when the row or the table does not exist
    fn fetch_row(&self, table: &str, id: i64) -> Result<Option<HashMap<String, Option<String>>>, OdsqlError> {
        let columns = self.database.table_columns(table)?;
        if columns.is_empty() {
            return Ok(None);
        }
        let selections = columns
            .iter()
            .map(|column| -> Result<String, OdsqlError> {
                Ok(format!("CAST({} AS VARCHAR)", identifier::quote(column)?))
            })
            .collect::<Result<Vec<String>, _>>()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {IDENTITY} = ?",
            selections.join(", "),
            identifier::quote(table)?,
        );
        let mut statement = self.database.connection().prepare(&sql)?;
        let result = statement.query_row([id], |row| {
            (0..columns.len())
                .map(|index| Ok((columns[index].to_owned(), row.get::<_, Option<String>>(index)?)))
                .collect::<Result<HashMap<_, _>, duckdb::Error>>()
        });
        match result {
            Ok(fields) => Ok(Some(fields)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(error) => Err(error)?,
        }
    }
}
