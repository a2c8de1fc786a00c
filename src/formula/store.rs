use crate::database::Database;
use crate::error::OdsqlError;
use crate::formula::expression::Expr;
use duckdb::params;

/// Table holding one compiled formula per `(table_name, column_name)`.
/// Sheet-derived names never start with `_` followed by a letter, so it cannot collide.
pub const METHOD_TABLE: &str = "_formula_units";

/// Persisted, re-evaluatable formula bound to one column of a table.
#[derive(Clone, Debug, PartialEq)]
pub struct FormulaUnit {
    pub table: String,
    pub column: String,
    /// Formula text as found in the document, kept for display
    pub formula: String,
    pub expression: Expr,
}

/// Keyed storage of [`FormulaUnit`]s inside the imported database.
pub struct MethodStore<'a> {
    database: &'a Database,
}

impl<'a> MethodStore<'a> {
    /// Opens the store, creating its table if needed
    pub fn open(database: &'a Database) -> Result<Self, OdsqlError> {
        database.connection().execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {METHOD_TABLE} (
                table_name VARCHAR NOT NULL,
                column_name VARCHAR NOT NULL,
                formula VARCHAR NOT NULL,
                expression VARCHAR NOT NULL,
                PRIMARY KEY (table_name, column_name)
            );"
        ))?;
        Ok(MethodStore { database })
    }

    /// Attaches to the store without creating it; `None` if nothing was ever stored
    pub fn existing(database: &'a Database) -> Result<Option<Self>, OdsqlError> {
        if database.table_exists(METHOD_TABLE)? {
            Ok(Some(MethodStore { database }))
        } else {
            Ok(None)
        }
    }

    /// Writes the unit, replacing any previous unit of the same column
    pub fn save(&self, unit: &FormulaUnit) -> Result<(), OdsqlError> {
        let expression = serde_json::to_string(&unit.expression)?;
        let mut statement = self.database.connection().prepare_cached(&format!(
            "INSERT OR REPLACE INTO {METHOD_TABLE} (table_name, column_name, formula, expression) VALUES (?, ?, ?, ?)"
        ))?;
        statement.execute(params![unit.table, unit.column, unit.formula, expression])?;
        tracing::debug!(table = %unit.table, column = %unit.column, "formula unit saved");
        Ok(())
    }

    /// Loads the unit of a column; `None` means the column has no formula
    pub fn load(&self, table: &str, column: &str) -> Result<Option<FormulaUnit>, OdsqlError> {
        let mut statement = self.database.connection().prepare_cached(&format!(
            "SELECT formula, expression FROM {METHOD_TABLE} WHERE table_name = ? AND column_name = ?"
        ))?;
        let (formula, expression) = match statement.query_row([table, column], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        }) {
            Ok(found) => found,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(error) => Err(error)?,
        };
        Ok(Some(FormulaUnit {
            table: table.to_owned(),
            column: column.to_owned(),
            formula,
            expression: serde_json::from_str(&expression)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::expression::Operator;
    use crate::test_support;
    use pretty_assertions::assert_eq;

    fn unit(formula: &str, expression: Expr) -> FormulaUnit {
        FormulaUnit {
            table: "Pedidos".to_owned(),
            column: "IVA".to_owned(),
            formula: formula.to_owned(),
            expression,
        }
    }

    #[test]
    fn save_and_load() {
        let database = test_support::database();
        let store = MethodStore::open(&database).unwrap();
        let saved = unit(
            "of:=[.C2]*0.21",
            Expr::binary(Operator::Multiply, Expr::field("Precio"), Expr::number(0.21)),
        );
        store.save(&saved).unwrap();
        assert_eq!(store.load("Pedidos", "IVA").unwrap(), Some(saved));
        assert_eq!(store.load("Pedidos", "Total").unwrap(), None);
        assert_eq!(store.load("Clientes", "IVA").unwrap(), None);
    }

    #[test]
    fn save_overwrites_previous_unit() {
        let database = test_support::database();
        let store = MethodStore::open(&database).unwrap();
        store.save(&unit("of:=1", Expr::number(1.0))).unwrap();
        store.save(&unit("of:=2", Expr::number(2.0))).unwrap();

        let loaded = store.load("Pedidos", "IVA").unwrap().unwrap();
        assert_eq!(loaded.formula, "of:=2");
        assert_eq!(loaded.expression, Expr::number(2.0));
        assert_eq!(test_support::count(&database, METHOD_TABLE), 1);
    }

    #[test]
    fn open_keeps_existing_units() {
        let database = test_support::database();
        MethodStore::open(&database).unwrap().save(&unit("of:=1", Expr::number(1.0))).unwrap();
        let store = MethodStore::open(&database).unwrap();
        assert_eq!(store.load("Pedidos", "IVA").unwrap().map(|unit| unit.formula), Some("of:=1".to_owned()));
    }

    #[test]
    fn existing_does_not_create() {
        let database = test_support::database();
        assert!(MethodStore::existing(&database).unwrap().is_none());
        assert!(!database.table_exists(METHOD_TABLE).unwrap());
        MethodStore::open(&database).unwrap();
        assert!(MethodStore::existing(&database).unwrap().is_some());
    }
}
