use crate::database::column::Column;
use crate::database::identifier;
use crate::database::identifier::IDENTITY;
use crate::database::Database;
use crate::error::OdsqlError;
use duckdb::params_from_iter;
use duckdb::types::Value;

/// Relational table materialized from one sheet.
#[derive(Clone, Debug)]
pub struct StoredTable {
    /// Normalized sheet name
    pub name: String,
    pub columns: Vec<Column>,
}

impl StoredTable {
    pub fn new(name: &str, columns: Vec<Column>) -> Self {
        StoredTable {
            name: name.to_owned(),
            columns,
        }
    }

    /// Creates the identity sequence and the table unless they already exist.
    /// An existing table is left untouched, whatever its columns.
    pub fn create_if_missing(&self, database: &Database) -> Result<(), OdsqlError> {
        let definitions = self
            .columns
            .iter()
            .map(|column| -> Result<String, OdsqlError> {
                Ok(format!("{} {}", identifier::quote(&column.name)?, column.sql_type()))
            })
            .collect::<Result<Vec<String>, _>>()?;
        create_with_identity(database, &self.name, &definitions)
    }

    /// Inserts one row of values (in column order) and returns its identity
    pub fn insert(&self, database: &Database, values: &[Value]) -> Result<i64, OdsqlError> {
        let names = self
            .columns
            .iter()
            .map(|column| identifier::quote(&column.name))
            .collect::<Result<Vec<String>, _>>()?;
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            identifier::quote(&self.name)?,
            names.join(", "),
            placeholders,
            IDENTITY,
        );
        let mut statement = database.connection().prepare_cached(&sql)?;
        let id = statement.query_row(params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(id)
    }
}

/// `CREATE SEQUENCE` + `CREATE TABLE ... IF NOT EXISTS` with an auto-incrementing `id`.
/// `definitions` are already quoted `name TYPE` fragments.
pub(crate) fn create_with_identity(
    database: &Database,
    table: &str,
    definitions: &[String],
) -> Result<(), OdsqlError> {
    let sequence = format!("{table}_{IDENTITY}_seq");
    let quoted_sequence = identifier::quote(&sequence)?;
    let mut sql = format!(
        "CREATE SEQUENCE IF NOT EXISTS {quoted_sequence};\nCREATE TABLE IF NOT EXISTS {} ({IDENTITY} BIGINT PRIMARY KEY DEFAULT nextval('{sequence}')",
        identifier::quote(table)?,
    );
    for definition in definitions {
        sql.push_str(", ");
        sql.push_str(definition);
    }
    sql.push_str(");");
    tracing::debug!(table, "{}", sql);
    database.connection().execute_batch(&sql)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::ForeignKey;
    use crate::test_support;
    use pretty_assertions::assert_eq;

    fn table() -> StoredTable {
        StoredTable::new(
            "Pedidos",
            vec![
                Column {
                    name: "Producto".to_owned(),
                    position: 0,
                    foreign_key: None,
                },
                Column {
                    name: "Cliente_Nombre".to_owned(),
                    position: 1,
                    foreign_key: Some(ForeignKey {
                        table: "Cliente".to_owned(),
                        display_columns: vec!["Nombre".to_owned()],
                    }),
                },
            ],
        )
    }

    #[test]
    fn create_and_insert() {
        let database = test_support::database();
        let table = table();
        table.create_if_missing(&database).unwrap();
        assert!(database.table_exists("Pedidos").unwrap());
        assert_eq!(
            database.table_columns("Pedidos").unwrap(),
            vec!["id".to_owned(), "Producto".to_owned(), "Cliente_Nombre".to_owned()]
        );

        let first = table
            .insert(&database, &[Value::Text("Mesa".to_owned()), Value::BigInt(7)])
            .unwrap();
        let second = table
            .insert(&database, &[Value::Text("".to_owned()), Value::Null])
            .unwrap();
        assert_eq!(second, first + 1);
        assert_eq!(test_support::count(&database, "Pedidos"), 2);
        assert_eq!(
            test_support::column_values(&database, "Pedidos", "Cliente_Nombre"),
            vec![Some("7".to_owned()), None]
        );
    }

    #[test]
    fn create_is_idempotent() {
        let database = test_support::database();
        let table = table();
        table.create_if_missing(&database).unwrap();
        table.insert(&database, &[Value::Text("Mesa".to_owned()), Value::Null]).unwrap();
        table.create_if_missing(&database).unwrap();
        assert_eq!(test_support::count(&database, "Pedidos"), 1);
    }

    #[test]
    fn rejects_unsafe_names() {
        let database = test_support::database();
        let table = StoredTable::new("Pedidos\"; DROP", Vec::new());
        let result = table.create_if_missing(&database);
        assert!(matches!(
            result,
            Err(OdsqlError::SchemaError(crate::database::SchemaError::InvalidIdentifierError(_)))
        ));
    }
}
