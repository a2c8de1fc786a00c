use crate::database::column::ForeignKey;
use crate::database::identifier;
use crate::database::identifier::IDENTITY;
use crate::database::table::create_with_identity;
use crate::database::Database;
use crate::error::OdsqlError;
use duckdb::params_from_iter;
use std::collections::HashSet;

/// Turns display text such as `"Ana Gomez"` into the identity of a row in the
/// referenced table, inserting that row on first sight.
///
/// Matching is exact over every display field; when several rows match, the
/// one with the lowest identity wins. Reads and inserts are not isolated, so
/// two concurrent imports may both insert the same tuple.
pub struct ReferenceResolver<'a> {
    database: &'a Database,
    /// Referenced tables already prepared for a given set of display fields
    prepared: HashSet<(String, Vec<String>)>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(database: &'a Database) -> Self {
        ReferenceResolver {
            database,
            prepared: HashSet::new(),
        }
    }

    /// Creates the referenced table (identity + one text field per display column) if missing,
    /// then adds any display field that an earlier reference to the same table did not name
    pub fn prepare(&mut self, foreign_key: &ForeignKey) -> Result<(), OdsqlError> {
        let key = (foreign_key.table.to_owned(), foreign_key.display_columns.clone());
        if self.prepared.contains(&key) {
            return Ok(());
        }
        let definitions = foreign_key
            .display_columns
            .iter()
            .map(|column| -> Result<String, OdsqlError> { Ok(format!("{} VARCHAR", identifier::quote(column)?)) })
            .collect::<Result<Vec<String>, _>>()?;
        create_with_identity(self.database, &foreign_key.table, &definitions)?;

        let existing = self.database.table_columns(&foreign_key.table)?;
        for column in &foreign_key.display_columns {
            if existing.iter().any(|name| name.eq_ignore_ascii_case(column)) {
                continue;
            }
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} VARCHAR",
                identifier::quote(&foreign_key.table)?,
                identifier::quote(column)?,
            );
            tracing::debug!(table = %foreign_key.table, column = %column, "{}", sql);
            self.database.connection().execute_batch(&sql)?;
        }
        self.prepared.insert(key);
        Ok(())
    }

    /// Resolves display text to an identity; `None` when the text is blank
    pub fn resolve(&mut self, foreign_key: &ForeignKey, text: &str) -> Result<Option<i64>, OdsqlError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.prepare(foreign_key)?;

        let tokens = tokenize(text, foreign_key.display_columns.len());
        if let Some(id) = self.find(foreign_key, &tokens)? {
            tracing::debug!(table = %foreign_key.table, id, text, "reference found");
            return Ok(Some(id));
        }
        let id = self.insert(foreign_key, &tokens)?;
        tracing::debug!(table = %foreign_key.table, id, text, "reference created");
        Ok(Some(id))
    }

    fn find(&self, foreign_key: &ForeignKey, tokens: &[String]) -> Result<Option<i64>, OdsqlError> {
        let conditions = foreign_key
            .display_columns
            .iter()
            .map(|column| -> Result<String, OdsqlError> { Ok(format!("{} = ?", identifier::quote(column)?)) })
            .collect::<Result<Vec<String>, _>>()?;
        let sql = format!(
            "SELECT {IDENTITY} FROM {} WHERE {} ORDER BY {IDENTITY} LIMIT 1",
            identifier::quote(&foreign_key.table)?,
            conditions.join(" AND "),
        );
        let mut statement = self.database.connection().prepare_cached(&sql)?;
        match statement.query_row(params_from_iter(tokens.iter()), |row| row.get(0)) {
            Ok(id) => Ok(Some(id)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn insert(&self, foreign_key: &ForeignKey, tokens: &[String]) -> Result<i64, OdsqlError> {
        let names = foreign_key
            .display_columns
            .iter()
            .map(|column| identifier::quote(column))
            .collect::<Result<Vec<String>, _>>()?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {IDENTITY}",
            identifier::quote(&foreign_key.table)?,
            names.join(", "),
            vec!["?"; names.len()].join(", "),
        );
        let mut statement = self.database.connection().prepare_cached(&sql)?;
        let id = statement.query_row(params_from_iter(tokens.iter()), |row| row.get(0))?;
        Ok(id)
    }
}

/// Splits display text on whitespace into exactly `count` tokens,
/// padding with empty strings and ignoring extras.
pub(crate) fn tokenize(display: &str, count: usize) -> Vec<String> {
    let mut tokens: Vec<String> = display
        .split_whitespace()
        .take(count)
        .map(str::to_owned)
        .collect();
    tokens.resize(count, String::new());
    tokens
}
