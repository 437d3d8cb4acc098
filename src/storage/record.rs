//! Generic entity repository.
//!
//! Every entity kind describes its table through [`Record`] and supplies a
//! typed draft (create), patch (partial update) and filter (list category).
//! The CRUD operations below are written once against that contract, so
//! every kind gets the same validation, audit pairing and not-found rules.

use crate::error::{Error, Result};
use crate::storage::audit::{AuditAction, Module};
use crate::storage::sqlite::{now_ms, SqliteStorage};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::info;

/// Owned SQL value used for dynamically built statements.
pub type SqlValue = rusqlite::types::Value;

/// A persisted entity kind.
pub trait Record: Sized {
    /// Human name used in errors and audit details (`"note"`).
    const ENTITY: &'static str;
    /// Backing table.
    const TABLE: &'static str;
    /// Audit module owning this table.
    const MODULE: Module;
    /// Select list, in the order [`Record::from_row`] reads it.
    const COLUMNS: &'static str;
    /// Text columns matched by the free-text search.
    const SEARCH_COLUMNS: &'static [&'static str];
    /// ORDER BY clause for listings.
    const ORDER_BY: &'static str;

    type Draft: Draft;
    type Patch: Patch;
    type Filter: Filter;

    /// Build a record from a row selected with [`Record::COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns an error if a column has an unexpected type.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Input for `create`.
pub trait Draft {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequiredField`] naming the first empty field.
    fn validate(&self) -> Result<()>;

    /// Column/value pairs to insert (timestamps are added by the repository).
    ///
    /// # Errors
    ///
    /// Returns an error if a structured field cannot be encoded.
    fn columns(&self) -> Result<Vec<(&'static str, SqlValue)>>;

    /// Short description for the audit detail, e.g. the record's name.
    fn summary(&self) -> String;
}

/// Input for `update`. Each field maps to one allow-listed column.
pub trait Patch {
    /// Column assignments for the fields that are set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequiredField`] when a patch would blank a required field.
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>>;
}

/// Category narrowing for `list`.
pub trait Filter {
    /// SQL predicate and its parameters, or `None` for "everything".
    ///
    /// Placeholders are numbered from `?1`; the search term is bound after them.
    fn predicate(&self) -> Option<(String, Vec<SqlValue>)>;
}

impl Filter for () {
    fn predicate(&self) -> Option<(String, Vec<SqlValue>)> {
        None
    }
}

/// True when an optional text field holds something other than whitespace.
#[must_use]
pub fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Fail with [`Error::RequiredField`] when `value` is blank.
///
/// # Errors
///
/// Returns [`Error::RequiredField`] if the value is empty or whitespace.
pub fn require(entity: &'static str, field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::RequiredField { entity, field })
    } else {
        Ok(())
    }
}

/// Convert an optional string into an SQL value (NULL when absent).
#[must_use]
pub fn opt_text(value: Option<&str>) -> SqlValue {
    value.map_or(SqlValue::Null, |v| SqlValue::Text(v.to_string()))
}

/// Text SQL value.
#[must_use]
pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

/// Boolean SQL value stored as 0/1.
#[must_use]
pub fn flag(value: bool) -> SqlValue {
    SqlValue::Integer(i64::from(value))
}

/// Escape `%`, `_` and `\` so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Insert a validated draft inside an open transaction and return its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub(crate) fn insert_record<R: Record>(conn: &Connection, draft: &R::Draft, now: i64) -> Result<i64> {
    let mut columns = draft.columns()?;
    columns.push(("created_at", SqlValue::Integer(now)));
    columns.push(("updated_at", SqlValue::Integer(now)));

    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::TABLE,
        names.join(", "),
        placeholders.join(", ")
    );

    conn.execute(
        &sql,
        rusqlite::params_from_iter(columns.iter().map(|(_, value)| value)),
    )?;
    Ok(conn.last_insert_rowid())
}

/// Load one record inside any connection or transaction.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) fn fetch_record<R: Record>(conn: &Connection, id: i64) -> Result<Option<R>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", R::COLUMNS, R::TABLE);
    Ok(conn.query_row(&sql, [id], R::from_row).optional()?)
}

impl SqliteStorage {
    /// Create a record and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequiredField`] for missing input, or a storage error.
    pub fn create<R: Record>(&mut self, draft: &R::Draft) -> Result<i64> {
        draft.validate()?;
        let summary = draft.summary();

        let id = self.mutate(&format!("create_{}", R::ENTITY), |tx, ctx| {
            let id = insert_record::<R>(tx, draft, now_ms())?;
            ctx.record(
                AuditAction::Create,
                R::MODULE,
                format!("Created {} {summary}", R::ENTITY),
            );
            Ok(id)
        })?;

        info!(entity = R::ENTITY, id, "Created record");
        Ok(id)
    }

    /// Get a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get<R: Record>(&self, id: i64) -> Result<Option<R>> {
        fetch_record::<R>(self.conn(), id)
    }

    /// Get a record by id, failing with [`Error::NotFound`] when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a storage error.
    pub fn require<R: Record>(&self, id: i64) -> Result<R> {
        self.get::<R>(id)?.ok_or(Error::NotFound {
            entity: R::ENTITY,
            id,
        })
    }

    /// List records narrowed by a category filter and a free-text search.
    ///
    /// The search is a case-insensitive substring match OR-ed across the
    /// kind's search columns; it is AND-ed with the filter predicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list<R: Record>(&self, filter: &R::Filter, search: Option<&str>) -> Result<Vec<R>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        if let Some((predicate, values)) = filter.predicate() {
            conditions.push(format!("({predicate})"));
            params.extend(values);
        }

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            params.push(SqlValue::Text(like_pattern(term)));
            let idx = params.len();
            let matches: Vec<String> = R::SEARCH_COLUMNS
                .iter()
                .map(|col| format!("{col} LIKE ?{idx} ESCAPE '\\'"))
                .collect();
            conditions.push(format!("({})", matches.join(" OR ")));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM {}{where_clause} ORDER BY {}",
            R::COLUMNS,
            R::TABLE,
            R::ORDER_BY
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), R::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count all records of a kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count<R: Record>(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", R::TABLE);
        let count: i64 = self.conn().query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Apply a partial update. `updated_at` is always refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id does not exist, a validation
    /// error from the patch, or a storage error.
    pub fn update<R: Record>(&mut self, id: i64, patch: &R::Patch) -> Result<()> {
        let assignments = patch.assignments()?;

        self.mutate(&format!("update_{}", R::ENTITY), |tx, ctx| {
            let changed: Vec<&str> = assignments.iter().map(|(name, _)| *name).collect();

            let mut sets = vec!["updated_at = ?1".to_string()];
            let mut params = vec![SqlValue::Integer(now_ms())];
            for (name, value) in &assignments {
                params.push(value.clone());
                sets.push(format!("{name} = ?{}", params.len()));
            }
            params.push(SqlValue::Integer(id));

            let sql = format!(
                "UPDATE {} SET {} WHERE id = ?{}",
                R::TABLE,
                sets.join(", "),
                params.len()
            );
            let affected = tx.execute(&sql, rusqlite::params_from_iter(params.iter()))?;

            if affected == 0 {
                return Err(Error::NotFound {
                    entity: R::ENTITY,
                    id,
                });
            }

            let detail = if changed.is_empty() {
                format!("Touched {} {id}", R::ENTITY)
            } else {
                format!("Updated {} {id} ({})", R::ENTITY, changed.join(", "))
            };
            ctx.record(AuditAction::Update, R::MODULE, detail);
            Ok(())
        })
    }

    /// Delete a record. No cascade to other kinds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id does not exist, or a storage error.
    pub fn delete<R: Record>(&mut self, id: i64) -> Result<()> {
        self.mutate(&format!("delete_{}", R::ENTITY), |tx, ctx| {
            let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
            let affected = tx.execute(&sql, [id])?;

            if affected == 0 {
                return Err(Error::NotFound {
                    entity: R::ENTITY,
                    id,
                });
            }

            ctx.record(
                AuditAction::Delete,
                R::MODULE,
                format!("Deleted {} {id}", R::ENTITY),
            );
            Ok(())
        })?;

        info!(entity = R::ENTITY, id, "Deleted record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_require_rejects_whitespace() {
        assert!(require("note", "title", "Todo").is_ok());
        let err = require("note", "title", "   ").unwrap_err();
        assert!(matches!(
            err,
            Error::RequiredField {
                entity: "note",
                field: "title"
            }
        ));
    }

    #[test]
    fn test_is_present() {
        assert!(is_present(Some("x")));
        assert!(!is_present(Some(" ")));
        assert!(!is_present(None));
    }
}
