//! Spreadsheet model.
//!
//! A spreadsheet is a named grid: an ordered header list plus rows of cells.
//! Headers and rows are both stored as JSON arrays so every cell keeps the
//! column position it was written with, blank headers included.

use crate::error::{Error, Result};
use crate::storage::record::{require, text, Draft, Patch, Record, SqlValue};
use crate::storage::Module;
use rusqlite::Row;
use serde::Serialize;

/// A spreadsheet in the hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spreadsheet {
    pub id: i64,
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Spreadsheet {
    /// Rows padded or truncated to the header width.
    #[must_use]
    pub fn normalized_rows(&self) -> Vec<Vec<String>> {
        let width = self.headers.len();
        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<String> = row.iter().take(width).cloned().collect();
                cells.resize(width, String::new());
                cells
            })
            .collect()
    }
}

/// Input for creating a spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetDraft {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Partial update for a spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetPatch {
    pub name: Option<String>,
    pub headers: Option<Vec<String>>,
    pub rows: Option<Vec<Vec<String>>>,
}

/// Trimmed headers, keeping blank entries in place.
fn header_json(headers: &[String]) -> Result<SqlValue> {
    let trimmed: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
    Ok(SqlValue::Text(serde_json::to_string(&trimmed)?))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn require_headers(headers: &[String]) -> Result<()> {
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::RequiredField {
            entity: Spreadsheet::ENTITY,
            field: "headers",
        });
    }
    Ok(())
}

impl Record for Spreadsheet {
    const ENTITY: &'static str = "spreadsheet";
    const TABLE: &'static str = "spreadsheets";
    const MODULE: Module = Module::Spreadsheets;
    const COLUMNS: &'static str = "id, name, headers, rows, created_at, updated_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];
    const ORDER_BY: &'static str = "name COLLATE NOCASE, id";

    type Draft = SpreadsheetDraft;
    type Patch = SpreadsheetPatch;
    type Filter = ();

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            headers: json_column(row, 2)?,
            rows: json_column(row, 3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl Draft for SpreadsheetDraft {
    fn validate(&self) -> Result<()> {
        require(Spreadsheet::ENTITY, "name", &self.name)?;
        require_headers(&self.headers)
    }

    fn columns(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("name", text(self.name.trim())),
            ("headers", header_json(&self.headers)?),
            ("rows", SqlValue::Text(serde_json::to_string(&self.rows)?)),
        ])
    }

    fn summary(&self) -> String {
        self.name.trim().to_string()
    }
}

impl Patch for SpreadsheetPatch {
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        let mut out = Vec::new();
        if let Some(name) = &self.name {
            require(Spreadsheet::ENTITY, "name", name)?;
            out.push(("name", text(name.trim())));
        }
        if let Some(headers) = &self.headers {
            require_headers(headers)?;
            out.push(("headers", header_json(headers)?));
        }
        if let Some(rows) = &self.rows {
            out.push(("rows", SqlValue::Text(serde_json::to_string(rows)?)));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    fn draft() -> SpreadsheetDraft {
        SpreadsheetDraft {
            name: "Budget".into(),
            headers: vec!["Item".into(), "Cost".into()],
            rows: vec![vec!["Rent".into(), "900".into()]],
        }
    }

    #[test]
    fn test_headers_required() {
        let mut d = draft();
        d.headers = vec![" ".into()];
        assert!(matches!(
            d.validate().unwrap_err(),
            Error::RequiredField { field: "headers", .. }
        ));
    }

    #[test]
    fn test_rows_survive_storage() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage.create::<Spreadsheet>(&draft()).unwrap();

        let patch = SpreadsheetPatch {
            rows: Some(vec![vec!["Rent".into(), "950".into()], vec!["Food".into()]]),
            ..SpreadsheetPatch::default()
        };
        storage.update::<Spreadsheet>(id, &patch).unwrap();

        let sheet = storage.require::<Spreadsheet>(id).unwrap();
        assert_eq!(sheet.headers, vec!["Item", "Cost"]);
        assert_eq!(sheet.rows[0][1], "950");
        assert_eq!(sheet.normalized_rows()[1], vec!["Food", ""]);
    }

    #[test]
    fn test_blank_header_keeps_columns_aligned() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage
            .create::<Spreadsheet>(&SpreadsheetDraft {
                name: "Budget".into(),
                headers: vec!["Item".into(), " ".into(), "Price".into()],
                rows: vec![vec!["Rent".into(), "x".into(), "900".into()]],
            })
            .unwrap();

        let sheet = storage.require::<Spreadsheet>(id).unwrap();
        assert_eq!(sheet.headers, vec!["Item", "", "Price"]);
        assert_eq!(sheet.normalized_rows(), vec![vec!["Rent", "x", "900"]]);

        let patch = SpreadsheetPatch {
            headers: Some(vec!["".into(), "Cost".into()]),
            ..SpreadsheetPatch::default()
        };
        storage.update::<Spreadsheet>(id, &patch).unwrap();
        let sheet = storage.require::<Spreadsheet>(id).unwrap();
        assert_eq!(sheet.headers, vec!["", "Cost"]);
        assert_eq!(sheet.normalized_rows(), vec![vec!["Rent", "x"]]);
    }
}
