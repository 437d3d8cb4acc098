//! Note model.

use crate::error::{Error, Result};
use crate::storage::record::{flag, require, text, Draft, Filter, Patch, Record, SqlValue};
use crate::storage::Module;
use rusqlite::Row;
use serde::Serialize;

/// A free-form text note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub tags: String,
    pub is_favorite: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a note.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: String,
    pub is_favorite: bool,
}

impl NoteDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a note.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<String>,
    pub is_favorite: Option<bool>,
}

/// Listing categories for notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteFilter {
    #[default]
    All,
    Favorites,
}

impl Record for Note {
    const ENTITY: &'static str = "note";
    const TABLE: &'static str = "notes";
    const MODULE: Module = Module::Notes;
    const COLUMNS: &'static str = "id, title, content, tags, is_favorite, created_at, updated_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "content", "tags"];
    const ORDER_BY: &'static str = "title COLLATE NOCASE, id";

    type Draft = NoteDraft;
    type Patch = NotePatch;
    type Filter = NoteFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            tags: row.get(3)?,
            is_favorite: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl Draft for NoteDraft {
    fn validate(&self) -> Result<()> {
        require(Note::ENTITY, "title", &self.title)
    }

    fn columns(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("title", text(self.title.trim())),
            ("content", text(&self.content)),
            ("tags", text(&self.tags)),
            ("is_favorite", flag(self.is_favorite)),
        ])
    }

    fn summary(&self) -> String {
        self.title.trim().to_string()
    }
}

impl Patch for NotePatch {
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        let mut out = Vec::new();
        if let Some(title) = &self.title {
            require(Note::ENTITY, "title", title)?;
            out.push(("title", text(title.trim())));
        }
        if let Some(content) = &self.content {
            out.push(("content", text(content)));
        }
        if let Some(tags) = &self.tags {
            out.push(("tags", text(tags)));
        }
        if let Some(favorite) = self.is_favorite {
            out.push(("is_favorite", flag(favorite)));
        }
        Ok(out)
    }
}

impl Filter for NoteFilter {
    fn predicate(&self) -> Option<(String, Vec<SqlValue>)> {
        match self {
            Self::All => None,
            Self::Favorites => Some(("is_favorite = 1".to_string(), Vec::new())),
        }
    }
}

impl std::str::FromStr for NoteFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "favorites" => Ok(Self::Favorites),
            other => Err(Error::InvalidArgument(format!(
                "unknown note filter '{other}' (all, favorites)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::audit::{list_entries, AuditAction};
    use crate::storage::SqliteStorage;

    #[test]
    fn test_create_then_search_content() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage
            .create::<Note>(&NoteDraft::new("Todo", "Buy milk"))
            .unwrap();

        let hits = storage.list::<Note>(&NoteFilter::All, Some("milk")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert_eq!(hits[0].title, "Todo");

        let entries = list_entries(storage.conn(), Some(Module::Notes), None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Create);
    }

    #[test]
    fn test_search_is_case_insensitive_and_literal() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .create::<Note>(&NoteDraft::new("Sale", "50% off"))
            .unwrap();
        storage
            .create::<Note>(&NoteDraft::new("Plain", "500 items"))
            .unwrap();

        assert_eq!(storage.list::<Note>(&NoteFilter::All, Some("SALE")).unwrap().len(), 1);
        assert_eq!(storage.list::<Note>(&NoteFilter::All, Some("50%")).unwrap().len(), 1);
    }

    #[test]
    fn test_favorite_toggle() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let id = storage.create::<Note>(&NoteDraft::new("A", "")).unwrap();
        storage.create::<Note>(&NoteDraft::new("B", "")).unwrap();

        let patch = NotePatch {
            is_favorite: Some(true),
            ..NotePatch::default()
        };
        storage.update::<Note>(id, &patch).unwrap();

        let favorites = storage.list::<Note>(&NoteFilter::Favorites, None).unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, id);
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let err = storage.update::<Note>(99, &NotePatch::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "note", id: 99 }));
        assert!(matches!(
            storage.delete::<Note>(99).unwrap_err(),
            Error::NotFound { .. }
        ));
    }
}
