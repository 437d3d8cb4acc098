//! Utility model.
//!
//! A utility is a launcher entry: a local application, a web site, or a
//! shell command line.

use crate::error::{Error, Result};
use crate::storage::record::{flag, is_present, opt_text, require, text, Draft, Filter, Patch, Record, SqlValue};
use crate::storage::sqlite::parse_text;
use crate::storage::Module;
use rusqlite::Row;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// What a utility launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    App,
    Site,
    Command,
}

impl UtilityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Site => "site",
            Self::Command => "command",
        }
    }

    /// The field a utility of this kind cannot run without.
    #[must_use]
    pub const fn target_field(&self) -> &'static str {
        match self {
            Self::App | Self::Site => "path",
            Self::Command => "command",
        }
    }
}

impl FromStr for UtilityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "app" => Ok(Self::App),
            "site" => Ok(Self::Site),
            "command" => Ok(Self::Command),
            other => Err(format!("unknown utility kind '{other}' (app, site, command)")),
        }
    }
}

impl fmt::Display for UtilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A launcher entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utility {
    pub id: i64,
    pub name: String,
    pub kind: UtilityKind,

    /// Application path or site URL
    pub path: Option<String>,

    /// Shell command line for `command` utilities
    pub command: Option<String>,

    pub is_favorite: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Utility {
    /// The value launched for this utility's kind, if set.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        let value = match self.kind {
            UtilityKind::App | UtilityKind::Site => self.path.as_deref(),
            UtilityKind::Command => self.command.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// Input for creating a utility.
#[derive(Debug, Clone)]
pub struct UtilityDraft {
    pub name: String,
    pub kind: UtilityKind,
    pub path: Option<String>,
    pub command: Option<String>,
    pub is_favorite: bool,
}

/// Partial update for a utility.
#[derive(Debug, Clone, Default)]
pub struct UtilityPatch {
    pub name: Option<String>,
    pub kind: Option<UtilityKind>,
    pub path: Option<String>,
    pub command: Option<String>,
    pub is_favorite: Option<bool>,
}

/// Listing categories for utilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UtilityFilter {
    #[default]
    All,
    Favorites,
    Kind(UtilityKind),
}

impl Record for Utility {
    const ENTITY: &'static str = "utility";
    const TABLE: &'static str = "utilities";
    const MODULE: Module = Module::Utilities;
    const COLUMNS: &'static str = "id, name, kind, path, command, is_favorite, created_at, updated_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "path", "command"];
    const ORDER_BY: &'static str = "name COLLATE NOCASE, id";

    type Draft = UtilityDraft;
    type Patch = UtilityPatch;
    type Filter = UtilityFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            kind: parse_text(row, 2)?,
            path: row.get(3)?,
            command: row.get(4)?,
            is_favorite: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl Draft for UtilityDraft {
    fn validate(&self) -> Result<()> {
        require(Utility::ENTITY, "name", &self.name)?;
        let target = match self.kind {
            UtilityKind::App | UtilityKind::Site => self.path.as_deref(),
            UtilityKind::Command => self.command.as_deref(),
        };
        if is_present(target) {
            Ok(())
        } else {
            Err(Error::RequiredField {
                entity: Utility::ENTITY,
                field: self.kind.target_field(),
            })
        }
    }

    fn columns(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("name", text(self.name.trim())),
            ("kind", text(self.kind.as_str())),
            ("path", opt_text(self.path.as_deref())),
            ("command", opt_text(self.command.as_deref())),
            ("is_favorite", flag(self.is_favorite)),
        ])
    }

    fn summary(&self) -> String {
        format!("{} ({})", self.name.trim(), self.kind)
    }
}

impl Patch for UtilityPatch {
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        let mut out = Vec::new();
        if let Some(name) = &self.name {
            require(Utility::ENTITY, "name", name)?;
            out.push(("name", text(name.trim())));
        }
        if let Some(kind) = self.kind {
            out.push(("kind", text(kind.as_str())));
        }
        if let Some(path) = &self.path {
            out.push(("path", text(path)));
        }
        if let Some(command) = &self.command {
            out.push(("command", text(command)));
        }
        if let Some(favorite) = self.is_favorite {
            out.push(("is_favorite", flag(favorite)));
        }
        Ok(out)
    }
}

impl Filter for UtilityFilter {
    fn predicate(&self) -> Option<(String, Vec<SqlValue>)> {
        match self {
            Self::All => None,
            Self::Favorites => Some(("is_favorite = 1".to_string(), Vec::new())),
            Self::Kind(kind) => Some(("kind = ?1".to_string(), vec![text(kind.as_str())])),
        }
    }
}

impl FromStr for UtilityFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "favorites" => Ok(Self::Favorites),
            other => other.parse().map(Self::Kind).map_err(|_| {
                Error::InvalidArgument(format!(
                    "unknown utility filter '{other}' (all, favorites, app, site, command)"
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    fn site(name: &str, url: &str) -> UtilityDraft {
        UtilityDraft {
            name: name.into(),
            kind: UtilityKind::Site,
            path: Some(url.into()),
            command: None,
            is_favorite: false,
        }
    }

    #[test]
    fn test_kind_decides_required_field() {
        let mut draft = site("Docs", "");
        assert!(matches!(
            draft.validate().unwrap_err(),
            Error::RequiredField { field: "path", .. }
        ));

        draft.kind = UtilityKind::Command;
        draft.command = Some("ls -la".into());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_filter_by_kind() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create::<Utility>(&site("Docs", "docs.rs")).unwrap();
        storage
            .create::<Utility>(&UtilityDraft {
                name: "List".into(),
                kind: UtilityKind::Command,
                path: None,
                command: Some("ls".into()),
                is_favorite: true,
            })
            .unwrap();

        let sites = storage
            .list::<Utility>(&UtilityFilter::Kind(UtilityKind::Site), None)
            .unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].target(), Some("docs.rs"));

        let favorites = storage.list::<Utility>(&UtilityFilter::Favorites, None).unwrap();
        assert_eq!(favorites[0].kind, UtilityKind::Command);
        assert_eq!("site".parse::<UtilityFilter>().unwrap(), UtilityFilter::Kind(UtilityKind::Site));
    }
}
