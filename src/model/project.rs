//! Project model.
//!
//! A project is a named working directory, scaffolded on creation with an
//! optional list of sub-folders.

use crate::error::{Error, Result};
use crate::model::{join_lines, split_lines};
use crate::storage::record::{flag, opt_text, require, text, Draft, Filter, Patch, Record, SqlValue};
use crate::storage::Module;
use rusqlite::Row;
use serde::Serialize;
use std::path::{Component, Path};

/// A project in the hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: i64,

    /// Display name
    pub name: String,

    /// Free-form category (`general`, `web`, `python`, ...)
    pub project_type: String,

    /// Absolute path to the project directory
    pub base_dir: String,

    /// Folders created under `base_dir`
    pub subfolders: Vec<String>,

    pub description: Option<String>,
    pub tags: String,
    pub is_favorite: bool,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

/// Input for creating a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub name: String,
    pub project_type: Option<String>,
    pub base_dir: String,
    pub subfolders: Vec<String>,
    pub description: Option<String>,
    pub tags: String,
    pub is_favorite: bool,
}

impl ProjectDraft {
    /// Draft with the two required fields set.
    #[must_use]
    pub fn new(name: impl Into<String>, base_dir: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a project. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub project_type: Option<String>,
    pub base_dir: Option<String>,
    pub subfolders: Option<Vec<String>>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub is_favorite: Option<bool>,
}

/// Listing categories for projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProjectFilter {
    #[default]
    All,
    Favorites,
    Type(String),
}

impl Record for Project {
    const ENTITY: &'static str = "project";
    const TABLE: &'static str = "projects";
    const MODULE: Module = Module::Projects;
    const COLUMNS: &'static str = "id, name, project_type, base_dir, subfolders, description, tags, is_favorite, created_at, updated_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "description", "tags"];
    const ORDER_BY: &'static str = "name COLLATE NOCASE, id";

    type Draft = ProjectDraft;
    type Patch = ProjectPatch;
    type Filter = ProjectFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let subfolders: String = row.get(4)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            project_type: row.get(2)?,
            base_dir: row.get(3)?,
            subfolders: split_lines(&subfolders),
            description: row.get(5)?,
            tags: row.get(6)?,
            is_favorite: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

/// Sub-folders must stay inside the project: relative, without `..`.
fn check_subfolders(folders: &[String]) -> Result<()> {
    for folder in folders.iter().map(|f| f.trim()).filter(|f| !f.is_empty()) {
        let escapes = Path::new(folder).components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if escapes {
            return Err(Error::InvalidArgument(format!(
                "subfolder '{folder}' must be a relative path inside the project"
            )));
        }
    }
    Ok(())
}

impl Draft for ProjectDraft {
    fn validate(&self) -> Result<()> {
        require(Project::ENTITY, "name", &self.name)?;
        require(Project::ENTITY, "base_dir", &self.base_dir)?;
        check_subfolders(&self.subfolders)
    }

    fn columns(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("name", text(self.name.trim())),
            (
                "project_type",
                text(self.project_type.as_deref().map_or("general", str::trim)),
            ),
            ("base_dir", text(self.base_dir.trim())),
            ("subfolders", text(&join_lines(&self.subfolders))),
            ("description", opt_text(self.description.as_deref())),
            ("tags", text(&self.tags)),
            ("is_favorite", flag(self.is_favorite)),
        ])
    }

    fn summary(&self) -> String {
        self.name.trim().to_string()
    }
}

impl Patch for ProjectPatch {
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        let mut out = Vec::new();
        if let Some(name) = &self.name {
            require(Project::ENTITY, "name", name)?;
            out.push(("name", text(name.trim())));
        }
        if let Some(kind) = &self.project_type {
            out.push(("project_type", text(kind.trim())));
        }
        if let Some(dir) = &self.base_dir {
            require(Project::ENTITY, "base_dir", dir)?;
            out.push(("base_dir", text(dir.trim())));
        }
        if let Some(folders) = &self.subfolders {
            check_subfolders(folders)?;
            out.push(("subfolders", text(&join_lines(folders))));
        }
        if let Some(description) = &self.description {
            out.push(("description", text(description)));
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

impl Filter for ProjectFilter {
    fn predicate(&self) -> Option<(String, Vec<SqlValue>)> {
        match self {
            Self::All => None,
            Self::Favorites => Some(("is_favorite = 1".to_string(), Vec::new())),
            Self::Type(kind) => Some(("project_type = ?1".to_string(), vec![text(kind)])),
        }
    }
}

impl std::str::FromStr for ProjectFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "favorites" => Ok(Self::Favorites),
            other => match other.strip_prefix("type:") {
                Some(kind) if !kind.is_empty() => Ok(Self::Type(kind.to_string())),
                _ => Err(Error::InvalidArgument(format!(
                    "unknown project filter '{other}' (all, favorites, type:<name>)"
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_draft_requires_name_and_base_dir() {
        let draft = ProjectDraft::new("Site", "");
        let err = draft.validate().unwrap_err();
        assert!(matches!(err, Error::RequiredField { field: "base_dir", .. }));

        assert!(ProjectDraft::new("Site", "/tmp/site").validate().is_ok());
    }

    #[test]
    fn test_subfolders_must_stay_inside_project() {
        let mut draft = ProjectDraft::new("Site", "/tmp/site");
        draft.subfolders = vec!["src/../docs".into(), "assets/./img".into()];
        assert!(matches!(draft.validate(), Err(Error::InvalidArgument(_))));

        draft.subfolders = vec!["/etc/hub".into()];
        assert!(matches!(draft.validate(), Err(Error::InvalidArgument(_))));

        draft.subfolders = vec!["assets/./img".into(), "docs".into()];
        assert!(draft.validate().is_ok());

        let patch = ProjectPatch {
            subfolders: Some(vec!["../outside".into()]),
            ..ProjectPatch::default()
        };
        assert!(matches!(patch.assignments(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_create_and_filter() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let mut web = ProjectDraft::new("Website", "/w/site");
        web.project_type = Some("web".into());
        web.subfolders = vec!["src".into(), "assets".into()];
        web.is_favorite = true;
        let web_id = storage.create::<Project>(&web).unwrap();
        storage
            .create::<Project>(&ProjectDraft::new("Archive", "/w/archive"))
            .unwrap();

        let loaded = storage.require::<Project>(web_id).unwrap();
        assert_eq!(loaded.project_type, "web");
        assert_eq!(loaded.subfolders, vec!["src", "assets"]);

        let all = storage.list::<Project>(&ProjectFilter::All, None).unwrap();
        assert_eq!(all.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), ["Archive", "Website"]);

        let favorites = storage.list::<Project>(&ProjectFilter::Favorites, None).unwrap();
        assert_eq!(favorites.len(), 1);

        let typed = storage
            .list::<Project>(&ProjectFilter::Type("web".into()), Some("site"))
            .unwrap();
        assert_eq!(typed.len(), 1);
        assert_eq!(typed[0].id, web_id);
    }

    #[test]
    fn test_patch_rejects_blank_name() {
        let patch = ProjectPatch {
            name: Some(" ".into()),
            ..ProjectPatch::default()
        };
        assert!(patch.assignments().is_err());
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("favorites".parse::<ProjectFilter>().unwrap(), ProjectFilter::Favorites);
        assert_eq!(
            "type:web".parse::<ProjectFilter>().unwrap(),
            ProjectFilter::Type("web".into())
        );
        assert!("type:".parse::<ProjectFilter>().is_err());
    }
}
