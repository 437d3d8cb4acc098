//! Custom command model.

use crate::error::{Error, Result};
use crate::storage::record::{opt_text, require, text, Draft, Filter, Patch, Record, SqlValue};
use crate::storage::Module;
use rusqlite::Row;
use serde::Serialize;

/// A saved shell command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub id: i64,
    pub name: String,
    pub command: String,
    pub category: Option<String>,
    pub tags: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a command.
#[derive(Debug, Clone, Default)]
pub struct CommandDraft {
    pub name: String,
    pub command: String,
    pub category: Option<String>,
    pub tags: String,
}

impl CommandDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a command.
#[derive(Debug, Clone, Default)]
pub struct CommandPatch {
    pub name: Option<String>,
    pub command: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

/// Listing categories for commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommandFilter {
    #[default]
    All,
    Category(String),
}

impl Record for Command {
    const ENTITY: &'static str = "command";
    const TABLE: &'static str = "custom_commands";
    const MODULE: Module = Module::Commands;
    const COLUMNS: &'static str = "id, name, command, category, tags, created_at, updated_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "command", "category", "tags"];
    const ORDER_BY: &'static str = "name COLLATE NOCASE, id";

    type Draft = CommandDraft;
    type Patch = CommandPatch;
    type Filter = CommandFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            command: row.get(2)?,
            category: row.get(3)?,
            tags: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl Draft for CommandDraft {
    fn validate(&self) -> Result<()> {
        require(Command::ENTITY, "name", &self.name)?;
        require(Command::ENTITY, "command", &self.command)
    }

    fn columns(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("name", text(self.name.trim())),
            ("command", text(self.command.trim())),
            ("category", opt_text(self.category.as_deref())),
            ("tags", text(&self.tags)),
        ])
    }

    fn summary(&self) -> String {
        self.name.trim().to_string()
    }
}

impl Patch for CommandPatch {
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        let mut out = Vec::new();
        if let Some(name) = &self.name {
            require(Command::ENTITY, "name", name)?;
            out.push(("name", text(name.trim())));
        }
        if let Some(command) = &self.command {
            require(Command::ENTITY, "command", command)?;
            out.push(("command", text(command.trim())));
        }
        if let Some(category) = &self.category {
            out.push(("category", text(category)));
        }
        if let Some(tags) = &self.tags {
            out.push(("tags", text(tags)));
        }
        Ok(out)
    }
}

impl Filter for CommandFilter {
    fn predicate(&self) -> Option<(String, Vec<SqlValue>)> {
        match self {
            Self::All => None,
            Self::Category(category) => {
                Some(("category = ?1".to_string(), vec![text(category)]))
            }
        }
    }
}

impl std::str::FromStr for CommandFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            return Ok(Self::All);
        }
        match s.strip_prefix("category:") {
            Some(category) if !category.is_empty() => Ok(Self::Category(category.to_string())),
            _ => Err(Error::InvalidArgument(format!(
                "unknown command filter '{s}' (all, category:<name>)"
            ))),
        }
    }
}
