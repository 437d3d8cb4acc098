//! Reminder model.
//!
//! Due times are Unix milliseconds. The CLI accepts them in local time as
//! `YYYY-MM-DD HH:MM` (see [`parse_due`]).

use crate::error::{Error, Result};
use crate::storage::record::{flag, opt_text, require, text, Draft, Filter, Patch, Record, SqlValue};
use crate::storage::Module;
use chrono::{Local, NaiveDateTime, TimeZone};
use rusqlite::Row;
use serde::Serialize;

/// Accepted input format for due times.
pub const DUE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A dated reminder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reminder {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Due time (Unix milliseconds), `None` for undated reminders
    pub due_at: Option<i64>,

    pub is_completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a reminder.
#[derive(Debug, Clone, Default)]
pub struct ReminderDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<i64>,
}

/// Partial update for a reminder.
///
/// The optional columns take `Some(None)` to clear the stored value.
#[derive(Debug, Clone, Default)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_at: Option<Option<i64>>,
    pub is_completed: Option<bool>,
}

/// Listing categories for reminders.
///
/// Time-relative filters carry the reference time explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReminderFilter {
    #[default]
    All,
    /// Open reminders due at or after `now`.
    Upcoming { now: i64 },
    /// Open reminders due at or before `now`.
    Due { now: i64 },
    /// Every open reminder.
    Pending,
    Completed,
}

impl ReminderFilter {
    /// Parse a filter name, resolving time-relative filters against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for unknown names.
    pub fn parse(name: &str, now: i64) -> Result<Self> {
        match name {
            "all" => Ok(Self::All),
            "upcoming" => Ok(Self::Upcoming { now }),
            "due" => Ok(Self::Due { now }),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(Error::InvalidArgument(format!(
                "unknown reminder filter '{other}' (all, upcoming, due, pending, completed)"
            ))),
        }
    }
}

/// Parse a local `YYYY-MM-DD HH:MM` time into Unix milliseconds.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when the text does not match or the
/// local time does not exist.
pub fn parse_due(input: &str) -> Result<i64> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), DUE_FORMAT).map_err(|e| {
        Error::InvalidArgument(format!("invalid due time '{input}' (expected YYYY-MM-DD HH:MM): {e}"))
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| Error::InvalidArgument(format!("due time '{input}' does not exist locally")))
}

/// Render a due time back in the input format, in local time.
#[must_use]
pub fn format_due(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map_or_else(|| ms.to_string(), |dt| dt.format(DUE_FORMAT).to_string())
}

impl Record for Reminder {
    const ENTITY: &'static str = "reminder";
    const TABLE: &'static str = "reminders";
    const MODULE: Module = Module::Reminders;
    const COLUMNS: &'static str = "id, title, description, due_at, is_completed, created_at, updated_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "description"];
    const ORDER_BY: &'static str = "due_at IS NULL, due_at, id";

    type Draft = ReminderDraft;
    type Patch = ReminderPatch;
    type Filter = ReminderFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            due_at: row.get(3)?,
            is_completed: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl Draft for ReminderDraft {
    fn validate(&self) -> Result<()> {
        require(Reminder::ENTITY, "title", &self.title)
    }

    fn columns(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("title", text(self.title.trim())),
            ("description", opt_text(self.description.as_deref())),
            ("due_at", self.due_at.map_or(SqlValue::Null, SqlValue::Integer)),
            ("is_completed", flag(false)),
        ])
    }

    fn summary(&self) -> String {
        self.title.trim().to_string()
    }
}

impl Patch for ReminderPatch {
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        let mut out = Vec::new();
        if let Some(title) = &self.title {
            require(Reminder::ENTITY, "title", title)?;
            out.push(("title", text(title.trim())));
        }
        if let Some(description) = &self.description {
            out.push(("description", opt_text(description.as_deref())));
        }
        if let Some(due_at) = self.due_at {
            out.push(("due_at", due_at.map_or(SqlValue::Null, SqlValue::Integer)));
        }
        if let Some(done) = self.is_completed {
            out.push(("is_completed", flag(done)));
        }
        Ok(out)
    }
}

impl Filter for ReminderFilter {
    fn predicate(&self) -> Option<(String, Vec<SqlValue>)> {
        match *self {
            Self::All => None,
            Self::Upcoming { now } => Some((
                "is_completed = 0 AND due_at >= ?1".to_string(),
                vec![SqlValue::Integer(now)],
            )),
            Self::Due { now } => Some((
                "is_completed = 0 AND due_at <= ?1".to_string(),
                vec![SqlValue::Integer(now)],
            )),
            Self::Pending => Some(("is_completed = 0".to_string(), Vec::new())),
            Self::Completed => Some(("is_completed = 1".to_string(), Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    fn at(title: &str, due_at: Option<i64>) -> ReminderDraft {
        ReminderDraft {
            title: title.into(),
            description: None,
            due_at,
        }
    }

    #[test]
    fn test_patch_clears_optional_fields() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut draft = at("Dentist", Some(5_000));
        draft.description = Some("bring card".into());
        let id = storage.create::<Reminder>(&draft).unwrap();

        let keep = ReminderPatch {
            title: Some("Dentist visit".into()),
            ..ReminderPatch::default()
        };
        storage.update::<Reminder>(id, &keep).unwrap();
        let reminder = storage.require::<Reminder>(id).unwrap();
        assert_eq!(reminder.due_at, Some(5_000));
        assert_eq!(reminder.description.as_deref(), Some("bring card"));

        let clear = ReminderPatch {
            description: Some(None),
            due_at: Some(None),
            ..ReminderPatch::default()
        };
        storage.update::<Reminder>(id, &clear).unwrap();
        let reminder = storage.require::<Reminder>(id).unwrap();
        assert_eq!(reminder.due_at, None);
        assert_eq!(reminder.description, None);
    }

    #[test]
    fn test_time_filters() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let now = 1_000_000;
        storage.create::<Reminder>(&at("past", Some(now - 1))).unwrap();
        storage.create::<Reminder>(&at("future", Some(now + 1))).unwrap();
        storage.create::<Reminder>(&at("undated", None)).unwrap();

        let upcoming = storage.list::<Reminder>(&ReminderFilter::Upcoming { now }, None).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].title, "future");

        let due = storage.list::<Reminder>(&ReminderFilter::Due { now }, None).unwrap();
        assert_eq!(due[0].title, "past");

        let all = storage.list::<Reminder>(&ReminderFilter::All, None).unwrap();
        assert_eq!(
            all.iter().map(|r| r.title.as_str()).collect::<Vec<_>>(),
            ["past", "future", "undated"]
        );
        assert_eq!(storage.list::<Reminder>(&ReminderFilter::Pending, None).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_due_round_trip() {
        let ms = parse_due("2026-03-01 09:30").unwrap();
        assert_eq!(format_due(ms), "2026-03-01 09:30");
        assert!(parse_due("tomorrow").is_err());
    }

    #[test]
    fn test_filter_names() {
        assert_eq!(ReminderFilter::parse("upcoming", 5).unwrap(), ReminderFilter::Upcoming { now: 5 });
        assert!(ReminderFilter::parse("later", 5).is_err());
    }
}
