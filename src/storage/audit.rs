//! Audit log storage and retention.
//!
//! Every state-changing repository call appends exactly one entry in the
//! same transaction as the change itself. Entries are never updated; the
//! only deletion path is [`prune`], driven by an explicit retention policy.

use rusqlite::{Connection, OptionalExtension, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Execute,
    Export,
    Complete,
    Start,
    Pause,
    Resume,
    Cancel,
    Fail,
    Backup,
    Restore,
    Cleanup,
    Reset,
}

impl AuditAction {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Execute => "execute",
            Self::Export => "export",
            Self::Complete => "complete",
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Cancel => "cancel",
            Self::Fail => "fail",
            Self::Backup => "backup",
            Self::Restore => "restore",
            Self::Cleanup => "cleanup",
            Self::Reset => "reset",
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "create" => Self::Create,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "execute" => Self::Execute,
            "export" => Self::Export,
            "complete" => Self::Complete,
            "start" => Self::Start,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "cancel" => Self::Cancel,
            "fail" => Self::Fail,
            "backup" => Self::Backup,
            "restore" => Self::Restore,
            "cleanup" => Self::Cleanup,
            "reset" => Self::Reset,
            other => return Err(format!("unknown audit action '{other}'")),
        })
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The component that owns the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Projects,
    Spreadsheets,
    Notes,
    Utilities,
    Commands,
    Reminders,
    Downloads,
    Settings,
    System,
}

impl Module {
    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Spreadsheets => "spreadsheets",
            Self::Notes => "notes",
            Self::Utilities => "utilities",
            Self::Commands => "commands",
            Self::Reminders => "reminders",
            Self::Downloads => "downloads",
            Self::Settings => "settings",
            Self::System => "system",
        }
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "projects" => Self::Projects,
            "spreadsheets" => Self::Spreadsheets,
            "notes" => Self::Notes,
            "utilities" => Self::Utilities,
            "commands" => Self::Commands,
            "reminders" => Self::Reminders,
            "downloads" => Self::Downloads,
            "settings" => Self::Settings,
            "system" => Self::System,
            other => return Err(format!("unknown module '{other}'")),
        })
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit log record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub action: AuditAction,
    pub module: Module,
    pub detail: String,
    pub created_at: i64,
}

impl AuditEntry {
    /// Create a new entry (id will be assigned by database).
    #[must_use]
    pub fn new(action: AuditAction, module: Module, detail: impl Into<String>) -> Self {
        Self {
            id: 0,
            action,
            module,
            detail: detail.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Bounds applied by [`prune`]. A `None` bound is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    pub max_age_days: Option<u32>,
    pub max_entries: Option<u32>,
}

/// Insert an entry into the log.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_entry(conn: &Connection, entry: &AuditEntry) -> Result<i64> {
    conn.execute(
        "INSERT INTO audit_log (action, module, detail, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            entry.action.as_str(),
            entry.module.as_str(),
            entry.detail,
            entry.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// List entries, newest first, optionally for one module.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_entries(
    conn: &Connection,
    module: Option<Module>,
    limit: Option<u32>,
) -> Result<Vec<AuditEntry>> {
    let limit = limit.unwrap_or(100);
    let mut stmt = conn.prepare(
        "SELECT id, action, module, detail, created_at
         FROM audit_log
         WHERE ?1 IS NULL OR module = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(
        rusqlite::params![module.map(|m| m.as_str()), limit],
        map_entry,
    )?;
    rows.collect()
}

/// Count entries, optionally for one module.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_entries(conn: &Connection, module: Option<Module>) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM audit_log WHERE ?1 IS NULL OR module = ?1",
        [module.map(|m| m.as_str())],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// The most recent entry with the given action and module.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn last_entry(
    conn: &Connection,
    action: AuditAction,
    module: Module,
) -> Result<Option<AuditEntry>> {
    conn.query_row(
        "SELECT id, action, module, detail, created_at
         FROM audit_log
         WHERE action = ?1 AND module = ?2
         ORDER BY created_at DESC, id DESC
         LIMIT 1",
        [action.as_str(), module.as_str()],
        map_entry,
    )
    .optional()
}

/// Delete entries outside the retention bounds. Returns rows removed.
///
/// Age is applied first, then the count bound keeps the newest entries.
///
/// # Errors
///
/// Returns an error if a delete fails.
pub fn prune(conn: &Connection, policy: RetentionPolicy, now_ms: i64) -> Result<usize> {
    let mut removed = 0;

    if let Some(days) = policy.max_age_days {
        let cutoff = now_ms - i64::from(days) * 24 * 60 * 60 * 1000;
        removed += conn.execute("DELETE FROM audit_log WHERE created_at < ?1", [cutoff])?;
    }

    if let Some(max) = policy.max_entries {
        removed += conn.execute(
            "DELETE FROM audit_log WHERE id NOT IN (
                SELECT id FROM audit_log ORDER BY created_at DESC, id DESC LIMIT ?1
             )",
            [max],
        )?;
    }

    Ok(removed)
}

fn map_entry(row: &rusqlite::Row<'_>) -> Result<AuditEntry> {
    Ok(AuditEntry {
        id: row.get(0)?,
        action: crate::storage::sqlite::parse_text(row, 1)?,
        module: crate::storage::sqlite::parse_text(row, 2)?,
        detail: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::apply_schema;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_entry_insert_and_list() {
        let conn = setup();

        let entry = AuditEntry::new(AuditAction::Create, Module::Notes, "Created note Todo");
        let id = insert_entry(&conn, &entry).unwrap();
        assert!(id > 0);

        let entries = list_entries(&conn, Some(Module::Notes), Some(10)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Create);
        assert_eq!(entries[0].detail, "Created note Todo");

        assert!(list_entries(&conn, Some(Module::Projects), None).unwrap().is_empty());
        assert_eq!(count_entries(&conn, None).unwrap(), 1);
    }

    #[test]
    fn test_last_entry_picks_newest() {
        let conn = setup();

        let mut old = AuditEntry::new(AuditAction::Backup, Module::System, "old");
        old.created_at = 1_000;
        let mut new = AuditEntry::new(AuditAction::Backup, Module::System, "new");
        new.created_at = 2_000;
        insert_entry(&conn, &old).unwrap();
        insert_entry(&conn, &new).unwrap();

        let last = last_entry(&conn, AuditAction::Backup, Module::System)
            .unwrap()
            .unwrap();
        assert_eq!(last.detail, "new");
        assert!(
            last_entry(&conn, AuditAction::Restore, Module::System)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_prune_by_age_and_count() {
        let conn = setup();
        let day = 24 * 60 * 60 * 1000;
        let now = 100 * day;

        for age_days in [0, 1, 2, 40, 50] {
            let mut entry = AuditEntry::new(AuditAction::Update, Module::Notes, "x");
            entry.created_at = now - age_days * day;
            insert_entry(&conn, &entry).unwrap();
        }

        let policy = RetentionPolicy {
            max_age_days: Some(30),
            max_entries: None,
        };
        assert_eq!(prune(&conn, policy, now).unwrap(), 2);
        assert_eq!(count_entries(&conn, None).unwrap(), 3);

        let policy = RetentionPolicy {
            max_age_days: None,
            max_entries: Some(1),
        };
        assert_eq!(prune(&conn, policy, now).unwrap(), 2);

        let remaining = list_entries(&conn, None, None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].created_at, now);
    }

    #[test]
    fn test_action_round_trips_through_text() {
        for action in [AuditAction::Execute, AuditAction::Cleanup, AuditAction::Reset] {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
        assert!("frobnicate".parse::<AuditAction>().is_err());
    }
}
