//! SQLite storage implementation.
//!
//! This module provides the storage backend for the hub.
//! It follows the MutationContext pattern for transaction discipline and audit logging:
//! the primary change and its audit entry commit together or not at all.

use crate::error::Result;
use crate::storage::audit::{insert_entry, AuditAction, AuditEntry, Module};
use crate::storage::schema::apply_schema;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
    path: Option<PathBuf>,
}

/// Context for a mutation operation, collecting its audit entries.
///
/// Entries are written at the end of the transaction, after the mutation
/// closure succeeded, so a failed operation never leaves an entry behind.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Entries to write at the end of the transaction.
    pub entries: Vec<AuditEntry>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Record an audit entry for this operation.
    pub fn record(&mut self, action: AuditAction, module: Module, detail: impl Into<String>) {
        self.entries.push(AuditEntry::new(action, module, detail));
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(timeout_ms.unwrap_or(5_000)))?;

        apply_schema(&conn)?;
        debug!(path = %path.display(), "Opened store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Mutable connection access, needed by the online restore API.
    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Location of the store file, `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Base name used for backup artifacts (`hub` for in-memory stores).
    #[must_use]
    pub fn store_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
            .unwrap_or("hub")
            .to_string()
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes the audit entries it recorded
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op);

        let result = f(&tx, &mut ctx)?;

        for entry in &ctx.entries {
            insert_entry(&tx, entry)?;
        }

        tx.commit()?;
        debug!(op = %ctx.op_name, entries = ctx.entries.len(), "Mutation committed");

        Ok(result)
    }

    /// Append a single audit entry for work that happened outside the store.
    ///
    /// Used after a side effect (a launched process, a written snapshot)
    /// has already succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn append_audit(
        &mut self,
        action: AuditAction,
        module: Module,
        detail: impl Into<String>,
    ) -> Result<()> {
        let detail = detail.into();
        self.mutate(action.as_str(), |_, ctx| {
            ctx.record(action, module, detail);
            Ok(())
        })
    }
}

/// Current time as Unix milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Read a TEXT column into any `FromStr` enum.
///
/// # Errors
///
/// Returns a conversion error naming the column when parsing fails.
pub fn parse_text<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::audit::count_entries;

    #[test]
    fn test_open_memory() {
        let storage = SqliteStorage::open_memory();
        assert!(storage.is_ok());
        assert!(storage.unwrap().path().is_none());
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");

        let storage = SqliteStorage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.store_name(), "store");
    }

    #[test]
    fn test_mutate_commits_change_and_entry_together() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        storage
            .mutate("save", |tx, ctx| {
                tx.execute(
                    "INSERT INTO settings (key, value) VALUES ('theme', 'light')",
                    [],
                )?;
                ctx.record(AuditAction::Update, Module::Settings, "theme");
                Ok(())
            })
            .unwrap();

        assert_eq!(count_entries(storage.conn(), Some(Module::Settings)).unwrap(), 1);
    }

    #[test]
    fn test_mutate_failure_rolls_back_change_and_entry() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let result: Result<()> = storage.mutate("broken", |tx, ctx| {
            tx.execute(
                "INSERT INTO settings (key, value) VALUES ('theme', 'light')",
                [],
            )?;
            ctx.record(AuditAction::Update, Module::Settings, "theme");
            Err(Error::Other("boom".into()))
        });
        assert!(result.is_err());

        let settings: i64 = storage
            .conn()
            .query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(settings, 0);
        assert_eq!(count_entries(storage.conn(), None).unwrap(), 0);
    }

    #[test]
    fn test_append_audit() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .append_audit(AuditAction::Execute, Module::Commands, "ran ls")
            .unwrap();
        assert_eq!(count_entries(storage.conn(), Some(Module::Commands)).unwrap(), 1);
    }
}
