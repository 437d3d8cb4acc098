//! Key/value settings store.
//!
//! The store keeps an in-memory mirror of the `settings` table so reads never
//! touch SQLite and never fail. Writes go to the table first, then to the
//! mirror, so a `get` right after a `save` observes the new value.
//!
//! There is no process-wide instance: the hub owns one [`SettingsStore`] and
//! passes it to whatever needs configuration.

use crate::config::HubDirs;
use crate::error::Result;
use crate::storage::{AuditAction, Module, RetentionPolicy, SqliteStorage};
use rusqlite::Connection;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::{debug, info};

/// Values accepted as `true` by [`SettingsStore::get_bool`] (case-insensitive).
const TRUTHY: &[&str] = &["1", "true", "yes"];

pub const THEME: &str = "theme";
pub const AUTO_BACKUP: &str = "auto_backup";
pub const BACKUP_INTERVAL: &str = "backup_interval";
pub const BACKUP_DIR: &str = "backup_dir";
pub const BACKUP_RETENTION: &str = "backup_retention";
pub const DEFAULT_PROJECT_DIR: &str = "default_project_dir";
pub const DEFAULT_EXPORT_DIR: &str = "default_export_dir";
pub const DEFAULT_DOWNLOAD_DIR: &str = "default_download_dir";
pub const ENABLE_NOTIFICATIONS: &str = "enable_notifications";
pub const AUDIT_RETENTION_DAYS: &str = "audit_retention_days";
pub const AUDIT_MAX_ENTRIES: &str = "audit_max_entries";

/// Built-in defaults, applied on first run and on reset.
#[must_use]
pub fn default_table(dirs: &HubDirs) -> Vec<(&'static str, String)> {
    let path = |p: &PathBuf| p.to_string_lossy().into_owned();
    vec![
        (THEME, "dark".into()),
        ("language", "pt".into()),
        (AUTO_BACKUP, "1".into()),
        (BACKUP_INTERVAL, "7".into()),
        ("notifications", "1".into()),
        ("font_size", "12".into()),
        ("font_family", "Segoe UI".into()),
        ("recent_projects_limit", "5".into()),
        (DEFAULT_PROJECT_DIR, path(&dirs.projects)),
        (DEFAULT_EXPORT_DIR, path(&dirs.exports)),
        (BACKUP_DIR, path(&dirs.backups)),
        ("portable_mode", "0".into()),
        ("auto_update", "1".into()),
        ("markdown_preview", "1".into()),
        ("terminal_font_size", "10".into()),
        ("terminal_font_family", "Consolas".into()),
        ("terminal_theme", "dark".into()),
        ("enable_shortcuts", "1".into()),
        ("enable_drag_drop", "1".into()),
        (ENABLE_NOTIFICATIONS, "1".into()),
        (DEFAULT_DOWNLOAD_DIR, path(&dirs.downloads)),
        ("max_parallel_downloads", "3".into()),
        ("download_notifications", "1".into()),
        (AUDIT_RETENTION_DAYS, "90".into()),
        (AUDIT_MAX_ENTRIES, "10000".into()),
        (BACKUP_RETENTION, "10".into()),
    ]
}

/// Settings with an in-memory mirror of the persisted table.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    values: HashMap<String, String>,
    defaults: Vec<(&'static str, String)>,
}

impl SettingsStore {
    /// Empty store using the defaults derived from `dirs`.
    ///
    /// Call [`SettingsStore::initialize`] before reading.
    #[must_use]
    pub fn new(dirs: &HubDirs) -> Self {
        Self {
            values: HashMap::new(),
            defaults: default_table(dirs),
        }
    }

    /// Load persisted keys, then persist every default that is missing.
    ///
    /// Returns the number of defaults written; a second call returns 0 and
    /// writes nothing.
    ///
    /// # Errors
    ///
    /// Returns a storage error if loading or inserting fails.
    pub fn initialize(&mut self, storage: &mut SqliteStorage) -> Result<usize> {
        self.reload(storage.conn())?;

        let missing: Vec<(&'static str, String)> = self
            .defaults
            .iter()
            .filter(|(key, _)| !self.values.contains_key(*key))
            .cloned()
            .collect();

        if missing.is_empty() {
            debug!("Settings already initialized");
            return Ok(0);
        }

        storage.mutate("initialize_settings", |tx, _| {
            let mut stmt = tx.prepare("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")?;
            for (key, value) in &missing {
                stmt.execute([*key, value.as_str()])?;
            }
            Ok(())
        })?;

        for (key, value) in &missing {
            self.values.insert((*key).to_string(), value.clone());
        }

        info!(written = missing.len(), "Applied default settings");
        Ok(missing.len())
    }

    /// Replace the mirror with the table's current contents.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub fn reload(&mut self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<HashMap<String, String>, _>>()?;
        self.values = rows;
        Ok(())
    }

    /// The stored value, or `default` when the key is absent.
    #[must_use]
    pub fn get(&self, key: &str, default: &str) -> String {
        self.value(key).unwrap_or(default).to_string()
    }

    /// The stored value, if any.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse a stored value against the truthy set; `default` when absent.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.value(key).map_or(default, |v| {
            let v = v.trim();
            TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(v))
        })
    }

    /// Parse a stored value as a non-negative integer; `default` when absent
    /// or unparsable.
    #[must_use]
    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.value(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// A stored path setting, `None` when absent or blank.
    #[must_use]
    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.value(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    /// Upsert a value, then update the mirror.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails; the mirror is unchanged.
    pub fn save(&mut self, storage: &SqliteStorage, key: &str, value: &str) -> Result<()> {
        storage.conn().execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        self.values.insert(key.to_string(), value.to_string());
        debug!(key, "Saved setting");
        Ok(())
    }

    /// Delete every setting and re-apply the defaults.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the reset fails; the mirror is unchanged.
    pub fn reset(&mut self, storage: &mut SqliteStorage) -> Result<usize> {
        let defaults = &self.defaults;
        storage.mutate("reset_settings", |tx, ctx| {
            tx.execute("DELETE FROM settings", [])?;
            let mut stmt = tx.prepare("INSERT INTO settings (key, value) VALUES (?1, ?2)")?;
            for (key, value) in defaults {
                stmt.execute([*key, value.as_str()])?;
            }
            ctx.record(
                AuditAction::Reset,
                Module::Settings,
                format!("Restored {} default settings", defaults.len()),
            );
            Ok(())
        })?;

        self.values = self
            .defaults
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();

        info!(count = self.defaults.len(), "Settings reset to defaults");
        Ok(self.defaults.len())
    }

    /// All settings, sorted by key.
    #[must_use]
    pub fn all(&self) -> BTreeMap<&str, &str> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Audit retention bounds. A bound of 0 disables that bound.
    #[must_use]
    pub fn retention_policy(&self) -> RetentionPolicy {
        let bound = |key, default| Some(self.get_u32(key, default)).filter(|n| *n > 0);
        RetentionPolicy {
            max_age_days: bound(AUDIT_RETENTION_DAYS, 90),
            max_entries: bound(AUDIT_MAX_ENTRIES, 10_000),
        }
    }
}
