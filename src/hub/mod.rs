//! The hub context.
//!
//! [`Hub`] owns the store, the settings mirror and the background task set,
//! and is the one object every operation goes through. Opening follows a
//! fixed order: store, then settings, then audit retention, then tasks.

mod downloads;
mod exports;
mod launch;
mod maintenance;
mod projects;
mod reminders;

pub use launch::{CommandOutput, LaunchReport};
pub use maintenance::{CleanupReport, MaintenanceReport};

use crate::backup::{self, BackupInfo, RestoreReport, Verification};
use crate::config::HubDirs;
use crate::error::{Error, OperationContext, Result};
use crate::model::{Command, Download, Note, Project, Reminder, Spreadsheet, Utility};
use crate::settings::{self, SettingsStore};
use crate::storage::audit;
use crate::storage::{AuditAction, AuditEntry, Module, Record, SqliteStorage};
use crate::tasks::{BackgroundTasks, TaskId};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Record counts shown on the home screen.
#[derive(Debug, Clone, Serialize)]
pub struct HubSummary {
    pub projects: usize,
    pub spreadsheets: usize,
    pub notes: usize,
    pub utilities: usize,
    pub commands: usize,
    pub reminders: usize,
    pub downloads: usize,
    pub audit_entries: usize,
}

/// Application context: store, settings and background work.
pub struct Hub {
    storage: SqliteStorage,
    settings: SettingsStore,
    tasks: BackgroundTasks<CommandOutput>,
    /// Command runs waiting for `finish_command`: task -> (command id, name)
    running: HashMap<TaskId, (i64, String)>,
}

impl Hub {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or initialized.
    pub fn open(path: &Path, dirs: &HubDirs) -> Result<Self> {
        Self::with_storage(SqliteStorage::open(path)?, dirs)
    }

    /// Open a throwaway in-memory hub.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    pub fn open_memory(dirs: &HubDirs) -> Result<Self> {
        Self::with_storage(SqliteStorage::open_memory()?, dirs)
    }

    /// Build the context around an opened store.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be initialized or retention fails.
    pub fn with_storage(mut storage: SqliteStorage, dirs: &HubDirs) -> Result<Self> {
        let mut settings = SettingsStore::new(dirs);
        settings.initialize(&mut storage)?;

        let mut hub = Self {
            storage,
            settings,
            tasks: BackgroundTasks::new()?,
            running: HashMap::new(),
        };
        hub.prune_audit()?;
        debug!(store = %hub.storage.store_name(), "Hub ready");
        Ok(hub)
    }

    #[must_use]
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    // ── Settings ──────────────────────────────────────────────

    /// Persist one setting.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub fn save_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.settings.save(&self.storage, key, value)
    }

    /// Delete every setting and re-apply defaults.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the reset fails.
    pub fn reset_settings(&mut self) -> Result<usize> {
        self.settings.reset(&mut self.storage).during("reset settings")
    }

    // ── Generic repository ────────────────────────────────────

    /// Create a record of any kind.
    ///
    /// Projects and downloads have dedicated entry points
    /// ([`Hub::create_project`], [`Hub::create_download`]) that add directory
    /// scaffolding and defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequiredField`] or a storage error.
    pub fn create<R: Record>(&mut self, draft: &R::Draft) -> Result<i64> {
        self.storage.create::<R>(draft)
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub fn get<R: Record>(&self, id: i64) -> Result<Option<R>> {
        self.storage.get::<R>(id)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a storage error.
    pub fn require<R: Record>(&self, id: i64) -> Result<R> {
        self.storage.require::<R>(id)
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub fn list<R: Record>(&self, filter: &R::Filter, search: Option<&str>) -> Result<Vec<R>> {
        self.storage.list::<R>(filter, search)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`], a validation error, or a storage error.
    pub fn update<R: Record>(&mut self, id: i64, patch: &R::Patch) -> Result<()> {
        self.storage.update::<R>(id, patch)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a storage error.
    pub fn delete<R: Record>(&mut self, id: i64) -> Result<()> {
        self.storage.delete::<R>(id)
    }

    /// Record counts per kind.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn summary(&self) -> Result<HubSummary> {
        Ok(HubSummary {
            projects: self.storage.count::<Project>()?,
            spreadsheets: self.storage.count::<Spreadsheet>()?,
            notes: self.storage.count::<Note>()?,
            utilities: self.storage.count::<Utility>()?,
            commands: self.storage.count::<Command>()?,
            reminders: self.storage.count::<Reminder>()?,
            downloads: self.storage.count::<Download>()?,
            audit_entries: audit::count_entries(self.storage.conn(), None)?,
        })
    }

    // ── Audit log ─────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns a storage error.
    pub fn list_audit(&self, module: Option<Module>, limit: Option<u32>) -> Result<Vec<AuditEntry>> {
        Ok(audit::list_entries(self.storage.conn(), module, limit)?)
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub fn count_audit(&self, module: Option<Module>) -> Result<usize> {
        Ok(audit::count_entries(self.storage.conn(), module)?)
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub fn last_audit(&self, action: AuditAction, module: Module) -> Result<Option<AuditEntry>> {
        Ok(audit::last_entry(self.storage.conn(), action, module)?)
    }

    /// Apply the configured retention policy. Pruning is not itself audited.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn prune_audit(&mut self) -> Result<usize> {
        let policy = self.settings.retention_policy();
        let removed = audit::prune(self.storage.conn(), policy, crate::storage::now_ms())?;
        if removed > 0 {
            info!(removed, ?policy, "Pruned audit log");
        }
        Ok(removed)
    }

    // ── Backups ───────────────────────────────────────────────

    /// The configured backup directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `backup_dir` is blank.
    pub fn backup_dir(&self) -> Result<PathBuf> {
        self.settings
            .get_path(settings::BACKUP_DIR)
            .ok_or_else(|| Error::Config("setting 'backup_dir' is empty".into()))
    }

    /// Back up the store into `dir` (default: the `backup_dir` setting).
    ///
    /// # Errors
    ///
    /// Returns an I/O or storage error.
    pub fn backup(&mut self, dir: Option<&Path>) -> Result<PathBuf> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => self.backup_dir()?,
        };
        backup::create_backup(&mut self.storage, &dir).during("backup")
    }

    /// Restore from an artifact, then reload the settings mirror.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackupNotFound`], [`Error::CorruptBackup`], or an
    /// I/O or storage error.
    pub fn restore(&mut self, artifact: &Path) -> Result<RestoreReport> {
        let report = backup::restore_backup(&mut self.storage, artifact).during("restore")?;
        self.settings.reload(self.storage.conn())?;
        // A restored store from an older install may lack newer defaults.
        self.settings.initialize(&mut self.storage)?;
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] or an I/O error.
    pub fn list_backups(&self, dir: Option<&Path>) -> Result<Vec<BackupInfo>> {
        match dir {
            Some(dir) => backup::list_backups(dir),
            None => backup::list_backups(&self.backup_dir()?),
        }
    }

    /// Keep the newest `keep` backups (default: the `backup_retention` setting).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] or an I/O error.
    pub fn prune_backups(&self, dir: Option<&Path>, keep: Option<usize>) -> Result<Vec<PathBuf>> {
        let keep = keep.unwrap_or_else(|| self.settings.get_u32(settings::BACKUP_RETENTION, 10) as usize);
        match dir {
            Some(dir) => backup::prune_backups(dir, keep),
            None => backup::prune_backups(&self.backup_dir()?, keep),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::BackupNotFound`] or [`Error::CorruptBackup`].
    pub fn verify_backup(&self, artifact: &Path) -> Result<Verification> {
        backup::verify_backup(artifact)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Join all background work and report each job's outcome.
    pub fn shutdown(self) -> Vec<(String, Result<CommandOutput>)> {
        let outstanding = self.tasks.outstanding();
        if outstanding > 0 {
            debug!(outstanding, "Joining background tasks");
        }
        let results = self.tasks.shutdown();
        debug!(joined = results.len(), "Hub shut down");
        results
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{NoteDraft, NoteFilter, NotePatch};

    pub(crate) fn dirs(root: &Path) -> HubDirs {
        HubDirs::under(&root.join("docs"), &root.join("dl"))
    }

    pub(crate) fn memory_hub(root: &Path) -> Hub {
        Hub::open_memory(&dirs(root)).unwrap()
    }

    #[test]
    fn test_open_initializes_settings() {
        let dir = tempfile::tempdir().unwrap();
        let hub = memory_hub(dir.path());
        assert_eq!(hub.settings().get(settings::THEME, ""), "dark");
        assert_eq!(
            hub.backup_dir().unwrap(),
            dir.path().join("docs").join("AutomatePro").join("Backups")
        );
    }

    #[test]
    fn test_note_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());

        let id = hub.create::<Note>(&NoteDraft::new("Todo", "Buy milk")).unwrap();
        let hits = hub.list::<Note>(&NoteFilter::All, Some("milk")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);

        hub.update::<Note>(
            id,
            &NotePatch {
                content: Some("Buy milk and eggs".into()),
                ..NotePatch::default()
            },
        )
        .unwrap();
        let hits = hub.list::<Note>(&NoteFilter::All, Some("milk")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "Buy milk and eggs");

        hub.delete::<Note>(id).unwrap();
        assert!(hub.list::<Note>(&NoteFilter::All, Some("milk")).unwrap().is_empty());
    }

    #[test]
    fn test_audit_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());

        let id = hub.create::<Note>(&NoteDraft::new("A", "")).unwrap();
        assert_eq!(hub.count_audit(Some(Module::Notes)).unwrap(), 1);

        assert!(hub.create::<Note>(&NoteDraft::new("", "no title")).is_err());
        assert!(hub.update::<Note>(id + 100, &NotePatch::default()).is_err());
        assert!(hub.delete::<Note>(id + 100).is_err());
        assert_eq!(hub.count_audit(Some(Module::Notes)).unwrap(), 1);

        hub.update::<Note>(id, &NotePatch::default()).unwrap();
        hub.delete::<Note>(id).unwrap();
        assert_eq!(hub.count_audit(Some(Module::Notes)).unwrap(), 3);
    }

    #[test]
    fn test_partial_update_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());

        let mut draft = NoteDraft::new("Title", "Body");
        draft.tags = "home".into();
        let id = hub.create::<Note>(&draft).unwrap();
        let before = hub.require::<Note>(id).unwrap();

        hub.update::<Note>(
            id,
            &NotePatch {
                title: Some("Renamed".into()),
                ..NotePatch::default()
            },
        )
        .unwrap();
        let after = hub.require::<Note>(id).unwrap();

        assert_eq!(after.title, "Renamed");
        assert_eq!(after.content, before.content);
        assert_eq!(after.tags, before.tags);
        assert_eq!(after.is_favorite, before.is_favorite);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let first = hub.create::<Note>(&NoteDraft::new("A", "")).unwrap();
        hub.delete::<Note>(first).unwrap();
        let second = hub.create::<Note>(&NoteDraft::new("B", "")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_restore_reloads_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = Hub::open(&dir.path().join("hub.db"), &dirs(dir.path())).unwrap();
        let artifact = hub.backup(Some(&dir.path().join("b"))).unwrap();

        hub.save_setting(settings::THEME, "light").unwrap();
        hub.restore(&artifact).unwrap();

        assert_eq!(hub.settings().get(settings::THEME, ""), "dark");
    }

    #[test]
    fn test_summary_counts() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        hub.create::<Note>(&NoteDraft::new("A", "")).unwrap();

        let summary = hub.summary().unwrap();
        assert_eq!(summary.notes, 1);
        assert_eq!(summary.projects, 0);
        assert_eq!(summary.audit_entries, 1);
    }
}
