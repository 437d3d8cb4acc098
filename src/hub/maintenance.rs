//! Housekeeping: directory cleanup and the periodic maintenance pass.

use super::Hub;
use crate::error::{Error, Result};
use crate::model::Reminder;
use crate::settings;
use crate::storage::{AuditAction, Module};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// What a cleanup removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub bytes_freed: u64,
    /// Entries that could not be removed (in use, no permission)
    pub skipped: usize,
}

/// What a maintenance pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceReport {
    /// New backup, when one was due
    pub backup: Option<PathBuf>,
    pub pruned_backups: Vec<PathBuf>,
    pub reminders_due: Vec<Reminder>,
}

impl Hub {
    /// Empty each target directory, keeping the directory itself.
    ///
    /// Entries that cannot be removed are counted and skipped. One
    /// `cleanup` audit entry is written for the whole run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no target is given or a
    /// target is not a directory, or a storage error.
    pub fn run_cleanup(&mut self, targets: &[PathBuf]) -> Result<CleanupReport> {
        if targets.is_empty() {
            return Err(Error::InvalidArgument("no cleanup targets given".into()));
        }
        if let Some(bad) = targets.iter().find(|t| !t.is_dir()) {
            return Err(Error::InvalidArgument(format!(
                "cleanup target is not a directory: {}",
                bad.display()
            )));
        }

        let mut report = CleanupReport::default();
        for target in targets {
            empty_dir(target, &mut report);
        }

        self.storage.append_audit(
            AuditAction::Cleanup,
            Module::System,
            format!(
                "Removed {} files and {} folders ({} bytes) from {} location(s)",
                report.files_removed,
                report.dirs_removed,
                report.bytes_freed,
                targets.len()
            ),
        )?;

        info!(
            files = report.files_removed,
            dirs = report.dirs_removed,
            bytes = report.bytes_freed,
            skipped = report.skipped,
            "Cleanup finished"
        );
        Ok(report)
    }

    /// Whether the scheduled backup is due at `now`.
    ///
    /// Due when `auto_backup` is on and the newest `backup` audit entry is
    /// older than `backup_interval` days, or there is none.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn backup_due(&self, now: i64) -> Result<bool> {
        if !self.settings.get_bool(settings::AUTO_BACKUP, true) {
            return Ok(false);
        }
        let interval = i64::from(self.settings.get_u32(settings::BACKUP_INTERVAL, 7));
        let last = self.last_audit(AuditAction::Backup, Module::System)?;
        Ok(last.is_none_or(|entry| now - entry.created_at >= interval * DAY_MS))
    }

    /// One pass of the periodic jobs: the scheduled backup (plus backup
    /// pruning) and the reminder poll.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub fn run_maintenance(&mut self, now: i64) -> Result<MaintenanceReport> {
        let mut report = MaintenanceReport::default();

        if self.backup_due(now)? {
            report.backup = Some(self.backup(None)?);
            report.pruned_backups = self.prune_backups(None, None)?;
        } else {
            debug!("Scheduled backup not due");
        }

        report.reminders_due = self.poll_reminders(now)?;
        Ok(report)
    }
}

fn empty_dir(dir: &Path, report: &mut CleanupReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Cannot read directory");
            report.skipped += 1;
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(meta) = fs::symlink_metadata(&path) else {
            report.skipped += 1;
            continue;
        };

        if meta.is_dir() {
            empty_dir(&path, report);
            match fs::remove_dir(&path) {
                Ok(()) => report.dirs_removed += 1,
                Err(_) => report.skipped += 1,
            }
        } else {
            match fs::remove_file(&path) {
                Ok(()) => {
                    report.files_removed += 1;
                    report.bytes_freed += meta.len();
                }
                Err(_) => report.skipped += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::tests::memory_hub;
    use crate::model::ReminderDraft;

    #[test]
    fn test_cleanup_empties_but_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let target = dir.path().join("tmp");
        fs::create_dir_all(target.join("nested")).unwrap();
        fs::write(target.join("a.log"), b"12345").unwrap();
        fs::write(target.join("nested").join("b.log"), b"123").unwrap();

        let report = hub.run_cleanup(&[target.clone()]).unwrap();

        assert_eq!(report.files_removed, 2);
        assert_eq!(report.dirs_removed, 1);
        assert_eq!(report.bytes_freed, 8);
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
        assert!(hub.last_audit(AuditAction::Cleanup, Module::System).unwrap().is_some());
    }

    #[test]
    fn test_cleanup_rejects_missing_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        assert!(hub.run_cleanup(&[]).is_err());
        assert!(hub.run_cleanup(&[dir.path().join("absent")]).is_err());
        assert_eq!(hub.count_audit(Some(Module::System)).unwrap(), 0);
    }

    #[test]
    fn test_maintenance_backs_up_once_per_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let now = crate::storage::now_ms();

        let first = hub.run_maintenance(now).unwrap();
        assert!(first.backup.as_ref().is_some_and(|p| p.is_file()));

        let second = hub.run_maintenance(now + 1_000).unwrap();
        assert!(second.backup.is_none());

        assert!(hub.backup_due(now + 8 * DAY_MS).unwrap());
    }

    #[test]
    fn test_maintenance_respects_auto_backup_off() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        hub.save_setting(settings::AUTO_BACKUP, "false").unwrap();
        hub.create::<Reminder>(&ReminderDraft {
            title: "Stretch".into(),
            description: None,
            due_at: Some(0),
        })
        .unwrap();

        let report = hub.run_maintenance(1_000).unwrap();
        assert!(report.backup.is_none());
        assert_eq!(report.reminders_due.len(), 1);
    }
}
