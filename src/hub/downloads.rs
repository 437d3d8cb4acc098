//! Download records and their status transitions.

use super::Hub;
use crate::error::{Error, Result};
use crate::model::{Download, DownloadDraft, DownloadStatus};
use crate::settings;
use crate::storage::record::fetch_record;
use crate::storage::{now_ms, Module, Record};
use tracing::info;

impl Hub {
    /// Queue a download. A blank `save_path` takes the
    /// `default_download_dir` setting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequiredField`] or a storage error.
    pub fn create_download(&mut self, draft: &DownloadDraft) -> Result<i64> {
        let mut draft = draft.clone();
        if draft.save_path.trim().is_empty() {
            if let Some(dir) = self.settings.get_path(settings::DEFAULT_DOWNLOAD_DIR) {
                draft.save_path = dir.to_string_lossy().into_owned();
            }
        }
        self.storage.create::<Download>(&draft)
    }

    /// Move a download to `next`, enforcing the lifecycle.
    ///
    /// Completing a download sets its progress to 100.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::InvalidTransition`], or a
    /// storage error.
    pub fn transition_download(&mut self, id: i64, next: DownloadStatus) -> Result<Download> {
        let updated = self.storage.mutate("transition_download", |tx, ctx| {
            let current = fetch_record::<Download>(tx, id)?.ok_or(Error::NotFound {
                entity: Download::ENTITY,
                id,
            })?;

            if !current.status.can_transition_to(next) {
                return Err(Error::InvalidTransition {
                    entity: Download::ENTITY,
                    id,
                    from: current.status.to_string(),
                    to: next.to_string(),
                });
            }

            let progress = if next == DownloadStatus::Completed {
                100.0
            } else {
                current.progress
            };
            tx.execute(
                "UPDATE downloads SET status = ?1, progress = ?2, updated_at = ?3 WHERE id = ?4",
                rusqlite::params![next.as_str(), progress, now_ms(), id],
            )?;

            ctx.record(
                current.status.audit_action(next),
                Module::Downloads,
                format!("Download {id} {} -> {next}", current.status),
            );

            fetch_record::<Download>(tx, id)?.ok_or(Error::NotFound {
                entity: Download::ENTITY,
                id,
            })
        })?;

        info!(id, status = %next, "Download status changed");
        Ok(updated)
    }
}
