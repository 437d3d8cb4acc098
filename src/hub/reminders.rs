//! Reminder completion and polling.

use super::Hub;
use crate::error::{Error, Result};
use crate::model::{Reminder, ReminderFilter};
use crate::settings;
use crate::storage::record::fetch_record;
use crate::storage::{now_ms, AuditAction, Module};
use tracing::info;

impl Hub {
    /// Mark a reminder completed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a storage error.
    pub fn complete_reminder(&mut self, id: i64) -> Result<Reminder> {
        self.storage.mutate("complete_reminder", |tx, ctx| {
            let now = now_ms();
            let affected = tx.execute(
                "UPDATE reminders SET is_completed = 1, updated_at = ?1 WHERE id = ?2",
                rusqlite::params![now, id],
            )?;
            if affected == 0 {
                return Err(Error::NotFound {
                    entity: "reminder",
                    id,
                });
            }

            let reminder = fetch_record::<Reminder>(tx, id)?.ok_or(Error::NotFound {
                entity: "reminder",
                id,
            })?;
            ctx.record(
                AuditAction::Complete,
                Module::Reminders,
                format!("Completed reminder {}", reminder.title),
            );
            Ok(reminder)
        })
    }

    /// Collect open reminders due at or before `now` and mark them completed.
    ///
    /// Returns nothing and writes nothing when `enable_notifications` is
    /// off. Each reminder fired gets its own `complete` audit entry.
    ///
    /// # Errors
    ///
    /// Returns a storage error; on error no reminder is marked.
    pub fn poll_reminders(&mut self, now: i64) -> Result<Vec<Reminder>> {
        if !self.settings.get_bool(settings::ENABLE_NOTIFICATIONS, true) {
            return Ok(Vec::new());
        }

        let due = self.storage.list::<Reminder>(&ReminderFilter::Due { now }, None)?;
        if due.is_empty() {
            return Ok(due);
        }

        let fired = self.storage.mutate("poll_reminders", |tx, ctx| {
            let stamp = now_ms();
            let mut fired = Vec::with_capacity(due.len());
            for mut reminder in due {
                tx.execute(
                    "UPDATE reminders SET is_completed = 1, updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![stamp, reminder.id],
                )?;
                ctx.record(
                    AuditAction::Complete,
                    Module::Reminders,
                    format!("Reminder due: {}", reminder.title),
                );
                reminder.is_completed = true;
                reminder.updated_at = stamp;
                fired.push(reminder);
            }
            Ok(fired)
        })?;

        info!(count = fired.len(), "Reminders fired");
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::tests::memory_hub;
    use crate::model::ReminderDraft;

    fn draft(title: &str, due_at: i64) -> ReminderDraft {
        ReminderDraft {
            title: title.into(),
            description: None,
            due_at: Some(due_at),
        }
    }

    #[test]
    fn test_complete_reminder() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let id = hub.create::<Reminder>(&draft("Call", 10)).unwrap();

        let done = hub.complete_reminder(id).unwrap();
        assert!(done.is_completed);
        assert!(matches!(
            hub.complete_reminder(id + 1).unwrap_err(),
            Error::NotFound { .. }
        ));
        assert_eq!(hub.count_audit(Some(Module::Reminders)).unwrap(), 2);
    }

    #[test]
    fn test_poll_fires_due_reminders_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        hub.create::<Reminder>(&draft("due", 100)).unwrap();
        hub.create::<Reminder>(&draft("later", 300)).unwrap();

        let fired = hub.poll_reminders(200).unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].title, "due");

        assert!(hub.poll_reminders(200).unwrap().is_empty());
        assert_eq!(hub.count_audit(Some(Module::Reminders)).unwrap(), 3);
    }

    #[test]
    fn test_poll_respects_notification_setting() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        hub.create::<Reminder>(&draft("due", 100)).unwrap();
        hub.save_setting(settings::ENABLE_NOTIFICATIONS, "0").unwrap();

        assert!(hub.poll_reminders(200).unwrap().is_empty());
        let pending = hub.list::<Reminder>(&ReminderFilter::Pending, None).unwrap();
        assert_eq!(pending.len(), 1);
    }
}
