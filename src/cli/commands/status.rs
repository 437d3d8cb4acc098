//! Status command: record counts and backup state.

use crate::error::Result;
use crate::hub::HubSummary;
use crate::model::{Reminder, ReminderFilter};
use crate::storage::{now_ms, AuditAction, Module};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct StatusOutput {
    database: Option<PathBuf>,
    #[serde(flatten)]
    summary: HubSummary,
    last_backup: Option<String>,
    backup_due: bool,
    outstanding_reminders: usize,
}

/// Execute the status command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`] or a storage error.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let hub = super::open_hub(db_path)?;
    let now = now_ms();

    let output = StatusOutput {
        database: hub.storage().path().map(PathBuf::from),
        summary: hub.summary()?,
        last_backup: hub
            .last_audit(AuditAction::Backup, Module::System)?
            .map(|entry| super::format_timestamp(entry.created_at)),
        backup_due: hub.backup_due(now)?,
        outstanding_reminders: hub
            .list::<Reminder>(&ReminderFilter::Due { now }, None)?
            .len(),
    };
    super::close(hub);

    if json {
        return super::print_json(&output);
    }

    println!("{}", "Automation hub".cyan().bold());
    if let Some(path) = &output.database {
        println!("  Store: {}", path.display());
    }
    println!();
    let s = &output.summary;
    println!("  Projects:      {}", s.projects);
    println!("  Spreadsheets:  {}", s.spreadsheets);
    println!("  Notes:         {}", s.notes);
    println!("  Utilities:     {}", s.utilities);
    println!("  Commands:      {}", s.commands);
    println!("  Reminders:     {}", s.reminders);
    println!("  Downloads:     {}", s.downloads);
    println!("  Audit entries: {}", s.audit_entries);
    println!();
    println!(
        "  Last backup:   {}",
        output.last_backup.as_deref().unwrap_or("never")
    );
    if output.backup_due {
        println!("  {}", "Backup due: run `hub maintenance`".yellow());
    }
    if output.outstanding_reminders > 0 {
        println!(
            "  {}",
            format!("{} reminder(s) due", output.outstanding_reminders).yellow()
        );
    }
    Ok(())
}
