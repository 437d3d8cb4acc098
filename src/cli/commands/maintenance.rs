//! Cleanup and maintenance commands.
//!
//! `hub maintenance` is the one-shot form of the scheduled jobs: run it from
//! cron or a login hook to get auto-backups and reminder firing.

use crate::error::Result;
use crate::hub::{CleanupReport, MaintenanceReport};
use crate::model::reminder::format_due;
use crate::storage::now_ms;
use colored::Colorize;
use std::path::PathBuf;

/// Execute the cleanup command.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidArgument`] when no directory is given or
/// a target is not a directory, or a storage error.
pub fn execute_cleanup(
    paths: &[PathBuf],
    include_temp: bool,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let mut targets = paths.to_vec();
    if include_temp {
        targets.push(std::env::temp_dir());
    }

    let mut hub = super::open_hub(db_path)?;
    let result = hub.run_cleanup(&targets);
    super::close(hub);
    let report: CleanupReport = result?;

    if json {
        return super::print_json(&report);
    }

    println!(
        "Removed {} files and {} folders, freed {}",
        report.files_removed,
        report.dirs_removed,
        human_bytes(report.bytes_freed)
    );
    if report.skipped > 0 {
        println!("  {} entries were in use or not removable", report.skipped);
    }
    Ok(())
}

/// Execute the maintenance command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], or the first failing job's error.
pub fn execute_maintenance(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = hub.run_maintenance(now_ms());
    super::close(hub);
    let report: MaintenanceReport = result?;

    if json {
        return super::print_json(&report);
    }

    match &report.backup {
        Some(path) => println!("Backup written to {}", path.display()),
        None => println!("No backup due"),
    }
    if !report.pruned_backups.is_empty() {
        println!("Pruned {} old backup(s)", report.pruned_backups.len());
    }
    for reminder in &report.reminders_due {
        let due = reminder.due_at.map(format_due).unwrap_or_default();
        println!("{} {} {}", "Reminder:".yellow().bold(), reminder.title, due.dimmed());
        if let Some(desc) = &reminder.description {
            println!("  {desc}");
        }
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
