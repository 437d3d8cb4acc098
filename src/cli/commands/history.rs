//! Audit log commands.

use super::format_timestamp;
use crate::cli::HistoryCommands;
use crate::error::Result;
use crate::hub::Hub;
use crate::storage::{AuditAction, AuditEntry, Module};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct EntryOutput {
    id: i64,
    action: AuditAction,
    module: Module,
    detail: String,
    created_at: String,
}

impl From<AuditEntry> for EntryOutput {
    fn from(e: AuditEntry) -> Self {
        Self {
            id: e.id,
            action: e.action,
            module: e.module,
            detail: e.detail,
            created_at: format_timestamp(e.created_at),
        }
    }
}

#[derive(Serialize)]
struct HistoryOutput {
    entries: Vec<EntryOutput>,
    count: usize,
    total: usize,
}

#[derive(Serialize)]
struct PruneOutput {
    removed: usize,
    remaining: usize,
}

/// Execute a history command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`] or a storage error.
pub fn execute(command: &HistoryCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &HistoryCommands, json: bool) -> Result<()> {
    match command {
        HistoryCommands::List { module, limit } => {
            let entries = hub.list_audit(*module, Some(*limit))?;
            let total = hub.count_audit(*module)?;
            print_entries(entries, total, json)
        }
        HistoryCommands::Prune => {
            let removed = hub.prune_audit()?;
            let remaining = hub.count_audit(None)?;
            if json {
                return super::print_json(&PruneOutput { removed, remaining });
            }
            println!("Removed {removed} audit entries ({remaining} kept)");
            Ok(())
        }
    }
}

fn print_entries(entries: Vec<AuditEntry>, total: usize, json: bool) -> Result<()> {
    if json {
        return super::print_json(&HistoryOutput {
            count: entries.len(),
            total,
            entries: entries.into_iter().map(EntryOutput::from).collect(),
        });
    }

    if entries.is_empty() {
        println!("No history yet.");
        return Ok(());
    }

    println!("History ({} of {total}):\n", entries.len());
    for entry in &entries {
        println!(
            "  {}  {:<12} {:<8} {}",
            super::format_local(entry.created_at).dimmed(),
            entry.module.as_str(),
            entry.action.as_str().cyan(),
            entry.detail
        );
    }
    Ok(())
}
