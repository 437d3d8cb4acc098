//! Backup commands.
//!
//! - `hub backup create [--dir <dir>]` - Back up the store
//! - `hub backup restore <path>` - Replace the store with a backup
//! - `hub backup list [--dir <dir>]` - List artifacts, newest first
//! - `hub backup verify <path>` - Validate an artifact without restoring
//! - `hub backup prune [--keep <n>]` - Delete old backups

use crate::backup::{ArtifactKind, BackupInfo, RestoreReport, Verification};
use crate::cli::BackupCommands;
use crate::error::Result;
use crate::hub::Hub;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct CreateOutput {
    path: PathBuf,
}

#[derive(Serialize)]
struct ListOutput {
    backups: Vec<BackupInfo>,
    count: usize,
}

#[derive(Serialize)]
struct PruneOutput {
    removed: Vec<PathBuf>,
    count: usize,
}

/// Execute a backup command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], [`crate::Error::BackupNotFound`],
/// [`crate::Error::CorruptBackup`], or an I/O or storage error.
pub fn execute(command: &BackupCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &BackupCommands, json: bool) -> Result<()> {
    match command {
        BackupCommands::Create { dir } => {
            let path = hub.backup(dir.as_deref())?;
            if json {
                return super::print_json(&CreateOutput { path });
            }
            println!("Backup written to {}", path.display());
            Ok(())
        }
        BackupCommands::Restore { path } => {
            let report: RestoreReport = hub.restore(path)?;
            if json {
                return super::print_json(&report);
            }
            println!("Restored from {}", report.restored_from.display());
            println!("  Previous state saved to {}", report.snapshot.display());
            Ok(())
        }
        BackupCommands::List { dir } => {
            let backups = hub.list_backups(dir.as_deref())?;
            if json {
                return super::print_json(&ListOutput {
                    count: backups.len(),
                    backups,
                });
            }
            if backups.is_empty() {
                println!("No backups found.");
                return Ok(());
            }
            println!("Backups ({}):\n", backups.len());
            for info in &backups {
                let kind = match info.kind {
                    ArtifactKind::Backup => "backup",
                    ArtifactKind::PreRestore => "pre-restore",
                };
                let checksum = if info.has_checksum { "" } else { "  (no checksum)" };
                println!(
                    "  {}  {:<11} {:>9} bytes  {}{checksum}",
                    info.taken_at.format("%Y-%m-%d %H:%M:%S"),
                    kind,
                    info.size_bytes,
                    info.path.display()
                );
            }
            Ok(())
        }
        BackupCommands::Verify { path } => {
            let verification: Verification = hub.verify_backup(path)?;
            if json {
                return super::print_json(&verification);
            }
            println!("Backup OK: {}", verification.path.display());
            println!("  SHA-256: {}", verification.checksum);
            println!("  Schema:  {}", verification.schema_version);
            if verification.sidecar_verified {
                println!("  Checksum sidecar matched");
            } else {
                println!("  No checksum sidecar");
            }
            Ok(())
        }
        BackupCommands::Prune { dir, keep } => {
            let removed = hub.prune_backups(dir.as_deref(), *keep)?;
            if json {
                return super::print_json(&PruneOutput {
                    count: removed.len(),
                    removed,
                });
            }
            println!("Removed {} old backup(s)", removed.len());
            for path in &removed {
                println!("  {}", path.display());
            }
            Ok(())
        }
    }
}
