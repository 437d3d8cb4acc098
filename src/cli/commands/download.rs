//! Download commands.
//!
//! The hub tracks downloads; it does not fetch them. State commands
//! (`start`, `pause`, `resume`, `cancel`, `complete`, `fail`) move a record
//! through its lifecycle and reject moves the lifecycle does not allow.

use super::{format_timestamp, DeletedOutput};
use crate::cli::DownloadCommands;
use crate::error::Result;
use crate::hub::Hub;
use crate::model::{Download, DownloadDraft, DownloadKind, DownloadPatch, DownloadStatus};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct DownloadOutput {
    id: i64,
    url: String,
    kind: DownloadKind,
    format: Option<String>,
    quality: Option<String>,
    save_path: String,
    status: DownloadStatus,
    progress: f64,
    total_size: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl From<Download> for DownloadOutput {
    fn from(d: Download) -> Self {
        Self {
            id: d.id,
            url: d.url,
            kind: d.kind,
            format: d.format,
            quality: d.quality,
            save_path: d.save_path,
            status: d.status,
            progress: d.progress,
            total_size: d.total_size,
            created_at: format_timestamp(d.created_at),
            updated_at: format_timestamp(d.updated_at),
        }
    }
}

#[derive(Serialize)]
struct DownloadListOutput {
    downloads: Vec<DownloadOutput>,
    count: usize,
}

/// Execute a download command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], a validation error,
/// [`crate::Error::InvalidTransition`], or a storage error.
pub fn execute(command: &DownloadCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &DownloadCommands, json: bool) -> Result<()> {
    match command {
        DownloadCommands::Add {
            url,
            kind,
            format,
            quality,
            save_path,
        } => {
            let draft = DownloadDraft {
                format: format.clone(),
                quality: quality.clone(),
                save_path: save_path.clone().unwrap_or_default(),
                ..DownloadDraft::new(url.clone(), *kind)
            };
            let id = hub.create_download(&draft)?;
            print_one(hub.require::<Download>(id)?, "Queued", json)
        }
        DownloadCommands::List { filter, search } => {
            let downloads = hub.list::<Download>(filter, search.as_deref())?;
            if json {
                return super::print_json(&DownloadListOutput {
                    count: downloads.len(),
                    downloads: downloads.into_iter().map(DownloadOutput::from).collect(),
                });
            }
            if downloads.is_empty() {
                println!("No downloads found.");
                return Ok(());
            }
            println!("Downloads ({}):\n", downloads.len());
            for download in &downloads {
                println!(
                    "  [{}] {:<11} {:>5.1}%  {}",
                    download.id,
                    download.status.to_string(),
                    download.progress,
                    download.url
                );
            }
            Ok(())
        }
        DownloadCommands::Update {
            id,
            format,
            quality,
            save_path,
            progress,
            total_size,
        } => {
            let patch = DownloadPatch {
                format: format.clone(),
                quality: quality.clone(),
                save_path: save_path.clone(),
                progress: *progress,
                total_size: *total_size,
            };
            hub.update::<Download>(*id, &patch)?;
            print_one(hub.require::<Download>(*id)?, "Updated", json)
        }
        DownloadCommands::Delete { id } => {
            hub.delete::<Download>(*id)?;
            if json {
                return super::print_json(&DeletedOutput {
                    id: *id,
                    deleted: true,
                });
            }
            println!("Deleted download {id}");
            Ok(())
        }
        DownloadCommands::Start { id } => transition(hub, *id, DownloadStatus::Downloading, json),
        DownloadCommands::Pause { id } => transition(hub, *id, DownloadStatus::Paused, json),
        DownloadCommands::Resume { id } => transition(hub, *id, DownloadStatus::Downloading, json),
        DownloadCommands::Cancel { id } => transition(hub, *id, DownloadStatus::Cancelled, json),
        DownloadCommands::Complete { id } => transition(hub, *id, DownloadStatus::Completed, json),
        DownloadCommands::Fail { id } => transition(hub, *id, DownloadStatus::Failed, json),
    }
}

fn transition(hub: &mut Hub, id: i64, next: DownloadStatus, json: bool) -> Result<()> {
    let download = hub.transition_download(id, next)?;
    if json {
        return super::print_json(&DownloadOutput::from(download));
    }
    println!("Download {id} is now {}", download.status);
    Ok(())
}

fn print_one(download: Download, verb: &str, json: bool) -> Result<()> {
    if json {
        return super::print_json(&DownloadOutput::from(download));
    }
    println!("{verb} download: {}", download.url);
    println!("  ID:     {}", download.id);
    println!("  Status: {}", download.status);
    println!("  Into:   {}", download.save_path);
    Ok(())
}
