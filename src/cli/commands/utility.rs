//! Utility (launcher) commands.

use super::{format_timestamp, DeletedOutput};
use crate::cli::UtilityCommands;
use crate::error::Result;
use crate::hub::{Hub, LaunchReport};
use crate::model::{Utility, UtilityDraft, UtilityFilter, UtilityKind, UtilityPatch};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct UtilityOutput {
    id: i64,
    name: String,
    kind: UtilityKind,
    path: Option<String>,
    command: Option<String>,
    is_favorite: bool,
    created_at: String,
    updated_at: String,
}

impl From<Utility> for UtilityOutput {
    fn from(u: Utility) -> Self {
        Self {
            id: u.id,
            name: u.name,
            kind: u.kind,
            path: u.path,
            command: u.command,
            is_favorite: u.is_favorite,
            created_at: format_timestamp(u.created_at),
            updated_at: format_timestamp(u.updated_at),
        }
    }
}

#[derive(Serialize)]
struct UtilityListOutput {
    utilities: Vec<UtilityOutput>,
    count: usize,
}

/// Execute a utility command.
///
/// `run` returns once the process has started; the process itself is
/// waited for before the CLI exits.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], a validation error, an I/O
/// error, or a storage error.
pub fn execute(command: &UtilityCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &UtilityCommands, json: bool) -> Result<()> {
    match command {
        UtilityCommands::Add {
            name,
            kind,
            path,
            command,
            favorite,
        } => {
            let draft = UtilityDraft {
                name: name.clone(),
                kind: *kind,
                path: path.clone(),
                command: command.clone(),
                is_favorite: *favorite,
            };
            let id = hub.create::<Utility>(&draft)?;
            let utility = hub.require::<Utility>(id)?;
            if json {
                return super::print_json(&UtilityOutput::from(utility));
            }
            println!("Added {} utility: {}", utility.kind, utility.name);
            println!("  ID: {}", utility.id);
            Ok(())
        }
        UtilityCommands::List { filter, search } => {
            execute_list(hub, *filter, search.as_deref(), json)
        }
        UtilityCommands::Update {
            id,
            name,
            kind,
            path,
            command,
            favorite,
        } => {
            let patch = UtilityPatch {
                name: name.clone(),
                kind: *kind,
                path: path.clone(),
                command: command.clone(),
                is_favorite: *favorite,
            };
            hub.update::<Utility>(*id, &patch)?;
            let utility = hub.require::<Utility>(*id)?;
            if json {
                return super::print_json(&UtilityOutput::from(utility));
            }
            println!("Updated utility: {}", utility.name);
            Ok(())
        }
        UtilityCommands::Delete { id } => {
            hub.delete::<Utility>(*id)?;
            if json {
                return super::print_json(&DeletedOutput {
                    id: *id,
                    deleted: true,
                });
            }
            println!("Deleted utility {id}");
            Ok(())
        }
        UtilityCommands::Run { id } => {
            let report: LaunchReport = hub.execute_utility(*id)?;
            if json {
                return super::print_json(&report);
            }
            println!("Launched {} (pid {})", report.target, report.pid);
            Ok(())
        }
    }
}

fn execute_list(hub: &Hub, filter: UtilityFilter, search: Option<&str>, json: bool) -> Result<()> {
    let utilities = hub.list::<Utility>(&filter, search)?;

    if json {
        return super::print_json(&UtilityListOutput {
            count: utilities.len(),
            utilities: utilities.into_iter().map(UtilityOutput::from).collect(),
        });
    }

    if utilities.is_empty() {
        println!("No utilities found.");
        println!("\nAdd one with: hub utility add <name> --kind site --path example.com");
        return Ok(());
    }

    println!("Utilities ({}):\n", utilities.len());
    for utility in &utilities {
        let star = if utility.is_favorite { " *" } else { "" };
        println!(
            "  [{}] {} ({}){star}  {}",
            utility.id,
            utility.name,
            utility.kind,
            utility.target().unwrap_or("-")
        );
    }
    Ok(())
}
