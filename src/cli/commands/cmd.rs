//! Saved command commands.
//!
//! `hub cmd run <id>` blocks until the command exits and prints its
//! output. A non-zero exit is reported as an error (exit code 9).

use super::{format_timestamp, DeletedOutput};
use crate::cli::CmdCommands;
use crate::error::Result;
use crate::hub::Hub;
use crate::model::{Command, CommandDraft, CommandFilter, CommandPatch};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct CommandRecordOutput {
    id: i64,
    name: String,
    command: String,
    category: Option<String>,
    tags: String,
    created_at: String,
    updated_at: String,
}

impl From<Command> for CommandRecordOutput {
    fn from(c: Command) -> Self {
        Self {
            id: c.id,
            name: c.name,
            command: c.command,
            category: c.category,
            tags: c.tags,
            created_at: format_timestamp(c.created_at),
            updated_at: format_timestamp(c.updated_at),
        }
    }
}

#[derive(Serialize)]
struct CommandListOutput {
    commands: Vec<CommandRecordOutput>,
    count: usize,
}

/// Execute a saved-command command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], a validation error,
/// [`crate::Error::CommandFailed`], or a storage error.
pub fn execute(command: &CmdCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &CmdCommands, json: bool) -> Result<()> {
    match command {
        CmdCommands::Add {
            name,
            command,
            category,
            tags,
        } => {
            let draft = CommandDraft {
                name: name.clone(),
                command: command.clone(),
                category: category.clone(),
                tags: tags.clone(),
            };
            let id = hub.create::<Command>(&draft)?;
            let saved = hub.require::<Command>(id)?;
            if json {
                return super::print_json(&CommandRecordOutput::from(saved));
            }
            println!("Saved command: {}", saved.name);
            println!("  ID: {}", saved.id);
            Ok(())
        }
        CmdCommands::List { category, search } => {
            let filter = category
                .clone()
                .map_or(CommandFilter::All, CommandFilter::Category);
            let commands = hub.list::<Command>(&filter, search.as_deref())?;
            if json {
                return super::print_json(&CommandListOutput {
                    count: commands.len(),
                    commands: commands.into_iter().map(CommandRecordOutput::from).collect(),
                });
            }
            if commands.is_empty() {
                println!("No saved commands.");
                return Ok(());
            }
            println!("Commands ({}):\n", commands.len());
            for saved in &commands {
                let category = saved.category.as_deref().unwrap_or("-");
                println!("  [{}] {} ({category})", saved.id, saved.name);
                println!("      $ {}", saved.command);
            }
            Ok(())
        }
        CmdCommands::Update {
            id,
            name,
            command,
            category,
            tags,
        } => {
            let patch = CommandPatch {
                name: name.clone(),
                command: command.clone(),
                category: category.clone(),
                tags: tags.clone(),
            };
            hub.update::<Command>(*id, &patch)?;
            let saved = hub.require::<Command>(*id)?;
            if json {
                return super::print_json(&CommandRecordOutput::from(saved));
            }
            println!("Updated command: {}", saved.name);
            Ok(())
        }
        CmdCommands::Delete { id } => {
            hub.delete::<Command>(*id)?;
            if json {
                return super::print_json(&DeletedOutput {
                    id: *id,
                    deleted: true,
                });
            }
            println!("Deleted command {id}");
            Ok(())
        }
        CmdCommands::Run { id } => {
            let output = hub.execute_command(*id)?;
            if json {
                return super::print_json(&output);
            }
            print!("{}", output.stdout);
            if !output.stderr.is_empty() {
                eprint!("{}", output.stderr);
            }
            Ok(())
        }
    }
}
