//! Reminder commands.

use super::{format_timestamp, DeletedOutput};
use crate::cli::ReminderCommands;
use crate::error::Result;
use crate::hub::Hub;
use crate::model::reminder::{format_due, parse_due};
use crate::model::{Reminder, ReminderDraft, ReminderFilter, ReminderPatch};
use crate::storage::now_ms;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ReminderOutput {
    id: i64,
    title: String,
    description: Option<String>,
    due_at: Option<String>,
    is_completed: bool,
    created_at: String,
    updated_at: String,
}

impl From<Reminder> for ReminderOutput {
    fn from(r: Reminder) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            due_at: r.due_at.map(format_timestamp),
            is_completed: r.is_completed,
            created_at: format_timestamp(r.created_at),
            updated_at: format_timestamp(r.updated_at),
        }
    }
}

#[derive(Serialize)]
struct ReminderListOutput {
    reminders: Vec<ReminderOutput>,
    count: usize,
}

/// Execute a reminder command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], a validation error, or a
/// storage error.
pub fn execute(command: &ReminderCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &ReminderCommands, json: bool) -> Result<()> {
    match command {
        ReminderCommands::Add {
            title,
            due,
            description,
        } => {
            let draft = ReminderDraft {
                title: title.clone(),
                description: description.clone(),
                due_at: due.as_deref().map(parse_due).transpose()?,
            };
            let id = hub.create::<Reminder>(&draft)?;
            print_one(hub.require::<Reminder>(id)?, "Added", json)
        }
        ReminderCommands::List { filter, search } => {
            let filter = ReminderFilter::parse(filter, now_ms())?;
            let reminders = hub.list::<Reminder>(&filter, search.as_deref())?;
            print_list(reminders, json)
        }
        ReminderCommands::Update {
            id,
            title,
            due,
            description,
            clear_due,
            clear_description,
        } => {
            let due_at = due.as_deref().map(parse_due).transpose()?;
            let patch = ReminderPatch {
                title: title.clone(),
                description: if *clear_description {
                    Some(None)
                } else {
                    description.clone().map(Some)
                },
                due_at: if *clear_due { Some(None) } else { due_at.map(Some) },
                is_completed: None,
            };
            hub.update::<Reminder>(*id, &patch)?;
            print_one(hub.require::<Reminder>(*id)?, "Updated", json)
        }
        ReminderCommands::Delete { id } => {
            hub.delete::<Reminder>(*id)?;
            if json {
                return super::print_json(&DeletedOutput {
                    id: *id,
                    deleted: true,
                });
            }
            println!("Deleted reminder {id}");
            Ok(())
        }
        ReminderCommands::Complete { id } => {
            let reminder = hub.complete_reminder(*id)?;
            print_one(reminder, "Completed", json)
        }
        ReminderCommands::Poll => {
            let fired = hub.poll_reminders(now_ms())?;
            if !json && fired.is_empty() {
                println!("Nothing due.");
                return Ok(());
            }
            print_list(fired, json)
        }
    }
}

fn print_one(reminder: Reminder, verb: &str, json: bool) -> Result<()> {
    if json {
        return super::print_json(&ReminderOutput::from(reminder));
    }
    println!("{verb} reminder: {}", reminder.title);
    println!("  ID:  {}", reminder.id);
    if let Some(due) = reminder.due_at {
        println!("  Due: {}", format_due(due));
    }
    Ok(())
}

fn print_list(reminders: Vec<Reminder>, json: bool) -> Result<()> {
    if json {
        return super::print_json(&ReminderListOutput {
            count: reminders.len(),
            reminders: reminders.into_iter().map(ReminderOutput::from).collect(),
        });
    }

    if reminders.is_empty() {
        println!("No reminders found.");
        return Ok(());
    }

    println!("Reminders ({}):\n", reminders.len());
    for reminder in &reminders {
        let mark = if reminder.is_completed { "x" } else { " " };
        let due = reminder.due_at.map_or_else(|| "no due time".to_string(), format_due);
        println!("  [{mark}] {} {} ({due})", reminder.id, reminder.title);
    }
    Ok(())
}
