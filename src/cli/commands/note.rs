//! Note commands.
//!
//! - `hub note create <title>` - Create a note
//! - `hub note list [--filter favorites] [--search <text>]` - List notes
//! - `hub note show <id>` - Print a note
//! - `hub note update <id>` - Change fields
//! - `hub note delete <id>` - Delete a note
//! - `hub note export <id>` - Write a note as Markdown

use super::{format_timestamp, DeletedOutput};
use crate::cli::NoteCommands;
use crate::error::Result;
use crate::hub::Hub;
use crate::model::{Note, NoteDraft, NoteFilter, NotePatch};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct NoteOutput {
    id: i64,
    title: String,
    content: String,
    tags: String,
    is_favorite: bool,
    created_at: String,
    updated_at: String,
}

impl From<Note> for NoteOutput {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            title: n.title,
            content: n.content,
            tags: n.tags,
            is_favorite: n.is_favorite,
            created_at: format_timestamp(n.created_at),
            updated_at: format_timestamp(n.updated_at),
        }
    }
}

#[derive(Serialize)]
struct NoteListOutput {
    notes: Vec<NoteOutput>,
    count: usize,
}

#[derive(Serialize)]
struct ExportOutput {
    id: i64,
    path: PathBuf,
}

/// Execute a note command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], a validation error, an I/O
/// error, or a storage error.
pub fn execute(command: &NoteCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &NoteCommands, json: bool) -> Result<()> {
    match command {
        NoteCommands::Create {
            title,
            content,
            tags,
            favorite,
        } => {
            let draft = NoteDraft {
                title: title.clone(),
                content: content.clone(),
                tags: tags.clone(),
                is_favorite: *favorite,
            };
            let id = hub.create::<Note>(&draft)?;
            let note = hub.require::<Note>(id)?;
            if json {
                return super::print_json(&NoteOutput::from(note));
            }
            println!("Created note: {}", note.title);
            println!("  ID: {}", note.id);
            Ok(())
        }
        NoteCommands::List { filter, search } => execute_list(hub, *filter, search.as_deref(), json),
        NoteCommands::Show { id } => {
            let note = hub.require::<Note>(*id)?;
            if json {
                return super::print_json(&NoteOutput::from(note));
            }
            println!("# {}\n", note.title);
            println!("{}", note.content);
            if !note.tags.is_empty() {
                println!("\nTags: {}", note.tags);
            }
            Ok(())
        }
        NoteCommands::Update {
            id,
            title,
            content,
            tags,
            favorite,
        } => {
            let patch = NotePatch {
                title: title.clone(),
                content: content.clone(),
                tags: tags.clone(),
                is_favorite: *favorite,
            };
            hub.update::<Note>(*id, &patch)?;
            let note = hub.require::<Note>(*id)?;
            if json {
                return super::print_json(&NoteOutput::from(note));
            }
            println!("Updated note: {}", note.title);
            Ok(())
        }
        NoteCommands::Delete { id } => {
            hub.delete::<Note>(*id)?;
            if json {
                return super::print_json(&DeletedOutput {
                    id: *id,
                    deleted: true,
                });
            }
            println!("Deleted note {id}");
            Ok(())
        }
        NoteCommands::Export { id, output } => {
            let path = hub.export_note_markdown(*id, output.as_deref())?;
            if json {
                return super::print_json(&ExportOutput { id: *id, path });
            }
            println!("Exported note {id} to {}", path.display());
            Ok(())
        }
    }
}

fn execute_list(hub: &Hub, filter: NoteFilter, search: Option<&str>, json: bool) -> Result<()> {
    let notes = hub.list::<Note>(&filter, search)?;

    if json {
        return super::print_json(&NoteListOutput {
            count: notes.len(),
            notes: notes.into_iter().map(NoteOutput::from).collect(),
        });
    }

    if notes.is_empty() {
        println!("No notes found.");
        return Ok(());
    }

    println!("Notes ({}):\n", notes.len());
    for note in &notes {
        let star = if note.is_favorite { " *" } else { "" };
        let preview: String = note.content.lines().next().unwrap_or("").chars().take(60).collect();
        println!("  [{}] {}{star}", note.id, note.title);
        if !preview.is_empty() {
            println!("      {preview}");
        }
    }
    Ok(())
}
