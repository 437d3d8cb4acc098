//! Spreadsheet commands.

use super::{format_timestamp, split_row, DeletedOutput};
use crate::cli::SheetCommands;
use crate::error::Result;
use crate::hub::Hub;
use crate::model::{Spreadsheet, SpreadsheetDraft, SpreadsheetPatch};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct SheetOutput {
    id: i64,
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    created_at: String,
    updated_at: String,
}

impl From<Spreadsheet> for SheetOutput {
    fn from(s: Spreadsheet) -> Self {
        Self {
            id: s.id,
            name: s.name,
            headers: s.headers,
            rows: s.rows,
            created_at: format_timestamp(s.created_at),
            updated_at: format_timestamp(s.updated_at),
        }
    }
}

#[derive(Serialize)]
struct SheetListOutput {
    spreadsheets: Vec<SheetOutput>,
    count: usize,
}

#[derive(Serialize)]
struct ExportOutput {
    id: i64,
    path: PathBuf,
}

/// Execute a spreadsheet command.
///
/// # Errors
///
/// Returns [`crate::Error::NotInitialized`], a validation error, an I/O
/// error, or a storage error.
pub fn execute(command: &SheetCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut hub = super::open_hub(db_path)?;
    let result = run(&mut hub, command, json);
    super::close(hub);
    result
}

fn run(hub: &mut Hub, command: &SheetCommands, json: bool) -> Result<()> {
    match command {
        SheetCommands::Create {
            name,
            headers,
            rows,
        } => {
            let draft = SpreadsheetDraft {
                name: name.clone(),
                headers: headers.clone(),
                rows: rows.iter().map(|r| split_row(r)).collect(),
            };
            let id = hub.create::<Spreadsheet>(&draft)?;
            print_sheet(&hub.require::<Spreadsheet>(id)?, "Created", json)
        }
        SheetCommands::List { search } => {
            let sheets = hub.list::<Spreadsheet>(&(), search.as_deref())?;
            if json {
                return super::print_json(&SheetListOutput {
                    count: sheets.len(),
                    spreadsheets: sheets.into_iter().map(SheetOutput::from).collect(),
                });
            }
            if sheets.is_empty() {
                println!("No spreadsheets found.");
                return Ok(());
            }
            println!("Spreadsheets ({}):\n", sheets.len());
            for sheet in &sheets {
                println!(
                    "  [{}] {} ({} columns, {} rows)",
                    sheet.id,
                    sheet.name,
                    sheet.headers.len(),
                    sheet.rows.len()
                );
            }
            Ok(())
        }
        SheetCommands::Show { id } => {
            let sheet = hub.require::<Spreadsheet>(*id)?;
            if json {
                return super::print_json(&SheetOutput::from(sheet));
            }
            println!("{}", sheet.name);
            println!("  {}", sheet.headers.join(" | "));
            for row in sheet.normalized_rows() {
                println!("  {}", row.join(" | "));
            }
            Ok(())
        }
        SheetCommands::Update {
            id,
            name,
            headers,
            rows,
            append_rows,
        } => {
            let rows = if !append_rows.is_empty() {
                let mut existing = hub.require::<Spreadsheet>(*id)?.rows;
                existing.extend(append_rows.iter().map(|r| split_row(r)));
                Some(existing)
            } else if rows.is_empty() {
                None
            } else {
                Some(rows.iter().map(|r| split_row(r)).collect())
            };

            let patch = SpreadsheetPatch {
                name: name.clone(),
                headers: headers.clone(),
                rows,
            };
            hub.update::<Spreadsheet>(*id, &patch)?;
            print_sheet(&hub.require::<Spreadsheet>(*id)?, "Updated", json)
        }
        SheetCommands::Delete { id } => {
            hub.delete::<Spreadsheet>(*id)?;
            if json {
                return super::print_json(&DeletedOutput {
                    id: *id,
                    deleted: true,
                });
            }
            println!("Deleted spreadsheet {id}");
            Ok(())
        }
        SheetCommands::Export { id, output } => {
            let path = hub.export_spreadsheet_csv(*id, output.as_deref())?;
            if json {
                return super::print_json(&ExportOutput { id: *id, path });
            }
            println!("Exported spreadsheet {id} to {}", path.display());
            Ok(())
        }
    }
}

fn print_sheet(sheet: &Spreadsheet, verb: &str, json: bool) -> Result<()> {
    if json {
        return super::print_json(&SheetOutput::from(sheet.clone()));
    }
    println!("{verb} spreadsheet: {}", sheet.name);
    println!("  ID:      {}", sheet.id);
    println!("  Columns: {}", sheet.headers.join(", "));
    println!("  Rows:    {}", sheet.rows.len());
    Ok(())
}
