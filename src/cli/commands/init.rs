//! Initialize the hub store.
//!
//! Creates the SQLite store (schema and default settings) at the resolved
//! path. Running it again on an existing store is safe: missing defaults
//! are filled in and nothing else changes.

use crate::config::{resolve_db_path, HubDirs};
use crate::error::{Error, Result};
use crate::hub::Hub;
use crate::settings;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    created: bool,
    settings: usize,
    backup_dir: Option<PathBuf>,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the store cannot be created or opened.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let database = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine a data directory for the store".to_string())
    })?;
    let created = !database.exists();

    let hub = Hub::open(&database, &HubDirs::discover())?;
    let output = InitOutput {
        database,
        created,
        settings: hub.settings().all().len(),
        backup_dir: hub.settings().get_path(settings::BACKUP_DIR),
    };
    super::close(hub);

    if json {
        return super::print_json(&output);
    }

    if output.created {
        println!("Initialized hub store");
    } else {
        println!("Hub store already initialized");
    }
    println!("  Database: {}", output.database.display());
    println!("  Settings: {}", output.settings);
    if let Some(dir) = &output.backup_dir {
        println!("  Backups:  {}", dir.display());
    }
    Ok(())
}
