//! Command implementations.
//!
//! Each module exposes `execute(command, db_path, json)`. Shared plumbing
//! (opening the hub, joining background work, timestamp rendering) lives
//! here.

pub mod backup;
pub mod cmd;
pub mod completions;
pub mod download;
pub mod history;
pub mod init;
pub mod maintenance;
pub mod note;
pub mod project;
pub mod reminder;
pub mod settings;
pub mod sheet;
pub mod status;
pub mod utility;
pub mod version;

use crate::config::{resolve_db_path, HubDirs};
use crate::error::{Error, Result};
use crate::hub::Hub;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Resolve the store path and open an existing hub.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] when no store exists yet.
pub(crate) fn open_hub(db_path: Option<&PathBuf>) -> Result<Hub> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    Hub::open(&db_path, &HubDirs::discover())
}

/// Join outstanding background work before the process exits.
///
/// Job failures are logged; they never change the command's own result.
pub(crate) fn close(hub: Hub) {
    for (label, outcome) in hub.shutdown() {
        match outcome {
            Ok(output) if !output.success => {
                warn!(%label, code = ?output.code, "Background job exited unsuccessfully");
            }
            Ok(_) => {}
            Err(e) => warn!(%label, error = %e, "Background job failed"),
        }
    }
}

/// Print any serializable value as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a Unix-millisecond timestamp as RFC 3339.
pub(crate) fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

/// Render a timestamp for people, in local time.
pub(crate) fn format_local(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts).map_or_else(
        || ts.to_string(),
        |dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

/// Split a comma-separated CLI row into trimmed cells.
pub(crate) fn split_row(row: &str) -> Vec<String> {
    row.split(',').map(|cell| cell.trim().to_string()).collect()
}

/// Output for delete commands.
#[derive(Serialize)]
pub(crate) struct DeletedOutput {
    pub id: i64,
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_rfc3339() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_split_row_trims_cells() {
        assert_eq!(split_row("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_row(""), vec![""]);
    }
}
