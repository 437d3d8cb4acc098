//! Data models for the automation hub.
//!
//! This module contains every persisted entity kind:
//! - Project
//! - Spreadsheet
//! - Note
//! - Utility
//! - Command
//! - Reminder
//! - Download
//!
//! Each kind ships a record, a draft for creation, a patch for partial
//! updates and a filter for listing, wired to the generic repository
//! through [`crate::storage::Record`].

pub mod command;
pub mod download;
pub mod note;
pub mod project;
pub mod reminder;
pub mod spreadsheet;
pub mod utility;

pub use command::{Command, CommandDraft, CommandFilter, CommandPatch};
pub use download::{Download, DownloadDraft, DownloadFilter, DownloadKind, DownloadPatch, DownloadStatus};
pub use note::{Note, NoteDraft, NoteFilter, NotePatch};
pub use project::{Project, ProjectDraft, ProjectFilter, ProjectPatch};
pub use reminder::{Reminder, ReminderDraft, ReminderFilter, ReminderPatch};
pub use spreadsheet::{Spreadsheet, SpreadsheetDraft, SpreadsheetPatch};
pub use utility::{Utility, UtilityDraft, UtilityFilter, UtilityKind, UtilityPatch};

/// Join list fields into the newline-separated form stored in TEXT columns.
pub(crate) fn join_lines(items: &[String]) -> String {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a newline-separated TEXT column, dropping blank lines.
pub(crate) fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_drop_blanks() {
        let items = vec!["src".to_string(), "  ".to_string(), " docs ".to_string()];
        let joined = join_lines(&items);
        assert_eq!(joined, "src\ndocs");
        assert_eq!(split_lines(&joined), vec!["src", "docs"]);
        assert!(split_lines("").is_empty());
    }
}
