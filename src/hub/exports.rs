//! Spreadsheet and note exports.

use super::Hub;
use crate::error::{OperationContext, Result};
use crate::files::{atomic_write, csv_escape};
use crate::model::{Note, Spreadsheet};
use crate::settings;
use crate::storage::{AuditAction, Module};
use std::path::{Path, PathBuf};
use tracing::info;

impl Hub {
    /// Write a spreadsheet as CSV: header row, then one line per row.
    ///
    /// `target` defaults to `<default_export_dir>/<name>.csv`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`], an I/O error, or a storage error.
    pub fn export_spreadsheet_csv(&mut self, id: i64, target: Option<&Path>) -> Result<PathBuf> {
        let sheet = self.storage.require::<Spreadsheet>(id)?;
        let path = self.export_target(target, &sheet.name, "csv");

        atomic_write(&path, render_csv(&sheet).as_bytes()).during("export spreadsheet")?;
        self.storage.append_audit(
            AuditAction::Export,
            Module::Spreadsheets,
            format!("Exported spreadsheet {id} to {}", path.display()),
        )?;

        info!(id, path = %path.display(), "Exported spreadsheet");
        Ok(path)
    }

    /// Write a note as Markdown: `# <title>`, a blank line, then the content.
    ///
    /// `target` defaults to `<default_export_dir>/<title>.md`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`], an I/O error, or a storage error.
    pub fn export_note_markdown(&mut self, id: i64, target: Option<&Path>) -> Result<PathBuf> {
        let note = self.storage.require::<Note>(id)?;
        let path = self.export_target(target, &note.title, "md");

        let body = format!("# {}\n\n{}\n", note.title, note.content.trim_end());
        atomic_write(&path, body.as_bytes()).during("export note")?;
        self.storage.append_audit(
            AuditAction::Export,
            Module::Notes,
            format!("Exported note {id} to {}", path.display()),
        )?;

        info!(id, path = %path.display(), "Exported note");
        Ok(path)
    }

    fn export_target(&self, target: Option<&Path>, name: &str, ext: &str) -> PathBuf {
        if let Some(path) = target {
            return path.to_path_buf();
        }
        let dir = self
            .settings
            .get_path(settings::DEFAULT_EXPORT_DIR)
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(format!("{}.{ext}", file_stem_for(name)))
    }
}

fn render_csv(sheet: &Spreadsheet) -> String {
    let line = |cells: &[String]| {
        cells
            .iter()
            .map(|c| csv_escape(c))
            .collect::<Vec<_>>()
            .join(",")
    };

    let mut out = line(&sheet.headers);
    out.push_str("\r\n");
    for row in sheet.normalized_rows() {
        out.push_str(&line(&row));
        out.push_str("\r\n");
    }
    out
}

/// A file name derived from a record name: path separators and other
/// reserved characters become `_`.
fn file_stem_for(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "export".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hub::tests::memory_hub;
    use crate::model::{NoteDraft, SpreadsheetDraft};

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let id = hub
            .create::<Spreadsheet>(&SpreadsheetDraft {
                name: "Budget".into(),
                headers: vec!["Item".into(), "Note".into()],
                rows: vec![vec!["Rent".into(), "due 1st, monthly".into()], vec!["Food".into()]],
            })
            .unwrap();

        let target = dir.path().join("out.csv");
        hub.export_spreadsheet_csv(id, Some(&target)).unwrap();

        let csv = std::fs::read_to_string(&target).unwrap();
        assert_eq!(csv, "Item,Note\r\nRent,\"due 1st, monthly\"\r\nFood,\r\n");
        assert_eq!(hub.count_audit(Some(Module::Spreadsheets)).unwrap(), 2);
    }

    #[test]
    fn test_markdown_export_default_location() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let id = hub.create::<Note>(&NoteDraft::new("Plans/2026", "Ship it")).unwrap();

        let path = hub.export_note_markdown(id, None).unwrap();

        assert_eq!(path.file_name().unwrap(), "Plans_2026.md");
        assert!(path.starts_with(dir.path().join("docs").join("AutomatePro").join("Exports")));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Plans/2026\n\nShip it\n");
    }

    #[test]
    fn test_export_missing_record_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let target = dir.path().join("x.md");

        let err = hub.export_note_markdown(5, Some(&target)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(!target.exists());
        assert_eq!(hub.count_audit(Some(Module::Notes)).unwrap(), 0);
    }

    #[test]
    fn test_file_stem_for() {
        assert_eq!(file_stem_for("a:b"), "a_b");
        assert_eq!(file_stem_for(".."), "export");
    }
}
