//! Download model.
//!
//! Downloads are tracked records; moving bytes is outside the hub. Status
//! only changes through [`DownloadStatus::can_transition_to`]-checked
//! transitions, never through a patch.

use crate::error::{Error, Result};
use crate::storage::record::{opt_text, require, text, Draft, Filter, Patch, Record, SqlValue};
use crate::storage::sqlite::parse_text;
use crate::storage::{AuditAction, Module};
use rusqlite::Row;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// What is being downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadKind {
    Video,
    Audio,
    File,
}

impl DownloadKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::File => "file",
        }
    }
}

impl FromStr for DownloadKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "file" => Ok(Self::File),
            other => Err(format!("unknown download kind '{other}' (video, audio, file)")),
        }
    }
}

impl fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Download lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl DownloadStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the state machine allows `self -> next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Downloading | Self::Cancelled)
                | (
                    Self::Downloading,
                    Self::Paused | Self::Completed | Self::Failed | Self::Cancelled
                )
                | (Self::Paused, Self::Downloading | Self::Cancelled)
                | (Self::Failed, Self::Downloading)
        )
    }

    /// Audit action recorded when entering `next` from `self`.
    #[must_use]
    pub const fn audit_action(&self, next: Self) -> AuditAction {
        match (self, next) {
            (Self::Paused | Self::Failed, Self::Downloading) => AuditAction::Resume,
            (_, Self::Downloading) => AuditAction::Start,
            (_, Self::Paused) => AuditAction::Pause,
            (_, Self::Completed) => AuditAction::Complete,
            (_, Self::Failed) => AuditAction::Fail,
            (_, Self::Cancelled | Self::Pending) => AuditAction::Cancel,
        }
    }
}

impl FromStr for DownloadStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "downloading" => Ok(Self::Downloading),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown download status '{other}'")),
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Download {
    pub id: i64,
    pub url: String,
    pub kind: DownloadKind,
    pub format: Option<String>,
    pub quality: Option<String>,

    /// Target directory
    pub save_path: String,

    pub status: DownloadStatus,

    /// Percent complete, 0 to 100
    pub progress: f64,

    /// Size in bytes, once known
    pub total_size: Option<i64>,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a download. New downloads start `pending`.
#[derive(Debug, Clone)]
pub struct DownloadDraft {
    pub url: String,
    pub kind: DownloadKind,
    pub format: Option<String>,
    pub quality: Option<String>,

    /// Blank means "use the `default_download_dir` setting"
    pub save_path: String,
}

impl DownloadDraft {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: DownloadKind) -> Self {
        Self {
            url: url.into(),
            kind,
            format: None,
            quality: None,
            save_path: String::new(),
        }
    }
}

/// Partial update for a download's metadata and progress.
#[derive(Debug, Clone, Default)]
pub struct DownloadPatch {
    pub format: Option<String>,
    pub quality: Option<String>,
    pub save_path: Option<String>,
    pub progress: Option<f64>,
    pub total_size: Option<i64>,
}

/// Listing categories for downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DownloadFilter {
    #[default]
    All,
    Status(DownloadStatus),
}

impl Record for Download {
    const ENTITY: &'static str = "download";
    const TABLE: &'static str = "downloads";
    const MODULE: Module = Module::Downloads;
    const COLUMNS: &'static str = "id, url, kind, format, quality, save_path, status, progress, total_size, created_at, updated_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["url", "save_path"];
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    type Draft = DownloadDraft;
    type Patch = DownloadPatch;
    type Filter = DownloadFilter;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            kind: parse_text(row, 2)?,
            format: row.get(3)?,
            quality: row.get(4)?,
            save_path: row.get(5)?,
            status: parse_text(row, 6)?,
            progress: row.get(7)?,
            total_size: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl Draft for DownloadDraft {
    fn validate(&self) -> Result<()> {
        require(Download::ENTITY, "url", &self.url)?;
        require(Download::ENTITY, "save_path", &self.save_path)
    }

    fn columns(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        Ok(vec![
            ("url", text(self.url.trim())),
            ("kind", text(self.kind.as_str())),
            ("format", opt_text(self.format.as_deref())),
            ("quality", opt_text(self.quality.as_deref())),
            ("save_path", text(self.save_path.trim())),
            ("status", text(DownloadStatus::Pending.as_str())),
        ])
    }

    fn summary(&self) -> String {
        format!("{} ({})", self.url.trim(), self.kind)
    }
}

impl Patch for DownloadPatch {
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        let mut out = Vec::new();
        if let Some(format) = &self.format {
            out.push(("format", text(format)));
        }
        if let Some(quality) = &self.quality {
            out.push(("quality", text(quality)));
        }
        if let Some(path) = &self.save_path {
            require(Download::ENTITY, "save_path", path)?;
            out.push(("save_path", text(path.trim())));
        }
        if let Some(progress) = self.progress {
            if !(0.0..=100.0).contains(&progress) {
                return Err(Error::InvalidArgument(format!(
                    "progress must be between 0 and 100, got {progress}"
                )));
            }
            out.push(("progress", SqlValue::Real(progress)));
        }
        if let Some(size) = self.total_size {
            if size < 0 {
                return Err(Error::InvalidArgument(format!(
                    "total size cannot be negative, got {size}"
                )));
            }
            out.push(("total_size", SqlValue::Integer(size)));
        }
        Ok(out)
    }
}

impl Filter for DownloadFilter {
    fn predicate(&self) -> Option<(String, Vec<SqlValue>)> {
        match self {
            Self::All => None,
            Self::Status(status) => Some(("status = ?1".to_string(), vec![text(status.as_str())])),
        }
    }
}

impl FromStr for DownloadFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse().map(Self::Status).map_err(Error::InvalidArgument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        use DownloadStatus::*;

        assert!(Pending.can_transition_to(Downloading));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(Downloading.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Downloading));
        assert!(Failed.can_transition_to(Downloading));
        assert!(!Completed.can_transition_to(Downloading));
        assert!(!Cancelled.can_transition_to(Downloading));
    }

    #[test]
    fn test_audit_action_for_transition() {
        use DownloadStatus::*;

        assert_eq!(Pending.audit_action(Downloading), AuditAction::Start);
        assert_eq!(Paused.audit_action(Downloading), AuditAction::Resume);
        assert_eq!(Downloading.audit_action(Failed), AuditAction::Fail);
    }

    #[test]
    fn test_patch_rejects_out_of_range_progress() {
        let patch = DownloadPatch {
            progress: Some(120.0),
            ..DownloadPatch::default()
        };
        assert!(matches!(patch.assignments().unwrap_err(), Error::InvalidArgument(_)));
    }

    #[test]
    fn test_draft_needs_save_path() {
        let draft = DownloadDraft::new("https://example.com/a.mp4", DownloadKind::Video);
        assert!(matches!(
            draft.validate().unwrap_err(),
            Error::RequiredField { field: "save_path", .. }
        ));
    }
}
