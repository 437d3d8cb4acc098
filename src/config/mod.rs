//! Configuration management.
//!
//! This module resolves where the store lives and which directories the
//! default settings point at.
//!
//! # Layout
//!
//! - **Store**: `<data dir>/automate-hub/hub.db` unless overridden
//! - **Working folders**: `<documents>/AutomatePro/{Projects,Exports,Backups}`
//! - **Downloads**: `<downloads>/AutomatePro`
//!
//! Nothing here is global state: callers resolve paths once and pass them on.

use std::path::{Path, PathBuf};

/// Environment variable overriding the store location.
pub const DB_ENV: &str = "HUB_DB";

/// Folder name used under the user's documents and downloads directories.
pub const APP_FOLDER: &str = "AutomatePro";

/// Resolve the store path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `HUB_DB` environment variable
/// 3. Platform data directory: `<data dir>/automate-hub/hub.db`
///
/// # Returns
///
/// Returns the path to the store file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(DB_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    directories::ProjectDirs::from("", "", "automate-hub").map(|d| d.data_dir().join("hub.db"))
}

/// Default directories referenced by the settings defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubDirs {
    pub projects: PathBuf,
    pub exports: PathBuf,
    pub backups: PathBuf,
    pub downloads: PathBuf,
}

impl HubDirs {
    /// Directories derived from the current user's profile.
    ///
    /// Falls back to the home directory (or `.`) when the platform does not
    /// report a documents or downloads folder.
    #[must_use]
    pub fn discover() -> Self {
        let user = directories::UserDirs::new();
        let home = user
            .as_ref()
            .map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        let documents = user
            .as_ref()
            .and_then(|u| u.document_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| home.join("Documents"));
        let downloads = user
            .as_ref()
            .and_then(|u| u.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| home.join("Downloads"));

        Self::under(&documents, &downloads)
    }

    /// Directories rooted at explicit documents and downloads folders.
    #[must_use]
    pub fn under(documents: &Path, downloads: &Path) -> Self {
        let base = documents.join(APP_FOLDER);
        Self {
            projects: base.join("Projects"),
            exports: base.join("Exports"),
            backups: base.join("Backups"),
            downloads: downloads.join(APP_FOLDER),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = Path::new("/tmp/custom.db");
        assert_eq!(resolve_db_path(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn test_dirs_under_roots() {
        let dirs = HubDirs::under(Path::new("/docs"), Path::new("/dl"));
        assert_eq!(dirs.projects, PathBuf::from("/docs/AutomatePro/Projects"));
        assert_eq!(dirs.backups, PathBuf::from("/docs/AutomatePro/Backups"));
        assert_eq!(dirs.downloads, PathBuf::from("/dl/AutomatePro"));
    }
}
