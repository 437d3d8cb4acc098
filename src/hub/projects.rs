//! Project scaffolding.

use super::Hub;
use crate::error::Result;
use crate::model::{Project, ProjectDraft};
use crate::settings;
use crate::storage::record::{insert_record, Draft};
use crate::storage::{now_ms, AuditAction, Module};
use std::path::{Path, PathBuf};
use tracing::info;

impl Hub {
    /// Create a project and its directories.
    ///
    /// A relative `base_dir` is placed under the `default_project_dir`
    /// setting. Directories are created inside the write transaction, so a
    /// failed mkdir leaves no row; directories made before a later failure
    /// are not removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequiredField`], an I/O error, or a storage error.
    pub fn create_project(&mut self, draft: &ProjectDraft) -> Result<i64> {
        draft.validate()?;

        let mut draft = draft.clone();
        let base_dir = self.project_root(Path::new(draft.base_dir.trim()));
        draft.base_dir = base_dir.to_string_lossy().into_owned();

        let folders: Vec<PathBuf> = draft
            .subfolders
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| base_dir.join(s))
            .collect();

        let id = self.storage.mutate("create_project", |tx, ctx| {
            let id = insert_record::<Project>(tx, &draft, now_ms())?;

            std::fs::create_dir_all(&base_dir)?;
            for folder in &folders {
                std::fs::create_dir_all(folder)?;
            }

            ctx.record(
                AuditAction::Create,
                Module::Projects,
                format!("Created project {} at {}", draft.summary(), base_dir.display()),
            );
            Ok(id)
        })?;

        info!(id, path = %base_dir.display(), folders = folders.len(), "Created project");
        Ok(id)
    }

    fn project_root(&self, base_dir: &Path) -> PathBuf {
        if base_dir.is_absolute() {
            return base_dir.to_path_buf();
        }
        match self.settings.get_path(settings::DEFAULT_PROJECT_DIR) {
            Some(root) => root.join(base_dir),
            None => base_dir.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hub::tests::memory_hub;
    use crate::model::ProjectFilter;

    #[test]
    fn test_create_project_scaffolds_folders() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let base = dir.path().join("site");

        let mut draft = ProjectDraft::new("Site", base.to_str().unwrap());
        draft.subfolders = vec!["src".into(), "assets/img".into(), " ".into()];
        let id = hub.create_project(&draft).unwrap();

        assert!(base.join("src").is_dir());
        assert!(base.join("assets").join("img").is_dir());

        let project = hub.require::<Project>(id).unwrap();
        assert_eq!(project.subfolders, vec!["src", "assets/img"]);
        assert_eq!(hub.count_audit(Some(Module::Projects)).unwrap(), 1);
    }

    #[test]
    fn test_relative_base_dir_uses_default_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());

        let id = hub.create_project(&ProjectDraft::new("Blog", "blog")).unwrap();

        let expected = dir.path().join("docs").join("AutomatePro").join("Projects").join("blog");
        assert!(expected.is_dir());
        assert_eq!(hub.require::<Project>(id).unwrap().base_dir, expected.to_string_lossy());
    }

    #[test]
    fn test_failed_mkdir_leaves_no_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let draft = ProjectDraft::new("Broken", blocker.join("inner").to_str().unwrap());
        assert!(hub.create_project(&draft).is_err());

        assert!(hub.list::<Project>(&ProjectFilter::All, None).unwrap().is_empty());
        assert_eq!(hub.count_audit(Some(Module::Projects)).unwrap(), 0);
    }

    #[test]
    fn test_missing_required_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let err = hub.create_project(&ProjectDraft::new("", "/tmp/x")).unwrap_err();
        assert!(matches!(err, Error::RequiredField { field: "name", .. }));
    }

    #[test]
    fn test_escaping_subfolder_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let base = dir.path().join("site");

        let mut draft = ProjectDraft::new("Site", base.to_str().unwrap());
        draft.subfolders = vec!["src".into(), "../escaped".into()];
        let err = hub.create_project(&draft).unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!base.exists());
        assert!(!dir.path().join("escaped").exists());
        assert!(hub.list::<Project>(&ProjectFilter::All, None).unwrap().is_empty());
    }
}
