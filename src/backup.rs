//! Backup and restore of the hub store.
//!
//! Artifacts are complete SQLite databases written with the online backup
//! API, so they are consistent even while the live connection stays open.
//! Each artifact gets a `<artifact>.sha256` sidecar. Restore validates the
//! artifact before anything is overwritten and always snapshots the live
//! store first.

use crate::error::{Error, Result};
use crate::files::{file_size, sha256_file};
use crate::storage::schema::{apply_schema, schema_version, table_exists, CURRENT_SCHEMA_VERSION, REQUIRED_TABLES};
use crate::storage::{AuditAction, Module, SqliteStorage};
use chrono::{Local, NaiveDateTime};
use rusqlite::backup::Progress;
use rusqlite::{Connection, DatabaseName, OpenFlags};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Local timestamp embedded in artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const ARTIFACT_EXT: &str = "db";
const SIDECAR_EXT: &str = "sha256";

/// Which operation produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Explicit or scheduled backup
    Backup,
    /// Safety snapshot taken right before a restore
    PreRestore,
}

impl ArtifactKind {
    const fn marker(self) -> &'static str {
        match self {
            Self::Backup => "_backup_",
            Self::PreRestore => "_pre_restore_",
        }
    }
}

/// A backup artifact found on disk.
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub taken_at: NaiveDateTime,
    #[serde(skip)]
    seq: u32,
    pub size_bytes: u64,
    pub has_checksum: bool,
}

/// Outcome of validating an artifact.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub path: PathBuf,
    pub checksum: String,
    /// A sidecar existed and matched; a mismatching sidecar fails verification.
    pub sidecar_verified: bool,
    pub schema_version: i32,
}

/// Outcome of a restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub restored_from: PathBuf,
    pub snapshot: PathBuf,
}

/// Write a backup of the live store into `dir`, creating it if needed.
///
/// Appends one `backup` audit entry after the artifact is complete, so the
/// artifact itself does not contain that entry.
///
/// # Errors
///
/// Returns an I/O error if `dir` is unwritable, or a storage error if the
/// copy fails.
pub fn create_backup(storage: &mut SqliteStorage, dir: &Path) -> Result<PathBuf> {
    let path = write_artifact(storage, dir, ArtifactKind::Backup)?;
    storage.append_audit(
        AuditAction::Backup,
        Module::System,
        format!("Backup created at {}", path.display()),
    )?;
    info!(path = %path.display(), "Backup created");
    Ok(path)
}

/// Restore the live store from an artifact.
///
/// Steps, in order: the artifact must exist; it must pass [`verify_backup`];
/// the current store is snapshotted next to the artifact; the artifact's
/// pages replace the live store; one `restore` audit entry is appended.
/// Validation failures leave the live store untouched.
///
/// The caller must reload anything it mirrors from the store (settings).
///
/// # Errors
///
/// Returns [`Error::BackupNotFound`], [`Error::CorruptBackup`], or an
/// I/O or storage error.
pub fn restore_backup(storage: &mut SqliteStorage, artifact: &Path) -> Result<RestoreReport> {
    verify_backup(artifact)?;

    let snapshot_dir = artifact
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let snapshot = write_artifact(storage, snapshot_dir, ArtifactKind::PreRestore)?;

    storage
        .conn_mut()
        .restore(DatabaseName::Main, artifact, None::<fn(Progress)>)?;
    // Older artifacts may predate some tables.
    apply_schema(storage.conn())?;

    storage.append_audit(
        AuditAction::Restore,
        Module::System,
        format!(
            "Restored from {} (previous state saved to {})",
            artifact.display(),
            snapshot.display()
        ),
    )?;

    info!(from = %artifact.display(), snapshot = %snapshot.display(), "Store restored");
    Ok(RestoreReport {
        restored_from: artifact.to_path_buf(),
        snapshot,
    })
}

/// Check that an artifact is a complete, compatible hub store.
///
/// # Errors
///
/// Returns [`Error::BackupNotFound`] if the file is missing and
/// [`Error::CorruptBackup`] naming the first failed check otherwise.
pub fn verify_backup(path: &Path) -> Result<Verification> {
    if !path.is_file() {
        return Err(Error::BackupNotFound {
            path: path.to_path_buf(),
        });
    }
    let corrupt = |reason: String| Error::CorruptBackup {
        path: path.to_path_buf(),
        reason,
    };

    let checksum = sha256_file(path)?;
    let sidecar_verified = match fs::read_to_string(sidecar_path(path)) {
        Ok(expected) => {
            let expected = expected.split_whitespace().next().unwrap_or_default();
            if !expected.eq_ignore_ascii_case(&checksum) {
                return Err(corrupt(format!(
                    "checksum mismatch (expected {expected}, found {checksum})"
                )));
            }
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| corrupt(format!("cannot open as SQLite: {e}")))?;

    let integrity: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .map_err(|e| corrupt(format!("not a SQLite database: {e}")))?;
    if integrity != "ok" {
        return Err(corrupt(format!("integrity check failed: {integrity}")));
    }

    let version = schema_version(&conn).map_err(|e| corrupt(e.to_string()))?;
    if version > CURRENT_SCHEMA_VERSION {
        return Err(corrupt(format!(
            "schema version {version} is newer than supported {CURRENT_SCHEMA_VERSION}"
        )));
    }

    for table in REQUIRED_TABLES {
        if !table_exists(&conn, table).map_err(|e| corrupt(e.to_string()))? {
            return Err(corrupt(format!("missing table '{table}'")));
        }
    }

    Ok(Verification {
        path: path.to_path_buf(),
        checksum,
        sidecar_verified,
        schema_version: version,
    })
}

/// Artifacts in `dir`, newest first. A missing directory lists as empty.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub fn list_backups(dir: &Path) -> Result<Vec<BackupInfo>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((kind, taken_at, seq)) = parse_artifact_name(name) else {
            continue;
        };
        found.push(BackupInfo {
            size_bytes: file_size(&path),
            has_checksum: sidecar_path(&path).is_file(),
            path,
            kind,
            taken_at,
            seq,
        });
    }

    found.sort_by(|a, b| (b.taken_at, b.seq).cmp(&(a.taken_at, a.seq)));
    Ok(found)
}

/// Delete all but the newest `keep` regular backups (and their sidecars).
///
/// Pre-restore snapshots are never pruned. `keep == 0` disables pruning.
///
/// # Errors
///
/// Returns an I/O error if listing fails. Individual delete failures are
/// logged and skipped.
pub fn prune_backups(dir: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    if keep == 0 {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    let backups = list_backups(dir)?
        .into_iter()
        .filter(|b| b.kind == ArtifactKind::Backup);

    for old in backups.skip(keep) {
        match fs::remove_file(&old.path) {
            Ok(()) => {
                let _ = fs::remove_file(sidecar_path(&old.path));
                removed.push(old.path);
            }
            Err(e) => warn!(path = %old.path.display(), error = %e, "Could not remove old backup"),
        }
    }

    if !removed.is_empty() {
        info!(removed = removed.len(), keep, "Pruned old backups");
    }
    Ok(removed)
}

/// Sidecar holding the artifact's SHA256.
#[must_use]
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(SIDECAR_EXT);
    artifact.with_file_name(name)
}

fn write_artifact(storage: &SqliteStorage, dir: &Path, kind: ArtifactKind) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = unique_artifact_path(dir, &storage.store_name(), kind, Local::now().naive_local());

    storage.conn().backup(DatabaseName::Main, &path, None)?;

    // A standalone artifact must not depend on -wal/-shm companions.
    {
        let copy = Connection::open(&path)?;
        copy.pragma_update_and_check(None, "journal_mode", "DELETE", |_| Ok(()))?;
    }

    let digest = sha256_file(&path)?;
    crate::files::atomic_write(&sidecar_path(&path), format!("{digest}\n").as_bytes())?;
    Ok(path)
}

fn unique_artifact_path(dir: &Path, stem: &str, kind: ArtifactKind, at: NaiveDateTime) -> PathBuf {
    let base = format!("{stem}{}{}", kind.marker(), at.format(TIMESTAMP_FORMAT));
    let mut candidate = dir.join(format!("{base}.{ARTIFACT_EXT}"));
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{base}_{n}.{ARTIFACT_EXT}"));
        n += 1;
    }
    candidate
}

/// Split `<stem><marker><YYYYMMDD_HHMMSS>[_<n>].db` into its parts.
fn parse_artifact_name(name: &str) -> Option<(ArtifactKind, NaiveDateTime, u32)> {
    let body = name.strip_suffix(&format!(".{ARTIFACT_EXT}"))?;

    // rfind: the store stem may itself contain a marker.
    let (kind, rest) = [ArtifactKind::PreRestore, ArtifactKind::Backup]
        .into_iter()
        .find_map(|kind| body.rfind(kind.marker()).map(|i| (kind, &body[i + kind.marker().len()..])))?;

    let stamp = rest.get(..15)?;
    let taken_at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    let seq = match &rest[15..] {
        "" => 0,
        suffix => suffix.strip_prefix('_')?.parse().ok()?,
    };
    Some((kind, taken_at, seq))
}
