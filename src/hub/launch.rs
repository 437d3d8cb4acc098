//! Running utilities and custom commands.
//!
//! Processes run on the hub's background tasks. Utilities are launched and
//! reaped in the background; command runs capture their output and are
//! joined with [`Hub::finish_command`].

use super::Hub;
use crate::error::{Error, Result};
use crate::model::{Command, Utility, UtilityKind};
use crate::storage::{AuditAction, Module};
use crate::tasks::TaskId;
use serde::Serialize;
use std::path::Path;
use std::process::{Command as Process, Stdio};
use tracing::{debug, info, warn};

/// Result of a finished process.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub label: String,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// A utility that was started.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub utility_id: i64,
    pub target: String,
    pub pid: u32,
    pub task: TaskId,
}

/// Build a process that runs `line` through the platform shell.
fn shell(line: &str) -> Process {
    if cfg!(windows) {
        let mut p = Process::new("cmd");
        p.args(["/C", line]);
        p
    } else {
        let mut p = Process::new("sh");
        p.args(["-c", line]);
        p
    }
}

/// Build a process that opens `target` with the desktop's default handler.
fn opener(target: &str) -> Process {
    if cfg!(windows) {
        let mut p = Process::new("cmd");
        p.args(["/C", "start", "", target]);
        p
    } else if cfg!(target_os = "macos") {
        let mut p = Process::new("open");
        p.arg(target);
        p
    } else {
        let mut p = Process::new("xdg-open");
        p.arg(target);
        p
    }
}

/// Prefix `https://` when a site has no scheme.
fn site_url(target: &str) -> String {
    if target.contains("://") {
        target.to_string()
    } else {
        format!("https://{target}")
    }
}

impl Hub {
    /// Launch a utility: open an app or site, or start a command line.
    ///
    /// The process is reaped on a background task. One `execute` audit
    /// entry is written once the process has started.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id,
    /// [`Error::RequiredField`] when the utility has no target, or an I/O
    /// error if the process cannot start.
    pub fn execute_utility(&mut self, id: i64) -> Result<LaunchReport> {
        let utility = self.storage.require::<Utility>(id)?;
        let target = utility.target().ok_or(Error::RequiredField {
            entity: "utility",
            field: utility.kind.target_field(),
        })?;

        let (target, mut process) = match utility.kind {
            UtilityKind::App => {
                if !Path::new(target).exists() {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("application not found: {target}"),
                    )));
                }
                (target.to_string(), opener(target))
            }
            UtilityKind::Site => {
                let url = site_url(target);
                let process = opener(&url);
                (url, process)
            }
            UtilityKind::Command => (target.to_string(), shell(target)),
        };

        let child = process
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        let pid = child.id();

        let label = format!("utility {id}: {}", utility.name);
        let task_label = label.clone();
        let task = self.tasks.spawn(label, move || {
            let output = child.wait_with_output()?;
            Ok(CommandOutput {
                label: task_label,
                code: output.status.code(),
                success: output.status.success(),
                stdout: String::new(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        });

        self.storage.append_audit(
            AuditAction::Execute,
            Module::Utilities,
            format!("Launched utility {} ({target})", utility.name),
        )?;

        info!(id, pid, kind = %utility.kind, "Launched utility");
        Ok(LaunchReport {
            utility_id: id,
            target,
            pid,
            task,
        })
    }

    /// Start a saved command on a background task and return the task id.
    ///
    /// Nothing is audited until [`Hub::finish_command`] sees it succeed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub fn spawn_command(&mut self, id: i64) -> Result<TaskId> {
        let command = self.storage.require::<Command>(id)?;
        let line = command.command.clone();
        let label = format!("command {id}: {}", command.name);
        let task_label = label.clone();

        let task = self.tasks.spawn(label, move || {
            let output = shell(&line).stdin(Stdio::null()).output()?;
            Ok(CommandOutput {
                label: task_label,
                code: output.status.code(),
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        });

        self.running.insert(task, (id, command.name));
        debug!(id, task, "Command started");
        Ok(task)
    }

    /// Wait for a command started by [`Hub::spawn_command`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] for a non-zero exit (nothing is
    /// audited), [`Error::InvalidArgument`] for an unknown task, or the
    /// error that kept the process from running.
    pub fn finish_command(&mut self, task: TaskId) -> Result<CommandOutput> {
        let (id, name) = self
            .running
            .remove(&task)
            .ok_or_else(|| Error::InvalidArgument(format!("task {task} is not a command run")))?;

        let output = self.tasks.join(task)?;
        if !output.success {
            let status = output
                .code
                .map_or_else(|| "a signal".to_string(), |c| format!("status {c}"));
            warn!(id, %status, "Command failed");
            return Err(Error::CommandFailed {
                status,
                stderr: output.stderr.trim().to_string(),
            });
        }

        self.storage.append_audit(
            AuditAction::Execute,
            Module::Commands,
            format!("Executed command {name}"),
        )?;
        info!(id, "Command succeeded");
        Ok(output)
    }

    /// Run a saved command to completion.
    ///
    /// # Errors
    ///
    /// See [`Hub::spawn_command`] and [`Hub::finish_command`].
    pub fn execute_command(&mut self, id: i64) -> Result<CommandOutput> {
        let task = self.spawn_command(id)?;
        self.finish_command(task)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::hub::tests::memory_hub;
    use crate::model::{CommandDraft, UtilityDraft};

    #[test]
    fn test_execute_command_success_is_audited() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let id = hub
            .create::<Command>(&CommandDraft::new("Greet", "echo hello"))
            .unwrap();

        let output = hub.execute_command(id).unwrap();

        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.code, Some(0));
        assert_eq!(hub.count_audit(Some(Module::Commands)).unwrap(), 2);
    }

    #[test]
    fn test_failed_command_is_not_audited() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let id = hub
            .create::<Command>(&CommandDraft::new("Fail", "echo oops >&2; exit 3"))
            .unwrap();

        let err = hub.execute_command(id).unwrap_err();

        match err {
            Error::CommandFailed { status, stderr } => {
                assert_eq!(status, "status 3");
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hub.count_audit(Some(Module::Commands)).unwrap(), 1);
    }

    #[test]
    fn test_spawned_command_can_be_joined_later() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let id = hub.create::<Command>(&CommandDraft::new("Sleep", "sleep 0.1")).unwrap();

        let task = hub.spawn_command(id).unwrap();
        assert!(hub.finish_command(task + 1).is_err());
        assert!(hub.finish_command(task).unwrap().success);
    }

    #[test]
    fn test_command_utility_runs_and_is_reaped() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let marker = dir.path().join("ran");
        let id = hub
            .create::<Utility>(&UtilityDraft {
                name: "Touch".into(),
                kind: UtilityKind::Command,
                path: None,
                command: Some(format!("touch '{}'", marker.display())),
                is_favorite: false,
            })
            .unwrap();

        let report = hub.execute_utility(id).unwrap();
        assert!(report.pid > 0);
        assert_eq!(hub.count_audit(Some(Module::Utilities)).unwrap(), 2);

        let results = hub.shutdown();
        assert_eq!(results.len(), 1);
        assert!(results[0].1.as_ref().unwrap().success);
        assert!(marker.exists());
    }

    #[test]
    fn test_missing_app_is_not_launched() {
        let dir = tempfile::tempdir().unwrap();
        let mut hub = memory_hub(dir.path());
        let id = hub
            .create::<Utility>(&UtilityDraft {
                name: "Ghost".into(),
                kind: UtilityKind::App,
                path: Some("/definitely/not/here".into()),
                command: None,
                is_favorite: false,
            })
            .unwrap();

        assert!(hub.execute_utility(id).is_err());
        assert_eq!(hub.count_audit(Some(Module::Utilities)).unwrap(), 1);
    }

    #[test]
    fn test_site_url_scheme() {
        assert_eq!(site_url("docs.rs"), "https://docs.rs");
        assert_eq!(site_url("http://localhost:8080"), "http://localhost:8080");
    }
}
