//! Joinable background work.
//!
//! Blocking jobs (an external process, a long file walk) run on a private
//! tokio runtime via `spawn_blocking`. Every job gets a [`TaskId`]; callers
//! join it to collect the result, and [`BackgroundTasks::shutdown`] joins
//! whatever is still outstanding so no failure goes unreported.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle for a spawned job.
pub type TaskId = u64;

struct Task<T> {
    label: String,
    handle: JoinHandle<Result<T>>,
}

/// A set of blocking jobs with typed results.
pub struct BackgroundTasks<T> {
    runtime: Runtime,
    tasks: BTreeMap<TaskId, Task<T>>,
    next_id: TaskId,
}

impl<T: Send + 'static> BackgroundTasks<T> {
    /// Start the runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be created.
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("hub-task")
            .enable_all()
            .build()
            .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

        Ok(Self {
            runtime,
            tasks: BTreeMap::new(),
            next_id: 1,
        })
    }

    /// Run `job` on a blocking thread and return its id.
    pub fn spawn<F>(&mut self, label: impl Into<String>, job: F) -> TaskId
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        let label = label.into();
        debug!(id, label = %label, "Spawning background task");
        let handle = self.runtime.spawn_blocking(job);
        self.tasks.insert(id, Task { label, handle });
        id
    }

    /// Number of jobs not yet joined.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for a job and return its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unknown id, the job's own
    /// error, or [`Error::Other`] if the job panicked.
    pub fn join(&mut self, id: TaskId) -> Result<T> {
        let task = self
            .tasks
            .remove(&id)
            .ok_or_else(|| Error::InvalidArgument(format!("no background task with id {id}")))?;
        self.wait(task)
    }

    /// Join every outstanding job, in spawn order.
    pub fn shutdown(mut self) -> Vec<(String, Result<T>)> {
        let tasks = std::mem::take(&mut self.tasks);
        tasks
            .into_values()
            .map(|task| {
                let label = task.label.clone();
                let result = self.wait(task);
                if let Err(e) = &result {
                    warn!(label = %label, error = %e, "Background task failed");
                }
                (label, result)
            })
            .collect()
    }

    fn wait(&self, task: Task<T>) -> Result<T> {
        match self.runtime.block_on(task.handle) {
            Ok(result) => result,
            Err(e) => Err(Error::Other(format!(
                "background task '{}' did not complete: {e}",
                task.label
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_returns_value() {
        let mut tasks = BackgroundTasks::new().unwrap();
        let id = tasks.spawn("add", || Ok(2 + 2));
        assert_eq!(tasks.join(id).unwrap(), 4);
        assert_eq!(tasks.outstanding(), 0);
        assert!(tasks.join(id).is_err());
    }

    #[test]
    fn test_join_unknown_id() {
        let mut tasks: BackgroundTasks<()> = BackgroundTasks::new().unwrap();
        assert!(matches!(tasks.join(42), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_shutdown_surfaces_failures() {
        let mut tasks = BackgroundTasks::new().unwrap();
        tasks.spawn("ok", || Ok(1));
        tasks.spawn("bad", || Err(Error::Other("boom".into())));
        tasks.spawn("panics", || -> Result<i32> { panic!("kaboom") });

        let results = tasks.shutdown();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "ok");
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.as_ref().unwrap_err().to_string().contains("panics"));
    }
}
