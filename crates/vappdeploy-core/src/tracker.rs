//! Task tracking
//!
//! Polls server-side tasks until they reach a terminal state. There is no
//! timeout: a task that never leaves a non-terminal state blocks the caller
//! indefinitely.

use std::time::Duration;

use tracing::{debug, error, warn};
use vappdeploy_api::{TaskHandle, TaskState};
use vappdeploy_client::{ClientError, TaskMonitor};

/// Final result of a tracked task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed,
}

impl TaskOutcome {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }
}

/// Waits on tasks through a [`TaskMonitor`]
///
/// Each worker builds its own tracker, so polling of different workers runs
/// in parallel while polling within one tracker is sequential.
pub struct TaskTracker<'a, M: ?Sized> {
    monitor: &'a M,
    poll_interval: Duration,
}

impl<'a, M: TaskMonitor + ?Sized> TaskTracker<'a, M> {
    pub fn new(monitor: &'a M, poll_interval: Duration) -> Self {
        Self {
            monitor,
            poll_interval,
        }
    }

    /// Poll a task until it succeeds or errors
    ///
    /// A task ending in error is reported as [`TaskOutcome::Failed`], not as
    /// an `Err`; the caller decides whether to continue.
    ///
    /// # Errors
    /// Returns an error only if the task state cannot be read.
    pub async fn wait(&self, task: &TaskHandle) -> Result<TaskOutcome, ClientError> {
        loop {
            let info = self.monitor.task_info(task).await?;

            match info.state {
                TaskState::Succeeded => {
                    debug!(task = %task.id, "Task Completed");
                    return Ok(TaskOutcome::Succeeded);
                }
                TaskState::Failed => {
                    error!(
                        task = %task.id,
                        reason = info.error.as_deref().unwrap_or("unknown"),
                        "Task errored out"
                    );
                    return Ok(TaskOutcome::Failed);
                }
                state => {
                    debug!(task = %task.id, state = ?state, "Task is still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Wait for every task in turn; succeeds only if all of them succeed
    ///
    /// Never stops early: each task is polled to completion even after an
    /// earlier one failed. A task whose state cannot be read counts as failed.
    pub async fn wait_all(&self, tasks: &[TaskHandle]) -> TaskOutcome {
        let mut all_succeeded = true;

        for task in tasks {
            match self.wait(task).await {
                Ok(TaskOutcome::Succeeded) => {}
                Ok(TaskOutcome::Failed) => all_succeeded = false,
                Err(e) => {
                    warn!(task = %task.id, error = %e, "failed to read task state");
                    all_succeeded = false;
                }
            }
        }

        if all_succeeded {
            TaskOutcome::Succeeded
        } else {
            TaskOutcome::Failed
        }
    }
}
