use crate::vsphere::{VsphereClient, VsphereError, VsphereFault, VsphereTaskId, VsphereTaskState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Shared flag flipped by the interrupt handler; everything that waits checks
/// it between polls.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task did not complete successfully: {fault}")]
    Failed { fault: VsphereFault },

    #[error("Task did not complete within {}", format_timeout(.timeout))]
    TimedOut { timeout: Duration },

    #[error("Interrupted while waiting for the task")]
    Cancelled,

    #[error("Couldn't poll the task")]
    Poll(#[source] VsphereError),
}

fn format_timeout(timeout: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*timeout)
}

impl TaskError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Blocks until a remote task reaches a terminal state.
#[derive(Clone, Debug)]
pub struct TaskWaiter {
    poll_interval: Duration,
    timeout: Duration,
    cancellation: CancellationToken,
}

impl TaskWaiter {
    pub fn new(
        poll_interval: Duration,
        timeout: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            poll_interval,
            timeout,
            cancellation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn wait(
        &self,
        vsphere: &mut dyn VsphereClient,
        task: &VsphereTaskId,
    ) -> Result<(), TaskError> {
        let started_at = Instant::now();

        loop {
            if self.cancellation.is_cancelled() {
                return Err(TaskError::Cancelled);
            }

            let info = vsphere.task_info(task).map_err(TaskError::Poll)?;

            tracing::debug!(%task, state = ?info.state, "polled task");

            match info.state {
                VsphereTaskState::Success => {
                    return Ok(());
                }

                VsphereTaskState::Error => {
                    let fault = info.error.unwrap_or_else(VsphereFault::unknown);

                    return Err(TaskError::Failed { fault });
                }

                VsphereTaskState::Queued | VsphereTaskState::Running => {
                    if started_at.elapsed() >= self.timeout {
                        return Err(TaskError::TimedOut {
                            timeout: self.timeout,
                        });
                    }

                    thread::sleep(self.poll_interval);
                }
            }
        }
    }
}
