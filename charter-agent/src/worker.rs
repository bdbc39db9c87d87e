//! Background worker pool
//!
//! Node terminations may block on cluster I/O, so they run here instead of
//! on the executor's task-completion path. Submission is fire-and-forget:
//! nothing awaits a job's outcome.

use futures::future::BoxFuture;
use tokio::runtime::{Handle, TryCurrentError};

/// A unit of background work
pub type Job = BoxFuture<'static, ()>;

/// Pool that runs jobs in the background
pub trait WorkerPool: Send + Sync {
    /// Submits a job without waiting for it
    fn submit(&self, job: Job);
}

/// Worker pool backed by a tokio runtime
///
/// One instance is shared process-wide behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TokioWorkerPool {
    handle: Handle,
}

impl TokioWorkerPool {
    /// Creates a pool that spawns onto the given runtime
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a pool on the runtime of the calling task
    pub fn current() -> Result<Self, TryCurrentError> {
        Ok(Self::new(Handle::try_current()?))
    }
}

impl WorkerPool for TokioWorkerPool {
    fn submit(&self, job: Job) {
        // Detached: dropping the JoinHandle does not cancel the job.
        drop(self.handle.spawn(job));
    }
}
