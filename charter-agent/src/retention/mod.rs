//! Retention layer
//!
//! Decides when a build node is torn down:
//! - [`IdleRetentionPolicy`] releases nodes that stayed idle too long
//! - [`SingleUseRetentionStrategy`] releases a node as soon as its one task
//!   has finished, on top of the idle policy

mod idle;
mod single_use;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::node::{Computer, Executor, Task};

pub use idle::IdleRetentionPolicy;
pub use single_use::SingleUseRetentionStrategy;

/// Listener for task lifecycle events on one computer's executors
///
/// Callbacks run on the executor's completion path and must not block.
pub trait ExecutorListener: Send + Sync {
    /// A task was handed to an executor
    fn task_accepted(&self, executor: &dyn Executor, task: &dyn Task);

    /// A task finished normally
    fn task_completed(&self, executor: &dyn Executor, task: &dyn Task, duration: Duration);

    /// A task finished with an error
    fn task_completed_with_problems(
        &self,
        executor: &dyn Executor,
        task: &dyn Task,
        duration: Duration,
        problems: &(dyn std::error::Error + Send + Sync),
    );
}

/// Policy deciding when a computer's node is released
#[async_trait]
pub trait RetentionStrategy: Send + Sync {
    /// Periodic check of a computer
    ///
    /// # Returns
    /// Delay until the next check
    async fn check(&self, computer: &dyn Computer) -> Duration;

    /// Called once the computer is online
    fn start(&self, computer: &dyn Computer) {
        computer.set_accepting_tasks(true);
    }

    /// True once the strategy will never release the node again
    fn is_retired(&self) -> bool {
        false
    }
}

/// Starts a background loop running `strategy` checks for `computer`
///
/// The loop ends once the computer no longer has a node or the strategy
/// has retired it.
pub fn spawn_check_loop(
    strategy: Arc<dyn RetentionStrategy>,
    computer: Arc<dyn Computer>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        strategy.start(computer.as_ref());

        while computer.node().is_some() && !strategy.is_retired() {
            let delay = strategy.check(computer.as_ref()).await;
            tokio::time::sleep(delay).await;
        }

        debug!("Retention checks stopped for {}", computer.name());
    })
}
