//! Single-use retention strategy
//!
//! Ties a node's lifetime to one task. When the task completes, with or
//! without problems, the computer stops accepting tasks and termination of
//! its node is submitted to the shared worker pool:
//!
//! Active -> Draining -> Terminating -> Terminated | TerminateFailed
//!
//! The accepting-tasks flag is cleared before the job is submitted, so no
//! new task can land on a node already slated for removal. Termination
//! failures are logged and never reach the completion caller.

use async_trait::async_trait;
use charter_core::domain::node::NodeState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ExecutorListener, IdleRetentionPolicy, RetentionStrategy};
use crate::node::{Computer, Executor, Task};
use crate::worker::WorkerPool;

/// Terminates its node after exactly one task
pub struct SingleUseRetentionStrategy {
    idle: IdleRetentionPolicy,
    workers: Arc<dyn WorkerPool>,
    state: Arc<Mutex<NodeState>>,
}

impl SingleUseRetentionStrategy {
    /// Creates a strategy in the `Active` state
    ///
    /// # Arguments
    /// * `idle_minutes` - Idle timeout inherited from the idle policy
    /// * `check_interval` - Delay between idle checks
    /// * `workers` - Shared pool that runs terminations
    pub fn new(
        idle_minutes: u32,
        check_interval: Duration,
        workers: Arc<dyn WorkerPool>,
    ) -> Self {
        Self {
            idle: IdleRetentionPolicy::new(idle_minutes, check_interval),
            workers,
            state: Arc::new(Mutex::new(NodeState::Active)),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> NodeState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Idle timeout in minutes
    pub fn idle_minutes(&self) -> u32 {
        self.idle.idle_minutes()
    }

    /// Moves Active -> Draining; false if the node already left Active
    fn begin_draining(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state != NodeState::Active {
            return false;
        }
        *state = NodeState::Draining;
        true
    }

    fn terminate(&self, computer: Arc<dyn Computer>) {
        if !self.begin_draining() {
            debug!(
                "Ignoring completion on {}: node is already {}",
                computer.name(),
                self.state()
            );
            return;
        }

        info!("Terminating computer: {}", computer.name());
        computer.set_accepting_tasks(false);
        set_state(&self.state, NodeState::Terminating);

        let state = Arc::clone(&self.state);
        self.workers.submit(Box::pin(async move {
            release(computer.as_ref(), &state).await;
        }));
    }
}

/// Terminates the node of `computer` and unbinds it on success
async fn release(computer: &dyn Computer, state: &Mutex<NodeState>) {
    let Some(node) = computer.node() else {
        debug!("Node of {} already removed", computer.name());
        set_state(state, NodeState::Terminated);
        return;
    };

    match node.terminate().await {
        Ok(()) => {
            computer.remove_node();
            set_state(state, NodeState::Terminated);
            info!("Terminated node {}", node.name());
        }
        Err(e) => {
            set_state(state, NodeState::TerminateFailed);
            warn!("Failed to terminate {}: {}", computer.name(), e);
        }
    }
}

fn set_state(state: &Mutex<NodeState>, next: NodeState) {
    *state.lock().unwrap_or_else(|e| e.into_inner()) = next;
}

impl ExecutorListener for SingleUseRetentionStrategy {
    fn task_accepted(&self, _executor: &dyn Executor, task: &dyn Task) {
        debug!("Accepted task: {}", task.name());
    }

    fn task_completed(&self, executor: &dyn Executor, task: &dyn Task, duration: Duration) {
        info!(
            "Completed task: {} in: {} ms",
            task.name(),
            duration.as_millis()
        );
        self.terminate(executor.owner());
    }

    fn task_completed_with_problems(
        &self,
        executor: &dyn Executor,
        task: &dyn Task,
        duration: Duration,
        problems: &(dyn std::error::Error + Send + Sync),
    ) {
        info!(
            "Task completed with problems: {} in: {} ms ({})",
            task.name(),
            duration.as_millis(),
            problems
        );
        self.terminate(executor.owner());
    }
}

#[async_trait]
impl RetentionStrategy for SingleUseRetentionStrategy {
    async fn check(&self, computer: &dyn Computer) -> Duration {
        if self.idle.is_expired(computer) && self.begin_draining() {
            info!("Disconnecting idle computer {}", computer.name());
            computer.set_accepting_tasks(false);
            set_state(&self.state, NodeState::Terminating);
            release(computer, &self.state).await;
        }
        self.idle.check_interval()
    }

    fn is_retired(&self) -> bool {
        matches!(
            self.state(),
            NodeState::Terminated | NodeState::TerminateFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AgentComputer, AgentExecutor, CloudNode, TerminationError};
    use crate::worker::{Job, TokioWorkerPool};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Holds submitted jobs until the test runs them
    #[derive(Default)]
    struct ManualPool {
        jobs: Mutex<Vec<Job>>,
    }

    impl ManualPool {
        async fn run_all(&self) {
            let jobs: Vec<Job> = self.jobs.lock().unwrap().drain(..).collect();
            for job in jobs {
                job.await;
            }
        }

        fn pending(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }
    }

    impl WorkerPool for ManualPool {
        fn submit(&self, job: Job) {
            self.jobs.lock().unwrap().push(job);
        }
    }

    struct FakeNode {
        terminations: AtomicUsize,
        fail: bool,
        done: tokio::sync::Notify,
    }

    impl FakeNode {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                terminations: AtomicUsize::new(0),
                fail,
                done: tokio::sync::Notify::new(),
            })
        }

        fn terminations(&self) -> usize {
            self.terminations.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CloudNode for FakeNode {
        fn name(&self) -> &str {
            "node-1"
        }

        async fn terminate(&self) -> Result<(), TerminationError> {
            self.terminations.fetch_add(1, Ordering::SeqCst);
            self.done.notify_one();
            if self.fail {
                return Err(std::io::Error::other("connection reset").into());
            }
            Ok(())
        }
    }

    struct NamedTask(&'static str);

    impl Task for NamedTask {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn setup(fail: bool) -> (Arc<FakeNode>, Arc<AgentComputer>, AgentExecutor) {
        let node = FakeNode::new(fail);
        let computer = AgentComputer::new(node.clone());
        let executor = AgentExecutor::new(computer.clone());
        (node, computer, executor)
    }

    fn strategy(pool: Arc<dyn WorkerPool>) -> SingleUseRetentionStrategy {
        SingleUseRetentionStrategy::new(10, Duration::from_secs(60), pool)
    }

    #[tokio::test]
    async fn test_completion_terminates_once() {
        let pool = Arc::new(ManualPool::default());
        let strategy = strategy(pool.clone());
        let (node, computer, executor) = setup(false);

        strategy.task_accepted(&executor, &NamedTask("build"));
        assert_eq!(strategy.state(), NodeState::Active);

        strategy.task_completed(&executor, &NamedTask("build"), Duration::from_millis(1500));

        // Scheduling stops before the background job has run.
        assert!(!computer.is_accepting_tasks());
        assert_eq!(strategy.state(), NodeState::Terminating);
        assert_eq!(pool.pending(), 1);
        assert_eq!(node.terminations(), 0);

        pool.run_all().await;
        assert_eq!(node.terminations(), 1);
        assert_eq!(strategy.state(), NodeState::Terminated);
        assert!(strategy.is_retired());
        assert!(computer.node().is_none());

        strategy.task_completed(&executor, &NamedTask("build"), Duration::from_millis(10));
        assert_eq!(pool.pending(), 0);
        pool.run_all().await;
        assert_eq!(node.terminations(), 1);
    }

    #[tokio::test]
    async fn test_completion_with_problems_terminates() {
        let pool = Arc::new(ManualPool::default());
        let strategy = strategy(pool.clone());
        let (node, computer, executor) = setup(false);
        let problem = std::io::Error::other("test failures");

        strategy.task_completed_with_problems(
            &executor,
            &NamedTask("build"),
            Duration::from_secs(3),
            &problem,
        );

        assert!(!computer.is_accepting_tasks());
        pool.run_all().await;
        assert_eq!(node.terminations(), 1);
        assert_eq!(strategy.state(), NodeState::Terminated);
    }

    #[tokio::test]
    async fn test_termination_failure_is_absorbed() {
        let pool = Arc::new(ManualPool::default());
        let strategy = strategy(pool.clone());
        let (node, _computer, executor) = setup(true);

        strategy.task_completed(&executor, &NamedTask("build"), Duration::from_secs(1));
        pool.run_all().await;

        assert_eq!(node.terminations(), 1);
        assert_eq!(strategy.state(), NodeState::TerminateFailed);
    }

    #[tokio::test]
    async fn test_removed_node_is_skipped() {
        let pool = Arc::new(ManualPool::default());
        let strategy = strategy(pool.clone());
        let (node, computer, executor) = setup(false);

        strategy.task_completed(&executor, &NamedTask("build"), Duration::from_secs(1));
        computer.remove_node();
        pool.run_all().await;

        assert_eq!(node.terminations(), 0);
        assert_eq!(strategy.state(), NodeState::Terminated);
    }

    #[tokio::test]
    async fn test_terminates_on_tokio_pool() {
        let pool = Arc::new(TokioWorkerPool::current().unwrap());
        let strategy = strategy(pool);
        let (node, _computer, executor) = setup(false);

        strategy.task_completed(&executor, &NamedTask("build"), Duration::from_secs(1));

        tokio::time::timeout(Duration::from_secs(5), node.done.notified())
            .await
            .unwrap();
        assert_eq!(node.terminations(), 1);
    }

    #[tokio::test]
    async fn test_check_skips_retiring_node() {
        let pool = Arc::new(ManualPool::default());
        let strategy = SingleUseRetentionStrategy::new(1, Duration::from_secs(30), pool.clone());
        let (node, computer, executor) = setup(false);
        computer.set_idle_since(
            std::time::Instant::now()
                .checked_sub(Duration::from_secs(600))
                .unwrap(),
        );

        strategy.task_completed(&executor, &NamedTask("build"), Duration::from_secs(1));
        let delay = strategy.check(computer.as_ref()).await;

        assert_eq!(delay, Duration::from_secs(30));
        assert_eq!(node.terminations(), 0);
    }

    #[tokio::test]
    async fn test_idle_check_and_completion_terminate_once() {
        let pool = Arc::new(ManualPool::default());
        let strategy = SingleUseRetentionStrategy::new(1, Duration::from_secs(30), pool.clone());
        let (node, computer, executor) = setup(false);
        computer.set_idle_since(
            std::time::Instant::now()
                .checked_sub(Duration::from_secs(600))
                .unwrap(),
        );

        let delay = strategy.check(computer.as_ref()).await;
        assert_eq!(delay, Duration::from_secs(30));
        assert_eq!(node.terminations(), 1);
        assert_eq!(strategy.state(), NodeState::Terminated);
        assert!(!computer.is_accepting_tasks());

        strategy.task_completed(&executor, &NamedTask("build"), Duration::from_secs(1));
        assert_eq!(pool.pending(), 0);
        pool.run_all().await;
        assert_eq!(node.terminations(), 1);
    }

    #[tokio::test]
    async fn test_failed_termination_retires_strategy() {
        let pool = Arc::new(ManualPool::default());
        let strategy = strategy(pool.clone());
        let (_node, computer, executor) = setup(true);

        strategy.task_completed(&executor, &NamedTask("build"), Duration::from_secs(1));
        pool.run_all().await;

        assert!(strategy.is_retired());
        assert!(computer.node().is_some());
        let handle = crate::retention::spawn_check_loop(Arc::new(strategy), computer);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
