//! In-process computer and executor
//!
//! Tracks the accepting-tasks flag, busy executors and the idle clock for a
//! node. Embedders drive it with `task_started`/`task_finished`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::{CloudNode, Computer, Executor};

/// Computer bound to one cloud node
pub struct AgentComputer {
    name: String,
    node: Mutex<Option<Arc<dyn CloudNode>>>,
    accepting_tasks: AtomicBool,
    offline: AtomicBool,
    busy: AtomicUsize,
    idle_since: Mutex<Option<Instant>>,
}

impl AgentComputer {
    /// Creates an online, idle computer bound to `node`
    pub fn new(node: Arc<dyn CloudNode>) -> Arc<Self> {
        Arc::new(Self {
            name: node.name().to_string(),
            node: Mutex::new(Some(node)),
            accepting_tasks: AtomicBool::new(true),
            offline: AtomicBool::new(false),
            busy: AtomicUsize::new(0),
            idle_since: Mutex::new(Some(Instant::now())),
        })
    }

    /// Marks one executor as busy
    pub fn task_started(&self) {
        self.busy.fetch_add(1, Ordering::SeqCst);
        *self.idle_since.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Marks one executor as free, restarting the idle clock when none remain
    pub fn task_finished(&self) {
        let previous = self
            .busy
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |busy| {
                Some(busy.saturating_sub(1))
            })
            .unwrap_or(0);

        if previous <= 1 {
            *self.idle_since.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        }
    }

    /// Overrides the idle clock
    pub fn set_idle_since(&self, since: Instant) {
        *self.idle_since.lock().unwrap_or_else(|e| e.into_inner()) = Some(since);
    }

    /// Marks the computer as disconnected or reconnected
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl Computer for AgentComputer {
    fn name(&self) -> &str {
        &self.name
    }

    fn node(&self) -> Option<Arc<dyn CloudNode>> {
        self.node.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn remove_node(&self) -> Option<Arc<dyn CloudNode>> {
        self.node.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn set_accepting_tasks(&self, accepting: bool) {
        self.accepting_tasks.store(accepting, Ordering::SeqCst);
    }

    fn is_accepting_tasks(&self) -> bool {
        self.accepting_tasks.load(Ordering::SeqCst)
    }

    fn is_idle(&self) -> bool {
        self.busy.load(Ordering::SeqCst) == 0
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    fn idle_since(&self) -> Option<Instant> {
        *self.idle_since.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Executor slot on an [`AgentComputer`]
pub struct AgentExecutor {
    owner: Arc<AgentComputer>,
}

impl AgentExecutor {
    /// Creates an executor owned by `owner`
    pub fn new(owner: Arc<AgentComputer>) -> Self {
        Self { owner }
    }
}

impl Executor for AgentExecutor {
    fn owner(&self) -> Arc<dyn Computer> {
        self.owner.clone()
    }
}
