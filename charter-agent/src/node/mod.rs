//! Build node model
//!
//! The executor subsystem is reached through three traits:
//! - [`Executor`]: one slot of task execution, owned by a computer
//! - [`Computer`]: the live session bound to a node
//! - [`CloudNode`]: the provisioned agent backed by a cluster workload
//!
//! A computer and its node are paired for the lifetime of one task.

mod computer;
mod kubernetes;
mod provisioner;

use async_trait::async_trait;
use charter_deployer::ResourceError;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub use computer::{AgentComputer, AgentExecutor};
pub use kubernetes::KubernetesNode;
pub use provisioner::NodeProvisioner;

/// A queued unit of work run by an executor
pub trait Task: Send + Sync {
    /// Display name of the task
    fn name(&self) -> &str;
}

/// One slot of task execution on a computer
pub trait Executor: Send + Sync {
    /// The computer owning this executor
    fn owner(&self) -> Arc<dyn Computer>;
}

/// Live session bound to a build node
pub trait Computer: Send + Sync {
    /// Display name of the computer
    fn name(&self) -> &str;

    /// The node this computer is bound to
    ///
    /// Returns `None` once the node has been removed.
    fn node(&self) -> Option<Arc<dyn CloudNode>>;

    /// Unbinds the node from this computer
    ///
    /// Returns the node the first time only; later calls return `None`.
    fn remove_node(&self) -> Option<Arc<dyn CloudNode>>;

    /// Allows or stops scheduling of new tasks on this computer
    fn set_accepting_tasks(&self, accepting: bool);

    /// Whether new tasks may be scheduled here
    fn is_accepting_tasks(&self) -> bool;

    /// True when no executor is running a task
    fn is_idle(&self) -> bool;

    /// True when the computer is disconnected
    fn is_offline(&self) -> bool;

    /// When the computer last became idle
    fn idle_since(&self) -> Option<Instant>;
}

/// Errors raised while terminating a node
#[derive(Debug, Error)]
pub enum TerminationError {
    /// Termination was interrupted before it finished
    #[error("Termination interrupted: {0}")]
    Interrupted(String),

    /// Local I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Releasing the cluster resource failed
    #[error("Failed to release cluster resource: {0}")]
    Resource(#[from] ResourceError),
}

/// A provisioned build agent backed by a cluster workload
#[async_trait]
pub trait CloudNode: Send + Sync {
    /// Node name
    fn name(&self) -> &str;

    /// Releases the cluster resource backing this node
    async fn terminate(&self) -> Result<(), TerminationError>;
}
