//! Build node domain model

use serde::{Deserialize, Serialize};

/// Lifecycle state of a single-use build node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Node is accepting tasks
    Active,

    /// A task finished and the node no longer accepts tasks
    Draining,

    /// Termination has been handed to the worker pool
    Terminating,

    /// The backing cluster resource was released
    Terminated,

    /// The termination attempt failed; it is not retried
    TerminateFailed,
}

impl NodeState {
    /// Returns true once the node has stopped accepting work
    pub fn is_retiring(&self) -> bool {
        !matches!(self, NodeState::Active)
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeState::Active => write!(f, "Active"),
            NodeState::Draining => write!(f, "Draining"),
            NodeState::Terminating => write!(f, "Terminating"),
            NodeState::Terminated => write!(f, "Terminated"),
            NodeState::TerminateFailed => write!(f, "TerminateFailed"),
        }
    }
}
