//! Charter Agent
//!
//! Single-use build nodes backed by Kubernetes pods.
//!
//! Architecture:
//! - Configuration: idle timeout, check interval and node placement
//! - Node: executor/computer/node traits, the pod-backed node and its provisioner
//! - Retention: the idle-timeout policy and the single-use strategy that
//!   tears a node down once its one task has finished
//! - Worker: the shared pool that runs node terminations off the
//!   task-completion path

pub mod config;
pub mod node;
pub mod retention;
pub mod worker;

pub use config::Config;
