//! Charter Deployer
//!
//! Deploys and tears down charts on Kubernetes clusters.
//!
//! Architecture:
//! - Repositories: one per cluster resource kind, plus namespaces and charts
//! - Services: the chart deployment orchestrator that sequences repository calls
//!
//! Every repository and service is trait-based and injected through
//! constructors, so callers choose the backing implementation.

pub mod error;
pub mod repository;
pub mod service;

pub use error::{RepositoryError, ResourceError, ServiceError};
