//! Repository layer
//!
//! Repositories are stateless adapters over the cluster API and the chart
//! store. They provide small, focused interfaces without business logic:
//! - Namespaces: existence check and creation
//! - Resources: create/delete for one namespaced kind (services,
//!   replication controllers, pods)
//! - Charts: resolve a chart definition by repository and name
//!
//! All repositories are trait-based to enable testing and mocking.

mod charts;
mod clients;
mod namespaces;
mod resources;

#[cfg(test)]
mod mock;

// Re-export traits
pub use charts::ChartRepository;
pub use namespaces::NamespaceRepository;
pub use resources::{
    PodRepository, ReplicationControllerRepository, ResourceRepository, ServiceRepository,
};

// Re-export implementations
pub use charts::FileChartRepository;
pub use clients::ClientRegistry;
pub use namespaces::KubeNamespaceRepository;
pub use resources::KubeResourceRepository;
