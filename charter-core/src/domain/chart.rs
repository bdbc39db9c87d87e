//! Chart domain model
//!
//! A chart is a named bundle of services, replication controllers and pods
//! that are deployed into a namespace together.

use k8s_openapi::api::core::v1::{Pod, ReplicationController, Service};
use serde::{Deserialize, Serialize};

/// Location of a chart repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRepo {
    /// Repository location (a directory for file-backed repositories)
    pub url: String,

    /// Optional branch, tag or revision inside the repository
    #[serde(default)]
    pub reference: Option<String>,
}

impl ChartRepo {
    /// Creates a repository reference without a revision
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reference: None,
        }
    }

    /// Pins the repository to a revision
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

impl std::fmt::Display for ChartRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reference {
            Some(reference) => write!(f, "{}#{}", self.url, reference),
            None => write!(f, "{}", self.url),
        }
    }
}

/// A resolved chart definition
///
/// Categories missing from a definition deserialize as empty, so an absent
/// category and an empty one are the same thing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    /// Repository the chart was resolved from
    pub repo: ChartRepo,

    /// Chart name inside the repository
    pub name: String,

    /// Services, in creation order
    #[serde(default)]
    pub services: Vec<Service>,

    /// Replication controllers, in creation order
    #[serde(default)]
    pub replication_controllers: Vec<ReplicationController>,

    /// Bare pods, in creation order
    #[serde(default)]
    pub pods: Vec<Pod>,
}

impl Chart {
    /// Creates a chart with no resources
    pub fn new(repo: ChartRepo, name: impl Into<String>) -> Self {
        Self {
            repo,
            name: name.into(),
            services: Vec::new(),
            replication_controllers: Vec::new(),
            pods: Vec::new(),
        }
    }

    /// Total number of resources across all categories
    pub fn resource_count(&self) -> usize {
        self.services.len() + self.replication_controllers.len() + self.pods.len()
    }

    /// Returns true if the chart has nothing to deploy
    pub fn is_empty(&self) -> bool {
        self.resource_count() == 0
    }
}

impl std::fmt::Display for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.repo)
    }
}
