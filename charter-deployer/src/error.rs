//! Error types for the deployer
//!
//! Repositories fail with [`ResourceError`], which is either a
//! repository-layer [`RepositoryError`] or a Kubernetes client error.
//! The deployment service wraps both into a single [`ServiceError`].

use thiserror::Error;

/// Errors raised by repositories for failures outside the cluster transport
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No client is registered for the requested cluster
    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    /// The chart repository has no chart with that name
    #[error("Chart not found: {0}")]
    ChartNotFound(String),

    /// A resource definition cannot be used as given
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Reading chart files failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A chart manifest could not be decoded
    #[error("Failed to decode manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// Building a cluster client failed
    #[error("Failed to configure cluster client: {0}")]
    ClientConfig(String),
}

/// Any failure a repository operation may report
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Repository-layer failure
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Kubernetes client failure (transport or API status)
    #[error("Kubernetes client error: {0}")]
    Cluster(#[from] kube::Error),
}

impl ResourceError {
    /// Check if this error came from the Kubernetes client
    pub fn is_cluster_error(&self) -> bool {
        matches!(self, Self::Cluster(_))
    }

    /// Check if the cluster reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Cluster(kube::Error::Api(response)) => response.code == 404,
            Self::Repository(RepositoryError::ChartNotFound(_)) => true,
            _ => false,
        }
    }
}

/// Result type alias for repository operations
pub type Result<T> = std::result::Result<T, ResourceError>;

/// The single error kind returned by the deployment service
///
/// Carries the context (namespace or chart) and the original cause.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
    #[source]
    source: ResourceError,
}

impl ServiceError {
    /// Wraps a repository failure with context
    pub fn new(message: impl Into<String>, source: ResourceError) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }

    /// Context message without the cause
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wrapped repository failure
    pub fn cause(&self) -> &ResourceError {
        &self.source
    }
}
