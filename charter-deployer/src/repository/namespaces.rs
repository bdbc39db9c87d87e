//! Namespace repository
//!
//! Handles namespace operations against the cluster:
//! - Checking whether a namespace exists
//! - Creating a namespace

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Api;
use kube::api::PostParams;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::Result;
use crate::repository::ClientRegistry;

/// Repository trait for namespace operations
#[async_trait]
pub trait NamespaceRepository: Send + Sync {
    /// Returns true if the namespace exists on the cluster
    ///
    /// # Arguments
    /// * `cluster` - Cluster identity
    /// * `namespace` - Namespace name
    async fn exists(&self, cluster: &str, namespace: &str) -> Result<bool>;

    /// Creates the namespace on the cluster
    ///
    /// # Arguments
    /// * `cluster` - Cluster identity
    /// * `namespace` - Namespace name
    async fn create(&self, cluster: &str, namespace: &str) -> Result<()>;
}

/// Kubernetes implementation of NamespaceRepository
pub struct KubeNamespaceRepository {
    clients: Arc<ClientRegistry>,
}

impl KubeNamespaceRepository {
    /// Creates a new namespace repository
    pub fn new(clients: Arc<ClientRegistry>) -> Self {
        Self { clients }
    }

    fn api(&self, cluster: &str) -> Result<Api<Namespace>> {
        Ok(Api::all(self.clients.client(cluster)?))
    }
}

#[async_trait]
impl NamespaceRepository for KubeNamespaceRepository {
    async fn exists(&self, cluster: &str, namespace: &str) -> Result<bool> {
        let found = self.api(cluster)?.get_opt(namespace).await?;
        debug!(
            "Namespace {} on {} exists: {}",
            namespace,
            cluster,
            found.is_some()
        );
        Ok(found.is_some())
    }

    async fn create(&self, cluster: &str, namespace: &str) -> Result<()> {
        let object = Namespace {
            metadata: ObjectMeta {
                name: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        self.api(cluster)?
            .create(&PostParams::default(), &object)
            .await?;

        info!("Created namespace {} on {}", namespace, cluster);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::status_registry;
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn test_missing_namespace_does_not_exist() {
        let (clients, responder) = status_registry("c1", StatusCode::NOT_FOUND);
        let repository = KubeNamespaceRepository::new(clients);

        assert!(!repository.exists("c1", "builds").await.unwrap());

        let (method, path) = responder.await.unwrap();
        assert_eq!(method, Method::GET);
        assert_eq!(path, "/api/v1/namespaces/builds");
    }

    #[tokio::test]
    async fn test_namespace_lookup_failure() {
        let (clients, _responder) = status_registry("c1", StatusCode::FORBIDDEN);
        let repository = KubeNamespaceRepository::new(clients);

        let err = repository.exists("c1", "builds").await.unwrap_err();
        assert!(err.is_cluster_error());
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_unregistered_cluster() {
        let repository = KubeNamespaceRepository::new(Arc::new(ClientRegistry::new()));

        let err = repository.exists("c2", "builds").await.unwrap_err();
        assert!(!err.is_cluster_error());
    }
}
