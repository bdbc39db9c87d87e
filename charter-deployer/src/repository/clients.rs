//! Cluster client registry
//!
//! Maps a cluster identity to a Kubernetes client. Repositories look the
//! client up on every call, so clusters can be registered at any time.

use kube::Client;
use kube::config::{Config, KubeConfigOptions};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

use crate::error::RepositoryError;

/// Registry of Kubernetes clients keyed by cluster name
#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Client>>,
}

impl ClientRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already-built client under a cluster name
    pub fn insert(&self, cluster: impl Into<String>, client: Client) {
        let mut clients = self.clients.write().unwrap_or_else(|e| e.into_inner());
        clients.insert(cluster.into(), client);
    }

    /// Registers a cluster from a kubeconfig context of the same name
    ///
    /// # Arguments
    /// * `cluster` - Name of the kubeconfig context to load
    pub async fn register_context(&self, cluster: &str) -> Result<(), RepositoryError> {
        let options = KubeConfigOptions {
            context: Some(cluster.to_string()),
            ..Default::default()
        };

        let config = Config::from_kubeconfig(&options)
            .await
            .map_err(|e| RepositoryError::ClientConfig(e.to_string()))?;

        self.register_config(cluster, config)
    }

    /// Registers a cluster from the inferred environment configuration
    ///
    /// Uses the in-cluster service account when available, otherwise the
    /// current kubeconfig context.
    pub async fn register_inferred(&self, cluster: &str) -> Result<(), RepositoryError> {
        let config = Config::infer()
            .await
            .map_err(|e| RepositoryError::ClientConfig(e.to_string()))?;

        self.register_config(cluster, config)
    }

    fn register_config(&self, cluster: &str, config: Config) -> Result<(), RepositoryError> {
        let endpoint = config.cluster_url.to_string();
        let client =
            Client::try_from(config).map_err(|e| RepositoryError::ClientConfig(e.to_string()))?;

        self.insert(cluster, client);
        info!("Registered cluster {} at {}", cluster, endpoint);

        Ok(())
    }

    /// Returns the client for a cluster
    pub fn client(&self, cluster: &str) -> Result<Client, RepositoryError> {
        let clients = self.clients.read().unwrap_or_else(|e| e.into_inner());
        clients
            .get(cluster)
            .cloned()
            .ok_or_else(|| RepositoryError::ClusterNotFound(cluster.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_cluster() {
        let registry = ClientRegistry::new();

        match registry.client("c1") {
            Err(RepositoryError::ClusterNotFound(name)) => assert_eq!(name, "c1"),
            _ => panic!("expected ClusterNotFound"),
        }
    }
}
