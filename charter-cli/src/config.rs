//! Configuration module
//!
//! Handles CLI configuration: target cluster and namespace.

use charter_core::util::any_blank;

/// Cluster identity used when no kubeconfig context is given
pub const INFERRED_CLUSTER: &str = "inferred";

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Kubeconfig context of the target cluster
    pub cluster: Option<String>,

    /// Target namespace
    pub namespace: String,
}

impl Config {
    /// Cluster identity passed to the deployment service
    pub fn cluster_id(&self) -> &str {
        self.cluster.as_deref().unwrap_or(INFERRED_CLUSTER)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if any_blank(&[self.namespace.as_str()]) {
            anyhow::bail!("namespace cannot be blank");
        }

        if self.cluster.as_deref().is_some_and(|c| any_blank(&[c])) {
            anyhow::bail!("cluster cannot be blank");
        }

        Ok(())
    }
}
