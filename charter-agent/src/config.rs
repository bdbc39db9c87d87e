//! Agent configuration
//!
//! Defines where build nodes are provisioned and how long an idle node is
//! kept before it is released.

use anyhow::Context;
use charter_core::util::{DEFAULT_NAMESPACE, any_blank};
use k8s_openapi::api::core::v1::Pod;
use std::path::PathBuf;
use std::time::Duration;

/// Cluster name resolved from the in-cluster or default kubeconfig setup
pub const INFERRED_CLUSTER: &str = "in-cluster";

/// Agent configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Cluster identity nodes are provisioned on
    pub cluster: String,

    /// Namespace node pods are created in
    pub namespace: String,

    /// Prefix for generated node names
    pub node_prefix: String,

    /// Minutes a node may stay idle before it is terminated (0 disables)
    pub idle_minutes: u32,

    /// How often retention checks run
    pub check_interval: Duration,

    /// YAML file holding the pod template for new nodes
    pub pod_template: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(cluster: String) -> Self {
        Self {
            cluster,
            namespace: DEFAULT_NAMESPACE.to_string(),
            node_prefix: "charter-agent".to_string(),
            idle_minutes: 10,
            check_interval: Duration::from_secs(60),
            pod_template: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - CHARTER_CLUSTER (optional, default: in-cluster)
    /// - CHARTER_NAMESPACE (optional, default: default)
    /// - CHARTER_NODE_PREFIX (optional, default: charter-agent)
    /// - CHARTER_IDLE_MINUTES (optional, default: 10)
    /// - CHARTER_CHECK_INTERVAL (optional, seconds, default: 60)
    /// - CHARTER_POD_TEMPLATE (optional, path to a pod YAML file)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(cluster) = std::env::var("CHARTER_CLUSTER") {
            config.cluster = cluster;
        }

        if let Ok(namespace) = std::env::var("CHARTER_NAMESPACE") {
            config.namespace = namespace;
        }

        if let Ok(prefix) = std::env::var("CHARTER_NODE_PREFIX") {
            config.node_prefix = prefix;
        }

        if let Ok(raw) = std::env::var("CHARTER_IDLE_MINUTES") {
            config.idle_minutes = raw
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("Invalid CHARTER_IDLE_MINUTES '{}': {}", raw, e))?;
        }

        if let Ok(raw) = std::env::var("CHARTER_CHECK_INTERVAL") {
            let seconds = raw
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("Invalid CHARTER_CHECK_INTERVAL '{}': {}", raw, e))?;
            config.check_interval = Duration::from_secs(seconds);
        }

        if let Ok(path) = std::env::var("CHARTER_POD_TEMPLATE") {
            config.pod_template = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Sets the idle timeout in minutes
    pub fn with_idle_minutes(mut self, idle_minutes: u32) -> Self {
        self.idle_minutes = idle_minutes;
        self
    }

    /// Whether the cluster client comes from the inferred environment
    /// rather than a named kubeconfig context
    pub fn uses_inferred_cluster(&self) -> bool {
        self.cluster == INFERRED_CLUSTER
    }

    /// Reads the pod template new nodes are created from
    pub fn load_pod_template(&self) -> anyhow::Result<Pod> {
        let path = self
            .pod_template
            .as_ref()
            .context("CHARTER_POD_TEMPLATE is not set")?;

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pod template {}", path.display()))?;

        serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid pod template {}", path.display()))
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if any_blank(&[
            self.cluster.as_str(),
            self.namespace.as_str(),
            self.node_prefix.as_str(),
        ]) {
            anyhow::bail!("cluster, namespace and node_prefix cannot be blank");
        }

        if self.check_interval.is_zero() {
            anyhow::bail!("check_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(INFERRED_CLUSTER.to_string())
    }
}
