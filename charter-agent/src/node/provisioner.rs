//! Node provisioner
//!
//! Creates the pod for a new single-use build node and hands back the node
//! together with its retention strategy.

use charter_core::domain::labels::{Labels, NODE_LABEL};
use charter_deployer::ResourceError;
use charter_deployer::repository::PodRepository;
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::KubernetesNode;
use crate::config::Config;
use crate::retention::SingleUseRetentionStrategy;
use crate::worker::WorkerPool;

/// Provisions pod-backed build nodes
pub struct NodeProvisioner {
    config: Config,
    pods: Arc<PodRepository>,
    workers: Arc<dyn WorkerPool>,
}

impl NodeProvisioner {
    /// Creates a new provisioner
    ///
    /// # Arguments
    /// * `config` - Cluster, namespace, naming and idle settings
    /// * `pods` - Repository used to create and release node pods
    /// * `workers` - Shared pool that runs node terminations
    pub fn new(config: Config, pods: Arc<PodRepository>, workers: Arc<dyn WorkerPool>) -> Self {
        Self {
            config,
            pods,
            workers,
        }
    }

    /// Creates a pod from `template` and returns the node it backs
    ///
    /// The pod is named `<prefix>-<8 hex chars>` and labelled with the node
    /// name plus `labels`.
    pub async fn provision(
        &self,
        template: &Pod,
        labels: &Labels,
    ) -> Result<Arc<KubernetesNode>, ResourceError> {
        let name = self.next_name();

        let mut pod = template.clone();
        pod.metadata.name = Some(name.clone());
        pod.metadata.generate_name = None;

        let mut node_labels = labels.clone();
        node_labels.insert(NODE_LABEL.to_string(), name.clone());

        self.pods
            .create(
                &self.config.cluster,
                &self.config.namespace,
                &pod,
                &node_labels,
            )
            .await?;

        info!(
            "Provisioned node {} in {}/{}",
            name, self.config.cluster, self.config.namespace
        );

        let retention = Arc::new(SingleUseRetentionStrategy::new(
            self.config.idle_minutes,
            self.config.check_interval,
            Arc::clone(&self.workers),
        ));

        Ok(Arc::new(KubernetesNode::new(
            self.config.cluster.clone(),
            self.config.namespace.clone(),
            pod,
            Arc::clone(&self.pods),
            retention,
        )))
    }

    fn next_name(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.config.node_prefix, &suffix[..8])
    }
}
