//! Pod-backed build node

use async_trait::async_trait;
use charter_deployer::repository::PodRepository;
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use tracing::info;

use super::{CloudNode, TerminationError};
use crate::retention::SingleUseRetentionStrategy;

/// Build node running as a single pod
pub struct KubernetesNode {
    name: String,
    cluster: String,
    namespace: String,
    pod: Pod,
    pods: Arc<PodRepository>,
    retention: Arc<SingleUseRetentionStrategy>,
}

impl KubernetesNode {
    /// Creates a node for an already-created pod
    ///
    /// # Arguments
    /// * `cluster` - Cluster the pod runs on
    /// * `namespace` - Namespace of the pod
    /// * `pod` - The pod; its metadata name names the node
    /// * `pods` - Repository used to release the pod
    /// * `retention` - Retention strategy owned by this node
    pub fn new(
        cluster: String,
        namespace: String,
        pod: Pod,
        pods: Arc<PodRepository>,
        retention: Arc<SingleUseRetentionStrategy>,
    ) -> Self {
        let name = pod.metadata.name.clone().unwrap_or_default();
        Self {
            name,
            cluster,
            namespace,
            pod,
            pods,
            retention,
        }
    }

    /// The pod backing this node
    pub fn pod(&self) -> &Pod {
        &self.pod
    }

    /// Namespace of the backing pod
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Retention strategy owned by this node
    pub fn retention(&self) -> &Arc<SingleUseRetentionStrategy> {
        &self.retention
    }
}

#[async_trait]
impl CloudNode for KubernetesNode {
    fn name(&self) -> &str {
        &self.name
    }

    async fn terminate(&self) -> Result<(), TerminationError> {
        self.pods
            .delete(&self.cluster, &self.namespace, &self.pod)
            .await?;

        info!(
            "Released pod {} in {}/{}",
            self.name, self.cluster, self.namespace
        );
        Ok(())
    }
}
