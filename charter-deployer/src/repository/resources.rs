//! Namespaced resource repositories
//!
//! One generic repository covers every namespaced kind a chart can carry.
//! Services, replication controllers and pods each get a named alias.

use async_trait::async_trait;
use charter_core::domain::labels::Labels;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::{Pod, ReplicationController, Service};
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::error::{RepositoryError, Result};
use crate::repository::ClientRegistry;

/// Repository trait for one namespaced resource kind
#[async_trait]
pub trait ResourceRepository<K: Send + Sync>: Send + Sync {
    /// Creates the resource in a namespace
    ///
    /// # Arguments
    /// * `cluster` - Cluster identity
    /// * `namespace` - Target namespace
    /// * `resource` - Resource definition from the chart
    /// * `labels` - Labels added to the resource's metadata
    async fn create(&self, cluster: &str, namespace: &str, resource: &K, labels: &Labels)
    -> Result<()>;

    /// Deletes the resource from a namespace
    ///
    /// The resource is identified by its metadata name.
    async fn delete(&self, cluster: &str, namespace: &str, resource: &K) -> Result<()>;
}

/// Repository for services
pub type ServiceRepository = dyn ResourceRepository<Service>;

/// Repository for replication controllers
pub type ReplicationControllerRepository = dyn ResourceRepository<ReplicationController>;

/// Repository for bare pods
pub type PodRepository = dyn ResourceRepository<Pod>;

/// Kubernetes implementation of ResourceRepository
pub struct KubeResourceRepository<K> {
    clients: Arc<ClientRegistry>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeResourceRepository<K> {
    /// Creates a new repository for kind `K`
    pub fn new(clients: Arc<ClientRegistry>) -> Self {
        Self {
            clients,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<K> ResourceRepository<K> for KubeResourceRepository<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static,
{
    async fn create(
        &self,
        cluster: &str,
        namespace: &str,
        resource: &K,
        labels: &Labels,
    ) -> Result<()> {
        let object = prepare_for_create(resource, labels)?;
        let api: Api<K> = Api::namespaced(self.clients.client(cluster)?, namespace);

        let created = api.create(&PostParams::default(), &object).await?;

        debug!(
            "Created {} {} in {}/{}",
            K::kind(&()),
            created.name_any(),
            cluster,
            namespace
        );
        Ok(())
    }

    async fn delete(&self, cluster: &str, namespace: &str, resource: &K) -> Result<()> {
        let name = resource.meta().name.clone().ok_or_else(|| {
            RepositoryError::InvalidResource(format!("{} without metadata.name", K::kind(&())))
        })?;
        let api: Api<K> = Api::namespaced(self.clients.client(cluster)?, namespace);

        match api.delete(&name, &DeleteParams::default()).await {
            Ok(_) => {
                debug!("Deleted {} {} in {}/{}", K::kind(&()), name, cluster, namespace);
                Ok(())
            }
            Err(kube::Error::Api(response)) if response.code == 404 => {
                debug!(
                    "{} {} already absent from {}/{}",
                    K::kind(&()),
                    name,
                    cluster,
                    namespace
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Copies a chart resource and stamps it for creation
///
/// Chart labels override existing labels with the same key. Server-owned
/// metadata is cleared so the object can be posted into any namespace.
fn prepare_for_create<K>(resource: &K, labels: &Labels) -> Result<K>
where
    K: Resource<DynamicType = ()> + Clone,
{
    let meta = resource.meta();
    if meta.name.is_none() && meta.generate_name.is_none() {
        return Err(RepositoryError::InvalidResource(format!(
            "{} without metadata.name",
            K::kind(&())
        ))
        .into());
    }

    let mut object = resource.clone();
    object
        .labels_mut()
        .extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));

    let meta = object.meta_mut();
    meta.namespace = None;
    meta.resource_version = None;
    meta.uid = None;

    Ok(object)
}
