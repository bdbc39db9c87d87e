//! Chart deployment service
//!
//! Deploys a chart into a namespace and tears it down again:
//! - Ensures the namespace exists before deploying
//! - Creates services, then replication controllers, then pods
//! - Deletes in the same category order
//!
//! Calls run one after another on the caller's task. The first failure
//! aborts the sequence; nothing already created or deleted is rolled back.

use async_trait::async_trait;
use charter_core::domain::chart::{Chart, ChartRepo};
use charter_core::domain::labels::Labels;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{ResourceError, ServiceError};
use crate::repository::{
    ChartRepository, NamespaceRepository, PodRepository, ReplicationControllerRepository,
    ServiceRepository,
};

/// Service trait for chart deployment
#[async_trait]
pub trait ChartDeploymentService: Send + Sync {
    /// Deploys a chart into a namespace
    ///
    /// Creates the namespace if it is missing. Every created resource
    /// carries `labels`.
    ///
    /// # Arguments
    /// * `cluster` - Cluster identity
    /// * `namespace` - Target namespace
    /// * `repo` - Repository holding the chart
    /// * `chart_name` - Chart to deploy
    /// * `labels` - Labels applied to every created resource
    ///
    /// # Returns
    /// The resolved chart
    async fn deploy_chart(
        &self,
        cluster: &str,
        namespace: &str,
        repo: &ChartRepo,
        chart_name: &str,
        labels: &Labels,
    ) -> Result<Chart, ServiceError>;

    /// Resolves a chart and deletes its resources from a namespace
    async fn delete_chart(
        &self,
        cluster: &str,
        namespace: &str,
        repo: &ChartRepo,
        chart_name: &str,
    ) -> Result<(), ServiceError>;

    /// Deletes the resources of an already-resolved chart
    ///
    /// A missing namespace means there is nothing to delete and is not an
    /// error.
    async fn delete_chart_resources(
        &self,
        cluster: &str,
        namespace: &str,
        chart: &Chart,
    ) -> Result<(), ServiceError>;
}

/// Standard implementation of ChartDeploymentService
pub struct StandardChartDeploymentService {
    namespaces: Arc<dyn NamespaceRepository>,
    charts: Arc<dyn ChartRepository>,
    services: Arc<ServiceRepository>,
    replication_controllers: Arc<ReplicationControllerRepository>,
    pods: Arc<PodRepository>,
}

impl StandardChartDeploymentService {
    /// Creates a new deployment service from its repositories
    pub fn new(
        namespaces: Arc<dyn NamespaceRepository>,
        charts: Arc<dyn ChartRepository>,
        services: Arc<ServiceRepository>,
        replication_controllers: Arc<ReplicationControllerRepository>,
        pods: Arc<PodRepository>,
    ) -> Self {
        Self {
            namespaces,
            charts,
            services,
            replication_controllers,
            pods,
        }
    }

    async fn try_deploy(
        &self,
        cluster: &str,
        namespace: &str,
        repo: &ChartRepo,
        chart_name: &str,
        labels: &Labels,
    ) -> Result<Chart, ResourceError> {
        let chart = self.charts.chart(repo, chart_name).await?;

        if !self.namespaces.exists(cluster, namespace).await? {
            warn!("Namespace not found, creating it: {}", namespace);
            self.namespaces.create(cluster, namespace).await?;
        }

        for service in &chart.services {
            self.services
                .create(cluster, namespace, service, labels)
                .await?;
        }

        for controller in &chart.replication_controllers {
            self.replication_controllers
                .create(cluster, namespace, controller, labels)
                .await?;
        }

        for pod in &chart.pods {
            self.pods.create(cluster, namespace, pod, labels).await?;
        }

        info!(
            "Deployed chart {} to {}/{} ({} resource(s))",
            chart,
            cluster,
            namespace,
            chart.resource_count()
        );
        Ok(chart)
    }

    /// Returns false if the namespace is missing and nothing was deleted
    async fn try_delete(
        &self,
        cluster: &str,
        namespace: &str,
        chart: &Chart,
    ) -> Result<bool, ResourceError> {
        if !self.namespaces.exists(cluster, namespace).await? {
            return Ok(false);
        }

        for service in &chart.services {
            self.services.delete(cluster, namespace, service).await?;
        }

        for controller in &chart.replication_controllers {
            self.replication_controllers
                .delete(cluster, namespace, controller)
                .await?;
        }

        for pod in &chart.pods {
            self.pods.delete(cluster, namespace, pod).await?;
        }

        Ok(true)
    }
}

#[async_trait]
impl ChartDeploymentService for StandardChartDeploymentService {
    async fn deploy_chart(
        &self,
        cluster: &str,
        namespace: &str,
        repo: &ChartRepo,
        chart_name: &str,
        labels: &Labels,
    ) -> Result<Chart, ServiceError> {
        self.try_deploy(cluster, namespace, repo, chart_name, labels)
            .await
            .map_err(|err| {
                let message = match &err {
                    ResourceError::Repository(_) => {
                        format!("Error accessing/creating namespace [{}]. ", namespace)
                    }
                    ResourceError::Cluster(_) => format!(
                        "Error in Kubernetes client trying to deploy chart [{}]. ",
                        chart_name
                    ),
                };
                fail(message, err)
            })
    }

    async fn delete_chart(
        &self,
        cluster: &str,
        namespace: &str,
        repo: &ChartRepo,
        chart_name: &str,
    ) -> Result<(), ServiceError> {
        let chart = self
            .charts
            .chart(repo, chart_name)
            .await
            .map_err(|err| fail(format!("Error accessing chart [{}]. ", chart_name), err))?;

        self.delete_chart_resources(cluster, namespace, &chart)
            .await
    }

    async fn delete_chart_resources(
        &self,
        cluster: &str,
        namespace: &str,
        chart: &Chart,
    ) -> Result<(), ServiceError> {
        match self.try_delete(cluster, namespace, chart).await {
            Ok(true) => {
                info!("Deleted chart {} from {}/{}", chart, cluster, namespace);
                Ok(())
            }
            Ok(false) => {
                warn!(
                    "Namespace {} not found. Unable to delete chart {}",
                    namespace, chart
                );
                Ok(())
            }
            Err(err) => {
                let message = match &err {
                    ResourceError::Repository(_) => {
                        format!("Error accessing namespace [{}]. ", namespace)
                    }
                    ResourceError::Cluster(_) => format!(
                        "Error in Kubernetes client trying to delete chart [{}]. ",
                        chart
                    ),
                };
                Err(fail(message, err))
            }
        }
    }
}

fn fail(message: String, err: ResourceError) -> ServiceError {
    error!("{}{}", message, err);
    ServiceError::new(message, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RepositoryError, Result};
    use crate::repository::ResourceRepository;
    use k8s_openapi::api::core::v1::{Pod, ReplicationController, Service};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::Resource;
    use kube::error::ErrorResponse;
    use std::collections::HashSet;
    use std::sync::Mutex;

    type CallLog = Arc<Mutex<Vec<String>>>;

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn conflict() -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "already exists".to_string(),
            reason: "AlreadyExists".to_string(),
            code: 409,
        })
    }

    #[derive(Clone, Copy)]
    enum Failure {
        Repository,
        Cluster,
    }

    impl Failure {
        fn error(self) -> ResourceError {
            match self {
                Failure::Repository => {
                    RepositoryError::InvalidResource("rejected".to_string()).into()
                }
                Failure::Cluster => conflict().into(),
            }
        }
    }

    struct FakeNamespaces {
        log: CallLog,
        existing: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl NamespaceRepository for FakeNamespaces {
        async fn exists(&self, cluster: &str, namespace: &str) -> Result<bool> {
            self.log
                .lock()
                .unwrap()
                .push(format!("exists:{}:{}", cluster, namespace));
            Ok(self.existing.lock().unwrap().contains(namespace))
        }

        async fn create(&self, cluster: &str, namespace: &str) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("create-namespace:{}:{}", cluster, namespace));
            self.existing.lock().unwrap().insert(namespace.to_string());
            Ok(())
        }
    }

    struct FakeCharts {
        chart: Option<Chart>,
    }

    #[async_trait]
    impl ChartRepository for FakeCharts {
        async fn chart(&self, _repo: &ChartRepo, name: &str) -> Result<Chart> {
            self.chart
                .clone()
                .ok_or_else(|| RepositoryError::ChartNotFound(name.to_string()).into())
        }
    }

    struct FakeResources {
        log: CallLog,
        fail_on: Option<(String, Failure)>,
    }

    impl FakeResources {
        fn record<K: Resource<DynamicType = ()>>(
            &self,
            action: &str,
            resource: &K,
            labels: Option<&Labels>,
        ) -> Result<()> {
            let name = resource.meta().name.clone().unwrap_or_default();
            if let Some((target, failure)) = &self.fail_on {
                if *target == name {
                    return Err(failure.error());
                }
            }

            let mut entry = format!("{}:{}:{}", action, K::kind(&()), name);
            if let Some(labels) = labels {
                let rendered: Vec<String> =
                    labels.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                entry.push_str(&format!(":{}", rendered.join(",")));
            }
            self.log.lock().unwrap().push(entry);
            Ok(())
        }
    }

    #[async_trait]
    impl<K> ResourceRepository<K> for FakeResources
    where
        K: Resource<DynamicType = ()> + Send + Sync,
    {
        async fn create(
            &self,
            _cluster: &str,
            _namespace: &str,
            resource: &K,
            labels: &Labels,
        ) -> Result<()> {
            self.record("create", resource, Some(labels))
        }

        async fn delete(&self, _cluster: &str, _namespace: &str, resource: &K) -> Result<()> {
            self.record("delete", resource, None)
        }
    }

    struct Harness {
        log: CallLog,
        service: StandardChartDeploymentService,
    }

    fn harness(
        chart: Option<Chart>,
        existing: &[&str],
        fail_on: Option<(&str, Failure)>,
    ) -> Harness {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let resources = Arc::new(FakeResources {
            log: Arc::clone(&log),
            fail_on: fail_on.map(|(name, failure)| (name.to_string(), failure)),
        });
        let namespaces = Arc::new(FakeNamespaces {
            log: Arc::clone(&log),
            existing: Mutex::new(existing.iter().map(|ns| ns.to_string()).collect()),
        });

        let service = StandardChartDeploymentService::new(
            namespaces,
            Arc::new(FakeCharts { chart }),
            resources.clone(),
            resources.clone(),
            resources,
        );

        Harness { log, service }
    }

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn repo() -> ChartRepo {
        ChartRepo::new("/srv/charts")
    }

    fn web_chart() -> Chart {
        let mut chart = Chart::new(repo(), "web");
        chart.services.push(Service {
            metadata: meta("svc-a"),
            ..Default::default()
        });
        chart.replication_controllers.push(ReplicationController {
            metadata: meta("rc-a"),
            ..Default::default()
        });
        chart
    }

    fn full_chart() -> Chart {
        let mut chart = web_chart();
        chart.pods.push(Pod {
            metadata: meta("pod-a"),
            ..Default::default()
        });
        chart.services.push(Service {
            metadata: meta("svc-b"),
            ..Default::default()
        });
        chart
    }

    fn web_labels() -> Labels {
        Labels::from([("app".to_string(), "web".to_string())])
    }

    #[tokio::test]
    async fn test_deploy_then_delete_web_chart() {
        let h = harness(Some(web_chart()), &[], None);

        let chart = h
            .service
            .deploy_chart("c1", "ns1", &repo(), "web", &web_labels())
            .await
            .unwrap();
        assert_eq!(chart.name, "web");

        assert_eq!(
            calls(&h.log),
            vec![
                "exists:c1:ns1",
                "create-namespace:c1:ns1",
                "create:Service:svc-a:app=web",
                "create:ReplicationController:rc-a:app=web",
            ]
        );

        h.log.lock().unwrap().clear();
        h.service
            .delete_chart("c1", "ns1", &repo(), "web")
            .await
            .unwrap();

        assert_eq!(
            calls(&h.log),
            vec![
                "exists:c1:ns1",
                "delete:Service:svc-a",
                "delete:ReplicationController:rc-a",
            ]
        );
    }

    #[tokio::test]
    async fn test_deploy_empty_chart_only_touches_namespace() {
        let h = harness(Some(Chart::new(repo(), "empty")), &[], None);

        let chart = h
            .service
            .deploy_chart("c1", "ns1", &repo(), "empty", &web_labels())
            .await
            .unwrap();

        assert!(chart.is_empty());
        assert_eq!(chart.name, "empty");
        assert_eq!(
            calls(&h.log),
            vec!["exists:c1:ns1", "create-namespace:c1:ns1"]
        );
    }

    #[tokio::test]
    async fn test_deploy_existing_namespace_orders_categories() {
        let h = harness(Some(full_chart()), &["ns1"], None);

        h.service
            .deploy_chart("c1", "ns1", &repo(), "web", &web_labels())
            .await
            .unwrap();

        assert_eq!(
            calls(&h.log),
            vec![
                "exists:c1:ns1",
                "create:Service:svc-a:app=web",
                "create:Service:svc-b:app=web",
                "create:ReplicationController:rc-a:app=web",
                "create:Pod:pod-a:app=web",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_keeps_creation_order() {
        let h = harness(Some(full_chart()), &["ns1"], None);

        h.service
            .delete_chart_resources("c1", "ns1", &full_chart())
            .await
            .unwrap();

        // Teardown mirrors creation order rather than reversing it.
        assert_eq!(
            calls(&h.log),
            vec![
                "exists:c1:ns1",
                "delete:Service:svc-a",
                "delete:Service:svc-b",
                "delete:ReplicationController:rc-a",
                "delete:Pod:pod-a",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_missing_namespace_is_noop() {
        let h = harness(Some(full_chart()), &[], None);

        h.service
            .delete_chart("c1", "gone", &repo(), "web")
            .await
            .unwrap();

        assert_eq!(calls(&h.log), vec!["exists:c1:gone"]);
    }

    #[tokio::test]
    async fn test_deploy_repository_failure_aborts() {
        let h = harness(
            Some(full_chart()),
            &["ns1"],
            Some(("svc-b", Failure::Repository)),
        );

        let err = h
            .service
            .deploy_chart("c1", "ns1", &repo(), "web", &web_labels())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Error accessing/creating namespace [ns1]. ");
        assert!(!err.cause().is_cluster_error());
        assert_eq!(
            calls(&h.log),
            vec!["exists:c1:ns1", "create:Service:svc-a:app=web"]
        );
    }

    #[tokio::test]
    async fn test_deploy_cluster_failure_aborts() {
        let h = harness(Some(full_chart()), &["ns1"], Some(("rc-a", Failure::Cluster)));

        let err = h
            .service
            .deploy_chart("c1", "ns1", &repo(), "web", &web_labels())
            .await
            .unwrap_err();

        assert_eq!(
            err.message(),
            "Error in Kubernetes client trying to deploy chart [web]. "
        );
        assert!(err.cause().is_cluster_error());
        let log = calls(&h.log);
        assert!(!log.iter().any(|call| call.starts_with("create:Pod")));
    }

    #[tokio::test]
    async fn test_delete_failure_aborts() {
        let h = harness(Some(full_chart()), &["ns1"], Some(("rc-a", Failure::Cluster)));

        let err = h
            .service
            .delete_chart_resources("c1", "ns1", &full_chart())
            .await
            .unwrap_err();

        assert!(
            err.message()
                .starts_with("Error in Kubernetes client trying to delete chart")
        );
        assert_eq!(
            calls(&h.log),
            vec![
                "exists:c1:ns1",
                "delete:Service:svc-a",
                "delete:Service:svc-b",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_chart() {
        let h = harness(None, &["ns1"], None);

        let err = h
            .service
            .delete_chart("c1", "ns1", &repo(), "web")
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Error accessing chart [web]. ");
        assert!(err.cause().is_not_found());

        let err = h
            .service
            .deploy_chart("c1", "ns1", &repo(), "web", &web_labels())
            .await
            .unwrap_err();
        assert!(!err.cause().is_cluster_error());
        assert!(calls(&h.log).is_empty());
    }
}
