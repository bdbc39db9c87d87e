//! Charter Agent
//!
//! Provisions one single-use build node and keeps it under retention until
//! it is released.
//!
//! Startup:
//! - Configuration: load settings from environment or defaults
//! - Cluster: register the inferred client or a named kubeconfig context
//! - Node: create the pod from the configured template
//! - Retention: run checks until the node is released or the process is
//!   interrupted

use anyhow::{Context, Result};
use charter_agent::Config;
use charter_agent::node::{AgentComputer, CloudNode, Computer, NodeProvisioner};
use charter_agent::retention::{RetentionStrategy, spawn_check_loop};
use charter_agent::worker::{TokioWorkerPool, WorkerPool};
use charter_core::domain::labels::Labels;
use charter_deployer::repository::{ClientRegistry, KubeResourceRepository, PodRepository};
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "charter=info,charter_deployer=info,charter_agent=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Charter Agent");

    let config = load_config()?;
    info!(
        "Loaded configuration: cluster={}, namespace={}, idle_minutes={}",
        config.cluster, config.namespace, config.idle_minutes
    );

    let template = config.load_pod_template()?;

    let clients = Arc::new(ClientRegistry::new());
    if config.uses_inferred_cluster() {
        clients
            .register_inferred(&config.cluster)
            .await
            .context("Failed to infer cluster configuration")?;
    } else {
        clients
            .register_context(&config.cluster)
            .await
            .with_context(|| format!("Failed to load kubeconfig context {}", config.cluster))?;
    }

    let pods: Arc<PodRepository> = Arc::new(KubeResourceRepository::<Pod>::new(clients));
    let workers: Arc<dyn WorkerPool> =
        Arc::new(TokioWorkerPool::current().context("No tokio runtime for the worker pool")?);

    let provisioner = NodeProvisioner::new(config.clone(), pods, workers);
    let node = provisioner
        .provision(&template, &Labels::new())
        .await
        .context("Failed to provision build node")?;

    let computer = AgentComputer::new(node.clone());
    let strategy: Arc<dyn RetentionStrategy> = node.retention().clone();
    let mut checks = spawn_check_loop(strategy, computer.clone());

    info!(
        "Node {} ready, checking every {:?}",
        node.name(),
        config.check_interval
    );

    tokio::select! {
        result = &mut checks => result.context("Retention checks failed")?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, releasing node {}", node.name());
            checks.abort();

            if let Some(bound) = computer.remove_node() {
                bound.terminate().await.context("Failed to release node")?;
            }
        }
    }

    info!("Node {} released", node.name());
    Ok(())
}

/// Loads configuration from environment variables
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Invalid agent configuration")?;
    config.validate()?;
    Ok(config)
}
