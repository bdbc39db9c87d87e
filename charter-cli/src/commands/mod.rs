//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod chart;

pub use chart::ChartCommands;

use anyhow::{Context, Result};
use charter_deployer::repository::{
    ClientRegistry, FileChartRepository, KubeNamespaceRepository, KubeResourceRepository,
};
use charter_deployer::service::StandardChartDeploymentService;
use clap::Subcommand;
use k8s_openapi::api::core::v1::{Pod, ReplicationController, Service};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Chart deployment
    Chart {
        #[command(subcommand)]
        command: ChartCommands,
    },
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Chart { command } => chart::handle_chart_command(command, config).await,
    }
}

/// Wires the cluster client, repositories and deployment service
async fn deployment_service(config: &Config) -> Result<StandardChartDeploymentService> {
    let clients = Arc::new(ClientRegistry::new());

    match &config.cluster {
        Some(context) => clients
            .register_context(context)
            .await
            .with_context(|| format!("Failed to load kubeconfig context {}", context))?,
        None => clients
            .register_inferred(config.cluster_id())
            .await
            .context("Failed to infer cluster configuration")?,
    }

    info!(
        "Using cluster {} (namespace {})",
        config.cluster_id(),
        config.namespace
    );

    Ok(StandardChartDeploymentService::new(
        Arc::new(KubeNamespaceRepository::new(Arc::clone(&clients))),
        Arc::new(FileChartRepository::new()),
        Arc::new(KubeResourceRepository::<Service>::new(Arc::clone(&clients))),
        Arc::new(KubeResourceRepository::<ReplicationController>::new(
            Arc::clone(&clients),
        )),
        Arc::new(KubeResourceRepository::<Pod>::new(clients)),
    ))
}
