//! Chart command handlers
//!
//! Handles deploying, deleting and inspecting charts.

use anyhow::Result;
use charter_core::domain::chart::{Chart, ChartRepo};
use charter_core::domain::labels::{Labels, chart_labels};
use charter_deployer::repository::{ChartRepository, FileChartRepository};
use charter_deployer::service::ChartDeploymentService;
use clap::{Args, Subcommand};
use colored::*;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::deployment_service;
use crate::config::Config;

/// Chart location arguments shared by all chart commands
#[derive(Args)]
pub struct ChartArgs {
    /// Chart repository directory
    #[arg(long)]
    repo: String,

    /// Revision inside the repository
    #[arg(long)]
    reference: Option<String>,

    /// Chart name
    #[arg(long)]
    chart: String,
}

impl ChartArgs {
    fn chart_repo(&self) -> ChartRepo {
        let repo = ChartRepo::new(self.repo.clone());
        match &self.reference {
            Some(reference) => repo.with_reference(reference.clone()),
            None => repo,
        }
    }
}

/// Chart subcommands
#[derive(Subcommand)]
pub enum ChartCommands {
    /// Deploy a chart into the namespace
    Deploy {
        #[command(flatten)]
        chart: ChartArgs,

        /// Extra label applied to every resource (key=value, repeatable)
        #[arg(long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
    },
    /// Delete a chart's resources from the namespace
    Delete {
        #[command(flatten)]
        chart: ChartArgs,
    },
    /// Show the resources of a chart without touching the cluster
    Show {
        #[command(flatten)]
        chart: ChartArgs,
    },
}

/// Handle chart commands
///
/// # Arguments
/// * `command` - The chart command to execute
/// * `config` - The CLI configuration
pub async fn handle_chart_command(command: ChartCommands, config: &Config) -> Result<()> {
    match command {
        ChartCommands::Deploy { chart, labels } => deploy(config, &chart, labels).await,
        ChartCommands::Delete { chart } => delete(config, &chart).await,
        ChartCommands::Show { chart } => show(&chart).await,
    }
}

async fn deploy(config: &Config, args: &ChartArgs, extra: Vec<(String, String)>) -> Result<()> {
    let service = deployment_service(config).await?;
    let labels = deployment_labels(&args.chart, extra);

    let chart = service
        .deploy_chart(
            config.cluster_id(),
            &config.namespace,
            &args.chart_repo(),
            &args.chart,
            &labels,
        )
        .await?;

    println!(
        "{}",
        format!(
            "Deployed chart {} to namespace {}",
            chart.name, config.namespace
        )
        .green()
        .bold()
    );
    print_chart(&chart);

    Ok(())
}

async fn delete(config: &Config, args: &ChartArgs) -> Result<()> {
    let service = deployment_service(config).await?;

    service
        .delete_chart(
            config.cluster_id(),
            &config.namespace,
            &args.chart_repo(),
            &args.chart,
        )
        .await?;

    println!(
        "{}",
        format!(
            "Deleted chart {} from namespace {}",
            args.chart, config.namespace
        )
        .green()
        .bold()
    );

    Ok(())
}

async fn show(args: &ChartArgs) -> Result<()> {
    let chart = FileChartRepository::new()
        .chart(&args.chart_repo(), &args.chart)
        .await?;

    println!("{}", format!("Chart {}", chart).bold());
    if chart.is_empty() {
        println!("{}", "  No resources.".yellow());
    } else {
        print_chart(&chart);
    }

    Ok(())
}

/// Default chart label, overridden or extended by `--label`
fn deployment_labels(chart_name: &str, extra: Vec<(String, String)>) -> Labels {
    let mut labels = chart_labels(chart_name);
    labels.extend(extra);
    labels
}

/// Parses a `key=value` label argument
fn parse_label(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("label '{}' must be key=value", input))?;

    if key.trim().is_empty() {
        return Err(format!("label '{}' has an empty key", input));
    }

    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn display_name(meta: &ObjectMeta) -> &str {
    meta.name.as_deref().unwrap_or("<unnamed>")
}

fn print_chart(chart: &Chart) {
    for service in &chart.services {
        println!("  {} Service {}", "▸".cyan(), display_name(&service.metadata));
    }
    for controller in &chart.replication_controllers {
        println!(
            "  {} ReplicationController {}",
            "▸".cyan(),
            display_name(&controller.metadata)
        );
    }
    for pod in &chart.pods {
        println!("  {} Pod {}", "▸".cyan(), display_name(&pod.metadata));
    }
}
