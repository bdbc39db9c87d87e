//! Charter CLI
//!
//! Command-line interface for deploying charts to Kubernetes clusters.

mod commands;
mod config;

use anyhow::Result;
use charter_core::util::DEFAULT_NAMESPACE;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "charter")]
#[command(about = "Deploy and tear down charts on Kubernetes", long_about = None)]
struct Cli {
    /// Kubeconfig context of the target cluster (inferred when omitted)
    #[arg(long, global = true, env = "CHARTER_CLUSTER")]
    cluster: Option<String>,

    /// Target namespace
    #[arg(long, global = true, env = "CHARTER_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    #[command(subcommand)]
    command: Commands,
}

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

    let cli = Cli::parse();

    let config = Config {
        cluster: cli.cluster,
        namespace: cli.namespace,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
