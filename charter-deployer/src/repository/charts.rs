//! Chart repository
//!
//! Resolves chart definitions. The file-backed implementation reads a chart
//! from `<repo>/<chart>/manifests/`, where every YAML document is one
//! Kubernetes resource routed by its `kind`.

use async_trait::async_trait;
use charter_core::domain::chart::{Chart, ChartRepo};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{RepositoryError, Result};

/// Repository trait for chart lookups
#[async_trait]
pub trait ChartRepository: Send + Sync {
    /// Resolves a chart definition
    ///
    /// # Arguments
    /// * `repo` - Repository holding the chart
    /// * `name` - Chart name
    async fn chart(&self, repo: &ChartRepo, name: &str) -> Result<Chart>;
}

/// Chart repository backed by a local directory tree
#[derive(Debug, Default, Clone)]
pub struct FileChartRepository {}

impl FileChartRepository {
    /// Creates a new file chart repository
    pub fn new() -> Self {
        Self {}
    }

    async fn load(
        &self,
        repo: &ChartRepo,
        name: &str,
    ) -> std::result::Result<Chart, RepositoryError> {
        if let Some(reference) = &repo.reference {
            debug!(
                "Ignoring reference {} for file repository {}",
                reference, repo.url
            );
        }

        let manifests = Path::new(&repo.url).join(name).join("manifests");
        if !tokio::fs::try_exists(&manifests).await? {
            return Err(RepositoryError::ChartNotFound(format!(
                "{} in {}",
                name, repo.url
            )));
        }

        let mut files: Vec<PathBuf> = Vec::new();
        let mut entries = tokio::fs::read_dir(&manifests).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if is_yaml {
                files.push(path);
            }
        }
        files.sort();

        let mut chart = Chart::new(repo.clone(), name);
        for path in &files {
            let content = tokio::fs::read_to_string(path).await?;
            add_manifest(&mut chart, &content, path)?;
        }

        debug!(
            "Loaded chart {} with {} resource(s) from {} file(s)",
            chart,
            chart.resource_count(),
            files.len()
        );
        Ok(chart)
    }
}

#[async_trait]
impl ChartRepository for FileChartRepository {
    async fn chart(&self, repo: &ChartRepo, name: &str) -> Result<Chart> {
        Ok(self.load(repo, name).await?)
    }
}

/// Routes every document of one manifest file into the chart
fn add_manifest(
    chart: &mut Chart,
    content: &str,
    source: &Path,
) -> std::result::Result<(), RepositoryError> {
    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let kind = value
            .get("kind")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            "Service" => chart.services.push(serde_yaml::from_value(value)?),
            "ReplicationController" => chart
                .replication_controllers
                .push(serde_yaml::from_value(value)?),
            "Pod" => chart.pods.push(serde_yaml::from_value(value)?),
            other => warn!(
                "Skipping unsupported kind '{}' in {}",
                other,
                source.display()
            ),
        }
    }

    Ok(())
}
