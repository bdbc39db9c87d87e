//! Label sets applied to chart resources

use std::collections::BTreeMap;

/// Label set applied uniformly to every resource of one deployment
///
/// Matches the shape of `metadata.labels` on Kubernetes objects.
pub type Labels = BTreeMap<String, String>;

/// Label carrying the chart name
pub const CHART_LABEL: &str = "chart";

/// Label carrying the name of the build node a pod backs
pub const NODE_LABEL: &str = "charter.io/node";

/// Builds the default label set for a chart deployment
pub fn chart_labels(chart_name: &str) -> Labels {
    let mut labels = Labels::new();
    labels.insert(CHART_LABEL.to_string(), chart_name.to_string());
    labels
}
