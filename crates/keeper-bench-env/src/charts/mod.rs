//! Deployable components
//!
//! A run is a list of components installed in order: Helm releases for the
//! Chainlink nodes, the Ethereum network and the remote runner, and raw
//! manifests for the block explorer.

pub mod blockscout;
pub mod chainlink;
pub mod ethereum;
pub mod remote_runner;

use serde::Serialize;

use keeper_bench_common::Values;

/// Helm repository all benchmark charts are published in
pub const CHART_REPOSITORY: &str = "chainlink-qa";

/// A Helm release to install
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelmChart {
    /// Release name, unique within the namespace
    pub release: String,
    /// Chart reference (`repo/chart`)
    pub chart: String,
    /// Pinned chart version, latest when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Values passed to the chart
    pub values: Values,
}

impl HelmChart {
    /// Chart from the benchmark chart repository
    pub fn new(release: impl Into<String>, chart: &str, values: Values) -> Self {
        Self {
            release: release.into(),
            chart: format!("{}/{}", CHART_REPOSITORY, chart),
            version: None,
            values,
        }
    }

    /// Pin the chart version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Pre-rendered Kubernetes documents applied as-is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestSet {
    /// Name used in logs
    pub name: String,
    /// JSON or YAML documents
    pub documents: Vec<String>,
}

/// Anything the provisioner can install
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Component {
    /// Helm release
    Helm(HelmChart),
    /// Raw manifests
    Manifests(ManifestSet),
}

impl Component {
    /// Release or manifest-set name
    pub fn name(&self) -> &str {
        match self {
            Component::Helm(chart) => &chart.release,
            Component::Manifests(set) => &set.name,
        }
    }
}

impl From<HelmChart> for Component {
    fn from(chart: HelmChart) -> Self {
        Component::Helm(chart)
    }
}

impl From<ManifestSet> for Component {
    fn from(set: ManifestSet) -> Self {
        Component::Manifests(set)
    }
}
