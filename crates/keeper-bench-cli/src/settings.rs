//! Benchmark settings shared by every subcommand
//!
//! Each setting comes from a flag when given, otherwise from `TEST_INPUTS`,
//! otherwise from its default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use tracing::{debug, info, warn};

use keeper_bench_common::{
    Values, DEFAULT_CHAINLINK_CHART_VERSION, DEFAULT_NODE_COUNT, DEFAULT_REGISTRY,
    DEFAULT_TTL_HOURS,
};
use keeper_bench_env::network::known_network_keys;
use keeper_bench_env::{select_network, BenchmarkSettings, NetworkEndpoints, TestType};

use crate::inputs::{
    TestInputs, GRAFANA_DASHBOARD_URL_KEY, NODE_COUNT_KEY, REGISTRY_KEY, TEST_TYPE_KEY,
};
use crate::{Error, Result};

/// Settings that shape the benchmark environment
#[derive(Args, Debug, Clone)]
pub struct BenchmarkArgs {
    /// Comma separated key=value list forwarded to the remote test
    #[arg(long, env = "TEST_INPUTS", default_value = "")]
    pub test_inputs: String,

    /// Networks to test against; the first entry is deployed
    #[arg(long, env = "SELECTED_NETWORKS", default_value = "")]
    pub selected_networks: String,

    /// Websocket endpoints for external networks
    #[arg(long, env = "EVM_URLS", default_value = "")]
    pub evm_urls: String,

    /// HTTP endpoints for external networks
    #[arg(long, env = "EVM_HTTP_URLS", default_value = "")]
    pub evm_http_urls: String,

    /// Funding keys for external networks
    #[arg(long, env = "EVM_KEYS", default_value = "", hide_env_values = true)]
    pub evm_keys: String,

    /// Registry version under test (overrides AUTOMATION_REGISTRY_TO_TEST)
    #[arg(long)]
    pub registry: Option<String>,

    /// Chainlink node count (overrides AUTOMATION_NUMBER_OF_NODES)
    #[arg(long)]
    pub nodes: Option<usize>,

    /// Test type, e.g. benchmark or soak (overrides TEST_TYPE)
    #[arg(long)]
    pub test_type: Option<String>,

    /// Grafana dashboard URL (overrides GRAFANA_DASHBOARD_URL)
    #[arg(long)]
    pub grafana_dashboard_url: Option<String>,

    /// Chainlink helm chart version
    #[arg(long, default_value = DEFAULT_CHAINLINK_CHART_VERSION)]
    pub chainlink_chart_version: String,

    /// Hours before the namespace janitor removes the environment
    #[arg(long, default_value_t = DEFAULT_TTL_HOURS)]
    pub ttl_hours: u64,

    /// YAML or JSON list of per-node env overrides, applied by node index
    #[arg(long)]
    pub node_overrides: Option<PathBuf>,
}

impl BenchmarkArgs {
    /// Resolve flags, `TEST_INPUTS` and defaults into run settings
    pub async fn resolve(&self) -> Result<BenchmarkSettings> {
        let inputs = TestInputs::parse(&self.test_inputs)?;

        let registry = match &self.registry {
            Some(registry) => registry.clone(),
            None => inputs.get_or(REGISTRY_KEY, DEFAULT_REGISTRY).to_string(),
        };

        let node_count = match self.nodes {
            Some(nodes) => nodes,
            None => inputs.parse_or(NODE_COUNT_KEY, DEFAULT_NODE_COUNT)?,
        };

        let test_type: TestType = self
            .test_type
            .as_deref()
            .unwrap_or_else(|| inputs.get_or(TEST_TYPE_KEY, ""))
            .parse()
            .unwrap_or_default();

        let grafana_dashboard_url = match &self.grafana_dashboard_url {
            Some(url) => url.clone(),
            None => inputs.get_or(GRAFANA_DASHBOARD_URL_KEY, "").to_string(),
        };

        let endpoints =
            NetworkEndpoints::from_lists(&self.evm_urls, &self.evm_http_urls, &self.evm_keys);
        let network = select_network(&self.selected_networks, &endpoints).inspect_err(|e| {
            if matches!(e, keeper_bench_common::Error::UnknownNetwork(_)) {
                let known: Vec<_> = known_network_keys().collect();
                warn!(known = %known.join(","), "unknown network in SELECTED_NETWORKS");
            }
        })?;

        let ttl_secs = self.ttl_hours.checked_mul(3600).ok_or_else(|| {
            keeper_bench_common::Error::validation_for_field(
                "ttl_hours",
                format!("{} hours is too long for a namespace TTL", self.ttl_hours),
            )
        })?;

        let node_overrides = match &self.node_overrides {
            Some(path) => load_node_overrides(path).await?,
            None => Vec::new(),
        };

        info!(
            registry = %registry,
            nodes = node_count,
            test_type = %test_type,
            network = %network.name,
            overrides = node_overrides.len(),
            "resolved benchmark settings"
        );

        Ok(BenchmarkSettings {
            registry,
            node_count,
            test_type,
            network,
            grafana_dashboard_url,
            test_inputs: inputs.raw().to_string(),
            selected_networks: self.selected_networks.clone(),
            node_overrides,
            chainlink_chart_version: self.chainlink_chart_version.clone(),
            ttl: Duration::from_secs(ttl_secs),
        })
    }
}

/// Read a list of env maps, one per node index
pub async fn load_node_overrides(path: &Path) -> Result<Vec<Values>> {
    let content = tokio::fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    // YAML is a superset of JSON, so one parser covers both formats
    let overrides: Vec<Values> = serde_yaml::from_str(&content)
        .map_err(|e| Error::invalid_overrides(path, e.to_string()))?;

    debug!(path = %path.display(), count = overrides.len(), "loaded node overrides");
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> BenchmarkArgs {
        BenchmarkArgs {
            test_inputs: String::new(),
            selected_networks: String::new(),
            evm_urls: String::new(),
            evm_http_urls: String::new(),
            evm_keys: String::new(),
            registry: None,
            nodes: None,
            test_type: None,
            grafana_dashboard_url: None,
            chainlink_chart_version: DEFAULT_CHAINLINK_CHART_VERSION.to_string(),
            ttl_hours: DEFAULT_TTL_HOURS,
            node_overrides: None,
        }
    }

    #[tokio::test]
    async fn defaults_without_inputs() {
        let settings = args().resolve().await.unwrap();

        assert_eq!(settings.registry, "registry-2-0");
        assert_eq!(settings.node_count, 6);
        assert_eq!(settings.test_type, TestType::Benchmark);
        assert!(settings.network.simulated);
        assert_eq!(settings.grafana_dashboard_url, "");
        assert_eq!(settings.ttl, Duration::from_secs(720 * 3600));
        assert!(settings.node_overrides.is_empty());
    }

    #[tokio::test]
    async fn test_inputs_fill_unset_flags() {
        let settings = BenchmarkArgs {
            test_inputs: "AUTOMATION_REGISTRY_TO_TEST=registry-1-3,AUTOMATION_NUMBER_OF_NODES=4,\
                          TEST_TYPE=soak,GRAFANA_DASHBOARD_URL=https://grafana/d/k"
                .into(),
            ..args()
        }
        .resolve()
        .await
        .unwrap();

        assert_eq!(settings.registry, "registry-1-3");
        assert_eq!(settings.node_count, 4);
        assert_eq!(settings.test_type, TestType::Soak);
        assert_eq!(settings.grafana_dashboard_url, "https://grafana/d/k");
    }

    /// Story: a one-off run bumps the node count without editing TEST_INPUTS,
    /// while the runner still receives TEST_INPUTS untouched
    #[tokio::test]
    async fn flags_win_over_test_inputs() {
        let raw = "AUTOMATION_NUMBER_OF_NODES=4,TEST_TYPE=soak";
        let settings = BenchmarkArgs {
            test_inputs: raw.into(),
            nodes: Some(10),
            test_type: Some("benchmark".into()),
            ..args()
        }
        .resolve()
        .await
        .unwrap();

        assert_eq!(settings.node_count, 10);
        assert_eq!(settings.test_type, TestType::Benchmark);
        assert_eq!(settings.test_inputs, raw);
    }

    #[tokio::test]
    async fn ttl_overflow_is_a_validation_error() {
        let err = BenchmarkArgs {
            ttl_hours: u64::MAX,
            ..args()
        }
        .resolve()
        .await
        .unwrap_err();

        match err {
            Error::Bench(keeper_bench_common::Error::Validation { field, .. }) => {
                assert_eq!(field.as_deref(), Some("ttl_hours"));
            }
            other => panic!("Expected ttl_hours validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_node_count_is_reported() {
        let err = BenchmarkArgs {
            test_inputs: "AUTOMATION_NUMBER_OF_NODES=lots".into(),
            ..args()
        }
        .resolve()
        .await
        .unwrap_err();

        assert!(err.to_string().contains("lots"));
    }

    #[tokio::test]
    async fn external_network_needs_endpoints() {
        let err = BenchmarkArgs {
            selected_networks: "GOERLI".into(),
            ..args()
        }
        .resolve()
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Bench(keeper_bench_common::Error::Validation { .. })
        ));

        let settings = BenchmarkArgs {
            selected_networks: "GOERLI".into(),
            evm_urls: "wss://goerli/ws".into(),
            evm_http_urls: "https://goerli/rpc".into(),
            evm_keys: "abc".into(),
            ..args()
        }
        .resolve()
        .await
        .unwrap();
        assert!(!settings.network.simulated);
        assert_eq!(settings.selected_networks, "GOERLI");
    }

    #[tokio::test]
    async fn overrides_file_accepts_yaml_and_json() {
        let mut yaml = tempfile::NamedTempFile::new().unwrap();
        writeln!(yaml, "- CHAINLINK_DEV: \"true\"\n- {{}}\n- LOG_LEVEL: debug").unwrap();
        let overrides = load_node_overrides(yaml.path()).await.unwrap();
        assert_eq!(overrides.len(), 3);
        assert_eq!(overrides[0]["CHAINLINK_DEV"], "true");
        assert!(overrides[1].is_empty());

        let mut json = tempfile::NamedTempFile::new().unwrap();
        write!(json, r#"[{{"LOG_LEVEL": "warn"}}]"#).unwrap();
        let overrides = load_node_overrides(json.path()).await.unwrap();
        assert_eq!(overrides[0]["LOG_LEVEL"], "warn");
    }

    #[tokio::test]
    async fn overrides_file_must_be_a_list_of_maps() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CHAINLINK_DEV: true").unwrap();

        let err = load_node_overrides(file.path()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidOverrides { .. }));
    }

    #[tokio::test]
    async fn empty_overrides_file_means_none() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_node_overrides(file.path()).await.unwrap().is_empty());
    }
}
