//! Remote test runner release

use serde_json::{json, Value};

use keeper_bench_common::{
    values_from, Values, BENCHMARK_FOCUS_TAG, REMOTE_TEST_DIR, REMOTE_TEST_LOG_LEVEL,
};

use super::HelmChart;
use crate::network::EvmNetwork;

/// Chart name in the benchmark repository
pub const REMOTE_RUNNER_CHART: &str = "remote-test-runner";

/// Release name, also the container the test binary is copied into
pub const REMOTE_RUNNER_RELEASE: &str = "remote-test-runner";

/// Values key the chart reads the payload from
pub const REMOTE_RUNNER_VALUES_KEY: &str = "remote_test_runner";

/// Test filter for a network/registry pair
pub fn focus_tag(network_component: &str, registry: &str) -> String {
    format!("@{}-{} {}", network_component, registry, BENCHMARK_FOCUS_TAG)
}

/// What the runner needs to execute the benchmark
#[derive(Debug, Clone, Default)]
pub struct RemoteRunnerPayload {
    /// Test filter
    pub focus: String,
    /// Namespace the nodes live in
    pub env_namespace: String,
    /// Dashboard linked from test reports
    pub grafana_dashboard_url: String,
    /// Raw `TEST_INPUTS`, passed through untouched
    pub test_inputs: String,
    /// Raw `SELECTED_NETWORKS`, passed through untouched
    pub selected_networks: String,
}

impl RemoteRunnerPayload {
    /// Runner values, including the network connection settings
    pub fn to_values(&self, network: &EvmNetwork) -> Values {
        let mut values = values_from(json!({
            "focus": self.focus,
            "env_namespace": self.env_namespace,
            "test_dir": REMOTE_TEST_DIR,
            "test_log_level": REMOTE_TEST_LOG_LEVEL,
            "grafana_dashboard_url": self.grafana_dashboard_url,
            "TEST_INPUTS": self.test_inputs,
            "SELECTED_NETWORKS": self.selected_networks,
        }));
        values.extend(network.to_map());
        values
    }
}

/// Build the runner release around a payload
pub fn remote_runner_chart(payload: Values) -> HelmChart {
    let mut values = Values::new();
    values.insert(REMOTE_RUNNER_VALUES_KEY.to_string(), Value::Object(payload));
    HelmChart::new(REMOTE_RUNNER_RELEASE, REMOTE_RUNNER_CHART, values)
}
