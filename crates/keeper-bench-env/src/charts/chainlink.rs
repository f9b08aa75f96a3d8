//! Chainlink node releases

use super::HelmChart;
use crate::topology::NodeSpec;

/// Chart name in the benchmark repository
pub const CHAINLINK_CHART: &str = "chainlink";

/// Release name for the node at `index`
pub fn release_name(index: usize) -> String {
    format!("chainlink-{}", index)
}

/// One pinned Chainlink release per node
pub fn chainlink_chart(node: &NodeSpec, version: &str) -> HelmChart {
    HelmChart::new(release_name(node.index), CHAINLINK_CHART, node.chart_values.clone())
        .with_version(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_bench_common::{values_from, Values};
    use serde_json::json;

    #[test]
    fn release_is_indexed_and_pinned() {
        let node = NodeSpec {
            index: 3,
            env: Values::new(),
            chart_values: values_from(json!({"env": {"ETH_CHAIN_ID": "1337"}})),
        };

        let chart = chainlink_chart(&node, "0.0.11");
        assert_eq!(chart.release, "chainlink-3");
        assert_eq!(chart.chart, "chainlink-qa/chainlink");
        assert_eq!(chart.version.as_deref(), Some("0.0.11"));
        assert_eq!(chart.values["env"]["ETH_CHAIN_ID"], "1337");
    }
}
