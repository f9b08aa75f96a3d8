//! Ethereum network release
//!
//! Always installed. For simulated networks the chart runs geth in the
//! namespace; for external networks it only publishes the endpoints.

use serde_json::json;

use keeper_bench_common::{merge_values, values_from, MergePolicy, Values};

use super::HelmChart;
use crate::network::EvmNetwork;
use crate::resources::geth_resources;

/// Chart name in the benchmark repository
pub const ETHEREUM_CHART: &str = "ethereum";

/// Release name; Chainlink nodes reach the simulated chain at `geth`
pub const ETHEREUM_RELEASE: &str = "geth";

/// Parameters of the Ethereum release
#[derive(Debug, Clone)]
pub struct EthereumProps {
    /// Network display name
    pub network_name: String,
    /// Whether geth runs in the namespace
    pub simulated: bool,
    /// Websocket endpoints
    pub ws_urls: Vec<String>,
    /// Extra chart values (resources, geth settings)
    pub values: Values,
}

impl EthereumProps {
    /// Props for a network with the standard geth sizing and the given block time
    pub fn for_network(network: &EvmNetwork, block_time: &str) -> Self {
        Self {
            network_name: network.name.clone(),
            simulated: network.simulated,
            ws_urls: network.urls.clone(),
            values: values_from(json!({
                "resources": geth_resources().to_values(),
                "geth": {
                    "blocktime": block_time,
                },
            })),
        }
    }
}

/// Build the Ethereum release
pub fn ethereum_chart(props: EthereumProps) -> HelmChart {
    let mut values = props.values;
    merge_values(
        &mut values,
        &values_from(json!({
            "network": {
                "name": props.network_name,
                "simulated": props.simulated,
                "wsURLs": props.ws_urls,
            },
        })),
        MergePolicy::Override,
    );
    HelmChart::new(ETHEREUM_RELEASE, ETHEREUM_CHART, values)
}
