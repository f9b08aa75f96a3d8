//! Chainlink node topology
//!
//! Decides how many nodes a run gets and what each node's chart values are.
//! All nodes share one environment; per-node overrides are layered on top when
//! the caller supplies them.

use serde_json::{json, Value};
use tracing::debug;

use keeper_bench_common::{
    merge_values, merged, values_from, Error, MergePolicy, Result, Values, REGISTRY_2_0,
};

use crate::network::EvmNetwork;
use crate::resources::{ResourceProfile, TestType};

/// Env key toggling turn-taking between keeper nodes
pub const KEEPER_TURN_FLAG_ENABLED: &str = "KEEPER_TURN_FLAG_ENABLED";

/// Env key for confirmations before a log is processed
pub const MIN_INCOMING_CONFIRMATIONS: &str = "MIN_INCOMING_CONFIRMATIONS";

/// Keys cleared on external networks so nodes fall back to their own defaults
pub const NODE_DEFAULT_KEYS: [&str; 5] = [
    "KEEPER_REGISTRY_SYNC_INTERVAL",
    MIN_INCOMING_CONFIRMATIONS,
    "ETH_MAX_IN_FLIGHT_TRANSACTIONS",
    "ETH_MAX_QUEUED_TRANSACTIONS",
    "ETH_GAS_BUMP_TX_DEPTH",
];

/// Simulated block time for registry 2.0 runs
pub const REGISTRY_2_0_BLOCK_TIME: &str = "12";

/// Simulated block time for everything else
pub const DEFAULT_BLOCK_TIME: &str = "1";

/// Inputs to topology building
#[derive(Debug, Clone, Copy)]
pub struct TopologyConfig<'a> {
    /// Registry version under test (e.g. "registry-2-0")
    pub registry: &'a str,
    /// Requested node count before registry adjustment
    pub node_count: usize,
    /// Network the nodes connect to
    pub network: &'a EvmNetwork,
    /// Selects the resource preset
    pub test_type: &'a TestType,
    /// Per-node env overrides, by node index
    pub node_overrides: &'a [Values],
}

/// One Chainlink deployment
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    /// Position in the node list, used in the release name
    pub index: usize,
    /// Environment variables for the node
    pub env: Values,
    /// Complete chart values (`env` plus resources)
    pub chart_values: Values,
}

/// The node set for one run
#[derive(Debug, Clone)]
pub struct Topology {
    /// Nodes in deployment order
    pub nodes: Vec<NodeSpec>,
    /// Env shared by every node before overrides
    pub common_env: Values,
    /// Block time for the simulated chain, in seconds
    pub block_time: String,
    /// Resource preset applied to every node
    pub profile: ResourceProfile,
}

impl Topology {
    /// Build the node set for a run.
    pub fn build(config: &TopologyConfig<'_>) -> Result<Self> {
        if config.node_count == 0 {
            return Err(Error::validation_for_field(
                "node_count",
                "at least one Chainlink node is required",
            ));
        }

        let count = effective_node_count(config.registry, config.node_count)?;
        if config.node_overrides.len() > count {
            return Err(Error::validation_for_field(
                "node_overrides",
                format!(
                    "{} node overrides given but only {} nodes will be deployed",
                    config.node_overrides.len(),
                    count
                ),
            ));
        }

        let block_time = block_time(config.registry);
        let common_env = merged(
            &static_values(config.network)?,
            &benchmark_values(config.registry, config.network.simulated),
            MergePolicy::PreserveExisting,
        );
        let profile = ResourceProfile::for_test_type(config.test_type);
        let profile_values = profile.to_values();

        let nodes = (0..count)
            .map(|index| {
                let mut env = common_env.clone();
                if let Some(overrides) = config.node_overrides.get(index) {
                    merge_values(&mut env, overrides, MergePolicy::Override);
                }
                let mut chart_values = values_from(json!({ "env": env }));
                merge_values(&mut chart_values, &profile_values, MergePolicy::PreserveExisting);
                NodeSpec {
                    index,
                    env,
                    chart_values,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            nodes = nodes.len(),
            profile = profile.name,
            block_time,
            "built chainlink topology"
        );

        Ok(Self {
            nodes,
            common_env,
            block_time: block_time.to_string(),
            profile,
        })
    }

    /// Number of Chainlink nodes that will be deployed
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Registry 2.0 needs one node more than requested
pub fn effective_node_count(registry: &str, requested: usize) -> Result<usize> {
    if registry != REGISTRY_2_0 {
        return Ok(requested);
    }
    requested.checked_add(1).ok_or_else(|| {
        Error::validation_for_field(
            "node_count",
            format!("{} nodes plus the registry 2.0 node is too many", requested),
        )
    })
}

/// Simulated block time for a registry version
pub fn block_time(registry: &str) -> &'static str {
    if registry == REGISTRY_2_0 {
        REGISTRY_2_0_BLOCK_TIME
    } else {
        DEFAULT_BLOCK_TIME
    }
}

/// Values every node needs to reach the chain
pub fn static_values(network: &EvmNetwork) -> Result<Values> {
    Ok(values_from(json!({
        "ETH_URL": network.primary_url()?,
        "ETH_HTTP_URL": network.primary_http_url()?,
        "ETH_CHAIN_ID": network.chain_id.to_string(),
    })))
}

/// Keeper benchmark node settings for a registry and network kind
pub fn benchmark_values(registry: &str, simulated: bool) -> Values {
    let mut values = values_from(json!({
        MIN_INCOMING_CONFIRMATIONS: "1",
        KEEPER_TURN_FLAG_ENABLED: "true",
        "CHAINLINK_DEV": "false",
        "P2P_NETWORKING_STACK": "V2",
        "P2PV2_LISTEN_ADDRESSES": "0.0.0.0:6690",
        "P2PV2_ANNOUNCE_ADDRESSES": "0.0.0.0:6690",
        "FEATURE_OFFCHAIN_REPORTING2": "true",
        "FEATURE_OFFCHAIN_REPORTING": "",
        "FEATURE_LOG_POLLER": "true",
        "P2P_LISTEN_IP": "",
        "P2P_LISTEN_PORT": "",
    }));

    if registry == REGISTRY_2_0 {
        values.insert(
            KEEPER_TURN_FLAG_ENABLED.to_string(),
            Value::String("false".to_string()),
        );
    }

    if !simulated {
        for key in NODE_DEFAULT_KEYS {
            values.insert(key.to_string(), Value::String(String::new()));
        }
    }

    values
}
