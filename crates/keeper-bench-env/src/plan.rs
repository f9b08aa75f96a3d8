//! Benchmark run assembly and launch
//!
//! [`assemble`] turns resolved settings into a fully described environment
//! without touching a cluster. [`launch`] provisions it and starts the remote
//! test. The steps are linear; any failure ends the run.

use std::path::Path;
use std::time::Duration;

use tracing::{error, info};

use keeper_bench_common::{
    Error, Result, Values, DEFAULT_CHAINLINK_CHART_VERSION, DEFAULT_NODE_COUNT, DEFAULT_REGISTRY,
    DEFAULT_TTL_HOURS,
};

use crate::charts::blockscout::{blockscout_manifests, BlockscoutProps, BLOCKSCOUT_NAME};
use crate::charts::chainlink::chainlink_chart;
use crate::charts::ethereum::{ethereum_chart, EthereumProps};
use crate::charts::remote_runner::{focus_tag, remote_runner_chart, RemoteRunnerPayload};
use crate::environment::{namespace_prefix, Environment, EnvironmentConfig};
use crate::network::EvmNetwork;
use crate::provision::Provisioner;
use crate::resources::TestType;
use crate::topology::{Topology, TopologyConfig};
use crate::trigger::RemoteTrigger;

/// Everything a run needs, already resolved from flags and `TEST_INPUTS`
#[derive(Debug, Clone)]
pub struct BenchmarkSettings {
    /// Registry version under test
    pub registry: String,
    /// Requested Chainlink node count
    pub node_count: usize,
    /// Test type, selects the resource preset
    pub test_type: TestType,
    /// Chain the nodes connect to
    pub network: EvmNetwork,
    /// Dashboard linked from test reports
    pub grafana_dashboard_url: String,
    /// Raw `TEST_INPUTS`, forwarded to the runner
    pub test_inputs: String,
    /// Raw `SELECTED_NETWORKS`, forwarded to the runner
    pub selected_networks: String,
    /// Per-node env overrides
    pub node_overrides: Vec<Values>,
    /// Chainlink chart version
    pub chainlink_chart_version: String,
    /// Namespace time-to-live
    pub ttl: Duration,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            node_count: DEFAULT_NODE_COUNT,
            test_type: TestType::default(),
            network: EvmNetwork::simulated(),
            grafana_dashboard_url: String::new(),
            test_inputs: String::new(),
            selected_networks: String::new(),
            node_overrides: Vec::new(),
            chainlink_chart_version: DEFAULT_CHAINLINK_CHART_VERSION.to_string(),
            ttl: Duration::from_secs(DEFAULT_TTL_HOURS * 3600),
        }
    }
}

/// An assembled run, ready to launch
#[derive(Debug, Clone)]
pub struct BenchmarkPlan {
    /// Chainlink node set
    pub topology: Topology,
    /// Test filter handed to the runner
    pub focus: String,
    /// Namespace and components to install
    pub environment: Environment,
}

/// Build the topology and the ordered component list for a run
pub fn assemble(settings: &BenchmarkSettings) -> Result<BenchmarkPlan> {
    let network = &settings.network;
    let topology = Topology::build(&TopologyConfig {
        registry: &settings.registry,
        node_count: settings.node_count,
        network,
        test_type: &settings.test_type,
        node_overrides: &settings.node_overrides,
    })?;

    let network_component = network.namespace_component();
    let prefix = namespace_prefix(&settings.test_type, &network_component, &settings.registry);
    let mut environment =
        Environment::new(EnvironmentConfig::new(prefix).with_ttl(settings.ttl))?;

    for node in &topology.nodes {
        environment.add_helm(chainlink_chart(node, &settings.chainlink_chart_version));
    }

    if network.simulated {
        environment.add_manifests(blockscout_manifests(&BlockscoutProps {
            name: BLOCKSCOUT_NAME.to_string(),
            ws_url: network.primary_url()?.to_string(),
            http_url: network.primary_http_url()?.to_string(),
        })?);
    }

    let focus = focus_tag(&network_component, &settings.registry);
    let payload = RemoteRunnerPayload {
        focus: focus.clone(),
        env_namespace: environment.namespace().to_string(),
        grafana_dashboard_url: settings.grafana_dashboard_url.clone(),
        test_inputs: settings.test_inputs.clone(),
        selected_networks: settings.selected_networks.clone(),
    };
    environment.add_helm(remote_runner_chart(payload.to_values(network)));

    environment.add_helm(ethereum_chart(EthereumProps::for_network(
        network,
        &topology.block_time,
    )));

    info!(
        namespace = environment.namespace(),
        nodes = topology.node_count(),
        network = %network.name,
        registry = %settings.registry,
        test_type = %settings.test_type,
        "assembled benchmark environment"
    );

    Ok(BenchmarkPlan {
        topology,
        focus,
        environment,
    })
}

/// Provision the environment, then start the remote test
pub async fn launch<P, T>(
    environment: &Environment,
    provisioner: &P,
    trigger: &T,
    source_dir: &Path,
) -> Result<()>
where
    P: Provisioner + ?Sized,
    T: RemoteTrigger + ?Sized,
{
    let namespace = environment.namespace();

    if let Err(e) = provisioner.provision(environment).await {
        error!(namespace, error = %e, "provisioning failed");
        return Err(Error::Provision(e.to_string()));
    }

    if let Err(e) = trigger.trigger(source_dir, environment).await {
        error!(namespace, error = %e, "remote trigger failed");
        return Err(Error::Trigger(e.to_string()));
    }

    info!(namespace, "benchmark launched");
    Ok(())
}
