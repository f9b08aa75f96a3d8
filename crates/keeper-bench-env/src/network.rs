//! EVM network selection
//!
//! The benchmark runs either against the in-cluster simulated geth network or
//! against an external testnet whose endpoints and keys are supplied by the
//! caller (`EVM_URLS`, `EVM_HTTP_URLS`, `EVM_KEYS`).

use std::fmt;
use std::time::Duration;

use serde_json::{json, Value};

use keeper_bench_common::{values_from, Error, Result, Values};

/// Network used when `SELECTED_NETWORKS` is empty
pub const DEFAULT_NETWORK_KEY: &str = "SIMULATED";

/// Namespace/focus component used for every simulated network
pub const SIMULATED_NETWORK_COMPONENT: &str = "simulated";

/// Static description of a network the driver knows how to target
struct KnownNetwork {
    key: &'static str,
    name: &'static str,
    chain_id: i64,
    simulated: bool,
    chainlink_transaction_limit: u64,
    transaction_timeout: Duration,
    minimum_confirmations: u32,
    gas_estimation_buffer: u64,
}

const KNOWN_NETWORKS: &[KnownNetwork] = &[
    KnownNetwork {
        key: "SIMULATED",
        name: "Simulated Geth",
        chain_id: 1337,
        simulated: true,
        chainlink_transaction_limit: 500_000,
        transaction_timeout: Duration::from_secs(120),
        minimum_confirmations: 1,
        gas_estimation_buffer: 10_000,
    },
    KnownNetwork {
        key: "GOERLI",
        name: "Goerli Testnet",
        chain_id: 5,
        simulated: false,
        chainlink_transaction_limit: 5_000,
        transaction_timeout: Duration::from_secs(300),
        minimum_confirmations: 1,
        gas_estimation_buffer: 1_000,
    },
    KnownNetwork {
        key: "SEPOLIA",
        name: "Sepolia Testnet",
        chain_id: 11_155_111,
        simulated: false,
        chainlink_transaction_limit: 5_000,
        transaction_timeout: Duration::from_secs(300),
        minimum_confirmations: 1,
        gas_estimation_buffer: 1_000,
    },
    KnownNetwork {
        key: "ARBITRUM_GOERLI",
        name: "Arbitrum Goerli",
        chain_id: 421_613,
        simulated: false,
        chainlink_transaction_limit: 5_000,
        transaction_timeout: Duration::from_secs(600),
        minimum_confirmations: 0,
        gas_estimation_buffer: 0,
    },
    KnownNetwork {
        key: "OPTIMISM_GOERLI",
        name: "Optimism Goerli",
        chain_id: 420,
        simulated: false,
        chainlink_transaction_limit: 5_000,
        transaction_timeout: Duration::from_secs(300),
        minimum_confirmations: 1,
        gas_estimation_buffer: 0,
    },
    KnownNetwork {
        key: "POLYGON_MUMBAI",
        name: "Polygon Mumbai",
        chain_id: 80_001,
        simulated: false,
        chainlink_transaction_limit: 5_000,
        transaction_timeout: Duration::from_secs(300),
        minimum_confirmations: 1,
        gas_estimation_buffer: 1_000,
    },
    KnownNetwork {
        key: "AVALANCHE_FUJI",
        name: "Avalanche Fuji",
        chain_id: 43_113,
        simulated: false,
        chainlink_transaction_limit: 5_000,
        transaction_timeout: Duration::from_secs(300),
        minimum_confirmations: 1,
        gas_estimation_buffer: 1_000,
    },
];

const SIMULATED_WS_URL: &str = "ws://geth:8546";
const SIMULATED_HTTP_URL: &str = "http://geth:8544";
/// Funded dev account baked into the simulated geth genesis
const SIMULATED_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Endpoints and keys supplied from outside for non-simulated networks
#[derive(Clone, Default)]
pub struct NetworkEndpoints {
    /// Websocket RPC URLs
    pub urls: Vec<String>,
    /// HTTP RPC URLs
    pub http_urls: Vec<String>,
    /// Funding keys
    pub private_keys: Vec<String>,
}

impl NetworkEndpoints {
    /// Build from comma-separated lists, ignoring blank entries
    pub fn from_lists(urls: &str, http_urls: &str, private_keys: &str) -> Self {
        Self {
            urls: split_list(urls),
            http_urls: split_list(http_urls),
            private_keys: split_list(private_keys),
        }
    }
}

impl fmt::Debug for NetworkEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkEndpoints")
            .field("urls", &self.urls)
            .field("http_urls", &self.http_urls)
            .field("private_keys", &format_args!("<{} redacted>", self.private_keys.len()))
            .finish()
    }
}

/// A fully resolved EVM network
#[derive(Clone, PartialEq)]
pub struct EvmNetwork {
    /// Human readable name ("Simulated Geth", "Goerli Testnet")
    pub name: String,
    /// Whether the network runs inside the test namespace
    pub simulated: bool,
    /// EIP-155 chain id
    pub chain_id: i64,
    /// Websocket RPC URLs
    pub urls: Vec<String>,
    /// HTTP RPC URLs
    pub http_urls: Vec<String>,
    /// Funding keys
    pub private_keys: Vec<String>,
    /// Gas limit Chainlink nodes use for transactions
    pub chainlink_transaction_limit: u64,
    /// How long to wait for a transaction to confirm
    pub transaction_timeout: Duration,
    /// Confirmations before a transaction counts as final
    pub minimum_confirmations: u32,
    /// Extra gas added on top of estimates
    pub gas_estimation_buffer: u64,
}

impl EvmNetwork {
    /// The in-cluster simulated geth network
    pub fn simulated() -> Self {
        let mut network = Self::from_known(&KNOWN_NETWORKS[0]);
        network.urls = vec![SIMULATED_WS_URL.to_string()];
        network.http_urls = vec![SIMULATED_HTTP_URL.to_string()];
        network.private_keys = vec![SIMULATED_PRIVATE_KEY.to_string()];
        network
    }

    fn from_known(known: &KnownNetwork) -> Self {
        Self {
            name: known.name.to_string(),
            simulated: known.simulated,
            chain_id: known.chain_id,
            urls: Vec::new(),
            http_urls: Vec::new(),
            private_keys: Vec::new(),
            chainlink_transaction_limit: known.chainlink_transaction_limit,
            transaction_timeout: known.transaction_timeout,
            minimum_confirmations: known.minimum_confirmations,
            gas_estimation_buffer: known.gas_estimation_buffer,
        }
    }

    /// First websocket URL, required by every Chainlink node
    pub fn primary_url(&self) -> Result<&str> {
        self.urls.first().map(String::as_str).ok_or_else(|| {
            Error::validation_for_field(
                "urls",
                format!("network '{}' has no websocket URL", self.name),
            )
        })
    }

    /// First HTTP URL, required by every Chainlink node
    pub fn primary_http_url(&self) -> Result<&str> {
        self.http_urls.first().map(String::as_str).ok_or_else(|| {
            Error::validation_for_field(
                "http_urls",
                format!("network '{}' has no HTTP URL", self.name),
            )
        })
    }

    /// Network part of namespaces and focus tags
    ///
    /// Simulated networks always use `simulated`; external networks use their
    /// normalized name.
    pub fn namespace_component(&self) -> String {
        if self.simulated {
            SIMULATED_NETWORK_COMPONENT.to_string()
        } else {
            normalize_network_name(&self.name)
        }
    }

    /// Connection settings handed to the remote runner
    pub fn to_map(&self) -> Values {
        values_from(json!({
            "evm_name": self.name,
            "evm_chain_id": self.chain_id.to_string(),
            "evm_urls": self.urls.join(","),
            "evm_http_urls": self.http_urls.join(","),
            "evm_keys": self.private_keys.join(","),
            "evm_simulated": Value::Bool(self.simulated),
            "evm_chainlink_transaction_limit": self.chainlink_transaction_limit.to_string(),
            "evm_transaction_timeout": go_duration(self.transaction_timeout),
            "evm_minimum_confirmations": self.minimum_confirmations.to_string(),
            "evm_gas_estimation_buffer": self.gas_estimation_buffer.to_string(),
        }))
    }
}

impl fmt::Debug for EvmNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmNetwork")
            .field("name", &self.name)
            .field("simulated", &self.simulated)
            .field("chain_id", &self.chain_id)
            .field("urls", &self.urls)
            .field("http_urls", &self.http_urls)
            .field("private_keys", &format_args!("<{} redacted>", self.private_keys.len()))
            .finish_non_exhaustive()
    }
}

/// Resolve the network named first in a `SELECTED_NETWORKS` list.
///
/// An empty list selects the simulated network. Caller endpoints replace the
/// simulated defaults when given and are mandatory for external networks.
pub fn select_network(selected: &str, endpoints: &NetworkEndpoints) -> Result<EvmNetwork> {
    let key = selected
        .split(',')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_NETWORK_KEY)
        .to_uppercase();

    let known = KNOWN_NETWORKS
        .iter()
        .find(|n| n.key == key)
        .ok_or_else(|| Error::UnknownNetwork(key.clone()))?;

    let mut network = if known.simulated {
        EvmNetwork::simulated()
    } else {
        EvmNetwork::from_known(known)
    };

    if !endpoints.urls.is_empty() {
        network.urls = endpoints.urls.clone();
    }
    if !endpoints.http_urls.is_empty() {
        network.http_urls = endpoints.http_urls.clone();
    }
    if !endpoints.private_keys.is_empty() {
        network.private_keys = endpoints.private_keys.clone();
    }

    // Fail here rather than deep inside topology building
    network.primary_url()?;
    network.primary_http_url()?;

    Ok(network)
}

/// Keys of every network `select_network` accepts
pub fn known_network_keys() -> impl Iterator<Item = &'static str> {
    KNOWN_NETWORKS.iter().map(|n| n.key)
}

/// Lower-case a network name and replace spaces with hyphens
pub fn normalize_network_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Format a duration the way the remote runner's duration parser expects
/// (`2m0s`, `1h0m0s`, `45s`).
pub fn go_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
