//! Common types for keeper-bench: value maps, errors, and shared constants

#![deny(missing_docs)]

pub mod error;
pub mod values;

pub use error::Error;
pub use values::{merge_values, merged, values_from, MergePolicy, Values};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================

/// Registry version that needs an extra node and 12 second blocks
pub const REGISTRY_2_0: &str = "registry-2-0";

/// Registry tested when `AUTOMATION_REGISTRY_TO_TEST` is not set
pub const DEFAULT_REGISTRY: &str = REGISTRY_2_0;

/// Chainlink node count when `AUTOMATION_NUMBER_OF_NODES` is not set
pub const DEFAULT_NODE_COUNT: usize = 6;

/// Chainlink helm chart version deployed for every node
pub const DEFAULT_CHAINLINK_CHART_VERSION: &str = "0.0.11";

/// Environment time-to-live (30 days)
pub const DEFAULT_TTL_HOURS: u64 = 720;

/// Prefix of every namespace created by the driver
pub const NAMESPACE_PREFIX: &str = "automation";

/// Test directory the remote runner compiles and runs
pub const REMOTE_TEST_DIR: &str = "./integration-tests/benchmark/tests";

/// Log level handed to the remote runner
pub const REMOTE_TEST_LOG_LEVEL: &str = "debug";

/// Focus tag appended to every benchmark filter
pub const BENCHMARK_FOCUS_TAG: &str = "@benchmark-keeper";

/// Repository root relative to the benchmark directory
pub const DEFAULT_SOURCE_DIR: &str = "../../";
