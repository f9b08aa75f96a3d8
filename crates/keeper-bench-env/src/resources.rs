//! Test types and the resource presets they select
//!
//! Every Chainlink node in a run gets the same profile: `soak` runs are sized
//! for long, low-throughput tests; everything else uses the `performance`
//! preset.

use std::fmt;
use std::str::FromStr;

use serde_json::json;

use keeper_bench_common::{values_from, Values};

/// Kind of run, taken from `TEST_TYPE`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TestType {
    /// Short, high-load run (default)
    #[default]
    Benchmark,
    /// Long-running run with smaller nodes
    Soak,
    /// Any other label; uses the performance preset
    Other(String),
}

impl TestType {
    /// Lower-case label used in namespaces
    pub fn as_str(&self) -> &str {
        match self {
            TestType::Benchmark => "benchmark",
            TestType::Soak => "soak",
            TestType::Other(label) => label,
        }
    }
}

impl FromStr for TestType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        Ok(match label.as_str() {
            "" | "benchmark" => TestType::Benchmark,
            "soak" => TestType::Soak,
            _ => TestType::Other(label),
        })
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU and memory quantity pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// CPU quantity (e.g. "1000m")
    pub cpu: String,
    /// Memory quantity (e.g. "4Gi")
    pub memory: String,
}

impl ResourceSpec {
    /// Create a quantity pair
    pub fn new(cpu: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpu: cpu.into(),
            memory: memory.into(),
        }
    }
}

/// Requests and limits for one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequirements {
    /// Scheduler requests
    pub requests: ResourceSpec,
    /// Hard limits
    pub limits: ResourceSpec,
}

impl ResourceRequirements {
    /// Requests equal to limits
    pub fn guaranteed(cpu: &str, memory: &str) -> Self {
        Self {
            requests: ResourceSpec::new(cpu, memory),
            limits: ResourceSpec::new(cpu, memory),
        }
    }

    /// Chart `resources` block
    pub fn to_values(&self) -> Values {
        values_from(json!({
            "requests": {"cpu": self.requests.cpu, "memory": self.requests.memory},
            "limits": {"cpu": self.limits.cpu, "memory": self.limits.memory},
        }))
    }
}

/// Resource preset applied to every Chainlink node and its database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceProfile {
    /// Preset name, for logs
    pub name: &'static str,
    /// Chainlink node container
    pub chainlink: ResourceRequirements,
    /// Postgres container
    pub db: ResourceRequirements,
    /// Whether the database keeps a persistent volume
    pub db_stateful: bool,
    /// Persistent volume size
    pub db_capacity: String,
}

impl ResourceProfile {
    /// Sizing for benchmark runs
    pub fn performance() -> Self {
        Self {
            name: "performance",
            chainlink: ResourceRequirements::guaranteed("1000m", "4Gi"),
            db: ResourceRequirements::guaranteed("1000m", "1Gi"),
            db_stateful: true,
            db_capacity: "20Gi".to_string(),
        }
    }

    /// Sizing for soak runs
    pub fn soak() -> Self {
        Self {
            name: "soak",
            chainlink: ResourceRequirements::guaranteed("350m", "1Gi"),
            db: ResourceRequirements::guaranteed("250m", "256Mi"),
            db_stateful: true,
            db_capacity: "20Gi".to_string(),
        }
    }

    /// Pick the preset for a test type
    pub fn for_test_type(test_type: &TestType) -> Self {
        match test_type {
            TestType::Soak => Self::soak(),
            TestType::Benchmark | TestType::Other(_) => Self::performance(),
        }
    }

    /// Chart values for the `chainlink` and `db` sections
    pub fn to_values(&self) -> Values {
        values_from(json!({
            "chainlink": {
                "resources": self.chainlink.to_values(),
            },
            "db": {
                "resources": self.db.to_values(),
                "stateful": self.db_stateful,
                "capacity": self.db_capacity,
            },
        }))
    }
}

/// Resources for the simulated geth node
pub fn geth_resources() -> ResourceRequirements {
    ResourceRequirements::guaranteed("4000m", "4Gi")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_test_types_case_insensitively() {
        assert_eq!("soak".parse::<TestType>().unwrap(), TestType::Soak);
        assert_eq!("SOAK".parse::<TestType>().unwrap(), TestType::Soak);
        assert_eq!(" Soak ".parse::<TestType>().unwrap(), TestType::Soak);
        assert_eq!("".parse::<TestType>().unwrap(), TestType::Benchmark);
        assert_eq!("Benchmark".parse::<TestType>().unwrap(), TestType::Benchmark);
        assert_eq!(
            "Load".parse::<TestType>().unwrap(),
            TestType::Other("load".to_string())
        );
    }

    #[test]
    fn test_type_renders_lower_case() {
        assert_eq!(TestType::Soak.to_string(), "soak");
        assert_eq!("LOAD".parse::<TestType>().unwrap().to_string(), "load");
    }

    #[test]
    fn soak_selects_soak_preset() {
        let profile = ResourceProfile::for_test_type(&TestType::Soak);
        assert_eq!(profile, ResourceProfile::soak());

        let values = profile.to_values();
        assert_eq!(values["chainlink"]["resources"]["requests"]["cpu"], "350m");
        assert_eq!(values["db"]["resources"]["limits"]["memory"], "256Mi");
    }

    #[test]
    fn everything_else_selects_performance() {
        for test_type in [TestType::Benchmark, TestType::Other("load".into())] {
            let values = ResourceProfile::for_test_type(&test_type).to_values();
            assert_eq!(values["chainlink"]["resources"]["limits"]["cpu"], "1000m");
            assert_eq!(values["chainlink"]["resources"]["limits"]["memory"], "4Gi");
            assert_eq!(values["db"]["resources"]["requests"]["memory"], "1Gi");
        }
    }

    #[test]
    fn both_presets_keep_a_persistent_database() {
        for profile in [ResourceProfile::performance(), ResourceProfile::soak()] {
            let values = profile.to_values();
            assert_eq!(values["db"]["stateful"], true);
            assert_eq!(values["db"]["capacity"], "20Gi");
        }
    }

    #[test]
    fn geth_gets_four_cores() {
        let values = geth_resources().to_values();
        assert_eq!(values["requests"]["cpu"], "4000m");
        assert_eq!(values["limits"]["memory"], "4Gi");
    }
}
