//! `TEST_INPUTS` parsing
//!
//! The list is a comma separated sequence of `key=value` entries. It reaches
//! the remote runner verbatim; the driver only reads the handful of keys that
//! shape the environment.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

use keeper_bench_common::{Error, Result};

/// Registry version under test
pub const REGISTRY_KEY: &str = "AUTOMATION_REGISTRY_TO_TEST";

/// Requested Chainlink node count
pub const NODE_COUNT_KEY: &str = "AUTOMATION_NUMBER_OF_NODES";

/// Test type (`benchmark`, `soak`, ...)
pub const TEST_TYPE_KEY: &str = "TEST_TYPE";

/// Dashboard linked from reports
pub const GRAFANA_DASHBOARD_URL_KEY: &str = "GRAFANA_DASHBOARD_URL";

/// Parsed `TEST_INPUTS`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestInputs {
    raw: String,
    entries: BTreeMap<String, String>,
}

impl TestInputs {
    /// Parse a raw list.
    ///
    /// Empty segments are skipped. Entries without `=` or with an empty key
    /// are collected and reported together. A repeated key keeps its first
    /// value.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        let mut malformed = Vec::new();

        for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((key, value)) = segment.split_once('=') else {
                malformed.push(segment.to_string());
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                malformed.push(segment.to_string());
                continue;
            }
            if entries.contains_key(key) {
                warn!(key, "duplicate TEST_INPUTS key, keeping the first value");
                continue;
            }
            entries.insert(key.to_string(), value.trim().to_string());
        }

        if !malformed.is_empty() {
            return Err(Error::invalid_input(
                format!(
                    "TEST_INPUTS entries must be key=value, got: {}",
                    malformed.join(", ")
                ),
                malformed,
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            entries,
        })
    }

    /// The list exactly as given
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Value for `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default` when absent
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse the value for `key`, or return `default` when absent
    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e| {
                Error::validation_for_field(
                    key,
                    format!("'{}' is not a valid value for {}: {}", value, key, e),
                )
            }),
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys were given
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        let inputs =
            TestInputs::parse("AUTOMATION_REGISTRY_TO_TEST=registry-1-3,TEST_TYPE=soak").unwrap();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.get(REGISTRY_KEY), Some("registry-1-3"));
        assert_eq!(inputs.get(TEST_TYPE_KEY), Some("soak"));
        assert_eq!(inputs.get(GRAFANA_DASHBOARD_URL_KEY), None);
    }

    #[test]
    fn empty_input_has_no_keys() {
        let inputs = TestInputs::parse("").unwrap();
        assert!(inputs.is_empty());
        assert_eq!(inputs.get_or(REGISTRY_KEY, "registry-2-0"), "registry-2-0");
    }

    #[test]
    fn raw_text_is_preserved() {
        let raw = "TEST_TYPE=soak,,  ";
        let inputs = TestInputs::parse(raw).unwrap();
        assert_eq!(inputs.raw(), raw);
        assert_eq!(inputs.len(), 1);
    }

    #[test]
    fn value_keeps_everything_after_first_equals() {
        let inputs =
            TestInputs::parse("GRAFANA_DASHBOARD_URL=https://grafana/d/x?var=a=b").unwrap();
        assert_eq!(
            inputs.get(GRAFANA_DASHBOARD_URL_KEY),
            Some("https://grafana/d/x?var=a=b")
        );
    }

    /// Story: two typos in a long TEST_INPUTS list are reported in one go
    #[test]
    fn malformed_entries_are_collected() {
        let err = TestInputs::parse("TEST_TYPE=soak,AUTOMATION_NUMBER_OF_NODES,=6").unwrap_err();
        match err {
            Error::InvalidInput { entries, .. } => {
                assert_eq!(entries, vec!["AUTOMATION_NUMBER_OF_NODES", "=6"]);
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn first_duplicate_wins() {
        let inputs = TestInputs::parse("TEST_TYPE=soak,TEST_TYPE=benchmark").unwrap();
        assert_eq!(inputs.get(TEST_TYPE_KEY), Some("soak"));
    }

    #[test]
    fn numbers_parse_or_fail_loudly() {
        let inputs = TestInputs::parse("AUTOMATION_NUMBER_OF_NODES=4").unwrap();
        assert_eq!(inputs.parse_or::<usize>(NODE_COUNT_KEY, 6).unwrap(), 4);

        let inputs = TestInputs::parse("").unwrap();
        assert_eq!(inputs.parse_or::<usize>(NODE_COUNT_KEY, 6).unwrap(), 6);

        let inputs = TestInputs::parse("AUTOMATION_NUMBER_OF_NODES=six").unwrap();
        let err = inputs.parse_or::<usize>(NODE_COUNT_KEY, 6).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("six"));
    }
}
