//! Test environment descriptor
//!
//! Holds the namespace, the time-to-live and the ordered component list for
//! one run. Components are added while the run is assembled; the provisioner
//! only reads it.

use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use keeper_bench_common::{Error, Result, DEFAULT_TTL_HOURS, NAMESPACE_PREFIX};

use crate::charts::{Component, HelmChart, ManifestSet};
use crate::resources::TestType;

/// Annotation the namespace janitor reads to expire environments
pub const TTL_ANNOTATION: &str = "janitor/ttl";

/// Label marking namespaces created by this tool
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Value of [`MANAGED_BY_LABEL`]
pub const MANAGED_BY: &str = "keeper-bench";

/// Length of the random namespace suffix
const NAMESPACE_SUFFIX_LEN: usize = 5;

/// Longest valid Kubernetes namespace name
const MAX_NAMESPACE_LEN: usize = 63;

/// `<testType>-<network>-<registry>`
pub fn namespace_name(test_type: &TestType, network_component: &str, registry: &str) -> String {
    format!("{}-{}-{}", test_type.as_str(), network_component, registry)
}

/// Namespace prefix for a run; the environment appends a random suffix
pub fn namespace_prefix(test_type: &TestType, network_component: &str, registry: &str) -> String {
    format!(
        "{}-{}",
        NAMESPACE_PREFIX,
        namespace_name(test_type, network_component, registry)
    )
}

/// Settings fixed before the environment is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Namespace prefix (e.g. "automation-benchmark-simulated-registry-2-0")
    pub namespace_prefix: String,
    /// How long the namespace may live before the janitor removes it
    pub ttl: Duration,
}

impl EnvironmentConfig {
    /// Config with the default 30 day TTL
    pub fn new(namespace_prefix: impl Into<String>) -> Self {
        Self {
            namespace_prefix: namespace_prefix.into(),
            ttl: Duration::from_secs(DEFAULT_TTL_HOURS * 3600),
        }
    }

    /// Override the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// One run's environment
#[derive(Debug, Clone)]
pub struct Environment {
    config: EnvironmentConfig,
    namespace: String,
    components: Vec<Component>,
}

impl Environment {
    /// Create an environment in a fresh `<prefix>-<suffix>` namespace
    pub fn new(config: EnvironmentConfig) -> Result<Self> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let namespace = format!(
            "{}-{}",
            config.namespace_prefix,
            &suffix[..NAMESPACE_SUFFIX_LEN]
        );
        Self::with_namespace(config, namespace)
    }

    /// Create an environment in an explicit namespace
    pub fn with_namespace(config: EnvironmentConfig, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        Ok(Self {
            config,
            namespace,
            components: Vec::new(),
        })
    }

    /// Append a Helm release
    pub fn add_helm(&mut self, chart: HelmChart) -> &mut Self {
        self.components.push(Component::Helm(chart));
        self
    }

    /// Append raw manifests
    pub fn add_manifests(&mut self, manifests: ManifestSet) -> &mut Self {
        self.components.push(Component::Manifests(manifests));
        self
    }

    /// Concrete namespace
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Settings the environment was created with
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Components in install order
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// TTL in the janitor's format (e.g. "720h")
    pub fn ttl_annotation(&self) -> String {
        format!("{}h", self.config.ttl.as_secs().div_ceil(3600))
    }

    /// Namespace object carrying the TTL annotation
    pub fn namespace_manifest(&self) -> Result<String> {
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some(self.namespace.clone()),
                labels: Some(BTreeMap::from([(
                    MANAGED_BY_LABEL.to_string(),
                    MANAGED_BY.to_string(),
                )])),
                annotations: Some(BTreeMap::from([(
                    TTL_ANNOTATION.to_string(),
                    self.ttl_annotation(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        };
        serde_json::to_string_pretty(&ns)
            .map_err(|e| Error::serialization_for_kind("Namespace", e.to_string()))
    }
}

/// Namespaces must be RFC 1123 labels
fn validate_namespace(namespace: &str) -> Result<()> {
    let valid_chars = namespace
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_edges = namespace
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
        && namespace
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_alphanumeric());

    if namespace.len() > MAX_NAMESPACE_LEN || !valid_chars || !valid_edges {
        return Err(Error::validation_for_field(
            "namespace",
            format!(
                "'{}' is not a valid namespace (lower-case alphanumerics and '-', at most {} characters)",
                namespace, MAX_NAMESPACE_LEN
            ),
        ));
    }
    Ok(())
}
