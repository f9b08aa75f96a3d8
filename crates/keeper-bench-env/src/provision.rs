//! Environment provisioning
//!
//! Brings an [`Environment`] up: namespace first, then every component in the
//! order it was added. Manifests go through `kubectl apply`, charts through
//! `helm upgrade --install --wait`. The first failure stops provisioning;
//! nothing is rolled back (the namespace TTL cleans up).

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::info;

use keeper_bench_common::{Error, Result};

use crate::charts::{Component, HelmChart, ManifestSet};
use crate::command::{CommandRunner, CommandSpec, RealCommandRunner};
use crate::environment::Environment;

/// Default time helm waits for a release to become ready
pub const DEFAULT_HELM_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Brings an environment up
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Create the namespace and install every component
    async fn provision(&self, env: &Environment) -> Result<()>;
}

/// Provisioner backed by the `kubectl` and `helm` binaries
pub struct HelmProvisioner<R: CommandRunner = RealCommandRunner> {
    runner: R,
    helm_timeout: Duration,
    kube_context: Option<String>,
}

impl HelmProvisioner<RealCommandRunner> {
    /// Provisioner running real commands
    pub fn new() -> Self {
        Self::with_runner(RealCommandRunner)
    }
}

impl Default for HelmProvisioner<RealCommandRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> HelmProvisioner<R> {
    /// Provisioner with a custom command runner
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            helm_timeout: DEFAULT_HELM_TIMEOUT,
            kube_context: None,
        }
    }

    /// How long helm waits for each release
    pub fn with_helm_timeout(mut self, timeout: Duration) -> Self {
        self.helm_timeout = timeout;
        self
    }

    /// Target a specific kubeconfig context
    pub fn with_kube_context(mut self, context: impl Into<String>) -> Self {
        self.kube_context = Some(context.into());
        self
    }

    fn kubectl(&self) -> CommandSpec {
        let spec = CommandSpec::new("kubectl");
        match &self.kube_context {
            Some(ctx) => spec.args(["--context", ctx.as_str()]),
            None => spec,
        }
    }

    fn helm(&self) -> CommandSpec {
        let spec = CommandSpec::new("helm");
        match &self.kube_context {
            Some(ctx) => spec.args(["--kube-context", ctx.as_str()]),
            None => spec,
        }
    }

    async fn exec(&self, spec: CommandSpec) -> Result<()> {
        self.runner.run(&spec).await?.into_result(&spec)?;
        Ok(())
    }

    async fn apply_namespace(&self, env: &Environment) -> Result<()> {
        let spec = self
            .kubectl()
            .args(["apply", "-f", "-"])
            .stdin(env.namespace_manifest()?);
        self.exec(spec).await
    }

    async fn apply_manifests(&self, namespace: &str, set: &ManifestSet) -> Result<()> {
        let spec = self
            .kubectl()
            .args(["apply", "-n", namespace, "-f", "-"])
            .stdin(set.documents.join("\n---\n"));
        self.exec(spec).await
    }

    async fn install_chart(&self, namespace: &str, chart: &HelmChart) -> Result<()> {
        let values = serde_json::to_string(&chart.values)
            .map_err(|e| Error::serialization_for_kind("chart values", e.to_string()))?;

        let mut spec = self
            .helm()
            .args(["upgrade", "--install", chart.release.as_str(), chart.chart.as_str()]);
        if let Some(version) = &chart.version {
            spec = spec.args(["--version", version.as_str()]);
        }
        let spec = spec
            .args(["--namespace", namespace, "--values", "-", "--wait", "--timeout"])
            .arg(format!("{}s", self.helm_timeout.as_secs()))
            .stdin(values);
        self.exec(spec).await
    }
}

#[async_trait]
impl<R: CommandRunner> Provisioner for HelmProvisioner<R> {
    async fn provision(&self, env: &Environment) -> Result<()> {
        let namespace = env.namespace();
        info!(namespace, components = env.components().len(), "provisioning environment");

        self.apply_namespace(env).await?;

        for component in env.components() {
            info!(namespace, component = component.name(), "installing component");
            match component {
                Component::Helm(chart) => self.install_chart(namespace, chart).await?,
                Component::Manifests(set) => self.apply_manifests(namespace, set).await?,
            }
        }

        info!(namespace, "environment ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::RecordingRunner;
    use crate::command::CommandOutput;
    use crate::environment::EnvironmentConfig;
    use keeper_bench_common::{values_from, Values};
    use serde_json::json;

    fn environment() -> Environment {
        let mut env =
            Environment::with_namespace(EnvironmentConfig::new("automation-x"), "automation-x-abcde")
                .unwrap();
        env.add_helm(
            HelmChart::new("chainlink-0", "chainlink", values_from(json!({"env": {"A": "1"}})))
                .with_version("0.0.11"),
        )
        .add_manifests(ManifestSet {
            name: "geth-blockscout".into(),
            documents: vec!["{\"kind\":\"Deployment\"}".into(), "{\"kind\":\"Service\"}".into()],
        })
        .add_helm(HelmChart::new("geth", "ethereum", Values::new()));
        env
    }

    #[tokio::test]
    async fn installs_namespace_then_components_in_order() {
        let provisioner = HelmProvisioner::with_runner(RecordingRunner::new());
        provisioner.provision(&environment()).await.unwrap();

        let calls = provisioner.runner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].to_string(), "kubectl apply -f -");
        assert!(calls[0].stdin.as_deref().unwrap().contains("janitor/ttl"));
        assert!(calls[1].to_string().starts_with("helm upgrade --install chainlink-0"));
        assert_eq!(calls[2].to_string(), "kubectl apply -n automation-x-abcde -f -");
        assert!(calls[3].to_string().starts_with("helm upgrade --install geth"));
    }

    #[tokio::test]
    async fn chart_values_are_piped_as_json() {
        let provisioner = HelmProvisioner::with_runner(RecordingRunner::new())
            .with_helm_timeout(Duration::from_secs(60));
        provisioner.provision(&environment()).await.unwrap();

        let calls = provisioner.runner.calls();
        let install = &calls[1];
        assert_eq!(
            install.args,
            vec![
                "upgrade",
                "--install",
                "chainlink-0",
                "chainlink-qa/chainlink",
                "--version",
                "0.0.11",
                "--namespace",
                "automation-x-abcde",
                "--values",
                "-",
                "--wait",
                "--timeout",
                "60s",
            ]
        );
        let values: serde_json::Value =
            serde_json::from_str(install.stdin.as_deref().unwrap()).unwrap();
        assert_eq!(values["env"]["A"], "1");
    }

    #[tokio::test]
    async fn manifests_are_joined_into_one_apply() {
        let provisioner = HelmProvisioner::with_runner(RecordingRunner::new());
        provisioner.provision(&environment()).await.unwrap();

        let calls = provisioner.runner.calls();
        let apply = &calls[2];
        assert_eq!(
            apply.stdin.as_deref(),
            Some("{\"kind\":\"Deployment\"}\n---\n{\"kind\":\"Service\"}")
        );
    }

    #[tokio::test]
    async fn first_failure_stops_provisioning() {
        let runner = RecordingRunner::new()
            .reply(CommandOutput::ok("namespace/automation-x-abcde created"))
            .reply(CommandOutput::failed("chart not found"));
        let provisioner = HelmProvisioner::with_runner(runner);

        let err = provisioner.provision(&environment()).await.unwrap_err();
        assert!(err.to_string().contains("chart not found"));
        assert_eq!(provisioner.runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn kube_context_is_passed_to_both_tools() {
        let provisioner =
            HelmProvisioner::with_runner(RecordingRunner::new()).with_kube_context("kind-bench");
        provisioner.provision(&environment()).await.unwrap();

        let calls = provisioner.runner.calls();
        assert!(calls[0].to_string().starts_with("kubectl --context kind-bench"));
        assert!(calls[1].to_string().starts_with("helm --kube-context kind-bench"));
    }
}
