//! Remote test activation
//!
//! The benchmark itself runs inside the cluster. Triggering it means building
//! the test binary locally and copying it into the remote runner pod, which
//! starts executing as soon as the binary lands.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

use keeper_bench_common::{Error, Result};

use crate::charts::remote_runner::REMOTE_RUNNER_RELEASE;
use crate::command::{CommandRunner, CommandSpec, RealCommandRunner};
use crate::environment::Environment;

/// Script that compiles the benchmark tests into a single binary
pub const DEFAULT_BUILD_COMMAND: &str = "./integration-tests/scripts/buildTests";

/// Build output, relative to the source directory
pub const DEFAULT_ARTIFACT: &str = "integration-tests/remote.test";

/// Where the runner expects the binary
pub const REMOTE_BINARY_PATH: &str = "/root/remote.test";

/// Starts the benchmark in a provisioned environment
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteTrigger: Send + Sync {
    /// Build from `source_dir` and hand the result to the runner in `env`
    async fn trigger(&self, source_dir: &Path, env: &Environment) -> Result<()>;
}

/// Trigger that builds with a local script and copies with `kubectl cp`
pub struct RemoteRunnerTrigger<R: CommandRunner = RealCommandRunner> {
    runner: R,
    build_command: Vec<String>,
    artifact: PathBuf,
    kube_context: Option<String>,
}

impl RemoteRunnerTrigger<RealCommandRunner> {
    /// Trigger running real commands
    pub fn new() -> Self {
        Self::with_runner(RealCommandRunner)
    }
}

impl Default for RemoteRunnerTrigger<RealCommandRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> RemoteRunnerTrigger<R> {
    /// Trigger with a custom command runner
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            build_command: vec![DEFAULT_BUILD_COMMAND.to_string()],
            artifact: PathBuf::from(DEFAULT_ARTIFACT),
            kube_context: None,
        }
    }

    /// Replace the build command (program followed by its arguments)
    pub fn with_build_command<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_command = argv.into_iter().map(Into::into).collect();
        self
    }

    /// Binary produced by the build, relative to the source directory
    pub fn with_artifact(mut self, artifact: impl Into<PathBuf>) -> Self {
        self.artifact = artifact.into();
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

    async fn build(&self, source_dir: &Path) -> Result<()> {
        let (program, args) = self
            .build_command
            .split_first()
            .ok_or_else(|| Error::validation_for_field("build_command", "build command is empty"))?;

        let spec = CommandSpec::new(program.as_str())
            .args(args.iter().map(String::as_str))
            .current_dir(source_dir);
        info!(command = %spec, dir = %source_dir.display(), "building remote test binary");
        self.runner.run(&spec).await?.into_result(&spec)?;
        Ok(())
    }

    async fn runner_pod(&self, namespace: &str) -> Result<String> {
        let selector = format!("app={}", REMOTE_RUNNER_RELEASE);
        let spec = self.kubectl().args([
            "get",
            "pods",
            "-n",
            namespace,
            "-l",
            selector.as_str(),
            "-o",
            "jsonpath={.items[0].metadata.name}",
        ]);
        let output = self.runner.run(&spec).await?.into_result(&spec)?;

        let pod = output.stdout.trim();
        if pod.is_empty() {
            return Err(Error::command_failed(
                spec.to_string(),
                format!("no pod labelled {} in {}", selector, namespace),
            ));
        }
        Ok(pod.to_string())
    }

    async fn copy_binary(&self, source_dir: &Path, namespace: &str, pod: &str) -> Result<()> {
        let local = source_dir.join(&self.artifact);
        let local = local.to_string_lossy();
        let remote = format!("{}/{}:{}", namespace, pod, REMOTE_BINARY_PATH);

        let spec = self.kubectl().args([
            "cp",
            local.as_ref(),
            remote.as_str(),
            "-c",
            REMOTE_RUNNER_RELEASE,
        ]);
        self.runner.run(&spec).await?.into_result(&spec)?;
        Ok(())
    }
}

#[async_trait]
impl<R: CommandRunner> RemoteTrigger for RemoteRunnerTrigger<R> {
    async fn trigger(&self, source_dir: &Path, env: &Environment) -> Result<()> {
        let namespace = env.namespace();

        self.build(source_dir).await?;

        let pod = self.runner_pod(namespace).await?;
        debug!(namespace, pod = %pod, "found remote runner");

        self.copy_binary(source_dir, namespace, &pod).await?;
        info!(namespace, pod = %pod, "remote test started");
        Ok(())
    }
}
