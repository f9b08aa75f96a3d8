//! Run a benchmark: assemble, provision, trigger

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::{info, warn};

use keeper_bench_common::DEFAULT_SOURCE_DIR;
use keeper_bench_env::provision::DEFAULT_HELM_TIMEOUT;
use keeper_bench_env::trigger::DEFAULT_ARTIFACT;
use keeper_bench_env::{
    assemble, launch, CommandRunner, HelmProvisioner, RealCommandRunner, RemoteRunnerTrigger,
};

use crate::settings::BenchmarkArgs;
use crate::Result;

/// Provision the benchmark environment and start the remote test
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub benchmark: BenchmarkArgs,

    /// Repository root the remote test binary is built from
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    pub source_dir: PathBuf,

    /// Built binary, relative to --source-dir
    #[arg(long, default_value = DEFAULT_ARTIFACT)]
    pub artifact: PathBuf,

    /// Kubeconfig context to deploy into
    #[arg(long)]
    pub kube_context: Option<String>,

    /// Seconds helm waits for each release to become ready
    #[arg(long, default_value_t = DEFAULT_HELM_TIMEOUT.as_secs())]
    pub helm_timeout_secs: u64,

    /// Command that builds the remote test binary, run in --source-dir
    /// (e.g. `-- sh -c "make build_test_image"`)
    #[arg(last = true, value_name = "BUILD_COMMAND")]
    pub build_command: Vec<String>,
}

/// Provisioner and trigger configured from the run flags
pub fn deployers<R>(args: &RunArgs, runner: R) -> (HelmProvisioner<R>, RemoteRunnerTrigger<R>)
where
    R: CommandRunner + Clone,
{
    let mut provisioner = HelmProvisioner::with_runner(runner.clone())
        .with_helm_timeout(Duration::from_secs(args.helm_timeout_secs));
    let mut trigger =
        RemoteRunnerTrigger::with_runner(runner).with_artifact(args.artifact.clone());

    if !args.build_command.is_empty() {
        trigger = trigger.with_build_command(args.build_command.iter().cloned());
    }

    if let Some(context) = &args.kube_context {
        provisioner = provisioner.with_kube_context(context.as_str());
        trigger = trigger.with_kube_context(context.as_str());
    }

    (provisioner, trigger)
}

pub async fn run(args: RunArgs) -> Result<()> {
    let settings = args.benchmark.resolve().await?;
    let plan = assemble(&settings)?;

    info!("Namespace: {}", plan.environment.namespace());
    info!("Chainlink nodes: {}", plan.topology.node_count());
    info!("Focus: {}", plan.focus);

    let (provisioner, trigger) = deployers(&args, RealCommandRunner);

    if let Err(e) = launch(&plan.environment, &provisioner, &trigger, &args.source_dir).await {
        if e.environment_provisioned() {
            warn!(
                namespace = plan.environment.namespace(),
                ttl = %plan.environment.ttl_annotation(),
                "environment left in place until its TTL expires"
            );
        }
        return Err(e.into());
    }
    Ok(())
}
