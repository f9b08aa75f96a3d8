//! Print the environment a run would provision

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use serde_json::Value;

use keeper_bench_common::Values;
use keeper_bench_env::{assemble, BenchmarkPlan, Component};

use crate::settings::BenchmarkArgs;
use crate::Result;

/// Keys whose values never leave the process unless asked for
const SECRET_KEYS: [&str; 1] = ["evm_keys"];

const REDACTED: &str = "<redacted>";

/// Print the environment that would be provisioned, without touching a cluster
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub benchmark: BenchmarkArgs,

    /// Write to a file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Include private keys in the output
    #[arg(long)]
    pub show_secrets: bool,
}

#[derive(Serialize)]
struct RenderedPlan<'a> {
    namespace: &'a str,
    ttl: String,
    focus: &'a str,
    nodes: usize,
    block_time: &'a str,
    profile: &'a str,
    components: Vec<Component>,
}

/// Render a plan as YAML
pub fn render_plan(plan: &BenchmarkPlan, show_secrets: bool) -> Result<String> {
    let mut components = plan.environment.components().to_vec();
    if !show_secrets {
        for component in &mut components {
            if let Component::Helm(chart) = component {
                redact(&mut chart.values);
            }
        }
    }

    let rendered = RenderedPlan {
        namespace: plan.environment.namespace(),
        ttl: plan.environment.ttl_annotation(),
        focus: &plan.focus,
        nodes: plan.topology.node_count(),
        block_time: &plan.topology.block_time,
        profile: plan.topology.profile.name,
        components,
    };
    Ok(serde_yaml::to_string(&rendered)?)
}

fn redact(values: &mut Values) {
    for (key, value) in values.iter_mut() {
        if let Value::Object(nested) = value {
            redact(nested);
        } else if SECRET_KEYS.contains(&key.as_str()) {
            *value = Value::String(REDACTED.to_string());
        }
    }
}

pub async fn run(args: RenderArgs) -> Result<()> {
    let settings = args.benchmark.resolve().await?;
    let plan = assemble(&settings)?;
    let yaml = render_plan(&plan, args.show_secrets)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, yaml).await?;
            eprintln!("Environment written to {}", path.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
