//! keeper-bench CLI library

pub mod commands;
pub mod error;
pub mod inputs;
pub mod settings;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// keeper-bench - Keeper benchmark environment driver
#[derive(Parser, Debug)]
#[command(name = "keeper-bench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the benchmark environment and start the remote test
    Run(commands::run::RunArgs),
    /// Print the environment that would be provisioned, without touching a cluster
    Render(commands::render::RenderArgs),
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => commands::run::run(args).await,
            Commands::Render(args) => commands::render::run(args).await,
        }
    }
}
