//! Keeper benchmark environment driver
//!
//! Builds the Chainlink node topology for a keeper benchmark run, assembles
//! the Kubernetes environment around it (nodes, chain, explorer, remote test
//! runner), provisions it with Helm and kubectl, and starts the remote test.
//!
//! # Flow
//!
//! 1. [`network::select_network`] resolves the target chain
//! 2. [`plan::assemble`] builds the [`topology::Topology`] and the ordered
//!    component list in an [`environment::Environment`]
//! 3. [`plan::launch`] provisions through a [`provision::Provisioner`] and
//!    triggers through a [`trigger::RemoteTrigger`]

#![deny(missing_docs)]

pub mod charts;
pub mod command;
pub mod environment;
pub mod network;
pub mod plan;
pub mod provision;
pub mod resources;
pub mod topology;
pub mod trigger;

pub use charts::{Component, HelmChart, ManifestSet};
pub use command::{CommandOutput, CommandRunner, CommandSpec, RealCommandRunner};
pub use environment::{Environment, EnvironmentConfig};
pub use network::{select_network, EvmNetwork, NetworkEndpoints};
pub use plan::{assemble, launch, BenchmarkPlan, BenchmarkSettings};
pub use provision::{HelmProvisioner, Provisioner};
pub use resources::{ResourceProfile, TestType};
pub use topology::{NodeSpec, Topology, TopologyConfig};
pub use trigger::{RemoteRunnerTrigger, RemoteTrigger};
