//! External command execution
//!
//! `helm`, `kubectl` and the test build all go through [`CommandRunner`] so
//! provisioning and triggering can be tested without a cluster.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use keeper_bench_common::{Error, Result};

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Data written to stdin, if any
    pub stdin: Option<String>,
    /// Working directory, inherited when unset
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Start a command for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            current_dir: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed `input` on stdin
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Run in `dir`
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Whether the command exited zero
    pub success: bool,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Turn a non-zero exit into `Error::CommandFailed`
    pub fn into_result(self, spec: &CommandSpec) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(Error::command_failed(
                spec.to_string(),
                self.stderr.trim().to_string(),
            ))
        }
    }
}

/// Executes external commands (allows mocking in tests)
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and capture its output
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands on the host
#[derive(Debug, Default, Clone)]
pub struct RealCommandRunner;

#[async_trait]
impl CommandRunner for RealCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.current_dir {
            cmd.current_dir(dir);
        }

        debug!(command = %spec, "executing");

        let spawn_err = |e: std::io::Error| Error::command_failed(spec.to_string(), e.to_string());
        let mut child = cmd.spawn().map_err(spawn_err)?;

        if let (Some(input), Some(mut stdin)) = (&spec.stdin, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).await.map_err(spawn_err)?;
            // Close stdin so the child sees EOF
            drop(stdin);
        }

        let output = child.wait_with_output().await.map_err(spawn_err)?;
        Ok(output.into())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Records every command and replies from a script of outputs.
    ///
    /// Commands beyond the script succeed with empty output.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        calls: Mutex<Vec<CommandSpec>>,
        replies: Mutex<VecDeque<CommandOutput>>,
    }

    impl RecordingRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(self, output: CommandOutput) -> Self {
            self.replies.lock().unwrap().push_back(output);
            self
        }

        pub(crate) fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            Ok(self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| CommandOutput::ok("")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_arguments() {
        let spec = CommandSpec::new("helm")
            .arg("upgrade")
            .args(["--install", "geth"])
            .stdin("{}")
            .current_dir("/tmp");

        assert_eq!(spec.to_string(), "helm upgrade --install geth");
        assert_eq!(spec.stdin.as_deref(), Some("{}"));
        assert_eq!(spec.current_dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn failed_output_becomes_command_failed() {
        let spec = CommandSpec::new("kubectl").arg("apply");
        let err = CommandOutput::failed("  forbidden\n").into_result(&spec).unwrap_err();
        match err {
            Error::CommandFailed { command, message } => {
                assert_eq!(command, "kubectl apply");
                assert_eq!(message, "forbidden");
            }
            other => panic!("Expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn successful_output_passes_through() {
        let spec = CommandSpec::new("kubectl");
        let out = CommandOutput::ok("pod-0").into_result(&spec).unwrap();
        assert_eq!(out.stdout, "pod-0");
    }

    #[tokio::test]
    async fn real_runner_reports_missing_program() {
        let spec = CommandSpec::new("keeper-bench-definitely-not-installed");
        let err = RealCommandRunner.run(&spec).await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
