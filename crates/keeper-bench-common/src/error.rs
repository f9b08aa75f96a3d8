//! Error types for the keeper benchmark driver
//!
//! Only provisioning and triggering are fatal at run time. Everything else is
//! caught while composing configuration, before anything touches a cluster.

use thiserror::Error;

/// Main error type for keeper-bench operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed entries in a `key=value` input list
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of every malformed entry
        message: String,
        /// The offending raw entries
        entries: Vec<String>,
    },

    /// Configuration that parsed but cannot produce an environment
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
        /// The invalid field (e.g., "node_count")
        field: Option<String>,
    },

    /// Network name that is not in the known network table
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    /// Bringing the environment up failed
    #[error("error launching test environment: {0}")]
    Provision(String),

    /// Triggering the remote test failed
    #[error("error activating remote test: {0}")]
    Trigger(String),

    /// External command exited unsuccessfully or could not be spawned
    #[error("command `{command}` failed: {message}")]
    CommandFailed {
        /// The program and first arguments
        command: String,
        /// stderr or spawn error
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The thing being serialized (if known)
        kind: Option<String>,
    },
}

impl Error {
    /// Create an invalid input error listing the malformed entries
    pub fn invalid_input(msg: impl Into<String>, entries: Vec<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
            entries,
        }
    }

    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error for a specific field
    pub fn validation_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a command failure error
    pub fn command_failed(command: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with context about what was serialized
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Whether the run failed with the environment fully provisioned
    pub fn environment_provisioned(&self) -> bool {
        matches!(self, Error::Trigger(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::serialization(e.to_string())
    }
}
