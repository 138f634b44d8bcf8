//! Error types for Kptfile reconciliation and deploy sessions.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of an external `kpt` invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started at all.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("`{command}` exited with {}", exit_description(.code))]
    Exit { command: String, code: Option<i32> },

    /// The caller cancelled while the process was running.
    #[error("`{command}` was cancelled")]
    Cancelled { command: String },

    /// Waiting on or streaming from the process failed.
    #[error("i/o error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Errors raised while reconciling the Kptfile or running a deploy.
///
/// `Render` and `NamespaceCollection` are non-fatal: the session converts
/// them to info events and keeps going. Every other variant aborts the
/// current operation.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Kptfile not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("kpt pkg init failed for {}: {source}", .dir.display())]
    Initialization {
        dir: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("kpt live init failed for {}: {source}", .dir.display())]
    LiveInit {
        dir: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("kpt live apply failed for {}: {source}", .dir.display())]
    Apply {
        dir: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("kpt live destroy failed for {}: {source}", .dir.display())]
    Destroy {
        dir: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("could not read the hydrated manifest from {}: {reason}", .dir.display())]
    Render { dir: PathBuf, reason: String },

    #[error(
        "could not fetch deployed resource namespace. \
         This might cause port-forward and deploy health-check to fail: {reason}"
    )]
    NamespaceCollection { reason: String },

    #[error("operation on {} was cancelled", .dir.display())]
    Cancelled { dir: PathBuf },
}

impl DeployError {
    /// Whether this error should abort the running operation.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DeployError::Render { .. } | DeployError::NamespaceCollection { .. }
        )
    }
}
