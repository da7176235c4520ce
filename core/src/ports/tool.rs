//! Keyscan tool port (interface).

use std::time::Duration;

use thiserror::Error;

/// Captured output of a finished tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Time between spawn and exit.
    pub elapsed: Duration,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Ways a tool invocation can end without a normal exit.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its timeout and was killed.
    #[error("timed out after {after:?}")]
    Timeout {
        after: Duration,
        /// Whatever stderr output arrived before the kill.
        stderr: String,
    },

    /// Reading output or waiting for the process failed.
    #[error("I/O error while running tool: {0}")]
    Io(#[from] std::io::Error),
}

/// Port for running ssh-keyscan.
///
/// Implementations spawn one process per call and must not leave it running
/// once the returned future completes or is dropped.
pub trait KeyscanTool: Send + Sync {
    /// Run the tool with `args`, killing it after `timeout`.
    fn run(
        &self,
        args: &[String],
        timeout: Duration,
    ) -> impl std::future::Future<Output = std::result::Result<ToolOutput, ToolError>> + Send;
}
