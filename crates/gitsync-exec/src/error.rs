//! Command execution error types.

use std::process::ExitStatus;

use thiserror::Error;

/// Errors raised while running a post-update command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command could not be started.
    #[error("failed to start '{command}': {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully.
    #[error("command '{command}' failed with {status}{}", describe_output(.output))]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit status reported by the OS.
        status: ExitStatus,
        /// Combined stdout and stderr.
        output: String,
    },
}

impl ExecError {
    /// Returns the rendered command line the error belongs to.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. } | Self::Failed { command, .. } => command,
        }
    }
}

fn describe_output(output: &str) -> String {
    if output.is_empty() {
        String::new()
    } else {
        format!(": {output}")
    }
}

/// Result type for command execution.
pub type ExecResult<T> = Result<T, ExecError>;
