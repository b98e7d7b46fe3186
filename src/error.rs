//! Error types for qemuctl.

use thiserror::Error;

/// Result type alias using qemuctl's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in qemuctl operations.
///
/// The controller never lets these escape its public surface; they exist for
/// the executor/probe layer and for the CLI, which converts an unsuccessful
/// lifecycle operation into a process exit code.
#[derive(Error, Debug)]
pub enum Error {
    /// External command could not be spawned at all.
    ///
    /// A nonzero exit from a spawned command is ordinary data, not an error.
    #[error("command failed: {command}: {message}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// Error message.
        message: String,
    },

    /// A lifecycle operation reported failure.
    #[error("vm {op} failed: {vm}")]
    Lifecycle {
        /// Operation that failed ("start", "stop", "toggle").
        op: &'static str,
        /// Name of the VM.
        vm: String,
    },
}

impl Error {
    /// Create a command failed error.
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a lifecycle error for the given operation and VM.
    pub fn lifecycle(op: &'static str, vm: impl Into<String>) -> Self {
        Self::Lifecycle { op, vm: vm.into() }
    }
}
