//! Error taxonomy for the loading pipeline and the session.

use std::path::PathBuf;
use thiserror::Error;

/// Process-level failures. Each maps to an exit status via [`TryoutError::exit_code`].
#[derive(Error, Debug)]
pub enum TryoutError {
    #[error("You need to provide some arguments!")]
    InvalidInvocation,

    #[error("Invalid package argument: {0}")]
    InvalidRequest(#[from] tryout_schema::RequestError),

    #[error("Failed to install '{name}'. Double check the module name is correct\n\n{stderr}")]
    InstallationFailed {
        name: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Could not read metadata for '{name}': {reason}")]
    MetadataUnreadable { name: String, reason: String },

    #[error("Failed to load '{name}' from {}: {reason}", .path.display())]
    LoadFailed {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("History file {} is unusable: {source}", .path.display())]
    HistoryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not start JavaScript host: {0}")]
    Host(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TryoutError {
    /// Exit status for this failure.
    ///
    /// Installation failures mirror the installer's own status; a missing
    /// status (killed by a signal) and every other error become `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InstallationFailed {
                exit_code: Some(code),
                ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    pub(crate) fn metadata(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::MetadataUnreadable {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A session-local evaluation failure: a synchronous throw or a rejected promise.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EvalError {
    /// Rendered error text as the engine reports it.
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
