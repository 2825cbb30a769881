//! Error types for the wrapper and the module-descriptor reader.
//!
//! `ModFileError` is always absorbed by the package index (a bad `go.mod`
//! just means "no anchor here"). `WrapperError` is fatal for the run.

use std::path::PathBuf;
use thiserror::Error;

/// Which child stream a draining task was reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Failure reading a module descriptor.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModFileError {
    /// No `module` directive in the file
    #[error("no module directive in {path}")]
    MissingModule { path: PathBuf },

    /// File is not valid UTF-8
    #[error("{path} is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },
}

/// Fatal conditions inside the wrapper itself.
#[derive(Error, Debug)]
pub enum WrapperError {
    /// The wrapped command could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading or forwarding a child stream failed
    #[error("cannot process {stream} line: {source}")]
    Stream {
        stream: StreamKind,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the wrapped command failed
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A draining task panicked or was cancelled
    #[error("{stream} task aborted: {message}")]
    Join { stream: StreamKind, message: String },
}

impl WrapperError {
    pub fn stream(stream: StreamKind, source: std::io::Error) -> Self {
        Self::Stream { stream, source }
    }
}
