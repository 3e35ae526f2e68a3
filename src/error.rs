use std::process::ExitStatus;
use thiserror::Error;

pub type Result<T, E = RealignError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RealignError {
    /// The external command ran but exited unsuccessfully.
    #[error("external command `{command}` exited with {status}")]
    ExternalToolFailure { command: String, status: ExitStatus },
    /// The shell hosting the external command could not be started.
    #[error("failed to launch external command `{command}`: {source}")]
    ToolLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The tool's output does not correspond to the alignment it was given.
    #[error("format mismatch: {message}")]
    FormatMismatch { message: String },
    /// Input data (a block, a file) cannot be represented as an alignment.
    #[error("malformed input: {message}")]
    MalformedInput { message: String },
    /// The consistency test has nothing to compare.
    #[error("cannot compute head-or-tail score: {message}")]
    DegenerateScore { message: String },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl RealignError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    pub(crate) fn format_mismatch(message: impl Into<String>) -> Self {
        Self::FormatMismatch { message: message.into() }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput { message: message.into() }
    }

    pub(crate) fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateScore { message: message.into() }
    }
}
