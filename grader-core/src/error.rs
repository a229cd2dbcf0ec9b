//! Error types for grader core.

use std::io;
use std::path::PathBuf;

/// Error type for grader core operations.
#[derive(Debug, thiserror::Error)]
pub enum GraderError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The code to grade does not resolve to an existing directory.
    #[error("{} is not a valid path to code", .0.display())]
    InvalidScope(PathBuf),
    /// A tool process could not be started, timed out, or produced nothing.
    #[error("{tool} failed: {reason}")]
    ToolExecution {
        /// Tool identifier.
        tool: String,
        /// Human-readable cause.
        reason: String,
    },
    /// A tool reported that it could not run meaningfully at all.
    #[error("{tool} cannot run: {line}")]
    FatalTool {
        /// Tool identifier.
        tool: String,
        /// The output line that matched the fatal pattern.
        line: String,
    },
    /// A persisted record could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// A report directory already exists and overwrite was not requested.
    #[error("report {0} already exists")]
    ReportExists(String),
    /// A catch-all error with a message.
    #[error("{0}")]
    Other(String),
}

impl GraderError {
    /// Returns true when the error came from a tool's fatal output pattern.
    pub fn is_fatal_tool(&self) -> bool {
        matches!(self, Self::FatalTool { .. })
    }
}

/// Convenience result type for grader core.
pub type Result<T> = std::result::Result<T, GraderError>;
