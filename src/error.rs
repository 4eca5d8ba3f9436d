//! Error types for trace-diff
//!
//! One crate-wide enum; line-level parse problems are deliberately NOT here
//! (malformed trace lines are skipped with a diagnostic, never fatal).

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trace-diff error types
#[derive(Error, Debug)]
pub enum Error {
    /// Trace file absent or unreadable
    #[error("cannot read trace file {path}: {source}")]
    MissingFile {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying IO failure
        #[source]
        source: std::io::Error,
    },

    /// A zero-sample series was queried (interpolation, mean)
    #[error("series for node {node_id} is empty: no trace lines matched")]
    EmptySeries {
        /// Node the series was filtered on
        node_id: u32,
    },

    /// Variant identifier carries no trailing `p<digits>` probability
    #[error("variant '{0}' has no parseable trailing probability")]
    UnresolvedProbability(String),

    /// Identifier matches neither `none` nor `node_<id>_<behavior>_p<percent>`
    #[error("invalid variant identifier '{0}'")]
    InvalidVariant(String),

    /// Sweep configuration file did not deserialize
    #[error("cannot parse sweep config {path}: {source}")]
    Config {
        /// Config file path
        path: PathBuf,
        /// Underlying JSON failure
        #[source]
        source: serde_json::Error,
    },

    /// External collaborator binary exited non-zero
    #[error("external process '{program}' failed with status {status}")]
    ExternalProcess {
        /// Program that was invoked
        program: String,
        /// Exit status description
        status: String,
    },

    /// IO error outside of trace-file reads
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
