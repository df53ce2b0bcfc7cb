//! Error types for simulator configuration and joint addressing.

use thiserror::Error;

/// Errors surfaced by the simulator core.
///
/// Most simulator operations are total over in-memory state and never fail;
/// these cover the few boundaries where input comes from outside.
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading a configuration file failed.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file was not valid JSON for [`crate::SimulatorConfig`].
    #[error("invalid config JSON: {0}")]
    ConfigJson(#[from] serde_json::Error),

    /// A joint name did not match `base`, `armNX` or `armNZ`.
    #[error("unknown joint: {0}")]
    UnknownJoint(String),

    /// A chain must keep at least one segment.
    #[error("invalid segment count: {0}")]
    InvalidSegmentCount(usize),
}

impl SimError {
    /// Create an UnknownJoint error from anything string-like.
    pub fn unknown_joint(name: impl Into<String>) -> Self {
        Self::UnknownJoint(name.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
