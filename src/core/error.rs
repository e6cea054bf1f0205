use thiserror::Error;

use crate::motion::executor::ControllerGroup;

#[derive(Error, Debug)]
pub enum ReachError {
    #[error("Unable to find collision geometry for [{0}]")]
    TargetNotFound(String),

    #[error("No joint angles obtained from IK at waypoint {waypoint} of {of}")]
    IkFailure { waypoint: usize, of: usize },

    #[error("{group} trajectory execution failed: {reason}")]
    Execution {
        group: ControllerGroup,
        reason: String,
    },

    #[error("Shutdown requested")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Scene error: {0}")]
    Scene(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl ReachError {
    /// Whether this error should terminate the process with a failure code.
    ///
    /// Cancellation is an orderly shutdown, everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ReachError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, ReachError>;
