use thiserror::Error;

use super::bridge::BridgeError;
use super::config::ConfigError;
use crate::core::offset::OffsetError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Cyclic offset could not be applied: {source}")]
    Offset {
        #[from]
        source: OffsetError,
    },

    #[error("Engine bridge failed: {source}")]
    Bridge {
        #[from]
        source: BridgeError,
    },

    #[error("Input preparation failed: {0}")]
    Preparation(String),

    #[error("Design step '{step}' failed in trial {trial}: {reason}")]
    StepFailed {
        trial: usize,
        step: &'static str,
        reason: String,
    },

    #[error("Engine reported no model parameters to design with")]
    NoModels,

    #[error("Internal logic error: {0}")]
    Internal(String),
}
