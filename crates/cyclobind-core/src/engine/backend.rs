use crate::core::offset::OffsetMatrix;
use crate::engine::config::{GdSettings, ModelConfig};
use crate::engine::error::EngineError;
use crate::engine::protocol::{PrepRequest, PreparedInputs};
use crate::engine::state::TrialLog;
use crate::engine::strategy::{DesignFlags, DesignStep};
use std::path::Path;

/// The structure-prediction engine that owns the model, its inputs, and the optimizers.
///
/// Calls arrive in a fixed order per trial: (`clear_memory`, `build_model`,
/// `prepare_inputs` on a cache miss), `set_offset`, `restart`, `set_optimizer`,
/// `model_names`, one `run_step` per planned step, then `save_pdb`.
pub trait DesignBackend {
    /// Releases the previous model before a rebuild.
    fn clear_memory(&mut self) -> Result<(), EngineError>;

    /// Creates a model for the binder protocol.
    fn build_model(&mut self, model: &ModelConfig) -> Result<(), EngineError>;

    /// Loads the target and lays out the complex.
    ///
    /// # Errors
    ///
    /// Returns an error if the structure or the hotspot list cannot be resolved.
    fn prepare_inputs(&mut self, request: &PrepRequest) -> Result<PreparedInputs, EngineError>;

    /// Replaces the relative-position offset the model will see.
    fn set_offset(&mut self, offset: &OffsetMatrix) -> Result<(), EngineError>;

    /// Resets the design state, optionally starting from `seed`.
    fn restart(&mut self, seed: Option<&str>) -> Result<(), EngineError>;

    fn set_optimizer(&mut self, settings: &GdSettings) -> Result<(), EngineError>;

    /// Names of the trained parameter sets, in the engine's order.
    fn model_names(&mut self) -> Result<Vec<String>, EngineError>;

    fn run_step(&mut self, step: &DesignStep, flags: &DesignFlags) -> Result<(), EngineError>;

    /// Writes the best structure found so far.
    fn save_pdb(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Metrics of the best design seen by the engine, if any.
    fn best_log(&mut self) -> Result<Option<TrialLog>, EngineError>;
}
