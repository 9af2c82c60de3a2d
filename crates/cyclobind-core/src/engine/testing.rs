use crate::core::offset::{ChainLayout, OffsetMatrix};
use crate::engine::backend::DesignBackend;
use crate::engine::config::{GdSettings, ModelConfig};
use crate::engine::error::EngineError;
use crate::engine::protocol::{PrepRequest, PreparedInputs, Protocol};
use crate::engine::state::TrialLog;
use crate::engine::strategy::{DesignFlags, DesignStep};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ClearMemory,
    BuildModel,
    PrepareInputs(PrepRequest),
    SetOffset(OffsetMatrix),
    Restart(Option<String>),
    SetOptimizer(GdSettings),
    ModelNames,
    RunStep(DesignStep, DesignFlags),
    SavePdb(PathBuf),
    BestLog,
}

/// In-memory engine that records every call it receives.
pub(crate) struct RecordingBackend {
    pub calls: Vec<Call>,
    pub protocol: Protocol,
    pub target_len: usize,
    pub binder_len_override: Option<usize>, // Report a binder length other than requested
    pub models: Vec<String>,
    pub fail_on_save: Option<usize>, // Zero-based index of the save call that fails
    pub fail_prepare: bool,
    saves: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            protocol: Protocol::Binder,
            target_len: 6,
            binder_len_override: None,
            models: (1..=5).map(|i| format!("model_{}_multimer_v3", i)).collect(),
            fail_on_save: None,
            fail_prepare: false,
            saves: 0,
        }
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| matches(c)).count()
    }

    pub fn offsets(&self) -> Vec<&OffsetMatrix> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SetOffset(offset) => Some(offset),
                _ => None,
            })
            .collect()
    }
}

impl DesignBackend for RecordingBackend {
    fn clear_memory(&mut self) -> Result<(), EngineError> {
        self.calls.push(Call::ClearMemory);
        Ok(())
    }

    fn build_model(&mut self, _model: &ModelConfig) -> Result<(), EngineError> {
        self.calls.push(Call::BuildModel);
        Ok(())
    }

    fn prepare_inputs(&mut self, request: &PrepRequest) -> Result<PreparedInputs, EngineError> {
        self.calls.push(Call::PrepareInputs(request.clone()));
        if self.fail_prepare {
            return Err(EngineError::Preparation(format!(
                "no chain '{}' in {}",
                request.chain, request.pdb
            )));
        }
        let binder_len = match self.protocol {
            Protocol::Binder => self.binder_len_override.unwrap_or(request.binder_len),
            _ => 0,
        };
        let residue_index = ChainLayout::new(self.target_len, binder_len).residue_index();
        PreparedInputs::new(self.protocol, self.target_len, binder_len, residue_index)
    }

    fn set_offset(&mut self, offset: &OffsetMatrix) -> Result<(), EngineError> {
        self.calls.push(Call::SetOffset(offset.clone()));
        Ok(())
    }

    fn restart(&mut self, seed: Option<&str>) -> Result<(), EngineError> {
        self.calls.push(Call::Restart(seed.map(str::to_string)));
        Ok(())
    }

    fn set_optimizer(&mut self, settings: &GdSettings) -> Result<(), EngineError> {
        self.calls.push(Call::SetOptimizer(*settings));
        Ok(())
    }

    fn model_names(&mut self) -> Result<Vec<String>, EngineError> {
        self.calls.push(Call::ModelNames);
        Ok(self.models.clone())
    }

    fn run_step(&mut self, step: &DesignStep, flags: &DesignFlags) -> Result<(), EngineError> {
        self.calls.push(Call::RunStep(step.clone(), flags.clone()));
        Ok(())
    }

    fn save_pdb(&mut self, path: &Path) -> Result<(), EngineError> {
        self.calls.push(Call::SavePdb(path.to_path_buf()));
        let index = self.saves;
        self.saves += 1;
        if self.fail_on_save == Some(index) {
            return Err(EngineError::Internal(format!(
                "disk full while writing {}",
                path.display()
            )));
        }
        Ok(())
    }

    fn best_log(&mut self) -> Result<Option<TrialLog>, EngineError> {
        self.calls.push(Call::BestLog);
        if self.saves == 0 {
            return Ok(None);
        }
        Ok(Some(TrialLog::new(BTreeMap::from([
            ("loss".to_string(), 0.42),
            ("plddt".to_string(), 0.88),
        ]))))
    }
}
