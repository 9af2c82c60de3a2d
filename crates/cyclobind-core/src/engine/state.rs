use crate::core::offset::SignConvention;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Metrics the engine records for a design (loss, pLDDT, interface pTM, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialLog(BTreeMap<String, f64>);

impl TrialLog {
    pub fn new(metrics: BTreeMap<String, f64>) -> Self {
        Self(metrics)
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.0.get(metric).copied()
    }

    pub fn loss(&self) -> Option<f64> {
        self.get("loss")
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}

impl fmt::Display for TrialLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={:.3}", name, value)?;
        }
        Ok(())
    }
}

/// How the binder's relative positions were encoded for a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetStatus {
    Cyclic(SignConvention),
    Linear,
    Skipped { reason: String },
}

impl fmt::Display for OffsetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetStatus::Cyclic(convention) => write!(f, "cyclic ({})", convention),
            OffsetStatus::Linear => f.write_str("linear"),
            OffsetStatus::Skipped { reason } => write!(f, "cyclic skipped ({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub index: usize,
    pub output_path: PathBuf,
    pub offset: OffsetStatus,
    pub reused_preparation: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignReport {
    pub trials: Vec<TrialOutcome>,
    pub best_log: Option<TrialLog>,
}
