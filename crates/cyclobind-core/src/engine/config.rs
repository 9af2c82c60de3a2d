use crate::core::hotspot::HotspotSpec;
use crate::core::offset::SignConvention;
use crate::core::sequence::SeedSequence;
use crate::engine::protocol::PrepRequest;
use crate::engine::strategy::OptimizerKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Number of trained parameter sets shipped with AlphaFold.
pub const MAX_MODELS: usize = 5;

/// Placeholder replaced by the trial index in output paths.
pub const TRIAL_PLACEHOLDER: &str = "{n}";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecycleMode {
    Average,
    First,
    Last,
    #[default]
    Sample,
    Backprop,
}

impl FromStr for RecycleMode {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "average" => Ok(RecycleMode::Average),
            "first" => Ok(RecycleMode::First),
            "last" => Ok(RecycleMode::Last),
            "sample" => Ok(RecycleMode::Sample),
            "backprop" => Ok(RecycleMode::Backprop),
            other => Err(ConfigError::InvalidValue {
                parameter: "recycle-mode",
                reason: format!("unknown mode '{}'", other),
            }),
        }
    }
}

/// Gradient-descent optimizers understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GdMethod {
    Adabelief,
    Adafactor,
    Adagrad,
    Adam,
    Adamw,
    Fromage,
    Lamb,
    Lars,
    NoisySgd,
    Dpsgd,
    Radam,
    Rmsprop,
    #[default]
    Sgd,
    Sm3,
    Yogi,
}

impl GdMethod {
    pub const ALL: [GdMethod; 15] = [
        GdMethod::Adabelief,
        GdMethod::Adafactor,
        GdMethod::Adagrad,
        GdMethod::Adam,
        GdMethod::Adamw,
        GdMethod::Fromage,
        GdMethod::Lamb,
        GdMethod::Lars,
        GdMethod::NoisySgd,
        GdMethod::Dpsgd,
        GdMethod::Radam,
        GdMethod::Rmsprop,
        GdMethod::Sgd,
        GdMethod::Sm3,
        GdMethod::Yogi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GdMethod::Adabelief => "adabelief",
            GdMethod::Adafactor => "adafactor",
            GdMethod::Adagrad => "adagrad",
            GdMethod::Adam => "adam",
            GdMethod::Adamw => "adamw",
            GdMethod::Fromage => "fromage",
            GdMethod::Lamb => "lamb",
            GdMethod::Lars => "lars",
            GdMethod::NoisySgd => "noisy_sgd",
            GdMethod::Dpsgd => "dpsgd",
            GdMethod::Radam => "radam",
            GdMethod::Rmsprop => "rmsprop",
            GdMethod::Sgd => "sgd",
            GdMethod::Sm3 => "sm3",
            GdMethod::Yogi => "yogi",
        }
    }
}

impl fmt::Display for GdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GdMethod {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        GdMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ConfigError::InvalidValue {
                parameter: "gd-method",
                reason: format!("unknown optimizer '{}'", s),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    pub pdb: String,
    pub chain: String,
    pub hotspot: Option<HotspotSpec>,
    pub flexible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinderConfig {
    pub length: usize,
    pub seed: Option<SeedSequence>,
    pub cyclic: bool,
    pub sign_convention: SignConvention,
}

impl BinderConfig {
    /// A seed sequence fixes the binder length to its own length.
    pub fn effective_len(&self) -> usize {
        self.seed.as_ref().map_or(self.length, SeedSequence::len)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub use_multimer: bool,
    pub num_recycles: u32,
    pub recycle_mode: RecycleMode,
    pub num_models: usize,
    pub params_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GdSettings {
    pub method: GdMethod,
    pub learning_rate: f64,
    pub norm_seq_grad: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub kind: OptimizerKind,
    pub gd: GdSettings,
    pub dropout: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub trials: usize,
    pub output_pattern: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignConfig {
    pub target: TargetConfig,
    pub binder: BinderConfig,
    pub model: ModelConfig,
    pub optimizer: OptimizerConfig,
    pub run: RunConfig,
}

impl DesignConfig {
    pub fn prep_request(&self) -> PrepRequest {
        PrepRequest {
            pdb: self.target.pdb.clone(),
            chain: self.target.chain.clone(),
            binder_len: self.binder.effective_len(),
            hotspot: self.target.hotspot.clone(),
            use_multimer: self.model.use_multimer,
            rm_target_seq: self.target.flexible,
        }
    }

    pub fn output_path(&self, trial: usize) -> PathBuf {
        PathBuf::from(
            self.run
                .output_pattern
                .replace(TRIAL_PLACEHOLDER, &trial.to_string()),
        )
    }
}

#[derive(Default)]
pub struct DesignConfigBuilder {
    pdb: Option<String>,
    chain: Option<String>,
    hotspot: Option<HotspotSpec>,
    flexible: Option<bool>,
    binder_len: Option<usize>,
    seed: Option<SeedSequence>,
    cyclic: Option<bool>,
    sign_convention: Option<SignConvention>,
    use_multimer: Option<bool>,
    num_recycles: Option<u32>,
    recycle_mode: Option<RecycleMode>,
    num_models: Option<usize>,
    params_dir: Option<PathBuf>,
    optimizer: Option<OptimizerKind>,
    gd_method: Option<GdMethod>,
    learning_rate: Option<f64>,
    norm_seq_grad: Option<bool>,
    dropout: Option<bool>,
    trials: Option<usize>,
    output_pattern: Option<String>,
}

impl DesignConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pdb(mut self, pdb: impl Into<String>) -> Self {
        self.pdb = Some(pdb.into());
        self
    }
    pub fn chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }
    pub fn hotspot(mut self, hotspot: Option<HotspotSpec>) -> Self {
        self.hotspot = hotspot;
        self
    }
    pub fn flexible(mut self, flexible: bool) -> Self {
        self.flexible = Some(flexible);
        self
    }
    pub fn binder_len(mut self, len: usize) -> Self {
        self.binder_len = Some(len);
        self
    }
    pub fn seed(mut self, seed: Option<SeedSequence>) -> Self {
        self.seed = seed;
        self
    }
    pub fn cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = Some(cyclic);
        self
    }
    pub fn sign_convention(mut self, convention: SignConvention) -> Self {
        self.sign_convention = Some(convention);
        self
    }
    pub fn use_multimer(mut self, use_multimer: bool) -> Self {
        self.use_multimer = Some(use_multimer);
        self
    }
    pub fn num_recycles(mut self, n: u32) -> Self {
        self.num_recycles = Some(n);
        self
    }
    pub fn recycle_mode(mut self, mode: RecycleMode) -> Self {
        self.recycle_mode = Some(mode);
        self
    }
    pub fn num_models(mut self, n: usize) -> Self {
        self.num_models = Some(n);
        self
    }
    pub fn params_dir(mut self, path: PathBuf) -> Self {
        self.params_dir = Some(path);
        self
    }
    pub fn optimizer(mut self, kind: OptimizerKind) -> Self {
        self.optimizer = Some(kind);
        self
    }
    pub fn gd_method(mut self, method: GdMethod) -> Self {
        self.gd_method = Some(method);
        self
    }
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = Some(rate);
        self
    }
    pub fn norm_seq_grad(mut self, enabled: bool) -> Self {
        self.norm_seq_grad = Some(enabled);
        self
    }
    pub fn dropout(mut self, enabled: bool) -> Self {
        self.dropout = Some(enabled);
        self
    }
    pub fn trials(mut self, n: usize) -> Self {
        self.trials = Some(n);
        self
    }
    pub fn output_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.output_pattern = Some(pattern.into());
        self
    }

    pub fn build(self) -> Result<DesignConfig, ConfigError> {
        let pdb = self.pdb.ok_or(ConfigError::MissingParameter("pdb"))?;
        if pdb.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "pdb",
                reason: "must not be empty".to_string(),
            });
        }
        let chain = self.chain.ok_or(ConfigError::MissingParameter("chain"))?;
        if chain.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "chain",
                reason: "must not be empty".to_string(),
            });
        }

        let binder = BinderConfig {
            length: self
                .binder_len
                .ok_or(ConfigError::MissingParameter("binder_len"))?,
            seed: self.seed,
            cyclic: self.cyclic.ok_or(ConfigError::MissingParameter("cyclic"))?,
            sign_convention: self.sign_convention.unwrap_or_default(),
        };
        if binder.effective_len() == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "binder_len",
                reason: "must be a positive integer".to_string(),
            });
        }

        let num_models = self
            .num_models
            .ok_or(ConfigError::MissingParameter("num_models"))?;
        if !(1..=MAX_MODELS).contains(&num_models) {
            return Err(ConfigError::InvalidValue {
                parameter: "num_models",
                reason: format!("must be between 1 and {}, got {}", MAX_MODELS, num_models),
            });
        }
        let model = ModelConfig {
            use_multimer: self
                .use_multimer
                .ok_or(ConfigError::MissingParameter("use_multimer"))?,
            num_recycles: self
                .num_recycles
                .ok_or(ConfigError::MissingParameter("num_recycles"))?,
            recycle_mode: self.recycle_mode.unwrap_or_default(),
            num_models,
            params_dir: self
                .params_dir
                .ok_or(ConfigError::MissingParameter("params_dir"))?,
        };

        let learning_rate = self
            .learning_rate
            .ok_or(ConfigError::MissingParameter("learning_rate"))?;
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(ConfigError::InvalidValue {
                parameter: "learning_rate",
                reason: format!("must be a positive finite number, got {}", learning_rate),
            });
        }
        let optimizer = OptimizerConfig {
            kind: self
                .optimizer
                .ok_or(ConfigError::MissingParameter("optimizer"))?,
            gd: GdSettings {
                method: self.gd_method.unwrap_or_default(),
                learning_rate,
                norm_seq_grad: self
                    .norm_seq_grad
                    .ok_or(ConfigError::MissingParameter("norm_seq_grad"))?,
            },
            dropout: self.dropout.ok_or(ConfigError::MissingParameter("dropout"))?,
        };

        let trials = self.trials.ok_or(ConfigError::MissingParameter("trials"))?;
        if trials == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "trials",
                reason: "at least one trial is required".to_string(),
            });
        }
        let output_pattern = self
            .output_pattern
            .ok_or(ConfigError::MissingParameter("output_pattern"))?;
        if trials > 1 && !output_pattern.contains(TRIAL_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                parameter: "output_pattern",
                reason: format!(
                    "'{}' lacks the {} placeholder, so {} trials would overwrite each other",
                    output_pattern, TRIAL_PLACEHOLDER, trials
                ),
            });
        }

        Ok(DesignConfig {
            target: TargetConfig {
                pdb,
                chain,
                hotspot: self.hotspot,
                flexible: self.flexible.unwrap_or(false),
            },
            binder,
            model,
            optimizer,
            run: RunConfig {
                trials,
                output_pattern,
            },
        })
    }
}
