use crate::engine::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sequence optimizers offered by the engine, selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OptimizerKind {
    /// Designed PSSM biases a semi-greedy search.
    #[serde(rename = "pssm_semigreedy")]
    PssmSemigreedy,
    /// Gradient descent through logits, then soft, then hard sequence inputs.
    #[serde(rename = "3stage")]
    ThreeStage,
    /// Random mutations accepted when the loss decreases.
    #[serde(rename = "semigreedy")]
    Semigreedy,
    /// Logits then soft optimization, yielding a sequence profile.
    #[serde(rename = "pssm")]
    Pssm,
    #[serde(rename = "logits")]
    Logits,
    #[serde(rename = "soft")]
    Soft,
    #[serde(rename = "hard")]
    Hard,
    /// Markov-chain Monte Carlo sampling.
    #[default]
    #[serde(rename = "mcmc")]
    Mcmc,
}

impl OptimizerKind {
    pub const ALL: [OptimizerKind; 8] = [
        OptimizerKind::PssmSemigreedy,
        OptimizerKind::ThreeStage,
        OptimizerKind::Semigreedy,
        OptimizerKind::Pssm,
        OptimizerKind::Logits,
        OptimizerKind::Soft,
        OptimizerKind::Hard,
        OptimizerKind::Mcmc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizerKind::PssmSemigreedy => "pssm_semigreedy",
            OptimizerKind::ThreeStage => "3stage",
            OptimizerKind::Semigreedy => "semigreedy",
            OptimizerKind::Pssm => "pssm",
            OptimizerKind::Logits => "logits",
            OptimizerKind::Soft => "soft",
            OptimizerKind::Hard => "hard",
            OptimizerKind::Mcmc => "mcmc",
        }
    }

    /// Outputs of these optimizers are not one-hot and need redesign before use.
    pub fn yields_continuous_sequence(&self) -> bool {
        matches!(
            self,
            OptimizerKind::Pssm | OptimizerKind::Logits | OptimizerKind::Soft
        )
    }

    /// Expands the optimizer into the engine calls that run it.
    ///
    /// `base` carries the shared flags; `num_models` is the size of the final model
    /// subset used by multi-stage plans.
    pub fn plan(&self, base: &DesignFlags, num_models: usize) -> Vec<StagedStep> {
        let staged = |step: DesignStep| StagedStep {
            step,
            flags: base.clone(),
        };

        match self {
            OptimizerKind::ThreeStage => vec![staged(DesignStep::ThreeStage {
                soft_iters: 120,
                temp_iters: 60,
                hard_iters: 10,
            })],
            OptimizerKind::PssmSemigreedy => vec![staged(DesignStep::PssmSemigreedy {
                soft_iters: 120,
                hard_iters: 32,
            })],
            OptimizerKind::Semigreedy => vec![staged(DesignStep::PssmSemigreedy {
                soft_iters: 0,
                hard_iters: 32,
            })],
            OptimizerKind::Mcmc => vec![staged(DesignStep::Mcmc)],
            OptimizerKind::Pssm => {
                let mut final_flags = base.clone();
                final_flags.dropout = false;
                final_flags.save_best = true;
                vec![
                    staged(DesignStep::Logits {
                        iters: 120,
                        e_soft: Some(1.0),
                        num_models: Some(1),
                        ramp_recycles: true,
                    }),
                    staged(DesignStep::Soft {
                        iters: 32,
                        num_models: Some(1),
                    }),
                    StagedStep {
                        step: DesignStep::Soft {
                            iters: 10,
                            num_models: Some(num_models),
                        },
                        flags: final_flags,
                    },
                ]
            }
            OptimizerKind::Logits => vec![staged(DesignStep::Logits {
                iters: 120,
                e_soft: None,
                num_models: None,
                ramp_recycles: false,
            })],
            OptimizerKind::Soft => vec![staged(DesignStep::Soft {
                iters: 120,
                num_models: None,
            })],
            OptimizerKind::Hard => vec![staged(DesignStep::Hard { iters: 120 })],
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizerKind {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        OptimizerKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ConfigError::InvalidValue {
                parameter: "optimizer",
                reason: format!("unknown optimizer '{}'", s),
            })
    }
}

/// One engine-side design routine with its iteration budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DesignStep {
    #[serde(rename = "design_3stage")]
    ThreeStage {
        soft_iters: u32,
        temp_iters: u32,
        hard_iters: u32,
    },
    #[serde(rename = "design_pssm_semigreedy")]
    PssmSemigreedy { soft_iters: u32, hard_iters: u32 },
    #[serde(rename = "design_logits")]
    Logits {
        iters: u32,
        e_soft: Option<f64>,
        num_models: Option<usize>,
        ramp_recycles: bool,
    },
    #[serde(rename = "design_soft")]
    Soft {
        iters: u32,
        num_models: Option<usize>,
    },
    #[serde(rename = "design_hard")]
    Hard { iters: u32 },
    #[serde(rename = "design_mcmc")]
    Mcmc,
}

impl DesignStep {
    pub fn name(&self) -> &'static str {
        match self {
            DesignStep::ThreeStage { .. } => "design_3stage",
            DesignStep::PssmSemigreedy { .. } => "design_pssm_semigreedy",
            DesignStep::Logits { .. } => "design_logits",
            DesignStep::Soft { .. } => "design_soft",
            DesignStep::Hard { .. } => "design_hard",
            DesignStep::Mcmc => "design_mcmc",
        }
    }
}

/// Flags shared by every design routine of a trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignFlags {
    pub num_recycles: u32,
    pub models: Vec<String>,
    pub dropout: bool,
    pub save_best: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedStep {
    pub step: DesignStep,
    pub flags: DesignFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> DesignFlags {
        DesignFlags {
            num_recycles: 6,
            models: vec!["model_1_multimer_v3".to_string()],
            dropout: true,
            save_best: false,
        }
    }

    #[test]
    fn mcmc_plans_a_single_sampling_step() {
        let plan = OptimizerKind::Mcmc.plan(&flags(), 1);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].step, DesignStep::Mcmc);
        assert_eq!(plan[0].flags, flags());
    }

    #[test]
    fn semigreedy_skips_the_soft_phase() {
        let plan = OptimizerKind::Semigreedy.plan(&flags(), 1);
        assert_eq!(
            plan[0].step,
            DesignStep::PssmSemigreedy {
                soft_iters: 0,
                hard_iters: 32
            }
        );
    }

    #[test]
    fn pssm_plan_ends_without_dropout_and_saves_best() {
        let plan = OptimizerKind::Pssm.plan(&flags(), 3);
        assert_eq!(plan.len(), 3);
        assert!(plan[0].flags.dropout && plan[1].flags.dropout);
        let last = &plan[2];
        assert!(!last.flags.dropout);
        assert!(last.flags.save_best);
        assert_eq!(
            last.step,
            DesignStep::Soft {
                iters: 10,
                num_models: Some(3)
            }
        );
    }

    #[test]
    fn every_optimizer_has_a_non_empty_plan() {
        for kind in OptimizerKind::ALL {
            assert!(!kind.plan(&flags(), 1).is_empty(), "{kind}");
        }
    }

    #[test]
    fn optimizer_kind_parses_its_own_names() {
        for kind in OptimizerKind::ALL {
            assert_eq!(kind.as_str().parse::<OptimizerKind>().unwrap(), kind);
        }
        assert_eq!(
            "pssm-semigreedy".parse::<OptimizerKind>().unwrap(),
            OptimizerKind::PssmSemigreedy
        );
        assert!("annealing".parse::<OptimizerKind>().is_err());
    }

    #[test]
    fn design_step_serializes_with_strategy_tag() {
        let json = serde_json::to_value(DesignStep::PssmSemigreedy {
            soft_iters: 120,
            hard_iters: 32,
        })
        .unwrap();
        assert_eq!(json["strategy"], "design_pssm_semigreedy");
        assert_eq!(json["soft_iters"], 120);
    }
}
