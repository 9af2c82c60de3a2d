mod defaults;
mod models;

pub use defaults::DefaultsConfig;
pub use models::AppConfig;

use crate::cli::{DesignArgs, MultimerWeights, TargetFlexibility};
use crate::error::{CliError, Result};
use crate::params::ParamsLocator;
use crate::utils::parser;
use cyclobind::core::hotspot::HotspotSpec;
use cyclobind::core::offset::SignConvention;
use cyclobind::core::sequence::SeedSequence;
use cyclobind::engine::config::{DesignConfigBuilder, GdMethod, RecycleMode};
use cyclobind::engine::strategy::OptimizerKind;
use serde::Deserialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialTargetConfig {
    pdb: Option<String>,
    chain: Option<String>,
    hotspot: Option<String>,
    flexible: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialBinderConfig {
    length: Option<usize>,
    seed_sequence: Option<String>,
    cyclic: Option<bool>,
    sign_convention: Option<SignConvention>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum PartialModelCount {
    Count(usize),
    Named(String),
}

impl PartialModelCount {
    fn resolve(&self) -> Result<usize> {
        let parsed = match self {
            PartialModelCount::Count(n) => parser::parse_num_models(&n.to_string()),
            PartialModelCount::Named(name) => parser::parse_num_models(name),
        };
        parsed.map_err(|e| CliError::Config(e.to_string()))
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialModelConfig {
    use_multimer: Option<bool>,
    num_recycles: Option<u32>,
    recycle_mode: Option<RecycleMode>,
    num_models: Option<PartialModelCount>,
    params_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOptimizerConfig {
    kind: Option<OptimizerKind>,
    gd_method: Option<GdMethod>,
    learning_rate: Option<f64>,
    norm_seq_grad: Option<bool>,
    dropout: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialRunConfig {
    trials: Option<usize>,
    output_pattern: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialEngineConfig {
    command: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialDesignConfig {
    target: Option<PartialTargetConfig>,
    binder: Option<PartialBinderConfig>,
    model: Option<PartialModelConfig>,
    optimizer: Option<PartialOptimizerConfig>,
    run: Option<PartialRunConfig>,
    engine: Option<PartialEngineConfig>,
}

impl PartialDesignConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(
        mut self,
        args: &DesignArgs,
        params_locator: &ParamsLocator,
    ) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let target = self.target.take().unwrap_or_default();
        let binder = self.binder.take().unwrap_or_default();
        let model = self.model.take().unwrap_or_default();
        let optimizer = self.optimizer.take().unwrap_or_default();
        let run = self.run.take().unwrap_or_default();
        let engine = self.engine.take().unwrap_or_default();

        let hotspot = match args.hotspot.as_ref().or(target.hotspot.as_ref()) {
            Some(raw) => HotspotSpec::parse(raw).map_err(|e| CliError::Config(e.to_string()))?,
            None => None,
        };
        let seed = match args.seed_sequence.as_ref().or(binder.seed_sequence.as_ref()) {
            Some(raw) => {
                SeedSequence::sanitize(raw).map_err(|e| CliError::Config(e.to_string()))?
            }
            None => None,
        };

        let sign_convention = if args.legacy_offset {
            SignConvention::Legacy
        } else {
            binder.sign_convention.unwrap_or_default()
        };
        let cyclic = !args.linear && binder.cyclic.unwrap_or(defaults.cyclic);

        let recycle_mode = match &args.recycle_mode {
            Some(raw) => parse_value("model.recycle-mode", raw)?,
            None => model.recycle_mode.unwrap_or_default(),
        };
        let num_models = match &args.num_models {
            Some(raw) => {
                parser::parse_num_models(raw).map_err(|e| CliError::Argument(e.to_string()))?
            }
            None => match &model.num_models {
                Some(count) => count.resolve()?,
                None => defaults.num_models,
            },
        };
        let params_dir =
            params_locator.resolve(args.params_dir.as_deref().or(model.params_dir.as_deref()))?;

        let optimizer_kind = match &args.optimizer {
            Some(raw) => parse_value("optimizer.kind", raw)?,
            None => optimizer.kind.unwrap_or_default(),
        };
        let gd_method = match &args.gd_method {
            Some(raw) => parse_value("optimizer.gd-method", raw)?,
            None => optimizer.gd_method.unwrap_or_default(),
        };
        let norm_seq_grad = !args.no_norm_seq_grad
            && optimizer.norm_seq_grad.unwrap_or(defaults.norm_seq_grad);
        let dropout = !args.no_dropout && optimizer.dropout.unwrap_or(defaults.dropout);

        let engine_command = args
            .engine
            .as_ref()
            .or(engine.command.as_ref())
            .unwrap_or(&defaults.engine_command);
        let engine = parser::parse_engine_command(engine_command)
            .map_err(|e| CliError::Argument(e.to_string()))?;

        let mut builder = DesignConfigBuilder::new()
            .chain(
                args.chain
                    .clone()
                    .or(target.chain)
                    .unwrap_or(defaults.chain),
            )
            .hotspot(hotspot)
            .flexible(Self::merge_flexible(args.target_flexibility, target.flexible))
            .binder_len(args.binder_len.or(binder.length).unwrap_or(defaults.binder_len))
            .seed(seed)
            .cyclic(cyclic)
            .sign_convention(sign_convention)
            .use_multimer(Self::merge_multimer(
                args.multimer,
                model.use_multimer,
                defaults.use_multimer,
            ))
            .num_recycles(
                args.num_recycles
                    .or(model.num_recycles)
                    .unwrap_or(defaults.num_recycles),
            )
            .recycle_mode(recycle_mode)
            .num_models(num_models)
            .params_dir(params_dir)
            .optimizer(optimizer_kind)
            .gd_method(gd_method)
            .learning_rate(
                args.learning_rate
                    .or(optimizer.learning_rate)
                    .unwrap_or(defaults.learning_rate),
            )
            .norm_seq_grad(norm_seq_grad)
            .dropout(dropout)
            .trials(args.trials.or(run.trials).unwrap_or(defaults.trials))
            .output_pattern(
                args.output_pattern
                    .clone()
                    .or(run.output_pattern)
                    .unwrap_or(defaults.output_pattern),
            );
        if let Some(pdb) = args.pdb.clone().or(target.pdb) {
            builder = builder.pdb(pdb);
        }

        let core_config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(AppConfig {
            core_config,
            engine,
        })
    }

    fn merge_flexible(cli_flags: TargetFlexibility, file_val: Option<bool>) -> bool {
        if cli_flags.flexible {
            true
        } else if cli_flags.rigid {
            false
        } else {
            file_val.unwrap_or(false)
        }
    }

    fn merge_multimer(cli_flags: MultimerWeights, file_val: Option<bool>, default: bool) -> bool {
        if cli_flags.multimer {
            true
        } else if cli_flags.no_multimer {
            false
        } else {
            file_val.unwrap_or(default)
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "target.pdb" => {
                    self.target.get_or_insert_with(Default::default).pdb = Some(value_str.to_string());
                }
                "target.chain" => {
                    self.target.get_or_insert_with(Default::default).chain = Some(value_str.to_string());
                }
                "target.hotspot" => {
                    self.target.get_or_insert_with(Default::default).hotspot = Some(value_str.to_string());
                }
                "target.flexible" => {
                    self.target.get_or_insert_with(Default::default).flexible =
                        Some(parse_value(key, value_str)?);
                }
                "binder.length" => {
                    self.binder.get_or_insert_with(Default::default).length =
                        Some(parse_value(key, value_str)?);
                }
                "binder.seed-sequence" => {
                    self.binder.get_or_insert_with(Default::default).seed_sequence =
                        Some(value_str.to_string());
                }
                "binder.cyclic" => {
                    self.binder.get_or_insert_with(Default::default).cyclic =
                        Some(parse_value(key, value_str)?);
                }
                "binder.sign-convention" => {
                    self.binder.get_or_insert_with(Default::default).sign_convention =
                        Some(parse_value(key, value_str)?);
                }
                "model.use-multimer" => {
                    self.model.get_or_insert_with(Default::default).use_multimer =
                        Some(parse_value(key, value_str)?);
                }
                "model.num-recycles" => {
                    self.model.get_or_insert_with(Default::default).num_recycles =
                        Some(parse_value(key, value_str)?);
                }
                "model.recycle-mode" => {
                    self.model.get_or_insert_with(Default::default).recycle_mode =
                        Some(parse_value(key, value_str)?);
                }
                "model.num-models" => {
                    self.model.get_or_insert_with(Default::default).num_models =
                        Some(PartialModelCount::Named(value_str.to_string()));
                }
                "model.params-dir" => {
                    self.model.get_or_insert_with(Default::default).params_dir =
                        Some(PathBuf::from(value_str));
                }
                "optimizer.kind" => {
                    self.optimizer.get_or_insert_with(Default::default).kind =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.gd-method" => {
                    self.optimizer.get_or_insert_with(Default::default).gd_method =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.learning-rate" => {
                    self.optimizer.get_or_insert_with(Default::default).learning_rate =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.norm-seq-grad" => {
                    self.optimizer.get_or_insert_with(Default::default).norm_seq_grad =
                        Some(parse_value(key, value_str)?);
                }
                "optimizer.dropout" => {
                    self.optimizer.get_or_insert_with(Default::default).dropout =
                        Some(parse_value(key, value_str)?);
                }
                "run.trials" => {
                    self.run.get_or_insert_with(Default::default).trials = Some(parse_value(key, value_str)?);
                }
                "run.output-pattern" => {
                    self.run.get_or_insert_with(Default::default).output_pattern =
                        Some(value_str.to_string());
                }
                "engine.command" => {
                    self.engine.get_or_insert_with(Default::default).command =
                        Some(value_str.to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid value for {}: '{}' ({})", key, value, e)))
}
