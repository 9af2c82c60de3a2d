use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "cyclobind - Hallucinate cyclic peptide binders against a target structure with a structure-prediction engine.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Design cyclic peptide binders against a target chain.
    Design(DesignArgs),
    /// Export the cyclic relative-position offset of a target/binder complex as CSV.
    Offset(OffsetArgs),
    /// Manage the location of the AlphaFold parameter directory.
    Params(ParamsArgs),
}

/// Arguments for the `design` subcommand.
#[derive(Args, Debug)]
pub struct DesignArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Target ---
    /// Target structure: a PDB file path, or a PDB/UniProt code the engine can fetch.
    #[arg(long, value_name = "PATH_OR_CODE")]
    pub pdb: Option<String>,

    /// Target chain id(s), e.g. 'A' or 'A,B'.
    #[arg(long, value_name = "ID")]
    pub chain: Option<String>,

    /// Restrict the interface loss to these target residues, e.g. '36,37,39-42'.
    #[arg(long, value_name = "LIST")]
    pub hotspot: Option<String>,

    #[command(flatten)]
    pub target_flexibility: TargetFlexibility,

    // --- Binder ---
    /// Number of binder residues to hallucinate.
    #[arg(short = 'l', long, value_name = "INT")]
    pub binder_len: Option<usize>,

    /// Starting binder sequence. Its length replaces --binder-len.
    #[arg(long, value_name = "SEQ")]
    pub seed_sequence: Option<String>,

    /// Keep the linear relative-position offset instead of closing the binder into a ring.
    #[arg(long)]
    pub linear: bool,

    /// Use the legacy sign convention for the cyclic offset.
    #[arg(long, conflicts_with = "linear")]
    pub legacy_offset: bool,

    // --- Model ---
    #[command(flatten)]
    pub multimer: MultimerWeights,

    /// Number of recycles per prediction.
    #[arg(long, value_name = "INT")]
    pub num_recycles: Option<u32>,

    /// How recycles are handled: average, first, last, sample or backprop.
    #[arg(long, value_name = "MODE")]
    pub recycle_mode: Option<String>,

    /// Number of model parameter sets to design with: 1 to 5, or 'all'.
    #[arg(short = 'm', long, value_name = "N|all")]
    pub num_models: Option<String>,

    /// Directory holding the AlphaFold parameters. Overrides the configured location.
    #[arg(long, value_name = "PATH")]
    pub params_dir: Option<PathBuf>,

    // --- Optimizer ---
    /// Sequence optimizer, e.g. 'mcmc', 'pssm_semigreedy' or '3stage'.
    #[arg(long, value_name = "NAME")]
    pub optimizer: Option<String>,

    /// Gradient-descent method used by gradient-based optimizers, e.g. 'sgd' or 'adam'.
    #[arg(long, value_name = "NAME")]
    pub gd_method: Option<String>,

    /// Learning rate of the gradient-descent method.
    #[arg(long, value_name = "FLOAT")]
    pub learning_rate: Option<f64>,

    /// Disable sequence gradient normalization.
    #[arg(long)]
    pub no_norm_seq_grad: bool,

    /// Disable dropout during design.
    #[arg(long)]
    pub no_dropout: bool,

    // --- Run ---
    /// Number of independent design trials.
    #[arg(short = 'n', long, value_name = "INT")]
    pub trials: Option<usize>,

    /// Output path pattern; '{n}' is replaced by the trial number.
    #[arg(short, long, value_name = "PATTERN")]
    pub output_pattern: Option<String>,

    /// Command that starts the engine bridge process, e.g. 'python3 bridge.py'.
    #[arg(long, value_name = "COMMAND")]
    pub engine: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S run.trials=5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive flags controlling whether the target backbone may move.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = false, multiple = false)]
pub struct TargetFlexibility {
    /// Let the target backbone flex by hiding its sequence from the model.
    #[arg(long)]
    pub flexible: bool,
    /// Keep the target sequence, holding its backbone near the input.
    #[arg(long)]
    pub rigid: bool,
}

/// Mutually exclusive flags selecting the model weights.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = false, multiple = false)]
pub struct MultimerWeights {
    /// Use AlphaFold-Multimer weights.
    #[arg(long)]
    pub multimer: bool,
    /// Use monomer (ptm) weights.
    #[arg(long)]
    pub no_multimer: bool,
}

/// Arguments for the `offset` subcommand.
#[derive(Args, Debug)]
pub struct OffsetArgs {
    /// Number of target residues preceding the binder.
    #[arg(short, long, default_value_t = 0, value_name = "INT")]
    pub target_len: usize,

    /// Number of binder residues closed into a ring.
    #[arg(short, long, required = true, value_name = "INT")]
    pub binder_len: usize,

    /// Use the legacy sign convention.
    #[arg(long)]
    pub legacy: bool,

    /// Write only the binder-binder block.
    #[arg(long)]
    pub binder_only: bool,

    /// Output CSV file. Writes to stdout when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `params` subcommand.
#[derive(Args, Debug)]
pub struct ParamsArgs {
    #[command(subcommand)]
    pub command: ParamsCommands,
}

/// Available commands for parameter directory management.
#[derive(Subcommand, Debug)]
pub enum ParamsCommands {
    /// Show the absolute path to the AlphaFold parameter directory.
    Path,
    /// Set a custom path for the AlphaFold parameter directory.
    SetPath {
        /// The directory holding the parameter files.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the parameter directory to its default, OS-specific location.
    ResetPath,
}
