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
    version,
    about = "kspace CLI - reciprocal-space Ewald energies for periodic charged configurations.",
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
    /// Compute the reciprocal-space Ewald energy of a configuration.
    Energy(EnergyArgs),
    /// Resolve alpha and the wave-number maxima without computing energies.
    Params(ParamsArgs),
}

/// Inputs shared by every command.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the XYZ coordinate file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,
}

/// Command-line overrides of the `[ewald]` section.
///
/// Giving any of `--kmax-squared`, `--kxmax/--kymax/--kzmax` or `--tolerance`
/// replaces the cutoff choice of the config file as a whole.
#[derive(Args, Debug, Clone, Default)]
pub struct EwaldOverrides {
    /// Override the Ewald splitting parameter.
    #[arg(short, long, value_name = "FLOAT")]
    pub alpha: Option<f64>,

    /// Override the dimensionless cutoff, in units of (2π/L)².
    #[arg(short = 'k', long, value_name = "INT")]
    pub kmax_squared: Option<u32>,

    /// Override the maximum wave number along x.
    #[arg(long, value_name = "INT")]
    pub kxmax: Option<i32>,

    /// Override the maximum wave number along y.
    #[arg(long, value_name = "INT")]
    pub kymax: Option<i32>,

    /// Override the maximum wave number along z.
    #[arg(long, value_name = "INT")]
    pub kzmax: Option<i32>,

    /// Derive alpha and the maxima from a target relative accuracy.
    #[arg(short, long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,
}

impl EwaldOverrides {
    pub fn selects_cutoff(&self) -> bool {
        self.kmax_squared.is_some()
            || self.kxmax.is_some()
            || self.kymax.is_some()
            || self.kzmax.is_some()
            || self.tolerance.is_some()
    }
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub ewald: EwaldOverrides,

    /// Write a checkpoint of the committed engine state to this path.
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    /// Run a full consistency check after the energy is committed.
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the `params` subcommand.
#[derive(Args, Debug)]
pub struct ParamsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub ewald: EwaldOverrides,
}
