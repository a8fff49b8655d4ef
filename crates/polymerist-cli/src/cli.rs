use clap::{Args, Parser, Subcommand, ValueEnum};
use polymerist::core::environment::InstalledFormat;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "polymerist - build linear polymer structures from monomer fragments, analyze their trajectories, and manage conda environment manifests.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate, merge and audit conda environment manifests.
    Env(EnvArgs),
    /// Build a linear polymer chain from a monomer group and write it as PDB.
    Build(BuildArgs),
    /// Compute time series properties and radial distribution functions for a trajectory.
    Analyze(AnalyzeArgs),
}

/// Arguments for the `env` subcommand.
#[derive(Args, Debug)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommands,
}

#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// Check that a manifest parses and is internally consistent.
    Check {
        #[arg(required = true, value_name = "MANIFEST")]
        manifest: PathBuf,
    },
    /// Union several manifests into one.
    Merge {
        #[arg(required = true, num_args = 1.., value_name = "MANIFEST")]
        manifests: Vec<PathBuf>,

        /// Path for the merged manifest.
        #[arg(short, long, required = true, value_name = "PATH")]
        output: PathBuf,

        /// Name for the merged environment. Defaults to the first manifest's name.
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },
    /// Compare a manifest against an installed package listing.
    Audit {
        #[arg(required = true, value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Output of `conda list --export` or `pip freeze`.
        #[arg(long, required = true, value_name = "FILE")]
        installed: PathBuf,

        /// Format of the installed package listing.
        #[arg(long, value_enum, default_value_t = ListingFormat::Conda)]
        format: ListingFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFormat {
    Conda,
    Pip,
}

impl From<ListingFormat> for InstalledFormat {
    fn from(format: ListingFormat) -> Self {
        match format {
            ListingFormat::Conda => InstalledFormat::CondaExport,
            ListingFormat::Pip => InstalledFormat::PipFreeze,
        }
    }
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    // --- Core Arguments ---
    /// Path to the monomer group JSON file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub monomers: PathBuf,

    /// Path for the output PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a build configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Polymer Overrides ---
    /// Override the degree of polymerization (end groups plus sequence repeats).
    #[arg(short = 'n', long = "dop", value_name = "INT")]
    pub degree_of_polymerization: Option<usize>,

    /// Override the block sequence of middle monomers, repeated along the chain.
    #[arg(short, long, value_name = "SEQUENCE")]
    pub sequence: Option<String>,

    /// Cap open chain-end ports with hydrogen, overriding the config file.
    #[arg(long)]
    pub add_hydrogens: bool,

    /// Expand bracket hydrogen counts into explicit atoms, overriding the config file.
    #[arg(long)]
    pub expand_hydrogens: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S polymer.monomer-spacing=1.6
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    // --- Core Arguments ---
    /// Path to the input trajectory (single- or multi-model PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the property time series CSV.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Compute radial distribution functions and write them to this CSV.
    #[arg(long, value_name = "PATH")]
    pub rdf_output: Option<PathBuf>,

    /// Path to an analysis configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Analysis Overrides ---
    /// Override the time between frames, in nanoseconds.
    #[arg(short, long, value_name = "NS")]
    pub time_step: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S rdf.bin-width=0.01
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
