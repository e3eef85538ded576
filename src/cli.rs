use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keel")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Compile layered service options into a desired-state resource graph", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile node inputs into resource graphs
    Compile(CompileArgs),

    /// Show every option's effective value and the layer it came from
    Resolve(ResolveArgs),

    /// Compare the graphs compiled from two node inputs
    Diff(DiffArgs),

    /// List the option table
    Options,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// ============================================================================
// Compile
// ============================================================================

#[derive(Parser)]
pub struct CompileArgs {
    /// Node input files (TOML or JSON) or directories containing them
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Only show specific resources: "kind" or "kind.id"
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of parallel compile jobs (defaults to the number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Template root searched before each input's own template root
    #[arg(long, env = "KEEL_TEMPLATES")]
    pub templates: Option<PathBuf>,
}

// ============================================================================
// Resolve
// ============================================================================

#[derive(Parser)]
pub struct ResolveArgs {
    /// Node input file (TOML or JSON)
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

// ============================================================================
// Diff
// ============================================================================

#[derive(Parser)]
pub struct DiffArgs {
    /// Node input describing the current configuration
    pub before: PathBuf,

    /// Node input describing the proposed configuration
    pub after: PathBuf,

    /// Only show specific resources: "kind" or "kind.id"
    #[arg(short, long)]
    pub target: Option<String>,

    /// Template root searched before each input's own template root
    #[arg(long, env = "KEEL_TEMPLATES")]
    pub templates: Option<PathBuf>,
}
