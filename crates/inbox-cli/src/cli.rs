//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use inbox_domain::Priority;
use std::path::PathBuf;

/// Inbox Agent - Turn captured notes into ranked tasks.
#[derive(Debug, Parser)]
#[command(name = "inbox")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (ids only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process a batch of notes
    Run(RunArgs),

    /// Route, rank and gate a single note without storing it
    Check(CheckArgs),

    /// List stored tasks
    Tasks(TasksArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Notes file: a JSON array or blank-line separated text ("-" for stdin)
    pub input: String,

    /// Maximum notes processed at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Store tasks in memory only
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the check command.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Note text
    pub text: String,
}

/// Arguments for the tasks command.
#[derive(Debug, Parser)]
pub struct TasksArgs {
    /// Filter by project
    #[arg(short, long)]
    pub project: Option<String>,

    /// Minimum priority
    #[arg(short, long, value_enum)]
    pub min_priority: Option<PriorityArg>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Priority argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PriorityArg {
    /// Low priority
    Low,
    /// Medium priority
    Medium,
    /// High priority
    High,
    /// Critical priority
    Critical,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<PriorityArg> for Priority {
    fn from(priority: PriorityArg) -> Self {
        match priority {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Critical => Priority::Critical,
        }
    }
}
