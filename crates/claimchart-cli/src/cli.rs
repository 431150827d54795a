//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Claimchart CLI - Review and refine patent claim charts.
#[derive(Debug, Parser)]
#[command(name = "claimchart")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CLAIMCHART_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true, env = "CLAIMCHART_DB")]
    pub db: Option<PathBuf>,

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
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a chart from claim-chart document text
    Extract(ExtractArgs),

    /// Attach a reference document to a chart
    Attach(AttachArgs),

    /// List charts
    List,

    /// Show a chart, or one element in detail
    Show(ShowArgs),

    /// Ask the AI to refine an element
    Refine(RefineArgs),

    /// Accept a pending proposal
    Accept(ReviewArgs),

    /// Reject a pending proposal
    Reject(ReviewArgs),

    /// Show an element's version log
    History(ElementArgs),

    /// Show the word diff of a proposal
    Diff(ReviewArgs),

    /// List elements that would weaken an exported chart
    Check(ChartArgs),

    /// Delete a chart
    Delete(DeleteArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Plain-text claim chart document
    pub file: PathBuf,

    /// Chart title (defaults to the file name)
    #[arg(short, long)]
    pub title: Option<String>,

    /// File holding the AI reply to replay
    #[arg(short, long)]
    pub response: PathBuf,
}

/// Arguments for the attach command.
#[derive(Debug, Parser)]
pub struct AttachArgs {
    /// Chart ID
    pub chart: String,

    /// Plain-text reference document
    pub file: PathBuf,

    /// Document name (defaults to the file name)
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Chart ID
    pub chart: String,

    /// Element ID; shows the element with its conversation
    pub element: Option<String>,
}

/// Arguments for the refine command.
#[derive(Debug, Parser)]
pub struct RefineArgs {
    /// Chart ID
    pub chart: String,

    /// Element ID
    pub element: String,

    /// Analyst request (e.g. "Remove hedging", "undo", "restore version v2")
    pub query: String,

    /// File holding the AI reply to replay
    #[arg(short, long)]
    pub response: Option<PathBuf>,
}

/// Arguments for accept, reject and diff.
#[derive(Debug, Parser)]
pub struct ReviewArgs {
    /// Chart ID
    pub chart: String,

    /// Element ID
    pub element: String,

    /// Chat message index (defaults to the latest pending proposal)
    #[arg(short, long)]
    pub message: Option<usize>,
}

/// Arguments naming one element.
#[derive(Debug, Parser)]
pub struct ElementArgs {
    /// Chart ID
    pub chart: String,

    /// Element ID
    pub element: String,
}

/// Arguments naming one chart.
#[derive(Debug, Parser)]
pub struct ChartArgs {
    /// Chart ID
    pub chart: String,
}

/// Arguments for the delete command.
#[derive(Debug, Parser)]
pub struct DeleteArgs {
    /// Chart ID
    pub chart: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
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
