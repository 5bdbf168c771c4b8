//! CLI argument parsing for fluxwindow

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fluxwindow")]
#[command(version)]
#[command(about = "Flux query window analysis and Flux task management", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./fluxwindow.toml when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the minimum range window of a Flux script
    Analyze(AnalyzeArgs),

    /// Manage Flux tasks on Kapacitor
    Tasks(TasksArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Pre-parsed AST in JSON form
    #[arg(long, value_name = "FILE", conflicts_with = "query", required_unless_present = "query")]
    pub ast: Option<PathBuf>,

    /// Flux script, parsed through the AST service
    #[arg(long, value_name = "FILE")]
    pub query: Option<PathBuf>,

    /// AST parsing service URL (overrides [ast] url)
    #[arg(long, value_name = "URL")]
    pub ast_url: Option<String>,

    /// Window reported when no AST service is configured (overrides [window] default_ms)
    #[arg(long, value_name = "MS")]
    pub default_window_ms: Option<f64>,

    /// Reference instant for relative bounds, RFC 3339 (defaults to the current time)
    #[arg(long, value_name = "TIME")]
    pub now: Option<String>,
}

#[derive(Args, Debug)]
pub struct TasksArgs {
    /// Kapacitor URL (overrides [kapacitor] url)
    #[arg(long, value_name = "URL")]
    pub kapacitor_url: Option<String>,

    #[command(subcommand)]
    pub action: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List Flux tasks
    List {
        /// Only show tasks whose name contains this text
        #[arg(long, value_name = "NAME", default_value = "")]
        filter: String,
    },

    /// Delete a Flux task
    Delete {
        /// Task ID
        id: String,
    },

    /// Switch a Flux task between active and inactive
    Toggle {
        /// Task ID
        id: String,
    },
}
