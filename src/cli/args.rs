//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, eval::EvalArgs, init::InitArgs, quote::QuoteArgs,
    validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "cotizador")]
#[command(author, version, about = "Quotation pricing for window and door fabrication")]
#[command(long_about = "Prices windows and doors from their dimensions, material formulas, provider offers and labor rules, and prints an itemized breakdown.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .cotizador/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a project with a sample catalog and payload
    Init(InitArgs),

    /// Price a quote payload against a catalog
    Quote(QuoteArgs),

    /// Evaluate a quantity formula for given dimensions
    Eval(EvalArgs),

    /// Check a catalog (and optionally payloads) for problems
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal, JSON when piped
    #[default]
    Auto,
    /// Human-readable tables
    Table,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}

impl OutputFormat {
    /// Resolve `auto` against the configured default, then the terminal
    pub fn resolve(self, configured: Option<&str>) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        let configured = configured
            .and_then(|s| OutputFormat::from_str(s, true).ok())
            .filter(|f| *f != OutputFormat::Auto);
        match configured {
            Some(format) => format,
            None if console::Term::stdout().is_term() => OutputFormat::Table,
            None => OutputFormat::Json,
        }
    }
}
