//! CLI command definitions for the `storytailor` binary.
//!
//! Uses clap derive macros for argument parsing. Handlers live in the
//! submodules and take `&AppState` plus the global `--json` flag.

pub mod check;
pub mod generate;
pub mod knowledge;
pub mod stats;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

/// Ground children's stories in a fact knowledge base.
#[derive(Parser)]
#[command(name = "storytailor", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Knowledge base directory (defaults to ~/.storytailor).
    #[arg(long, global = true, env = "STORYTAILOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter for the chosen verbosity; `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,storytailor_core=debug,storytailor_infra=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a fact to the knowledge base.
    Add {
        /// Fact text. Omit to read facts from --file.
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,

        /// Source label recorded with the fact.
        #[arg(short, long)]
        source: String,

        /// Read one fact per non-empty line from this file.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Add the built-in starter facts that are not stored yet.
    Seed,

    /// Find the facts most similar to a query.
    #[command(alias = "find")]
    Search {
        query: String,

        /// Maximum number of results.
        #[arg(short = 'n', long, default_value = "3")]
        limit: usize,

        /// Only search facts recorded with this source label.
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Delete a fact by id.
    #[command(alias = "rm")]
    Remove { id: String },

    /// Check a statement against the knowledge base.
    Check { statement: String },

    /// Generate a story grounded in the knowledge base.
    Generate(GenerateArgs),

    /// Knowledge base summary.
    Stats,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Reader age in years (3-15).
    #[arg(short, long)]
    pub age: u8,

    /// Preferred topic; repeat for several.
    #[arg(short, long = "pref")]
    pub preferences: Vec<String>,

    /// What the story should teach.
    #[arg(short, long)]
    pub goal: Option<String>,

    /// Lexile reading level.
    #[arg(long)]
    pub reading_level: Option<u32>,

    /// Skip retrieval and fact checking.
    #[arg(long)]
    pub no_grounding: bool,
}

/// Steady-ticking spinner on stderr; hidden with `--json` or `--quiet`.
pub(crate) fn spinner(message: &'static str, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Shorten `text` to `max` characters with a trailing ellipsis.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("storytailor").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_generate_with_repeated_preferences() {
        let cli = parse(&[
            "generate", "--age", "7", "--pref", "rabbit", "--pref", "friendship", "--goal",
            "kindness",
        ]);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.age, 7);
                assert_eq!(args.preferences, vec!["rabbit", "friendship"]);
                assert_eq!(args.goal.as_deref(), Some("kindness"));
                assert!(!args.no_grounding);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_add_requires_text_or_file() {
        assert!(Cli::try_parse_from(["storytailor", "add", "--source", "notes"]).is_err());
        assert!(
            Cli::try_parse_from([
                "storytailor", "add", "Foxes live in forests", "--source", "notes", "--file",
                "facts.txt",
            ])
            .is_err()
        );
        let cli = parse(&["add", "--source", "notes", "--file", "facts.txt"]);
        assert!(matches!(cli.command, Commands::Add { file: Some(_), text: None, .. }));
    }

    #[test]
    fn test_search_default_limit() {
        let cli = parse(&["search", "fast rabbit"]);
        assert!(matches!(cli.command, Commands::Search { limit: 3, source: None, .. }));

        let cli = parse(&["search", "rabbit", "--source", "Garden Guide"]);
        match cli.command {
            Commands::Search { source, .. } => assert_eq!(source.as_deref(), Some("Garden Guide")),
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["stats", "--json", "-vv"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_filter(), "trace");
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_log_filter_quiet_and_default() {
        assert_eq!(parse(&["stats", "--quiet"]).log_filter(), "error");
        assert_eq!(parse(&["stats"]).log_filter(), "warn");
    }
}
