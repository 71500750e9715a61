//! StoryTailor grounding CLI entry point.
//!
//! Binary name: `storytailor`
//!
//! Parses CLI arguments, sets up tracing, opens the grounding service for the
//! data directory, then dispatches to the matching command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use storytailor_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions {
        default_filter: cli.log_filter().to_string(),
        json: cli.json_logs,
        otel: cli.otel,
    };
    if let Err(e) = init_tracing(&options) {
        eprintln!("Warning: tracing setup failed: {e}");
    }

    let result = run(&cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    // Shell completions don't need the knowledge base
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "storytailor", &mut std::io::stdout());
        return Ok(());
    }

    let state = &AppState::init(cli.data_dir.clone()).await?;

    match &cli.command {
        Commands::Add {
            text,
            source,
            file,
        } => {
            cli::knowledge::add(state, text.as_deref(), file.as_deref(), source, cli.json).await?;
        }

        Commands::Seed => {
            cli::knowledge::seed(state, cli.json).await?;
        }

        Commands::Search {
            query,
            limit,
            source,
        } => {
            cli::knowledge::search(state, query, *limit, source.as_deref(), cli.json).await?;
        }

        Commands::Remove { id } => {
            cli::knowledge::remove(state, id, cli.json).await?;
        }

        Commands::Check { statement } => {
            cli::check::check(state, statement, cli.json).await?;
        }

        Commands::Generate(args) => {
            cli::generate::generate(state, args, cli.json, cli.quiet).await?;
        }

        Commands::Stats => {
            cli::stats::stats(state, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
