//! Protoforge CLI entry point.
//!
//! Binary name: `pforge`
//!
//! Parses CLI arguments, sets up tracing, opens the database and wires the
//! services, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use protoforge_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_directives};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(verbosity_directives(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "pforge", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    let caller = cli.caller();

    match cli.command {
        Commands::Olc { key, resume } => {
            cli::olc::run_olc(&state, &caller, key, resume).await?;
        }

        Commands::List => {
            cli::prototype::list_prototypes(&state, cli.json).await?;
        }

        Commands::Show { key } => {
            cli::prototype::show_prototype(&state, &key, cli.json).await?;
        }

        Commands::Delete { key, force } => {
            cli::prototype::delete_prototype(&state, &caller, &key, force, cli.json).await?;
        }

        Commands::Spawn { key, location } => {
            cli::prototype::spawn_prototype(&state, &caller, &key, location, cli.json).await?;
        }

        // Generated in `main` before any state is opened.
        Commands::Completions { .. } => {}
    }

    Ok(())
}
