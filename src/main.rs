// ABOUTME: Entry point for the relevo CLI application.
// ABOUTME: Parses arguments, dispatches to command handlers, and maps outcomes to exit codes.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use relevo::commands;
use relevo::error::Result;
use relevo::manifest;
use relevo::output::{Output, OutputMode};
use relevo::rollout::Outcome;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    match run(cli, &mut output).await {
        Ok(outcome) => {
            let code = outcome.exit_code();
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<Outcome> {
    match cli.command {
        Commands::Init {
            service,
            image,
            force,
        } => {
            let cwd = env::current_dir()?;
            let path =
                manifest::init_manifest(&cwd, service.as_deref(), image.as_deref(), force)?;
            output.success(&format!("Wrote {}", path.display()));
            Ok(Outcome::Healthy)
        }
        Commands::Deploy { manifest, force } => commands::deploy(&manifest, force, output).await,
        Commands::Status { manifest } => {
            commands::status(&manifest, output).await?;
            Ok(Outcome::Healthy)
        }
        Commands::Logs {
            manifest,
            tail,
            follow,
        } => {
            commands::logs(&manifest, tail, follow).await?;
            Ok(Outcome::Healthy)
        }
    }
}
