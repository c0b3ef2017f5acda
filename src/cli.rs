// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relevo")]
#[command(about = "Zero-downtime container rollouts for Docker and Podman")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter relevo.yml in the current directory
    Init {
        /// Service name to put in the manifest
        #[arg(short, long)]
        service: Option<String>,

        /// Image reference to put in the manifest
        #[arg(short, long)]
        image: Option<String>,

        /// Overwrite an existing manifest
        #[arg(short, long)]
        force: bool,
    },

    /// Roll out the release described by a manifest
    Deploy {
        /// Path to the release manifest
        manifest: PathBuf,

        /// Break an existing rollout lock
        #[arg(short, long)]
        force: bool,
    },

    /// Show the active container and latest rollout outcome
    Status {
        /// Path to the release manifest
        manifest: PathBuf,
    },

    /// Show logs from the active container
    Logs {
        /// Path to the release manifest
        manifest: PathBuf,

        /// Only the last N lines
        #[arg(short, long)]
        tail: Option<u64>,

        /// Follow output
        #[arg(short, long)]
        follow: bool,
    },
}
