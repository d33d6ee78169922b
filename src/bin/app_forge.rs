//! app-forge: build on-chain application programs from JSON manifests
//!
//! ## Commands
//!
//! - **build**: classify, assemble and write programs plus documents to a directory
//! - **spec**: print the application specification document
//! - **routes**: print bare actions, methods and their selectors
//!
//! ## Example Usage
//!
//! ```bash
//! # Write approval.teal, clear.teal, contract.json and application.json
//! app-forge build demos/state_example.json --out ./artifacts
//!
//! # Print the specification document
//! app-forge spec demos/state_example.json
//!
//! # Show routing targeting program version 7
//! app-forge --program-version 7 routes demos/state_example.json
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `app_forge=info`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod forge_cli;

use forge_cli::{build::BuildCmd, routes::RoutesCmd, spec::SpecCmd, CliOptions};

#[derive(Parser)]
#[command(
    name = "app-forge",
    author,
    version,
    about = "Build on-chain application programs from declarative manifests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Target program version (overrides APP_FORGE_PROGRAM_VERSION and the manifest)
    #[arg(long, global = true)]
    program_version: Option<u64>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble an application and write its artifacts
    Build(BuildCmd),

    /// Print the application specification document
    Spec(SpecCmd),

    /// Print the dispatch routes of an application
    Routes(RoutesCmd),
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app_forge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Cli {
        command,
        program_version,
        json,
    } = Cli::parse();
    let options = CliOptions { program_version, json };

    match command {
        Commands::Build(cmd) => cmd.execute(&options),
        Commands::Spec(cmd) => cmd.execute(&options),
        Commands::Routes(cmd) => cmd.execute(&options),
    }
}
