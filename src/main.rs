//! Binary entry point for ground-export.
//!
//! This binary serves the CSV export endpoint or runs one-shot exports.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use ground_export::cli::{ExportCommand, ServeCommand};
use ground_export::config::GroundExportConfig;
use ground_export::observability::{self, InitOptions};
use ground_export::{ExportRequest, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

/// Ground Export - CSV export for map-based field data projects.
#[derive(Parser)]
#[command(name = "ground-export")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP export endpoint.
    Serve {
        /// Address to listen on.
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// Document snapshot to serve from.
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Export one project (and layer) to CSV.
    Export {
        /// Project ID.
        #[arg(short, long)]
        project: String,

        /// Layer ID. Without it only the header row is written.
        #[arg(short, long)]
        layer: Option<String>,

        /// Output file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Document snapshot to export from.
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match GroundExportConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let expose_metrics = matches!(cli.command, Commands::Serve { .. });
    if let Err(e) = observability::init(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
            metrics_expose: expose_metrics,
        },
    ) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

async fn run_command(command: Commands, config: GroundExportConfig) -> Result<()> {
    match command {
        Commands::Serve { bind, data } => {
            let config = apply_overrides(config, bind, data);
            ServeCommand::new(config).run().await
        },
        Commands::Export {
            project,
            layer,
            output,
            data,
        } => {
            let config = apply_overrides(config, None, data);
            let request = match layer {
                Some(layer) => ExportRequest::new(project).with_layer(layer),
                None => ExportRequest::new(project),
            };
            // Store reads and file writes block; keep them off the runtime.
            tokio::task::spawn_blocking(move || {
                ExportCommand::new(config, request, output).run()
            })
            .await
            .map_err(|e| ground_export::Error::operation("export", e))?
            .map(|_| ())
        },
    }
}

/// Applies command-line overrides on top of the resolved configuration.
fn apply_overrides(
    mut config: GroundExportConfig,
    bind: Option<SocketAddr>,
    data: Option<PathBuf>,
) -> GroundExportConfig {
    if let Some(bind) = bind {
        config = config.with_bind(bind);
    }
    if let Some(data) = data {
        config = config.with_snapshot_path(data);
    }
    config
}
