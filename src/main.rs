//! Chain ingestor entry point.
//!
//! Loads the chain configurations, starts one listener per chain and appends every new
//! transaction to the chain's transaction log until interrupted.
//!
//! # Flow
//! 1. Applies CLI options to the environment and configures logging
//! 2. Loads and validates chain configurations (`--check` stops here)
//! 3. Starts one listener per chain under the supervisor
//! 4. On Ctrl+C, signals every listener and waits for them to finish their current append

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{all_stopped_cleanly, initialize_chains, run_listeners, Result},
	repositories::ChainRepository,
	services::{blockchain::EvmConnector, supervisor::ListenerOutcome},
	utils::{logging::setup_logging, parse_string_to_bytes_size},
};

use clap::Parser;
use dotenvy::dotenv_override;
use std::{
	env::{set_var, var},
	path::PathBuf,
};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(
	name = "chain-ingestor",
	about = "Listens to EVM chains and appends every new transaction to a durable per-chain log.",
	version
)]
struct Cli {
	/// Directory holding one JSON file per chain (default: config/chains)
	#[arg(long, value_name = "PATH", env = "CONFIG_DIR")]
	config_dir: Option<PathBuf>,

	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Validate configuration files without starting the service
	#[arg(long)]
	check: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		// Reload environment variables from .env file
		// Override any existing environment variables
		dotenv_override().ok();

		// Log file mode - override if CLI flag is set
		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		// Set log level from RUST_LOG if it exists
		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		// Log level - override if CLI flag is set
		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		// Log path - override if CLI flag is set
		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		// Log max size - override if CLI flag is set
		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}
	}
}

/// Main entry point for the chain ingestor.
///
/// # Errors
/// Returns an error if configuration loading fails or a listener terminates abnormally.
#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// Apply CLI options to environment
	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		eprintln!("Failed to setup logging: {}", e);
	});

	// If --check flag is provided, only validate configuration and exit
	if cli.check {
		return validate_configuration(cli.config_dir.clone()).await;
	}

	let chains = initialize_chains::<ChainRepository>(None, cli.config_dir.as_deref())
		.await
		.map_err(|e| anyhow::anyhow!("Failed to load chain configurations: {}", e))?;

	let (shutdown_tx, shutdown_rx) = watch::channel(false);

	info!(
		"Starting {} listener(s). Press Ctrl+C to shutdown",
		chains.len()
	);
	let listeners = tokio::spawn(run_listeners(chains, EvmConnector, shutdown_rx));

	tokio::spawn(async move {
		match tokio::signal::ctrl_c().await {
			Ok(()) => info!("Shutdown signal received, stopping listeners..."),
			Err(e) => error!("Error waiting for Ctrl+C: {}", e),
		}
		let _ = shutdown_tx.send(true);
	});

	let reports = listeners
		.await
		.map_err(|e| anyhow::anyhow!("Supervisor task failed: {}", e))?;

	for report in &reports {
		match &report.outcome {
			ListenerOutcome::Stopped => info!("{}: stopped", report.chain),
			ListenerOutcome::StoreUnavailable(e) => error!("{}: store unavailable: {}", report.chain, e),
			ListenerOutcome::Failed(e) => error!("{}: failed: {}", report.chain, e),
			ListenerOutcome::Aborted(e) => error!("{}: aborted: {}", report.chain, e),
		}
	}

	if !all_stopped_cleanly(&reports) {
		return Err(anyhow::anyhow!("One or more listeners terminated abnormally").into());
	}

	info!("Shutdown complete");
	Ok(())
}

/// Validates chain configurations and prints a summary.
async fn validate_configuration(config_dir: Option<PathBuf>) -> Result<()> {
	info!("Validating configuration files...");

	match initialize_chains::<ChainRepository>(None, config_dir.as_deref()).await {
		Ok(chains) => {
			for chain in &chains {
				info!(
					"✓ {} ({}) -> {} [{:?}]",
					chain.name,
					chain.slug,
					chain.output_path.display(),
					chain.store_format
				);
			}
			info!(
				"Configuration validation completed successfully! {} chain(s) configured",
				chains.len()
			);
			Ok(())
		}
		Err(e) => {
			error!("{}", e);
			Err(e)
		}
	}
}
