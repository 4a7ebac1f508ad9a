//! Bootstrap module for loading configuration and running the listeners.
//!
//! Keeps the binary thin: configuration is loaded through the chain repository, and the
//! supervisor is driven by a shutdown channel the caller owns.

use std::{error::Error, path::Path};
use tokio::sync::watch;

use crate::{
	models::ChainConfig,
	repositories::{ChainRepositoryTrait, ChainService},
	services::{
		blockchain::ChainConnector,
		supervisor::{ChainReport, Supervisor},
	},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Loads and validates every chain configuration.
///
/// # Arguments
/// * `chain_service` - Pre-built service, mainly for tests; loaded from `config_dir` when None
/// * `config_dir` - Directory of chain files, `config/chains` when None
///
/// # Returns
/// * `Result<Vec<ChainConfig>>` - Chains in file name order
/// # Errors
/// Returns an error if a file cannot be read or fails validation, or if no chain is configured
pub async fn initialize_chains<R>(
	chain_service: Option<ChainService<R>>,
	config_dir: Option<&Path>,
) -> Result<Vec<ChainConfig>>
where
	R: ChainRepositoryTrait + Send + Sync + 'static,
{
	let chain_service = match chain_service {
		Some(service) => service,
		None => {
			let repository = R::new(config_dir).await?;
			ChainService::<R>::new_with_repository(repository)?
		}
	};

	Ok(chain_service.get_all())
}

/// Runs one listener per chain until `shutdown` is set or every listener has terminated.
///
/// # Arguments
/// * `chains` - Chains to listen to
/// * `connector` - Opens clients for the chain endpoints
/// * `shutdown` - Shutdown signal shared by every listener
pub async fn run_listeners<C>(
	chains: Vec<ChainConfig>,
	connector: C,
	shutdown: watch::Receiver<bool>,
) -> Vec<ChainReport>
where
	C: ChainConnector + Clone + 'static,
{
	Supervisor::new(connector).run(chains, shutdown).await
}

/// Whether every listener ended because shutdown was requested
pub fn all_stopped_cleanly(reports: &[ChainReport]) -> bool {
	reports.iter().all(|report| report.outcome.is_stopped())
}
