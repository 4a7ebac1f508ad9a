//! Supervisor running one listener per chain.
//!
//! Every chain gets its own tokio task. A failing listener is reported and does not affect
//! the others; the supervisor returns once every listener has terminated.

use futures::future::join_all;
use tokio::sync::watch;

use crate::{
	models::ChainConfig,
	services::{
		blockchain::ChainConnector,
		listener::{ChainListener, ListenerError},
		store::{store_for_chain, StoreError},
	},
};

/// How a chain's listener ended
#[derive(Debug)]
pub enum ListenerOutcome {
	/// Stopped on shutdown
	Stopped,
	/// The transaction log could not be created, so no listener was started
	StoreUnavailable(StoreError),
	/// Terminated by a permanent failure
	Failed(ListenerError),
	/// The listener task panicked or was aborted
	Aborted(String),
}

impl ListenerOutcome {
	pub fn is_stopped(&self) -> bool {
		matches!(self, Self::Stopped)
	}
}

/// Final state of one chain
#[derive(Debug)]
pub struct ChainReport {
	pub chain: String,
	pub outcome: ListenerOutcome,
}

/// Starts and joins chain listeners
#[derive(Clone, Debug)]
pub struct Supervisor<C> {
	connector: C,
}

impl<C> Supervisor<C>
where
	C: ChainConnector + Clone + 'static,
{
	pub fn new(connector: C) -> Self {
		Self { connector }
	}

	/// Runs a listener for every chain until all of them have terminated
	///
	/// # Arguments
	/// * `chains` - Chains to listen to
	/// * `shutdown` - Set to `true` to stop every listener
	///
	/// # Returns
	/// * `Vec<ChainReport>` - One report per chain
	pub async fn run(
		&self,
		chains: Vec<ChainConfig>,
		shutdown: watch::Receiver<bool>,
	) -> Vec<ChainReport> {
		let mut reports = Vec::with_capacity(chains.len());
		let mut handles = Vec::new();

		for chain in chains {
			if let Err(e) = store_for_chain(&chain).ensure_initialized().await {
				tracing::error!(chain = %chain.slug, error = %e, "Cannot open transaction log");
				reports.push(ChainReport {
					chain: chain.slug.clone(),
					outcome: ListenerOutcome::StoreUnavailable(e),
				});
				continue;
			}

			tracing::info!(
				chain = %chain.slug,
				"Starting listener for {} ({})",
				chain.name,
				chain.endpoint_label()
			);
			let slug = chain.slug.clone();
			let listener = ChainListener::for_chain(chain, self.connector.clone(), shutdown.clone());
			handles.push((slug, tokio::spawn(listener.run())));
		}

		let (slugs, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
		let results = join_all(tasks).await;

		for (chain, result) in slugs.into_iter().zip(results) {
			let outcome = match result {
				Ok(Ok(())) => ListenerOutcome::Stopped,
				Ok(Err(e)) => ListenerOutcome::Failed(e),
				Err(e) => ListenerOutcome::Aborted(e.to_string()),
			};
			match &outcome {
				ListenerOutcome::Stopped => tracing::info!(chain = %chain, "Listener stopped"),
				other => tracing::error!(chain = %chain, outcome = ?other, "Listener terminated"),
			}
			reports.push(ChainReport { chain, outcome });
		}

		reports
	}
}
