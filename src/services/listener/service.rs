//! Chain listener state machine.
//!
//! One listener drives one chain: it connects, resumes from the persisted cursor, and polls
//! the chain head, writing every new block's transactions to the store in block order.
//! Failures never skip a block silently. Mid-poll transport faults send the listener back
//! through `Reconnecting`, while a block that keeps failing is eventually recorded in the
//! dead-letter file and passed over.

use backon::{BackoffBuilder, ExponentialBuilder, Retryable};
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::instrument;

use crate::{
	models::ChainConfig,
	services::{
		blockchain::{BlockChainClient, BlockChainError, ChainConnector},
		extractor::extract_block,
		listener::{
			cursor::{CursorStorage, FileCursorStorage},
			error::ListenerError,
		},
		store::{store_for_chain, TransactionStore},
	},
};

/// Lifecycle state of a [`ChainListener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
	/// Opening a client, with bounded retries
	Connecting,
	/// Reading new blocks on every poll interval
	Polling,
	/// Waiting out the reconnect delay after a failure
	Reconnecting,
	/// Terminal
	Stopped,
}

/// Result of one poll cycle or one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
	/// Keep going
	Continue,
	/// The block must be fetched again in a later cycle
	Retry,
	/// Shutdown was requested while waiting
	Stopped,
}

/// Why an adapter call produced no value
#[derive(Debug)]
enum CallFailure {
	Chain(BlockChainError),
	Timeout(Duration),
}

impl CallFailure {
	fn is_block_specific(&self) -> bool {
		matches!(self, Self::Chain(e) if e.is_block_specific())
	}

	fn into_source(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
		match self {
			Self::Chain(e) => Box::new(e),
			Self::Timeout(limit) => format!("request timed out after {:?}", limit).into(),
		}
	}
}

/// Resolves to `None` when shutdown is requested before `fut` completes
///
/// A dropped sender counts as a shutdown request.
async fn until_shutdown<F: Future>(shutdown: &watch::Receiver<bool>, fut: F) -> Option<F::Output> {
	let mut shutdown = shutdown.clone();
	if *shutdown.borrow_and_update() {
		return None;
	}
	tokio::select! {
		output = fut => Some(output),
		_ = shutdown.wait_for(|stop| *stop) => None,
	}
}

/// Listener for a single chain
pub struct ChainListener<C: ChainConnector> {
	chain: ChainConfig,
	connector: C,
	store: Arc<dyn TransactionStore>,
	cursor_storage: Arc<dyn CursorStorage>,
	shutdown: watch::Receiver<bool>,
	state: ListenerState,
	/// Failed attempts per block number, cleared once the block is written or dead-lettered
	block_failures: HashMap<u64, u32>,
	reconnect_delay: Duration,
}

impl<C: ChainConnector> ChainListener<C> {
	/// Creates a listener with explicit storage
	///
	/// # Arguments
	/// * `chain` - Chain configuration
	/// * `connector` - Opens clients for the chain endpoint
	/// * `store` - Transaction log the records are appended to
	/// * `cursor_storage` - Cursor and dead-letter storage
	/// * `shutdown` - Set to `true` to stop the listener
	pub fn new(
		chain: ChainConfig,
		connector: C,
		store: Arc<dyn TransactionStore>,
		cursor_storage: Arc<dyn CursorStorage>,
		shutdown: watch::Receiver<bool>,
	) -> Self {
		let reconnect_delay = chain.reconnect_delay();
		Self {
			chain,
			connector,
			store,
			cursor_storage,
			shutdown,
			state: ListenerState::Connecting,
			block_failures: HashMap::new(),
			reconnect_delay,
		}
	}

	/// Creates a listener using the store and cursor files named by the configuration
	pub fn for_chain(chain: ChainConfig, connector: C, shutdown: watch::Receiver<bool>) -> Self {
		let store = store_for_chain(&chain);
		let cursor_storage = Arc::new(FileCursorStorage::for_chain(&chain));
		Self::new(chain, connector, store, cursor_storage, shutdown)
	}

	pub fn state(&self) -> ListenerState {
		self.state
	}

	pub fn chain(&self) -> &ChainConfig {
		&self.chain
	}

	fn metadata(&self) -> Option<HashMap<String, String>> {
		Some(HashMap::from([("chain".to_string(), self.chain.slug.clone())]))
	}

	fn block_metadata(&self, number: u64) -> Option<HashMap<String, String>> {
		Some(HashMap::from([
			("chain".to_string(), self.chain.slug.clone()),
			("block".to_string(), number.to_string()),
		]))
	}

	fn transition(&mut self, next: ListenerState) {
		if self.state != next {
			tracing::info!("Listener state {:?} -> {:?}", self.state, next);
			self.state = next;
		}
	}

	/// Runs the listener until shutdown or a permanent failure
	///
	/// # Returns
	/// * `Result<(), ListenerError>` - Ok after shutdown, `ConnectionError` when the endpoint
	///   stayed unreachable for a whole connecting phase
	#[instrument(skip_all, fields(chain = %self.chain.slug))]
	pub async fn run(mut self) -> Result<(), ListenerError> {
		let mut client: Option<C::Client> = None;
		let mut cursor = 0u64;

		loop {
			match self.state {
				ListenerState::Connecting => {
					let connected = match self.connect().await {
						Ok(Some(connected)) => connected,
						Ok(None) => {
							self.transition(ListenerState::Stopped);
							continue;
						}
						Err(e) => {
							self.transition(ListenerState::Stopped);
							return Err(e);
						}
					};

					match self.resolve_cursor(&connected).await {
						Ok(Some(resolved)) => {
							cursor = resolved;
							client = Some(connected);
							self.transition(ListenerState::Polling);
						}
						Ok(None) => self.transition(ListenerState::Stopped),
						Err(e) => {
							tracing::warn!(error = %e, "Failed to resolve start position");
							self.transition(ListenerState::Reconnecting);
						}
					}
				}
				ListenerState::Polling => {
					let Some(active) = client.as_ref() else {
						self.transition(ListenerState::Connecting);
						continue;
					};

					match self.poll_cycle(active, &mut cursor).await {
						Ok(Progress::Stopped) => self.transition(ListenerState::Stopped),
						Ok(_) => {
							self.reconnect_delay = self.chain.reconnect_delay();
							let sleep = tokio::time::sleep(self.chain.poll_interval());
							if until_shutdown(&self.shutdown, sleep).await.is_none() {
								self.transition(ListenerState::Stopped);
							}
						}
						Err(e) => {
							tracing::warn!(error = %e, "Poll cycle failed, reconnecting");
							client = None;
							self.transition(ListenerState::Reconnecting);
						}
					}
				}
				ListenerState::Reconnecting => {
					let delay = self.reconnect_delay;
					tracing::info!("Reconnecting in {:?}", delay);
					self.reconnect_delay = (delay * 2).min(self.chain.max_reconnect_delay());

					let sleep = tokio::time::sleep(delay);
					if until_shutdown(&self.shutdown, sleep).await.is_none() {
						self.transition(ListenerState::Stopped);
					} else {
						self.transition(ListenerState::Connecting);
					}
				}
				ListenerState::Stopped => {
					tracing::info!("Listener stopped at block {}", cursor);
					return Ok(());
				}
			}
		}
	}

	/// Opens a client, retrying with exponential backoff
	///
	/// # Returns
	/// * `Result<Option<C::Client>, ListenerError>` - The client, `None` on shutdown, or
	///   `ConnectionError` once every attempt failed
	async fn connect(&self) -> Result<Option<C::Client>, ListenerError> {
		let attempts = self.chain.connect_max_retries.max(1);
		let timeout = self.chain.request_timeout();

		let chain = &self.chain;
		let connector = &self.connector;
		let operation = move || async move {
			match tokio::time::timeout(timeout, connector.connect(chain)).await {
				Ok(result) => result,
				Err(_) => Err(BlockChainError::connection_error(
					format!("Connection attempt timed out after {:?}", timeout),
					None,
					Some(HashMap::from([("chain".to_string(), chain.slug.clone())])),
				)),
			}
		};

		let backoff = ExponentialBuilder::default()
			.with_min_delay(self.chain.reconnect_delay())
			.with_max_delay(self.chain.max_reconnect_delay());

		// Boxed so the `Send` check of the listener future sees concrete lifetimes
		let retrying: futures::future::BoxFuture<'_, Result<C::Client, BlockChainError>> = Box::pin(
			operation
				.retry(backoff.build().take(attempts - 1))
				.notify(|e: &BlockChainError, delay: Duration| {
					tracing::warn!(error = %e, "Connection attempt failed, retrying in {:?}", delay);
				}),
		);

		match until_shutdown(&self.shutdown, retrying).await {
			None => Ok(None),
			Some(Ok(client)) => {
				tracing::info!("Connected to {}", self.chain.endpoint_label());
				Ok(Some(client))
			}
			Some(Err(e)) => Err(ListenerError::connection_error(
				format!("Failed to connect after {} attempts", attempts),
				Some(Box::new(e)),
				self.metadata(),
			)),
		}
	}

	/// Runs an adapter call bounded by the request timeout and raced against shutdown
	async fn call<T, F>(&self, fut: F) -> Option<Result<T, CallFailure>>
	where
		F: Future<Output = Result<T, BlockChainError>>,
	{
		let limit = self.chain.request_timeout();
		let bounded = tokio::time::timeout(limit, fut);
		until_shutdown(&self.shutdown, bounded)
			.await
			.map(|result| match result {
				Ok(inner) => inner.map_err(CallFailure::Chain),
				Err(_) => Err(CallFailure::Timeout(limit)),
			})
	}

	/// Loads the persisted cursor, or starts at the current head when there is none
	///
	/// # Returns
	/// * `Result<Option<u64>, ListenerError>` - Last processed block, `None` on shutdown
	async fn resolve_cursor(&self, client: &C::Client) -> Result<Option<u64>, ListenerError> {
		match self.cursor_storage.get_last_processed_block().await {
			Ok(Some(last)) => {
				tracing::info!("Resuming after block {}", last);
				self.report_missed_blocks().await;
				return Ok(Some(last));
			}
			Ok(None) => {}
			Err(e) => {
				tracing::warn!(error = %e, "Ignoring unreadable cursor, starting at chain head");
			}
		}

		let head = match self.call(client.get_latest_block_number()).await {
			None => return Ok(None),
			Some(Ok(head)) => head,
			Some(Err(failure)) => {
				return Err(ListenerError::network_error(
					"Failed to read chain head",
					Some(failure.into_source()),
					self.metadata(),
				))
			}
		};

		self.save_cursor(head).await?;
		tracing::info!("No cursor found, starting after head block {}", head);
		Ok(Some(head))
	}

	/// Warns about dead-lettered blocks left for an operator to re-ingest
	async fn report_missed_blocks(&self) {
		match self.cursor_storage.get_missed_blocks().await {
			Ok(missed) if missed.is_empty() => {}
			Ok(missed) => tracing::warn!(
				count = missed.len(),
				first = missed[0],
				last = missed[missed.len() - 1],
				"Blocks recorded as missed in {} were never ingested",
				self.chain.missed_blocks_path().display()
			),
			Err(e) => tracing::warn!(error = %e, "Failed to read missed blocks"),
		}
	}

	async fn save_cursor(&self, block: u64) -> Result<(), ListenerError> {
		self.cursor_storage
			.save_last_processed_block(block)
			.await
			.map_err(|e| {
				ListenerError::storage_error(
					"Failed to save cursor",
					Some(e.into()),
					self.block_metadata(block),
				)
			})
	}

	async fn dead_letter(&self, block: u64) -> Result<(), ListenerError> {
		self.cursor_storage
			.save_missed_block(block)
			.await
			.map_err(|e| {
				ListenerError::storage_error(
					"Failed to record missed block",
					Some(e.into()),
					self.block_metadata(block),
				)
			})
	}

	/// Processes every block between the cursor and the current head
	///
	/// The cursor is persisted after each block, so an error leaves it just before the
	/// block that failed.
	async fn poll_cycle(
		&mut self,
		client: &C::Client,
		cursor: &mut u64,
	) -> Result<Progress, ListenerError> {
		let latest = match self.call(client.get_latest_block_number()).await {
			None => return Ok(Progress::Stopped),
			Some(Ok(latest)) => latest,
			Some(Err(failure)) => {
				return Err(ListenerError::network_error(
					"Failed to read chain head",
					Some(failure.into_source()),
					self.metadata(),
				))
			}
		};

		if latest <= *cursor {
			tracing::debug!("No new blocks (head {}, cursor {})", latest, *cursor);
			return Ok(Progress::Continue);
		}

		let mut start = *cursor + 1;
		if let Some(max_catchup) = self.chain.max_catchup_blocks {
			if latest - *cursor > max_catchup {
				let first_kept = latest - max_catchup + 1;
				tracing::warn!(
					"Skipping {} blocks ({}..={}) beyond the catch-up limit of {}",
					first_kept - start,
					start,
					first_kept - 1,
					max_catchup
				);
				for skipped in start..first_kept {
					self.dead_letter(skipped).await?;
				}
				self.save_cursor(first_kept - 1).await?;
				*cursor = first_kept - 1;
				start = first_kept;
			}
		}

		tracing::info!("Processing blocks {}..={}", start, latest);

		for number in start..=latest {
			if *self.shutdown.borrow() {
				return Ok(Progress::Stopped);
			}

			match self.process_block(client, number).await? {
				Progress::Continue => {
					self.save_cursor(number).await?;
					*cursor = number;
				}
				Progress::Retry => return Ok(Progress::Retry),
				Progress::Stopped => return Ok(Progress::Stopped),
			}
		}

		Ok(Progress::Continue)
	}

	/// Fetches, extracts and appends one block
	///
	/// # Returns
	/// * `Ok(Progress::Continue)` when the block was written or dead-lettered, so the cursor
	///   may move past it
	/// * `Ok(Progress::Retry)` when the block failed and is still within its retry budget
	/// * `Err` for failures that require reconnecting
	#[instrument(skip(self, client))]
	async fn process_block(
		&mut self,
		client: &C::Client,
		number: u64,
	) -> Result<Progress, ListenerError> {
		let block = match self.call(client.get_block_with_transactions(number)).await {
			None => return Ok(Progress::Stopped),
			Some(Ok(block)) => block,
			Some(Err(failure)) if failure.is_block_specific() => {
				let error = ListenerError::block_processing_error(
					format!("Failed to fetch block {}", number),
					Some(failure.into_source()),
					self.block_metadata(number),
				);
				return self.record_block_failure(number, error).await;
			}
			Some(Err(failure)) => {
				let error = ListenerError::network_error(
					format!("Failed to fetch block {}", number),
					Some(failure.into_source()),
					self.block_metadata(number),
				);
				// Counted as well, so a block the provider can never serve is not retried forever
				return match self.record_block_failure(number, error).await? {
					Progress::Retry => Err(ListenerError::network_error(
						format!("Reconnecting after failing to fetch block {}", number),
						None,
						self.block_metadata(number),
					)),
					progress => Ok(progress),
				};
			}
		};

		let records = match extract_block(&block, &self.chain) {
			Ok(records) => records,
			Err(e) => {
				let error = ListenerError::block_processing_error(
					format!("Failed to extract transactions of block {}", number),
					Some(Box::new(e)),
					self.block_metadata(number),
				);
				return self.record_block_failure(number, error).await;
			}
		};

		let total = records.len();
		let written = self.store.append_all(records).await.map_err(|e| {
			ListenerError::storage_error(
				format!("Failed to append transactions of block {}", number),
				Some(Box::new(e)),
				self.block_metadata(number),
			)
		})?;

		self.block_failures.remove(&number);
		tracing::debug!(
			"Block {}: appended {} of {} transactions",
			number,
			written,
			total
		);
		Ok(Progress::Continue)
	}

	/// Counts a failure of `number` and dead-letters it once the retry budget is spent
	async fn record_block_failure(
		&mut self,
		number: u64,
		error: ListenerError,
	) -> Result<Progress, ListenerError> {
		let failures = {
			let count = self.block_failures.entry(number).or_insert(0);
			*count += 1;
			*count
		};

		if failures < self.chain.max_block_retries {
			tracing::warn!(
				error = %error,
				"Block {} failed ({}/{}), retrying next cycle",
				number,
				failures,
				self.chain.max_block_retries
			);
			return Ok(Progress::Retry);
		}

		self.dead_letter(number).await?;
		self.block_failures.remove(&number);
		tracing::warn!(
			error = %error,
			"Block {} failed {} times, recorded as missed and skipped",
			number,
			failures
		);
		Ok(Progress::Continue)
	}
}
