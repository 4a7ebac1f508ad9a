//! Scripted in-memory chain.
//!
//! [`FakeChain`] serves blocks from memory and can be told to fail specific calls, so the
//! listener's recovery paths can be driven deterministically. [`FakeConnector`] hands out
//! fake chains by slug.

use async_trait::async_trait;
use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::Duration,
};

use chain_ingestor::{
	models::{ChainConfig, EVMBlock},
	services::blockchain::{BlockChainClient, BlockChainError, ChainConnector},
	utils::tests::builders::evm::{block::BlockBuilder, transaction::TransactionBuilder},
};

/// Transactions per block served by [`FakeChain::with_blocks`]
pub const TXS_PER_BLOCK: u64 = 2;

/// Hash index of the `i`-th transaction of block `number`
pub fn tx_index(number: u64, i: u64) -> u64 {
	number * 100 + i
}

/// Hash of the `i`-th transaction of block `number`, as written to the store
pub fn tx_hash(number: u64, i: u64) -> String {
	format!("0x{:064x}", tx_index(number, i))
}

/// Expected store hashes for a range of blocks, in block then transaction order
pub fn hashes_for(blocks: impl IntoIterator<Item = u64>) -> Vec<String> {
	blocks
		.into_iter()
		.flat_map(|n| (0..TXS_PER_BLOCK).map(move |i| tx_hash(n, i)))
		.collect()
}

pub fn block(number: u64) -> EVMBlock {
	BlockBuilder::new()
		.number(number)
		.timestamp(1_700_000_000 + number * 12)
		.transactions(
			(0..TXS_PER_BLOCK)
				.map(|i| {
					TransactionBuilder::new()
						.hash_from_u64(tx_index(number, i))
						.transaction_index(i)
						.build()
				})
				.collect(),
		)
		.build()
}

#[derive(Debug, Default)]
pub struct FakeChainState {
	pub head: u64,
	pub blocks: HashMap<u64, EVMBlock>,
	/// Upcoming head reads that fail with a request error
	pub head_failures: u32,
	/// Upcoming head reads that never answer
	pub head_hangs: u32,
	/// Upcoming fetches of a block that fail with a decode error
	pub block_failures: HashMap<u64, u32>,
	/// Upcoming fetches of a block that fail with a request error
	pub block_request_failures: HashMap<u64, u32>,
	/// Upcoming connection attempts that fail
	pub connect_failures: u32,
	pub connects: u32,
	pub fetched: Vec<u64>,
}

/// In-memory chain, cheap to clone; clones share state
#[derive(Clone, Debug, Default)]
pub struct FakeChain {
	pub state: Arc<Mutex<FakeChainState>>,
}

impl FakeChain {
	/// Chain with blocks `1..=head` available
	pub fn with_blocks(head: u64) -> Self {
		let chain = Self::default();
		chain.extend_to(head);
		chain
	}

	/// Makes blocks up to `head` available and moves the head there
	pub fn extend_to(&self, head: u64) {
		let mut state = self.state.lock().unwrap();
		for number in 1..=head {
			state.blocks.entry(number).or_insert_with(|| block(number));
		}
		state.head = head;
	}

	/// Moves the head without serving the new blocks
	pub fn set_head(&self, head: u64) {
		self.state.lock().unwrap().head = head;
	}

	pub fn remove_block(&self, number: u64) {
		self.state.lock().unwrap().blocks.remove(&number);
	}

	pub fn fail_head_reads(&self, times: u32) {
		self.state.lock().unwrap().head_failures = times;
	}

	pub fn hang_head_reads(&self, times: u32) {
		self.state.lock().unwrap().head_hangs = times;
	}

	pub fn fail_block(&self, number: u64, times: u32) {
		self.state.lock().unwrap().block_failures.insert(number, times);
	}

	pub fn fail_block_requests(&self, number: u64, times: u32) {
		self.state
			.lock()
			.unwrap()
			.block_request_failures
			.insert(number, times);
	}

	pub fn fail_connects(&self, times: u32) {
		self.state.lock().unwrap().connect_failures = times;
	}

	pub fn connects(&self) -> u32 {
		self.state.lock().unwrap().connects
	}

	pub fn fetched(&self) -> Vec<u64> {
		self.state.lock().unwrap().fetched.clone()
	}
}

fn take_one(counter: &mut u32) -> bool {
	if *counter > 0 {
		*counter -= 1;
		true
	} else {
		false
	}
}

#[async_trait]
impl BlockChainClient for FakeChain {
	async fn get_latest_block_number(&self) -> Result<u64, BlockChainError> {
		let hang = {
			let mut state = self.state.lock().unwrap();
			if take_one(&mut state.head_failures) {
				return Err(BlockChainError::request_error("head read failed", None, None));
			}
			take_one(&mut state.head_hangs)
		};
		if hang {
			tokio::time::sleep(Duration::from_secs(3600)).await;
		}
		Ok(self.state.lock().unwrap().head)
	}

	async fn get_block_with_transactions(&self, number: u64) -> Result<EVMBlock, BlockChainError> {
		let mut state = self.state.lock().unwrap();
		state.fetched.push(number);

		if let Some(remaining) = state.block_request_failures.get_mut(&number) {
			if take_one(remaining) {
				return Err(BlockChainError::request_error("provider error", None, None));
			}
		}
		if let Some(remaining) = state.block_failures.get_mut(&number) {
			if take_one(remaining) {
				return Err(BlockChainError::decode_error("garbled block", None, None));
			}
		}

		state
			.blocks
			.get(&number)
			.cloned()
			.ok_or_else(|| BlockChainError::block_not_found(number.to_string(), None, None))
	}
}

/// Connector serving registered fake chains by slug; unknown slugs never connect
#[derive(Clone, Debug, Default)]
pub struct FakeConnector {
	pub chains: HashMap<String, FakeChain>,
}

impl FakeConnector {
	pub fn single(slug: &str, chain: FakeChain) -> Self {
		Self {
			chains: HashMap::from([(slug.to_string(), chain)]),
		}
	}

	pub fn with(mut self, slug: &str, chain: FakeChain) -> Self {
		self.chains.insert(slug.to_string(), chain);
		self
	}
}

#[async_trait]
impl ChainConnector for FakeConnector {
	type Client = FakeChain;

	async fn connect(&self, chain: &ChainConfig) -> Result<FakeChain, BlockChainError> {
		let Some(fake) = self.chains.get(&chain.slug) else {
			return Err(BlockChainError::connection_error(
				format!("no endpoint for {}", chain.slug),
				None,
				None,
			));
		};

		let mut state = fake.state.lock().unwrap();
		if take_one(&mut state.connect_failures) {
			return Err(BlockChainError::connection_error("connection refused", None, None));
		}
		state.connects += 1;
		drop(state);
		Ok(fake.clone())
	}
}
