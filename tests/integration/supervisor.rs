use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

use chain_ingestor::{
	models::ChainConfig,
	services::{
		listener::{CursorStorage, FileCursorStorage, ListenerError},
		store::StoreError,
		supervisor::{ChainReport, ListenerOutcome, Supervisor},
	},
	utils::tests::builders::chain::ChainConfigBuilder,
};

use crate::integration::mocks::{hashes_for, wait_until, FakeChain, FakeConnector};

const WAIT: Duration = Duration::from_secs(5);

fn chain(dir: &TempDir, slug: &str) -> ChainConfig {
	ChainConfigBuilder::new()
		.name(slug)
		.slug(slug)
		.connect_max_retries(2)
		.in_dir(dir.path())
		.build()
}

fn outcome_of<'a>(reports: &'a [ChainReport], slug: &str) -> &'a ListenerOutcome {
	&reports
		.iter()
		.find(|report| report.chain == slug)
		.unwrap_or_else(|| panic!("no report for {}", slug))
		.outcome
}

#[tokio::test]
async fn test_failing_chain_does_not_stop_the_others() {
	let dir = TempDir::new().unwrap();
	let eth = chain(&dir, "eth");
	let bnb = chain(&dir, "bnb");
	FileCursorStorage::for_chain(&eth)
		.save_last_processed_block(0)
		.await
		.unwrap();

	let fake = FakeChain::with_blocks(3);
	// bnb has no endpoint and fails once its connect retries are spent
	let connector = FakeConnector::single("eth", fake.clone());

	let (shutdown, rx) = watch::channel(false);
	let supervisor = Supervisor::new(connector);
	let chains = vec![eth.clone(), bnb];
	let running = tokio::spawn(async move { supervisor.run(chains, rx).await });

	let cursor = FileCursorStorage::for_chain(&eth);
	let cursor = &cursor;
	wait_until(WAIT, move || async move {
		cursor.get_last_processed_block().await.ok().flatten() == Some(3)
	})
	.await;

	shutdown.send(true).unwrap();
	let reports = tokio::time::timeout(WAIT, running).await.unwrap().unwrap();

	assert_eq!(reports.len(), 2);
	assert!(outcome_of(&reports, "eth").is_stopped());
	assert!(matches!(
		outcome_of(&reports, "bnb"),
		ListenerOutcome::Failed(ListenerError::ConnectionError(_))
	));

	let stored: Vec<String> = chain_ingestor::services::store::store_for_chain(&eth)
		.read_all()
		.await
		.unwrap()
		.into_iter()
		.map(|r| r.tx_hash)
		.collect();
	assert_eq!(stored, hashes_for(1..=3));
}

#[tokio::test]
async fn test_unwritable_store_is_reported_without_starting_listener() {
	let dir = TempDir::new().unwrap();
	let blocker = dir.path().join("not-a-directory");
	std::fs::write(&blocker, "file").unwrap();

	let mut broken = chain(&dir, "bnb");
	broken.output_path = blocker.join("bnb_transactions.json");
	let eth = chain(&dir, "eth");

	let fake_bnb = FakeChain::with_blocks(1);
	let connector = FakeConnector::single("eth", FakeChain::with_blocks(1)).with("bnb", fake_bnb.clone());

	let (_shutdown, rx) = watch::channel(true);
	let reports = tokio::time::timeout(WAIT, Supervisor::new(connector).run(vec![broken, eth], rx))
		.await
		.unwrap();

	assert!(matches!(
		outcome_of(&reports, "bnb"),
		ListenerOutcome::StoreUnavailable(StoreError::Io(_))
	));
	assert!(outcome_of(&reports, "eth").is_stopped());
	assert_eq!(fake_bnb.connects(), 0);
}

#[tokio::test]
async fn test_shutdown_before_start_stops_every_listener() {
	let dir = TempDir::new().unwrap();
	let chains = vec![chain(&dir, "eth"), chain(&dir, "bnb")];
	let connector = FakeConnector::single("eth", FakeChain::with_blocks(1))
		.with("bnb", FakeChain::with_blocks(1));

	let (_shutdown, rx) = watch::channel(true);
	let reports = tokio::time::timeout(WAIT, Supervisor::new(connector).run(chains, rx))
		.await
		.unwrap();

	assert_eq!(reports.len(), 2);
	assert!(reports.iter().all(|report| report.outcome.is_stopped()));
	// Stores are created before the listeners start
	assert!(dir.path().join("eth_transactions.json").exists());
	assert!(dir.path().join("bnb_transactions.json").exists());
}
