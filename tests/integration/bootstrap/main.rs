use std::{collections::BTreeMap, fs, path::Path};
use tempfile::TempDir;
use tokio::sync::watch;

use chain_ingestor::{
	bootstrap::{all_stopped_cleanly, initialize_chains, run_listeners},
	models::{SecretValue, StoreFormat},
	repositories::{ChainRepository, ChainService},
	services::{
		listener::ListenerError,
		supervisor::{ChainReport, ListenerOutcome},
	},
	utils::tests::builders::chain::ChainConfigBuilder,
};

use crate::integration::mocks::{FakeChain, FakeConnector};

fn write_chain(dir: &Path, file: &str, slug: &str, extra: &str) {
	let contents = format!(
		r#"{{
			"name": "{slug} chain",
			"slug": "{slug}",
			"token_symbol": "TKN",
			"rpc_url": {{"type": "plain", "value": "https://{slug}.example/rpc"}},
			"output_path": "{slug}_transactions.json"{extra}
		}}"#
	);
	fs::write(dir.join(file), contents).unwrap();
}

#[tokio::test]
async fn test_initialize_chains_from_directory() {
	let dir = TempDir::new().unwrap();
	write_chain(dir.path(), "b_bnb.json", "bnb", r#", "proof_of_authority": true"#);
	write_chain(
		dir.path(),
		"a_eth.json",
		"eth",
		r#", "store_format": "json_lines", "max_catchup_blocks": 100"#,
	);
	fs::write(dir.path().join("README.md"), "not a chain").unwrap();

	let chains = initialize_chains::<ChainRepository>(None, Some(dir.path()))
		.await
		.unwrap();

	assert_eq!(chains.len(), 2);
	assert_eq!(chains[0].slug, "eth");
	assert_eq!(chains[0].store_format, StoreFormat::JsonLines);
	assert_eq!(chains[0].max_catchup_blocks, Some(100));
	assert!(!chains[0].proof_of_authority);
	assert_eq!(chains[1].slug, "bnb");
	assert!(chains[1].proof_of_authority);
	assert!(matches!(chains[1].rpc_url, SecretValue::Plain(_)));
}

#[tokio::test]
async fn test_initialize_chains_empty_directory_is_an_error() {
	let dir = TempDir::new().unwrap();
	let result = initialize_chains::<ChainRepository>(None, Some(dir.path())).await;
	assert!(result.is_err());
}

#[tokio::test]
async fn test_initialize_chains_missing_directory_is_an_error() {
	let dir = TempDir::new().unwrap();
	let missing = dir.path().join("missing");
	let result = initialize_chains::<ChainRepository>(None, Some(&missing)).await;
	assert!(result.is_err());
}

#[tokio::test]
async fn test_initialize_chains_rejects_invalid_file() {
	let dir = TempDir::new().unwrap();
	write_chain(dir.path(), "eth.json", "eth", r#", "poll_interval_ms": 0"#);
	let result = initialize_chains::<ChainRepository>(None, Some(dir.path())).await;
	assert!(result.is_err());
}

#[tokio::test]
async fn test_initialize_chains_with_prebuilt_service() {
	let chain = ChainConfigBuilder::new().build();
	let repository = ChainRepository {
		chains: BTreeMap::from([("eth".to_string(), chain)]),
	};
	let service = ChainService::<ChainRepository>::new_with_repository(repository).unwrap();

	let chains = initialize_chains(Some(service), None).await.unwrap();
	assert_eq!(chains.len(), 1);
	assert_eq!(chains[0].slug, "eth");
}

#[tokio::test]
async fn test_run_listeners_stops_on_shutdown() {
	let dir = TempDir::new().unwrap();
	let chains = vec![ChainConfigBuilder::new().in_dir(dir.path()).build()];
	let connector = FakeConnector::single("eth", FakeChain::with_blocks(2));

	let (_shutdown, rx) = watch::channel(true);
	let reports = run_listeners(chains, connector, rx).await;

	assert_eq!(reports.len(), 1);
	assert!(all_stopped_cleanly(&reports));
}

#[test]
fn test_all_stopped_cleanly() {
	let stopped = ChainReport {
		chain: "eth".to_string(),
		outcome: ListenerOutcome::Stopped,
	};
	let failed = ChainReport {
		chain: "bnb".to_string(),
		outcome: ListenerOutcome::Failed(ListenerError::connection_error("refused", None, None)),
	};

	assert!(all_stopped_cleanly(&[]));
	assert!(all_stopped_cleanly(std::slice::from_ref(&stopped)));
	assert!(!all_stopped_cleanly(&[stopped, failed]));
}
