use std::{future::Future, time::Duration};

/// Polls `condition` every 10ms until it holds, panicking after `limit`
pub async fn wait_until<F, Fut>(limit: Duration, mut condition: F)
where
	F: FnMut() -> Fut,
	Fut: Future<Output = bool>,
{
	let deadline = tokio::time::Instant::now() + limit;
	loop {
		if condition().await {
			return;
		}
		if tokio::time::Instant::now() >= deadline {
			panic!("condition not met within {:?}", limit);
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
}
