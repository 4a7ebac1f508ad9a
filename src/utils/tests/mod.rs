//! Test helper utilities
//!
//! - `builders`: Builders for chain configurations, blocks and transactions
//! - `http`: Retry policies for tests against mock servers

pub mod builders {
	pub mod evm {
		pub mod block;
		pub mod transaction;
	}

	pub mod chain;
	pub mod record;
}


pub use builders::*;
pub use http::*;
