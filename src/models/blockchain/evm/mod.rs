//! EVM block and transaction models.

mod block;
mod transaction;

pub use block::{BaseBlock as EVMBaseBlock, Block as EVMBlock, MAX_STANDARD_EXTRA_DATA_LEN};
pub use transaction::{BaseTransaction as EVMBaseTransaction, Transaction as EVMTransaction};
