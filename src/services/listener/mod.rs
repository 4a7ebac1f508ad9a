//! Per-chain block listener.
//!
//! - `service`: the listener state machine
//! - `cursor`: persisted cursor and dead-letter file
//! - `error`: listener error types

mod cursor;
mod error;
mod service;

pub use cursor::{CursorStorage, FileCursorStorage};
pub use error::ListenerError;
pub use service::{ChainListener, ListenerState};
