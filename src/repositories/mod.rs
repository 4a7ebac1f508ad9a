//! Repository implementations for configuration management.
//!
//! Chain configurations are loaded from JSON files in a directory and exposed through
//! [`ChainService`], which the binary uses to build the supervisor's chain list.

mod chain;
mod error;

pub use chain::{ChainRepository, ChainRepositoryTrait, ChainService};
pub use error::RepositoryError;
