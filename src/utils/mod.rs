//! Utility modules for common functionality.
//!
//! - http: Retryable HTTP client construction for the HTTP transport
//! - logging: Logging setup and the shared `ErrorContext`
//! - parsing: Parsing utilities
//! - tests: Test builders
//! - units: Native unit conversion

pub mod http;
pub mod logging;
pub mod parsing;
pub mod tests;
pub mod units;

pub use http::*;
pub use parsing::*;
pub use units::*;
