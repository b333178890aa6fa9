//! Utility modules for common functionality.
//!
//! This module provides various utility functions and types that are used across
//! the application. Currently includes:
//!
//! - constants: Constants for the application
//! - http: Retryable HTTP client construction
//! - logging: Logging utilities
//! - precision: Outcome precision conversion
//! - retry: Reconnect backoff

pub mod constants;
pub mod http;
pub mod logging;
pub mod precision;
pub mod retry;

pub use constants::*;
pub use http::{create_http_client, create_retryable_http_client, HttpRetryConfig, TransientErrorRetryStrategy};
pub use precision::{scale_outcome, PrecisionError};
pub use retry::{Backoff, BackoffConfig};
