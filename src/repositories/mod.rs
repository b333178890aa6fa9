//! Repository implementations for configuration management.
//!
//! Endpoint files are loaded once at startup; services read the resolved
//! endpoints through [`EndpointService`].

mod endpoint;
mod error;

pub use endpoint::{EndpointRepository, EndpointRepositoryTrait, EndpointService};
pub use error::RepositoryError;
