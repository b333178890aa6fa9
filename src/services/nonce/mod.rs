//! Nonce coordination for account based chains.

mod coordinator;
mod error;

pub use coordinator::{NonceCoordinator, NonceLease, NonceSource, SigningIdentity};
pub use error::NonceError;
