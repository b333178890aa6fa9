//! Core services of the DLC observer.
//!
//! - `blockchain`: chain clients, subscription feeds and the reconnect supervisor
//! - `decoder`: raw notification to canonical event decoding
//! - `observer`: per-endpoint observers feeding the dispatcher
//! - `attestation`: attestor client and event dispatch
//! - `broadcaster`: confirmation transaction signing and submission
//! - `nonce`: per-identity nonce coordination
//! - `api`: administrative HTTP surface

pub mod api;
pub mod attestation;
pub mod blockchain;
pub mod broadcaster;
pub mod decoder;
pub mod nonce;
pub mod observer;
