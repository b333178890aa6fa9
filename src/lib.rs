//! DLC attestation observer.
//!
//! Watches DLC manager contracts on EVM networks and on Stacks, normalizes their
//! lifecycle events and drives two downstream actions:
//!
//! - announcement/attestation requests against an attestor service
//! - confirmation transactions broadcast back onto the origin chain
//!
//! # Module Structure
//! - `bootstrap`: wiring of endpoints into observers and broadcasters
//! - `models`: chain tags, endpoints, canonical events and chain specific documents
//! - `repositories`: configuration backed endpoint storage
//! - `services`: decoders, transports, observers, attestation, broadcasting, nonces, API
//! - `utils`: logging, HTTP retry, backoff and precision helpers

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
