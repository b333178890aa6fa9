//! Administrative HTTP surface.
//!
//! Write routes (`/set-status-funded`, `/post-close-dlc`) and the attestor
//! list are restricted to local and docker network callers. Attestor reads
//! are passed through to the configured attestation service.

use std::{
	net::{IpAddr, Ipv4Addr},
	sync::Arc,
};

use crate::{services::attestation::AttestationService, services::broadcaster::ContractPool};

mod server;

pub use server::{configure_routes, create_api_server};

/// Shared state of every request handler
#[derive(Clone)]
pub struct ApiState {
	pub contracts: ContractPool,
	pub attestor: Option<Arc<dyn AttestationService>>,
	pub attestor_list: Vec<String>,
	/// Write routes answer without touching a chain
	pub test_mode: bool,
	/// Slugs of the observed endpoints, reported by `/health`
	pub observed: Vec<String>,
}

impl ApiState {
	pub fn new(contracts: ContractPool) -> Self {
		Self {
			contracts,
			attestor: None,
			attestor_list: Vec::new(),
			test_mode: false,
			observed: Vec::new(),
		}
	}

	pub fn with_attestor(mut self, attestor: Arc<dyn AttestationService>) -> Self {
		self.attestor = Some(attestor);
		self
	}

	pub fn with_attestor_list(mut self, attestor_list: Vec<String>) -> Self {
		self.attestor_list = attestor_list;
		self
	}

	pub fn with_test_mode(mut self, test_mode: bool) -> Self {
		self.test_mode = test_mode;
		self
	}

	pub fn with_observed(mut self, observed: Vec<String>) -> Self {
		self.observed = observed;
		self
	}
}

/// Whether a caller may use the restricted routes.
///
/// Only the socket peer is consulted. Loopback peers and peers on the docker
/// bridge range `172.16.0.0/12` are accepted; `Host` and forwarding headers are
/// client controlled and never trusted.
pub fn is_local_or_docker(peer: Option<IpAddr>) -> bool {
	match peer {
		Some(IpAddr::V4(ip)) => is_local_v4(ip),
		Some(IpAddr::V6(ip)) => ip.is_loopback() || ip.to_ipv4_mapped().is_some_and(is_local_v4),
		None => false,
	}
}

fn is_local_v4(ip: Ipv4Addr) -> bool {
	let [first, second, ..] = ip.octets();
	ip.is_loopback() || (first == 172 && second & 0xf0 == 16)
}
