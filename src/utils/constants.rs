//! Constants shared across the service.

/// Admin API bind address
pub const DEFAULT_API_BIND_ADDRESS: &str = "127.0.0.1:3000";

/// One day
pub const DEFAULT_MATURATION_OFFSET_SECS: u64 = 86_400;

/// Pending notifications per observer before the feed applies backpressure
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Bound on every REST lookup
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Print-event source prefix emitted by the Stacks DLC manager
pub const EVENT_SOURCE_PREFIX: &str = "dlclink";

/// Print-event source version accepted by the decoder
pub const EVENT_SOURCE_VERSION: &str = "v1";

/// Named attestor deployments selectable through `ATTESTOR_CONFIG`
pub const ATTESTOR_PRESETS: &[(&str, &[&str])] = &[
	(
		"docker",
		&[
			"http://172.20.128.5:8801",
			"http://172.20.128.6:8802",
			"http://172.20.128.7:8803",
		],
	),
	(
		"local",
		&[
			"http://127.0.0.1:8801",
			"http://127.0.0.1:8802",
			"http://127.0.0.1:8803",
		],
	),
	(
		"devnet",
		&[
			"https://devnet.dlc.link/attestor-1",
			"https://devnet.dlc.link/attestor-2",
			"https://devnet.dlc.link/attestor-3",
		],
	),
	(
		"testnet",
		&[
			"https://testnet.dlc.link/attestor-1",
			"https://testnet.dlc.link/attestor-2",
			"https://testnet.dlc.link/attestor-3",
		],
	),
	("mainnet", &[]),
];
