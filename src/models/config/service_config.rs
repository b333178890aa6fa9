//! Process level settings read from the environment.

use std::{path::PathBuf, time::Duration};

use crate::{
	models::{config::endpoint_config::DEFAULT_CHAINS_DIR, ConfigError},
	utils::constants::{
		ATTESTOR_PRESETS, DEFAULT_API_BIND_ADDRESS, DEFAULT_CHANNEL_CAPACITY,
		DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MATURATION_OFFSET_SECS,
	},
};

/// Settings shared by every endpoint
#[derive(Debug, Clone)]
pub struct ServiceConfig {
	/// Base URL of the attestor the dispatcher talks to
	pub attestor_url: Option<String>,
	pub api_enabled: bool,
	pub api_bind_address: String,
	/// Maturation offset for endpoints without their own
	pub default_maturation_offset: Duration,
	/// Admin write routes answer without touching a chain
	pub test_mode: bool,
	pub attestor_list: Vec<String>,
	pub channel_capacity: usize,
	pub http_timeout: Duration,
	pub chains_dir: PathBuf,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self {
			attestor_url: None,
			api_enabled: true,
			api_bind_address: DEFAULT_API_BIND_ADDRESS.to_string(),
			default_maturation_offset: Duration::from_secs(DEFAULT_MATURATION_OFFSET_SECS),
			test_mode: false,
			attestor_list: Vec::new(),
			channel_capacity: DEFAULT_CHANNEL_CAPACITY,
			http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
			chains_dir: PathBuf::from(DEFAULT_CHAINS_DIR),
		}
	}
}

fn parse_number<T: std::str::FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
	value
		.map(|v| {
			v.trim()
				.parse::<T>()
				.map_err(|_| ConfigError::env_error(format!("{} must be a number, got '{}'", name, v)))
		})
		.transpose()
}

fn parse_flag(value: Option<String>) -> bool {
	value
		.map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
		.unwrap_or(false)
}

impl ServiceConfig {
	/// Reads settings from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads settings through an arbitrary accessor.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let defaults = Self::default();

		let maturation_secs = parse_number::<u64>(
			"DEFAULT_MATURATION_OFFSET_SECS",
			lookup("DEFAULT_MATURATION_OFFSET_SECS"),
		)?;
		let channel_capacity =
			parse_number::<usize>("OBSERVER_CHANNEL_CAPACITY", lookup("OBSERVER_CHANNEL_CAPACITY"))?;
		if channel_capacity == Some(0) {
			return Err(ConfigError::env_error(
				"OBSERVER_CHANNEL_CAPACITY must be greater than 0",
			));
		}
		let http_timeout = parse_number::<u64>("HTTP_TIMEOUT_SECS", lookup("HTTP_TIMEOUT_SECS"))?;

		Ok(Self {
			attestor_url: lookup("ATTESTOR_URL").filter(|v| !v.is_empty()),
			api_enabled: !parse_flag(lookup("API_DISABLED")),
			api_bind_address: lookup("API_BIND_ADDRESS").unwrap_or(defaults.api_bind_address),
			default_maturation_offset: maturation_secs
				.map(Duration::from_secs)
				.unwrap_or(defaults.default_maturation_offset),
			test_mode: parse_flag(lookup("TEST_MODE_ENABLED")),
			attestor_list: resolve_attestor_list(
				lookup("ATTESTOR_LIST").as_deref(),
				lookup("ATTESTOR_CONFIG").as_deref(),
			),
			channel_capacity: channel_capacity.unwrap_or(defaults.channel_capacity),
			http_timeout: http_timeout
				.map(Duration::from_secs)
				.unwrap_or(defaults.http_timeout),
			chains_dir: lookup("CHAINS_CONFIG_DIR")
				.map(PathBuf::from)
				.unwrap_or(defaults.chains_dir),
		})
	}
}

/// Attestor URLs exposed by `/get-all-attestors`.
///
/// A non-empty comma separated `list` wins; otherwise `preset` selects one of
/// the named deployments. Unknown presets yield an empty list.
pub fn resolve_attestor_list(list: Option<&str>, preset: Option<&str>) -> Vec<String> {
	if let Some(list) = list.filter(|l| !l.trim().is_empty()) {
		return list
			.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect();
	}

	preset
		.and_then(|name| ATTESTOR_PRESETS.iter().find(|(preset, _)| *preset == name))
		.map(|(_, domains)| domains.iter().map(|d| d.to_string()).collect())
		.unwrap_or_default()
}
