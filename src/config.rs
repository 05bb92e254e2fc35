//! JSON configuration for assembling the gateway and its client.
//!
//! Loading goes through `serde_path_to_error` so a malformed file names the exact field
//! path that failed instead of a bare offset.

// std
use std::{fs, path::{Path, PathBuf}};
// self
use crate::{_prelude::*, error::ConfigError};

#[cfg(feature = "reqwest")] use crate::client::RetryPolicy;

/// Server-side assembly settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Path of the token-registry snapshot file.
	pub tokens_file: PathBuf,
	/// Throttling applied per authenticated principal.
	pub rate_limit: RateLimitConfig,
	/// Storage backend to run against.
	#[serde(default)]
	pub backend: BackendConfig,
}
impl GatewayConfig {
	/// Loads and validates a configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		load_json(path.as_ref())
	}
}

/// Token-bucket shape shared by every principal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
	/// Burst capacity in request units.
	pub capacity: f64,
	/// Refill rate in units per second.
	pub refill_per_sec: f64,
}

/// Storage backend selection, tagged by `type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
	/// Process-local storage; contents do not survive a restart.
	Memory {
		/// Largest accepted object size in bytes, unbounded when absent.
		#[serde(default)]
		max_object_size: Option<usize>,
	},
}
impl Default for BackendConfig {
	fn default() -> Self {
		Self::Memory { max_object_size: None }
	}
}

/// Client-side connection and retry settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Gateway base URL, e.g. `http://localhost:8080`.
	pub base_url: String,
	/// Presented bearer token in its `<id>.<secret>` form.
	pub token: String,
	/// Maximum attempts per logical call.
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	/// Backoff before the second attempt, in milliseconds.
	#[serde(default = "default_initial_backoff_ms")]
	pub initial_backoff_ms: u64,
	/// Wall-clock budget per logical call, in milliseconds.
	#[serde(default = "default_overall_budget_ms")]
	pub overall_budget_ms: u64,
}
impl ClientConfig {
	/// Loads and validates a configuration file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		load_json(path.as_ref())
	}

	/// Renders the retry fields as a [`RetryPolicy`].
	#[cfg(feature = "reqwest")]
	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy {
			max_attempts: self.max_attempts.max(1),
			initial_backoff: Duration::milliseconds(self.initial_backoff_ms as i64),
			overall_budget: Duration::milliseconds(self.overall_budget_ms as i64),
		}
	}
}

fn default_max_attempts() -> u32 {
	4
}

fn default_initial_backoff_ms() -> u64 {
	250
}

fn default_overall_budget_ms() -> u64 {
	30_000
}

fn load_json<T>(path: &Path) -> Result<T, ConfigError>
where
	T: for<'de> Deserialize<'de>,
{
	let raw = fs::read(path)?;
	let mut deserializer = serde_json::Deserializer::from_slice(&raw);

	Ok(serde_path_to_error::deserialize(&mut deserializer)?)
}
