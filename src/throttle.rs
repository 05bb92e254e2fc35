//! Per-principal token-bucket throttling with lazy refill.
//!
//! One bucket per principal, shared capacity and refill rate. Buckets refill lazily at
//! check time (`elapsed × rate`, capped at capacity); there is no background timer.
//! Limiting is local to one running instance: replicas each enforce their own budget
//! unless bucket state is externalized.

// self
use crate::{_prelude::*, auth::TokenId, error::ThrottleError};

/// Mutable bucket state for one principal.
#[derive(Clone, Copy, Debug)]
struct Bucket {
	available: f64,
	refilled_at: OffsetDateTime,
}

/// Token-bucket rate limiter applied after successful authentication.
#[derive(Debug)]
pub struct RateLimiter {
	capacity: f64,
	refill_per_sec: f64,
	buckets: Mutex<HashMap<TokenId, Bucket>>,
}
impl RateLimiter {
	/// Builds a limiter with the provided bucket capacity and refill rate (units per
	/// second). Non-positive values are clamped to a minimal working configuration.
	pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
		Self {
			capacity: capacity.max(1.),
			refill_per_sec: refill_per_sec.max(f64::MIN_POSITIVE),
			buckets: Mutex::new(HashMap::new()),
		}
	}

	/// Consumes one unit from the principal's bucket, or fails with a wait hint.
	pub fn check(&self, principal: &TokenId) -> Result<(), ThrottleError> {
		self.check_at(principal, OffsetDateTime::now_utc())
	}

	/// Clock-injected variant of [`check`](Self::check); the bucket mutation runs under
	/// one exclusive critical section so concurrent requests from the same principal
	/// cannot double-spend a unit.
	pub fn check_at(&self, principal: &TokenId, now: OffsetDateTime) -> Result<(), ThrottleError> {
		let mut buckets = self.buckets.lock();
		let bucket = buckets
			.entry(principal.clone())
			.or_insert(Bucket { available: self.capacity, refilled_at: now });
		let elapsed = (now - bucket.refilled_at).as_seconds_f64().max(0.);

		bucket.available = (bucket.available + elapsed * self.refill_per_sec).min(self.capacity);
		bucket.refilled_at = now;

		if bucket.available >= 1. {
			bucket.available -= 1.;

			return Ok(());
		}

		let deficit = 1. - bucket.available;
		let wait_secs = deficit / self.refill_per_sec;

		Err(ThrottleError::RateLimited { retry_after: Duration::seconds_f64(wait_secs) })
	}
}
