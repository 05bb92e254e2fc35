//! Persisted token records and lifecycle helpers.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenId, token::secret::SecretHash},
	error::ConfigError,
};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is currently valid.
	Active,
	/// Token exceeded its expiry instant.
	Expired,
	/// Token has been revoked.
	Revoked,
}

/// Persisted record describing one issued token. The plaintext secret is never part of
/// the record; only its salted digest is.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Unique identifier; also the throttling principal.
	pub id: TokenId,
	/// Salted digest of the secret half of the presented token.
	pub secret: SecretHash,
	/// Non-empty scopes granted to this record.
	pub scope: ScopeSet,
	/// Creation instant.
	pub created_at: OffsetDateTime,
	/// Expiry instant; strictly after `created_at`.
	pub expires_at: OffsetDateTime,
	/// Revocation instant if the record has been revoked.
	pub revoked_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Builds a record expiring `ttl` after `created_at`.
	///
	/// Fails with [`ConfigError::InvalidTtl`] when the time-to-live is not strictly
	/// positive, preserving the `expires_at > created_at` invariant at creation.
	pub fn issue(
		id: TokenId,
		secret: SecretHash,
		scope: ScopeSet,
		created_at: OffsetDateTime,
		ttl: Duration,
	) -> Result<Self, ConfigError> {
		if !ttl.is_positive() {
			return Err(ConfigError::InvalidTtl { ttl });
		}

		Ok(Self { id, secret, scope, created_at, expires_at: created_at + ttl, revoked_at: None })
	}

	/// Computes the lifecycle status at a given instant. Revocation wins over expiry.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if self.revoked_at.is_some() {
			return TokenStatus::Revoked;
		}
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> TokenStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the record has been revoked.
	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}

	/// Marks the record as revoked; later calls keep the first instant.
	pub fn revoke(&mut self, instant: OffsetDateTime) {
		self.revoked_at.get_or_insert(instant);
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("id", &self.id)
			.field("secret", &"<redacted>")
			.field("scope", &self.scope)
			.field("created_at", &self.created_at)
			.field("expires_at", &self.expires_at)
			.field("revoked_at", &self.revoked_at)
			.finish()
	}
}
