//! Token registry contract and built-in implementations.
//!
//! The registry is explicit state with an explicit load/persist lifecycle, passed to
//! request handlers rather than hidden behind a process-wide global. [`FileStore`]
//! persists through atomic replace so concurrent readers never observe a partial
//! rewrite; [`MemoryStore`] backs tests and demos.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, SecretHash, TokenId, TokenRecord, TokenSecret, TokenStatus},
	error::{AuthError, ConfigError},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Durable registry of issued tokens: scopes, expiry, revocation.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Issues a new token: generates a random secret, persists salt + digest plus
	/// metadata, and returns the plaintext exactly once.
	///
	/// Fails with [`ConfigError::InvalidTtl`] for non-positive TTLs and
	/// [`ConfigError::DuplicateToken`] when the id is already taken. Empty scope sets
	/// are unrepresentable by construction of [`ScopeSet`].
	fn create(
		&self,
		id: TokenId,
		scope: ScopeSet,
		ttl: Duration,
	) -> StoreFuture<'_, (TokenSecret, TokenRecord)>;

	/// Validates a presented token and returns its record (principal + scopes).
	///
	/// Fails with [`AuthError::InvalidToken`] for malformed or unknown tokens and with
	/// [`AuthError::Expired`] / [`AuthError::Revoked`] for dead records regardless of
	/// their granted scopes.
	fn validate<'a>(&'a self, presented: &'a TokenSecret) -> StoreFuture<'a, TokenRecord>;

	/// Marks a record revoked; idempotent, and a no-op for unknown ids.
	fn revoke<'a>(&'a self, id: &'a TokenId) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] persistence layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced while reading or writing the registry.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Filesystem-level failure underneath the registry.
	#[error("Registry persistence failure: {message}.")]
	Persistence {
		/// Human-readable error payload.
		message: String,
	},
}

pub(crate) fn issue_into(
	records: &mut HashMap<TokenId, TokenRecord>,
	id: TokenId,
	scope: ScopeSet,
	ttl: Duration,
	now: OffsetDateTime,
) -> Result<(TokenSecret, TokenRecord)> {
	if records.contains_key(&id) {
		return Err(ConfigError::DuplicateToken { id: id.to_string() }.into());
	}

	let (secret, secret_half) = TokenSecret::mint(&id);
	let record = TokenRecord::issue(id.clone(), SecretHash::new(&secret_half), scope, now, ttl)?;

	records.insert(id, record.clone());

	Ok((secret, record))
}

pub(crate) fn validate_in(
	records: &HashMap<TokenId, TokenRecord>,
	presented: &TokenSecret,
	now: OffsetDateTime,
) -> Result<TokenRecord> {
	let Some((id, secret_half)) = presented.split() else {
		return Err(AuthError::InvalidToken.into());
	};
	let Some(record) = records.get(id) else {
		return Err(AuthError::InvalidToken.into());
	};

	if !record.secret.matches(secret_half) {
		return Err(AuthError::InvalidToken.into());
	}

	match record.status_at(now) {
		TokenStatus::Active => Ok(record.clone()),
		TokenStatus::Expired => Err(AuthError::Expired.into()),
		TokenStatus::Revoked => Err(AuthError::Revoked.into()),
	}
}
