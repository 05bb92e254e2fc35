//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenId, TokenRecord, TokenSecret},
	store::{self, StoreFuture, TokenStore},
};

type RegistryMap = Arc<RwLock<HashMap<TokenId, TokenRecord>>>;

/// Registry that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(RegistryMap);
impl MemoryStore {
	fn create_now(
		map: RegistryMap,
		id: TokenId,
		scope: ScopeSet,
		ttl: Duration,
	) -> Result<(TokenSecret, TokenRecord)> {
		store::issue_into(&mut map.write(), id, scope, ttl, OffsetDateTime::now_utc())
	}

	fn validate_now(map: RegistryMap, presented: TokenSecret) -> Result<TokenRecord> {
		store::validate_in(&map.read(), &presented, OffsetDateTime::now_utc())
	}

	fn revoke_now(map: RegistryMap, id: TokenId) {
		if let Some(record) = map.write().get_mut(&id) {
			record.revoke(OffsetDateTime::now_utc());
		}
	}
}
impl TokenStore for MemoryStore {
	fn create(
		&self,
		id: TokenId,
		scope: ScopeSet,
		ttl: Duration,
	) -> StoreFuture<'_, (TokenSecret, TokenRecord)> {
		let map = self.0.clone();

		Box::pin(async move { Self::create_now(map, id, scope, ttl) })
	}

	fn validate<'a>(&'a self, presented: &'a TokenSecret) -> StoreFuture<'a, TokenRecord> {
		let map = self.0.clone();
		let presented = presented.clone();

		Box::pin(async move { Self::validate_now(map, presented) })
	}

	fn revoke<'a>(&'a self, id: &'a TokenId) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let id = id.clone();

		Box::pin(async move {
			Self::revoke_now(map, id);

			Ok(())
		})
	}
}
