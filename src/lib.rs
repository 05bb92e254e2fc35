//! Key-value object store core: scoped bearer auth, token-bucket throttling, cursor
//! pagination, and a retry-aware client in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod backend;
#[cfg(feature = "reqwest")] pub mod client;
pub mod config;
pub mod cursor;
pub mod error;
pub mod gate;
pub mod key;
pub mod obs;
pub mod service;
pub mod store;
pub mod throttle;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ScopeSet, TokenId, TokenSecret},
		backend::MemoryBackend,
		gate::AuthGate,
		service::ObjectService,
		store::{MemoryStore, TokenStore},
		throttle::RateLimiter,
	};

	/// Default bucket shape used by service fixtures: effectively unthrottled.
	pub const TEST_BUCKET: (f64, f64) = (1_000., 1_000.);

	/// Builds an [`ObjectService`] over a [`MemoryBackend`] and [`MemoryStore`], plus one
	/// issued token carrying the provided scopes.
	pub async fn build_memory_service(
		scopes: &[&str],
		bucket: (f64, f64),
	) -> (ObjectService, TokenSecret) {
		let registry = Arc::new(MemoryStore::default());
		let id = TokenId::new("fixture").expect("Fixture token id should be valid.");
		let scope = ScopeSet::new(scopes.iter().copied()).expect("Fixture scopes should be valid.");
		let (secret, _) = registry
			.create(id, scope, Duration::hours(1))
			.await
			.expect("Fixture token creation should succeed.");
		let gate = AuthGate::new(registry);
		let throttle = RateLimiter::new(bucket.0, bucket.1);
		let service = ObjectService::new(Arc::new(MemoryBackend::default()), gate, throttle);

		(service, secret)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
