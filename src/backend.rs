//! Pluggable storage backend contract and the in-memory reference implementation.
//!
//! The gateway treats byte storage as an external collaborator: anything satisfying
//! [`StorageBackend`] (filesystem, S3-compatible, in-memory) can sit behind the
//! service. The concrete variant is chosen once at startup from configuration, never
//! via runtime type inspection.

pub mod memory;

pub use memory::MemoryBackend;

// self
use crate::{_prelude::*, error::BackendError, key::ObjectKey};

/// Boxed future returned by [`StorageBackend`] operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + 'a + Send>>;

/// Whether a put created the key or replaced an existing value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PutOutcome {
	/// The key did not previously exist.
	Created,
	/// A prior value was overwritten.
	Overwritten,
}

/// One page of keys produced by a backend listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
	/// Matching keys in lexicographic byte order.
	pub keys: Vec<ObjectKey>,
	/// `true` when more matching keys exist past this page.
	pub truncated: bool,
}

/// Storage collaborator contract: get/put/delete plus a native listing primitive.
pub trait StorageBackend
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, or `None` when absent. A present key with
	/// a zero-length value yields `Some` with empty bytes.
	fn get<'a>(&'a self, key: &'a ObjectKey) -> BackendFuture<'a, Option<Vec<u8>>>;

	/// Stores `bytes` under `key`, overwriting any prior value.
	fn put<'a>(&'a self, key: &'a ObjectKey, bytes: Vec<u8>) -> BackendFuture<'a, PutOutcome>;

	/// Removes `key`; `None` acknowledges that the key was already absent.
	fn delete<'a>(&'a self, key: &'a ObjectKey) -> BackendFuture<'a, Option<()>>;

	/// Lists up to `limit` keys matching `prefix`, strictly after `after` when given,
	/// in lexicographic byte order.
	fn list<'a>(
		&'a self,
		prefix: &'a ObjectKey,
		after: Option<&'a ObjectKey>,
		limit: usize,
	) -> BackendFuture<'a, Listing>;

	/// Largest object size the backend accepts, when it advertises one.
	fn max_object_size(&self) -> Option<usize> {
		None
	}
}
