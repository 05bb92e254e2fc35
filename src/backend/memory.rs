//! Thread-safe in-memory [`StorageBackend`] for tests and demos.

// self
use crate::{
	_prelude::*,
	backend::{BackendFuture, Listing, PutOutcome, StorageBackend},
	error::BackendError,
	key::ObjectKey,
};

type ObjectMap = Arc<RwLock<BTreeMap<ObjectKey, Vec<u8>>>>;

/// Keeps objects in a sorted in-process map; the map's ordering doubles as the
/// backend's native listing order.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
	objects: ObjectMap,
	max_object_size: Option<usize>,
}
impl MemoryBackend {
	/// Builds a backend that rejects objects larger than `limit` bytes.
	pub fn with_max_object_size(limit: usize) -> Self {
		Self { objects: ObjectMap::default(), max_object_size: Some(limit) }
	}

	fn list_now(
		map: ObjectMap,
		prefix: ObjectKey,
		after: Option<ObjectKey>,
		limit: usize,
	) -> Listing {
		let guard = map.read();
		let mut keys = Vec::with_capacity(limit.min(64));
		let mut truncated = false;

		for key in guard.keys() {
			if !key.starts_with(&prefix) {
				// Sorted iteration: a non-matching key greater than the prefix sits past
				// the whole prefix range, so nothing further can match.
				if key.as_bytes() > prefix.as_bytes() {
					break;
				}
				continue;
			}
			if after.as_ref().is_some_and(|a| key <= a) {
				continue;
			}
			if keys.len() == limit {
				truncated = true;
				break;
			}

			keys.push(key.clone());
		}

		Listing { keys, truncated }
	}
}
impl StorageBackend for MemoryBackend {
	fn get<'a>(&'a self, key: &'a ObjectKey) -> BackendFuture<'a, Option<Vec<u8>>> {
		let map = self.objects.clone();
		let key = key.clone();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn put<'a>(&'a self, key: &'a ObjectKey, bytes: Vec<u8>) -> BackendFuture<'a, PutOutcome> {
		let map = self.objects.clone();
		let key = key.clone();

		Box::pin(async move {
			match map.write().insert(key, bytes) {
				Some(_) => Ok(PutOutcome::Overwritten),
				None => Ok(PutOutcome::Created),
			}
		})
	}

	fn delete<'a>(&'a self, key: &'a ObjectKey) -> BackendFuture<'a, Option<()>> {
		let map = self.objects.clone();
		let key = key.clone();

		Box::pin(async move { Ok(map.write().remove(&key).map(|_| ())) })
	}

	fn list<'a>(
		&'a self,
		prefix: &'a ObjectKey,
		after: Option<&'a ObjectKey>,
		limit: usize,
	) -> BackendFuture<'a, Listing> {
		let map = self.objects.clone();
		let prefix = prefix.clone();
		let after = after.cloned();

		Box::pin(async move { Ok(Self::list_now(map, prefix, after, limit)) })
	}

	fn max_object_size(&self) -> Option<usize> {
		self.max_object_size
	}
}

/// Backend wrapper that fails a configured number of calls before delegating; exists so
/// retry behavior can be exercised without a real flaky network.
#[derive(Clone, Debug)]
pub struct FlakyBackend<B> {
	inner: B,
	remaining_failures: Arc<Mutex<u32>>,
}
impl<B> FlakyBackend<B> {
	/// Wraps `inner`, failing the first `failures` calls with [`BackendError::Unavailable`].
	pub fn new(inner: B, failures: u32) -> Self {
		Self { inner, remaining_failures: Arc::new(Mutex::new(failures)) }
	}

	fn should_fail(&self) -> bool {
		let mut remaining = self.remaining_failures.lock();

		if *remaining > 0 {
			*remaining -= 1;

			true
		} else {
			false
		}
	}

	fn unavailable() -> BackendError {
		BackendError::Unavailable { message: "injected failure".into() }
	}
}
impl<B> StorageBackend for FlakyBackend<B>
where
	B: StorageBackend,
{
	fn get<'a>(&'a self, key: &'a ObjectKey) -> BackendFuture<'a, Option<Vec<u8>>> {
		if self.should_fail() {
			return Box::pin(async { Err(Self::unavailable()) });
		}

		self.inner.get(key)
	}

	fn put<'a>(&'a self, key: &'a ObjectKey, bytes: Vec<u8>) -> BackendFuture<'a, PutOutcome> {
		if self.should_fail() {
			return Box::pin(async { Err(Self::unavailable()) });
		}

		self.inner.put(key, bytes)
	}

	fn delete<'a>(&'a self, key: &'a ObjectKey) -> BackendFuture<'a, Option<()>> {
		if self.should_fail() {
			return Box::pin(async { Err(Self::unavailable()) });
		}

		self.inner.delete(key)
	}

	fn list<'a>(
		&'a self,
		prefix: &'a ObjectKey,
		after: Option<&'a ObjectKey>,
		limit: usize,
	) -> BackendFuture<'a, Listing> {
		if self.should_fail() {
			return Box::pin(async { Err(Self::unavailable()) });
		}

		self.inner.list(prefix, after, limit)
	}

	fn max_object_size(&self) -> Option<usize> {
		self.inner.max_object_size()
	}
}
