//! Verb-to-backend translation with auth, throttling, and pagination applied.
//!
//! The service is the server half of the request-handling contract: every object
//! operation runs the [`AuthGate`], then the [`RateLimiter`], then a single backend
//! call, and maps the backend outcome onto the documented response semantics. Keys
//! arrive in their percent-encoded wire form and are decoded before the backend sees
//! them; keys in listings are re-encoded identically, so arbitrary key bytes round-trip
//! exactly. Transport routing stays outside this crate; an adapter extracts the path
//! segment and the `Authorization` header and calls straight in.

// self
use crate::{
	_prelude::*,
	backend::{MemoryBackend, PutOutcome, StorageBackend},
	config::{BackendConfig, GatewayConfig},
	cursor::PageCursor,
	error::RequestError,
	gate::{AuthContext, AuthGate, Operation},
	key::ObjectKey,
	obs::{self, OpOutcome, OpSpan},
	store::FileStore,
	throttle::RateLimiter,
};

/// Page size used when a listing request names none.
pub const DEFAULT_PAGE_SIZE: usize = 100;
/// Upper bound on a single listing page.
pub const MAX_PAGE_SIZE: usize = 1_000;

/// Listing request parameters as they appear in the query string.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListQuery<'a> {
	/// Percent-encoded key prefix; absent means "everything".
	pub prefix: Option<&'a str>,
	/// Continuation cursor from a previous page.
	pub cursor: Option<&'a str>,
	/// Requested page size; clamped to `[1, MAX_PAGE_SIZE]`.
	pub limit: Option<usize>,
}

/// Wire payload for one listing page: `{keys: [...], next_cursor?}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
	/// Matching keys in their percent-encoded wire form, lexicographic by raw bytes.
	pub keys: Vec<ObjectKey>,
	/// Opaque continuation token; absent on the final page.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next_cursor: Option<String>,
}

/// Request handler shared by every transport adapter.
pub struct ObjectService {
	backend: Arc<dyn StorageBackend>,
	gate: AuthGate,
	throttle: RateLimiter,
}
impl ObjectService {
	/// Assembles the service from its collaborators.
	pub fn new(backend: Arc<dyn StorageBackend>, gate: AuthGate, throttle: RateLimiter) -> Self {
		Self { backend, gate, throttle }
	}

	/// Assembles the service from a loaded configuration: file-backed token registry,
	/// per-principal throttle, and the configured storage backend.
	pub fn from_config(config: &GatewayConfig) -> Result<Self> {
		let registry = Arc::new(FileStore::open(&config.tokens_file)?);
		let backend: Arc<dyn StorageBackend> = match config.backend {
			BackendConfig::Memory { max_object_size: Some(limit) } =>
				Arc::new(MemoryBackend::with_max_object_size(limit)),
			BackendConfig::Memory { max_object_size: None } => Arc::new(MemoryBackend::default()),
		};

		Ok(Self::new(
			backend,
			AuthGate::new(registry),
			RateLimiter::new(config.rate_limit.capacity, config.rate_limit.refill_per_sec),
		))
	}

	/// Stores `bytes` under the (wire-encoded) `key`, reporting created vs overwritten
	/// so the transport can answer 201 vs 204.
	pub async fn put(
		&self,
		authorization: Option<&str>,
		key: &str,
		bytes: Vec<u8>,
	) -> Result<PutOutcome> {
		const OP: Operation = Operation::Put;

		self.observed(OP, "put", async {
			self.admit(authorization, OP).await?;

			if let Some(limit) = self.backend.max_object_size()
				&& bytes.len() > limit
			{
				return Err(RequestError::PayloadTooLarge { limit: Some(limit) }.into());
			}

			let key = ObjectKey::decode(key);

			Ok(self.backend.put(&key, bytes).await?)
		})
		.await
	}

	/// Fetches the value stored under `key`. An existing zero-length value is a success
	/// with empty bytes, never conflated with absence.
	pub async fn get(&self, authorization: Option<&str>, key: &str) -> Result<Vec<u8>> {
		const OP: Operation = Operation::Get;

		self.observed(OP, "get", async {
			self.admit(authorization, OP).await?;

			let key = ObjectKey::decode(key);

			self.backend.get(&key).await?.ok_or_else(|| RequestError::NotFound.into())
		})
		.await
	}

	/// Existence check; resolved through the backend's listing primitive so the value
	/// bytes are never read.
	pub async fn head(&self, authorization: Option<&str>, key: &str) -> Result<bool> {
		const OP: Operation = Operation::Head;

		self.observed(OP, "head", async {
			self.admit(authorization, OP).await?;

			let key = ObjectKey::decode(key);
			// A key sorts first within its own prefix range, so one-slot listing
			// answers existence exactly.
			let listing = self.backend.list(&key, None, 1).await?;

			Ok(listing.keys.first() == Some(&key))
		})
		.await
	}

	/// Removes `key`. Deleting an absent key fails with `NotFound` (the service reports
	/// the true state transition; callers wanting idempotence treat 404 as success).
	pub async fn delete(&self, authorization: Option<&str>, key: &str) -> Result<()> {
		const OP: Operation = Operation::Delete;

		self.observed(OP, "delete", async {
			self.admit(authorization, OP).await?;

			let key = ObjectKey::decode(key);

			self.backend.delete(&key).await?.ok_or_else(|| RequestError::NotFound.into())
		})
		.await
	}

	/// Lists keys under a prefix, one page at a time.
	///
	/// Continuation state lives entirely in the returned cursor, so the externally
	/// observed protocol is backend-agnostic and survives restarts. A cursor replayed
	/// with a different prefix than it was minted for is rejected.
	pub async fn list(&self, authorization: Option<&str>, query: ListQuery<'_>) -> Result<Page> {
		const OP: Operation = Operation::List;

		self.observed(OP, "list", async {
			self.admit(authorization, OP).await?;

			let prefix = ObjectKey::decode(query.prefix.unwrap_or_default());
			let (after, limit) = match query.cursor {
				Some(wire) => {
					let cursor = PageCursor::decode(wire)?;

					cursor.ensure_prefix(&prefix)?;

					// Cursors are opaque, not trusted; the minted limit gets re-clamped.
					(Some(cursor.last), cursor.limit.clamp(1, MAX_PAGE_SIZE))
				},
				None =>
					(None, query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)),
			};
			let listing = self.backend.list(&prefix, after.as_ref(), limit).await?;
			let next_cursor = match (listing.truncated, listing.keys.last()) {
				(true, Some(last)) =>
					Some(PageCursor::new(prefix, last.clone(), limit).encode()),
				_ => None,
			};

			Ok(Page { keys: listing.keys, next_cursor })
		})
		.await
	}

	/// Liveness probe; unauthenticated and unthrottled.
	pub async fn health(&self) -> Result<()> {
		self.observed(Operation::Health, "health", async { Ok(()) }).await
	}

	/// Runs the gate then the throttle, in that order: only authenticated principals
	/// spend bucket units.
	async fn admit(&self, authorization: Option<&str>, op: Operation) -> Result<AuthContext> {
		let ctx = self.gate.authorize(authorization, op).await?;

		self.throttle.check(&ctx.principal)?;

		Ok(ctx)
	}

	async fn observed<T, F>(&self, op: Operation, stage: &'static str, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		let span = OpSpan::new(op, stage);

		obs::record_op_outcome(op, OpOutcome::Attempt);

		let result = span.instrument(fut).await;

		match &result {
			Ok(_) => obs::record_op_outcome(op, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(op, OpOutcome::Failure),
		}

		result
	}
}
impl Debug for ObjectService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ObjectService(..)")
	}
}
