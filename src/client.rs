//! Retry-aware HTTP client speaking the gateway protocol.
//!
//! One [`ResilientClient`] wraps a pooled [`ReqwestClient`] and is cheap to clone per
//! task. Every call classifies each attempt as retryable or terminal before any wait
//! happens: only `rate_limited`, `unavailable`, `timeout`, and transport failures are
//! retried, with exponential backoff overridden by a server `Retry-After` hint when one
//! is present. A logical call never outlives its overall deadline budget, no matter how
//! many attempts remain.

// crates.io
use reqwest::{
	RequestBuilder, Response, StatusCode,
	header::{HeaderMap, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	backend::PutOutcome,
	config::ClientConfig,
	error::{AuthError, BackendError, ClientError, ConfigError, ErrorBody, RequestError, ThrottleError},
	key::ObjectKey,
	service::Page,
};

/// Retry behavior for one logical call.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
	/// Maximum number of attempts, the first included.
	pub max_attempts: u32,
	/// Backoff before the second attempt; doubles for each retry after that.
	pub initial_backoff: Duration,
	/// Wall-clock budget for the whole logical call, waits included.
	pub overall_budget: Duration,
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 4,
			initial_backoff: Duration::milliseconds(250),
			overall_budget: Duration::seconds(30),
		}
	}
}

/// Classification of one finished attempt, decided before any wait happens.
enum Attempt {
	/// 2xx response; hand it to the caller.
	Done(Response),
	/// Retryable failure, optionally carrying a server wait hint.
	Retry { error: Error, hint: Option<Duration> },
	/// Failure that repeating the identical request cannot fix.
	Terminal(Error),
}

/// Gateway client with typed operations and bounded retries.
#[derive(Clone, Debug)]
pub struct ResilientClient {
	http: ReqwestClient,
	base: Url,
	token: TokenSecret,
	policy: RetryPolicy,
}
impl ResilientClient {
	/// Builds a client for the gateway at `base` presenting `token` on every request.
	///
	/// The base URL is normalized to end with `/` so a path prefix survives joining.
	pub fn new(mut base: Url, token: TokenSecret) -> Result<Self, ConfigError> {
		// Joining eagerly rejects cannot-be-a-base URLs before any request is sent.
		base.join("health")?;

		if !base.path().ends_with('/') {
			base.set_path(&format!("{}/", base.path()));
		}

		Ok(Self { http: ReqwestClient::new(), base, token, policy: RetryPolicy::default() })
	}

	/// Builds a client from a loaded [`ClientConfig`].
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let base = Url::parse(&config.base_url)?;

		Ok(Self::new(base, TokenSecret::new(config.token.clone()))?
			.with_policy(config.retry_policy()))
	}

	/// Overrides the default retry policy.
	pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Reuses an existing connection pool instead of building a fresh one.
	pub fn with_http_client(mut self, http: ReqwestClient) -> Self {
		self.http = http;

		self
	}

	/// Stores `bytes` under `key`, reporting whether the key was created or overwritten.
	pub async fn put(&self, key: &ObjectKey, bytes: Vec<u8>) -> Result<PutOutcome> {
		let url = self.object_url(key)?;
		let response = self
			.send_with_retry(|| {
				self.http
					.put(url.clone())
					.bearer_auth(self.token.expose())
					.body(bytes.clone())
			})
			.await?;

		match response.status() {
			StatusCode::CREATED => Ok(PutOutcome::Created),
			StatusCode::NO_CONTENT => Ok(PutOutcome::Overwritten),
			status => Err(unexpected(status, "put").into()),
		}
	}

	/// Fetches the value stored under `key`; absence surfaces as a `NotFound` error.
	pub async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>> {
		let url = self.object_url(key)?;
		let response = self
			.send_with_retry(|| self.http.get(url.clone()).bearer_auth(self.token.expose()))
			.await?;

		Ok(response.bytes().await.map_err(ClientError::from)?.to_vec())
	}

	/// Existence check via `HEAD`; a 404 answers `false` instead of failing.
	pub async fn exists(&self, key: &ObjectKey) -> Result<bool> {
		let url = self.object_url(key)?;
		let sent = self
			.send_with_retry(|| self.http.head(url.clone()).bearer_auth(self.token.expose()))
			.await;

		match sent {
			Ok(_) => Ok(true),
			Err(Error::Request(RequestError::NotFound)) => Ok(false),
			Err(e) => Err(e),
		}
	}

	/// Removes `key`. The gateway reports deleting an absent key as `NotFound`; callers
	/// wanting idempotent semantics treat that error as success.
	pub async fn delete(&self, key: &ObjectKey) -> Result<()> {
		let url = self.object_url(key)?;

		self.send_with_retry(|| self.http.delete(url.clone()).bearer_auth(self.token.expose()))
			.await?;

		Ok(())
	}

	/// Fetches one listing page under `prefix`, resuming from `cursor` when given.
	pub async fn list_page(
		&self,
		prefix: &ObjectKey,
		cursor: Option<&str>,
		limit: Option<usize>,
	) -> Result<Page> {
		let mut url = self.base.join("objects").map_err(ConfigError::from)?;

		{
			let mut pairs = url.query_pairs_mut();

			if !prefix.is_empty() {
				pairs.append_pair("prefix", &prefix.encoded());
			}
			if let Some(cursor) = cursor {
				pairs.append_pair("cursor", cursor);
			}
			if let Some(limit) = limit {
				pairs.append_pair("limit", &limit.to_string());
			}
		}

		let response = self
			.send_with_retry(|| self.http.get(url.clone()).bearer_auth(self.token.expose()))
			.await?;
		let bytes = response.bytes().await.map_err(ClientError::from)?;

		decode_json(&bytes)
	}

	/// Returns a lazy pager over every key under `prefix`, fetching pages on demand and
	/// following cursors transparently.
	pub fn keys(&self, prefix: ObjectKey) -> KeyPages<'_> {
		KeyPages { client: self, prefix, cursor: None, limit: None, done: false }
	}

	/// Probes the gateway's health route.
	pub async fn health(&self) -> Result<()> {
		let url = self.base.join("health").map_err(ConfigError::from)?;

		self.send_with_retry(|| self.http.get(url.clone())).await?;

		Ok(())
	}

	fn object_url(&self, key: &ObjectKey) -> Result<Url, ConfigError> {
		// The key's wire form is parsed, not re-encoded, so its escapes survive intact.
		Ok(self.base.join(&format!("objects/{}", key.encoded()))?)
	}

	/// Bounded attempt loop owning the backoff schedule and the deadline budget.
	async fn send_with_retry<B>(&self, build: B) -> Result<Response>
	where
		B: Fn() -> RequestBuilder,
	{
		let deadline = OffsetDateTime::now_utc() + self.policy.overall_budget;
		let mut backoff = self.policy.initial_backoff;
		let mut attempts = 0;

		loop {
			attempts += 1;

			let (error, hint) = match classify(build().send().await).await {
				Attempt::Done(response) => return Ok(response),
				Attempt::Terminal(error) => return Err(error),
				Attempt::Retry { error, hint } => (error, hint),
			};

			if attempts >= self.policy.max_attempts {
				return Err(ClientError::RetriesExhausted { attempts, last: Box::new(error) }.into());
			}

			// A server hint always outranks the local schedule.
			let wait = hint.unwrap_or(backoff);

			if OffsetDateTime::now_utc() + wait > deadline {
				return Err(ClientError::DeadlineExceeded.into());
			}

			tokio::time::sleep(std::time::Duration::try_from(wait).unwrap_or_default()).await;

			backoff *= 2;
		}
	}
}

/// Lazy pager returned by [`ResilientClient::keys`]; each `next` call fetches one page.
#[derive(Debug)]
pub struct KeyPages<'a> {
	client: &'a ResilientClient,
	prefix: ObjectKey,
	cursor: Option<String>,
	limit: Option<usize>,
	done: bool,
}
impl KeyPages<'_> {
	/// Requests pages of at most `limit` keys instead of the server default.
	pub fn with_page_size(mut self, limit: usize) -> Self {
		self.limit = Some(limit);

		self
	}

	/// Fetches the next page of keys, or `None` once the listing is exhausted.
	pub async fn next(&mut self) -> Result<Option<Vec<ObjectKey>>> {
		if self.done {
			return Ok(None);
		}

		let page =
			self.client.list_page(&self.prefix, self.cursor.as_deref(), self.limit).await?;

		self.cursor = page.next_cursor;
		self.done = self.cursor.is_none();

		Ok(Some(page.keys))
	}

	/// Drains the remaining pages into one flat vector.
	pub async fn collect(mut self) -> Result<Vec<ObjectKey>> {
		let mut keys = Vec::new();

		while let Some(page) = self.next().await? {
			keys.extend(page);
		}

		Ok(keys)
	}
}

async fn classify(sent: Result<Response, ReqwestError>) -> Attempt {
	let response = match sent {
		Ok(response) => response,
		// Network failures are retryable; the request may never have reached the server,
		// but every gateway operation tolerates replay.
		Err(e) => return Attempt::Retry { error: ClientError::from(e).into(), hint: None },
	};
	let status = response.status();

	if status.is_success() {
		return Attempt::Done(response);
	}

	let hint = parse_retry_after(response.headers());
	let bytes = match response.bytes().await {
		Ok(bytes) => bytes,
		Err(e) => return Attempt::Retry { error: ClientError::from(e).into(), hint },
	};
	let error = decode_error(status, &bytes);

	if error.is_retryable() {
		let hint = hint.or_else(|| error.retry_after());

		Attempt::Retry { error, hint }
	} else {
		Attempt::Terminal(error)
	}
}

/// Rebuilds the typed error from a non-2xx response, falling back to the status code
/// for bodyless responses such as `HEAD`.
fn decode_error(status: StatusCode, bytes: &[u8]) -> Error {
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	if let Ok(body) = serde_path_to_error::deserialize::<_, ErrorBody>(&mut deserializer) {
		return Error::from_wire(body);
	}

	match status {
		StatusCode::BAD_REQUEST =>
			RequestError::InvalidCursor { reason: "undecodable error body".into() }.into(),
		StatusCode::UNAUTHORIZED => AuthError::InvalidToken.into(),
		StatusCode::FORBIDDEN => AuthError::InsufficientScope { reason: "unspecified".into() }.into(),
		StatusCode::NOT_FOUND => RequestError::NotFound.into(),
		StatusCode::PAYLOAD_TOO_LARGE => RequestError::PayloadTooLarge { limit: None }.into(),
		StatusCode::TOO_MANY_REQUESTS =>
			ThrottleError::RateLimited { retry_after: Duration::seconds(1) }.into(),
		StatusCode::GATEWAY_TIMEOUT => BackendError::Timeout.into(),
		// Any other bodyless 5xx reads as an outage worth retrying.
		status if status.is_server_error() =>
			BackendError::Unavailable { message: format!("HTTP {status}") }.into(),
		status => unexpected(status, "undecodable error body").into(),
	}
}

fn decode_json<T>(bytes: &[u8]) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	Ok(serde_path_to_error::deserialize(&mut deserializer).map_err(ConfigError::Parse)?)
}

fn unexpected(status: StatusCode, message: &str) -> ClientError {
	ClientError::UnexpectedResponse { status: status.as_u16(), message: message.into() }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
