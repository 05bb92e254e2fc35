//! Gateway-level error taxonomy shared by the service, the stores, and the client.
//!
//! Every failure the HTTP surface can produce maps to exactly one [`ErrorKind`] with a
//! stable wire label and status code; nothing enumerated here degrades to a generic 500.
//! The same labels round-trip through [`ErrorBody`] so the client reconstructs the
//! server-side kind faithfully.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Authentication or authorization failure.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Request-level failure that is never retried.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// Per-principal throttling.
	#[error(transparent)]
	Throttle(#[from] ThrottleError),
	/// Storage-backend failure.
	#[error(transparent)]
	Backend(#[from] BackendError),
	/// Token-registry persistence failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Client-side transport or retry-budget failure.
	#[error(transparent)]
	Client(#[from] ClientError),
}
impl Error {
	/// Stable kind label for the error, used on the wire and by retry classification.
	///
	/// Local failures that never cross the wire collapse onto the closest transport-level
	/// kind: token-registry and transport failures read as `Unavailable`, exhausted
	/// deadlines as `Timeout`.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Auth(AuthError::MissingCredentials) => ErrorKind::MissingCredentials,
			Self::Auth(AuthError::InvalidToken) => ErrorKind::InvalidToken,
			Self::Auth(AuthError::Expired) => ErrorKind::Expired,
			Self::Auth(AuthError::Revoked) => ErrorKind::Revoked,
			Self::Auth(AuthError::InsufficientScope { .. }) => ErrorKind::InsufficientScope,
			Self::Request(RequestError::NotFound) => ErrorKind::NotFound,
			Self::Request(RequestError::InvalidCursor { .. }) => ErrorKind::InvalidCursor,
			Self::Request(RequestError::PayloadTooLarge { .. }) => ErrorKind::PayloadTooLarge,
			Self::Throttle(ThrottleError::RateLimited { .. }) => ErrorKind::RateLimited,
			Self::Backend(BackendError::Unavailable { .. }) => ErrorKind::Unavailable,
			Self::Backend(BackendError::Timeout) => ErrorKind::Timeout,
			Self::Storage(_) | Self::Config(_) => ErrorKind::Unavailable,
			Self::Client(ClientError::DeadlineExceeded) => ErrorKind::Timeout,
			Self::Client(ClientError::RetriesExhausted { last, .. }) => last.kind(),
			Self::Client(_) => ErrorKind::Unavailable,
		}
	}

	/// HTTP status code for the error when rendered by a transport adapter.
	pub fn status(&self) -> u16 {
		self.kind().status()
	}

	/// Returns `true` when a client may retry the request with backoff.
	pub fn is_retryable(&self) -> bool {
		match self {
			// A response outside the protocol is not one a replay can fix.
			Self::Client(ClientError::UnexpectedResponse { .. }) => false,
			_ => self.kind().is_retryable(),
		}
	}

	/// Retry-after hint attached to the error, when one exists.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Throttle(ThrottleError::RateLimited { retry_after }) => Some(*retry_after),
			_ => None,
		}
	}

	/// Renders the structured `{error, message}` wire body.
	pub fn wire_body(&self) -> ErrorBody {
		ErrorBody {
			error: self.kind(),
			message: self.to_string(),
			retry_after_secs: self
				.retry_after()
				.map(|hint| hint.whole_seconds().max(1).unsigned_abs()),
		}
	}

	/// Reconstructs a typed error from a decoded wire body.
	pub fn from_wire(body: ErrorBody) -> Self {
		match body.error {
			ErrorKind::MissingCredentials => AuthError::MissingCredentials.into(),
			ErrorKind::InvalidToken => AuthError::InvalidToken.into(),
			ErrorKind::Expired => AuthError::Expired.into(),
			ErrorKind::Revoked => AuthError::Revoked.into(),
			ErrorKind::InsufficientScope =>
				AuthError::InsufficientScope { reason: body.message }.into(),
			ErrorKind::NotFound => RequestError::NotFound.into(),
			ErrorKind::InvalidCursor => RequestError::InvalidCursor { reason: body.message }.into(),
			ErrorKind::PayloadTooLarge => RequestError::PayloadTooLarge { limit: None }.into(),
			ErrorKind::RateLimited => ThrottleError::RateLimited {
				retry_after: Duration::seconds(
					body.retry_after_secs.map(|secs| secs as i64).unwrap_or(1),
				),
			}
			.into(),
			ErrorKind::Unavailable => BackendError::Unavailable { message: body.message }.into(),
			ErrorKind::Timeout => BackendError::Timeout.into(),
		}
	}
}

/// Authentication and authorization failures (401/403, never retried).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum AuthError {
	/// No `Authorization: Bearer` credential was presented.
	#[error("Request carries no bearer credential.")]
	MissingCredentials,
	/// The presented token matched no active record.
	#[error("Token is invalid or unknown.")]
	InvalidToken,
	/// The token exists but its expiry instant has passed.
	#[error("Token has expired.")]
	Expired,
	/// The token has been revoked and must not be reused.
	#[error("Token has been revoked.")]
	Revoked,
	/// The token is valid but lacks the scope the operation requires.
	#[error("Token lacks the required scope: {reason}.")]
	InsufficientScope {
		/// Names the missing scope.
		reason: String,
	},
}

/// Request-level failures (4xx, never retried).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RequestError {
	/// The addressed object does not exist.
	#[error("Object not found.")]
	NotFound,
	/// The pagination cursor failed to decode or was replayed against a different prefix.
	#[error("Cursor is invalid: {reason}.")]
	InvalidCursor {
		/// Explains why the cursor was rejected.
		reason: String,
	},
	/// The payload exceeds the backend's advertised object-size limit.
	#[error("Payload exceeds the backend object-size limit.")]
	PayloadTooLarge {
		/// The advertised limit in bytes, when the backend exposes one.
		limit: Option<usize>,
	},
}

/// Per-principal throttling (429, retried honoring the hint).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ThrottleError {
	/// The principal's bucket is exhausted for the current refill window.
	#[error("Rate limit exceeded; retry after {retry_after}.")]
	RateLimited {
		/// Time until one unit becomes available.
		retry_after: Duration,
	},
}

/// Storage-backend failures (503/504, retried with backoff).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum BackendError {
	/// The backend is unreachable or rejected the call outright.
	#[error("Storage backend unavailable: {message}.")]
	Unavailable {
		/// Human-readable failure payload.
		message: String,
	},
	/// The backend did not answer within its deadline.
	#[error("Storage backend timed out.")]
	Timeout,
}

/// Configuration and validation failures raised locally.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Token creation was requested with a non-positive time-to-live.
	#[error("Token TTL must be positive, got {ttl}.")]
	InvalidTtl {
		/// The rejected duration.
		ttl: Duration,
	},
	/// A token with the same id already exists.
	#[error("A token with id `{id}` already exists.")]
	DuplicateToken {
		/// The conflicting identifier string.
		id: String,
	},
	/// Configuration file could not be read.
	#[error("Failed to read configuration file.")]
	Io(#[from] std::io::Error),
	/// Configuration file contains malformed JSON.
	#[error("Failed to parse configuration file.")]
	Parse(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Client base URL cannot be parsed.
	#[error("Client base URL is invalid.")]
	InvalidBaseUrl(#[from] url::ParseError),
}

/// Client-side failures raised by the resilient client.
#[derive(Debug, ThisError)]
pub enum ClientError {
	/// Underlying HTTP transport reported a network failure.
	#[error("Network error occurred while calling the gateway.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The server answered with a status/body combination outside the protocol.
	#[error("Gateway returned an unexpected response (HTTP {status}): {message}.")]
	UnexpectedResponse {
		/// HTTP status code observed.
		status: u16,
		/// Raw or summarized response payload.
		message: String,
	},
	/// Every permitted attempt failed; carries the last observed outcome.
	#[error("Request failed after {attempts} attempts: {last}")]
	RetriesExhausted {
		/// Number of attempts performed.
		attempts: u32,
		/// Last error observed before giving up.
		#[source]
		last: Box<Error>,
	},
	/// The overall deadline budget for the logical call was exceeded.
	#[error("Overall request deadline exceeded.")]
	DeadlineExceeded,
}
impl ClientError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ClientError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}

/// Stable wire label identifying one failure condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// No credential presented.
	MissingCredentials,
	/// Unknown or malformed token.
	InvalidToken,
	/// Token past its expiry.
	Expired,
	/// Token revoked.
	Revoked,
	/// Scope missing for the verb.
	InsufficientScope,
	/// Object or record absent.
	NotFound,
	/// Undecodable or prefix-mismatched cursor.
	InvalidCursor,
	/// Payload above the backend limit.
	PayloadTooLarge,
	/// Bucket exhausted.
	RateLimited,
	/// Backend unreachable.
	Unavailable,
	/// Backend deadline elapsed.
	Timeout,
}
impl ErrorKind {
	/// Returns the stable snake_case label used on the wire and in metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MissingCredentials => "missing_credentials",
			Self::InvalidToken => "invalid_token",
			Self::Expired => "expired",
			Self::Revoked => "revoked",
			Self::InsufficientScope => "insufficient_scope",
			Self::NotFound => "not_found",
			Self::InvalidCursor => "invalid_cursor",
			Self::PayloadTooLarge => "payload_too_large",
			Self::RateLimited => "rate_limited",
			Self::Unavailable => "unavailable",
			Self::Timeout => "timeout",
		}
	}

	/// HTTP status code the kind renders as.
	pub const fn status(self) -> u16 {
		match self {
			Self::MissingCredentials | Self::InvalidToken | Self::Expired | Self::Revoked => 401,
			Self::InsufficientScope => 403,
			Self::NotFound => 404,
			Self::InvalidCursor => 400,
			Self::PayloadTooLarge => 413,
			Self::RateLimited => 429,
			Self::Unavailable => 503,
			Self::Timeout => 504,
		}
	}

	/// Returns `true` for kinds a client may retry with backoff.
	pub const fn is_retryable(self) -> bool {
		matches!(self, Self::RateLimited | Self::Unavailable | Self::Timeout)
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ErrorKind {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"missing_credentials" => Self::MissingCredentials,
			"invalid_token" => Self::InvalidToken,
			"expired" => Self::Expired,
			"revoked" => Self::Revoked,
			"insufficient_scope" => Self::InsufficientScope,
			"not_found" => Self::NotFound,
			"invalid_cursor" => Self::InvalidCursor,
			"payload_too_large" => Self::PayloadTooLarge,
			"rate_limited" => Self::RateLimited,
			"unavailable" => Self::Unavailable,
			"timeout" => Self::Timeout,
			_ => return Err(()),
		})
	}
}

/// Structured error body rendered on the wire as `{error, message}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Stable kind label.
	pub error: ErrorKind,
	/// Human-readable description.
	pub message: String,
	/// Retry-after hint in whole seconds, present for throttled responses.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub retry_after_secs: Option<u64>,
}
