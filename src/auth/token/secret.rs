//! Secret material: redacted plaintext wrapper and salted digests.
//!
//! A presented token has the shape `<id>.<secret>`: the id addresses the persisted
//! record, the secret is verified against the record's salted SHA-256 digest. Plaintext
//! is returned exactly once at creation and never persisted.

// crates.io
use base64::{Engine as _, engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD}};
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::TokenId};

const SECRET_LEN: usize = 32;
const SALT_LEN: usize = 16;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps an existing secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Generates a presented token together with its bare secret half.
	pub(crate) fn mint(id: &TokenId) -> (Self, String) {
		let mut bytes = [0_u8; SECRET_LEN];

		rand::rng().fill_bytes(&mut bytes);

		let half = URL_SAFE_NO_PAD.encode(bytes);

		(Self(format!("{id}.{half}")), half)
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Splits the presented form into its id and secret halves, when well-shaped.
	pub fn split(&self) -> Option<(&str, &str)> {
		self.0.split_once('.')
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Salted SHA-256 digest of a token secret; the only secret-derived material persisted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretHash {
	/// Per-record random salt, base64 (no padding).
	pub salt: String,
	/// Digest of salt bytes followed by the secret's UTF-8 bytes, base64 (no padding).
	pub digest: String,
}
impl SecretHash {
	/// Hashes the secret half of a presented token under a fresh random salt.
	pub fn new(secret: &str) -> Self {
		let mut salt = [0_u8; SALT_LEN];

		rand::rng().fill_bytes(&mut salt);

		Self { salt: STANDARD_NO_PAD.encode(salt), digest: Self::digest_with(&salt, secret) }
	}

	/// Returns `true` when the presented secret hashes to the stored digest.
	///
	/// Secrets are high-entropy random strings, so a plain digest comparison leaks
	/// nothing usable through timing.
	pub fn matches(&self, secret: &str) -> bool {
		let Ok(salt) = STANDARD_NO_PAD.decode(&self.salt) else {
			return false;
		};

		Self::digest_with(&salt, secret) == self.digest
	}

	fn digest_with(salt: &[u8], secret: &str) -> String {
		let mut hasher = Sha256::new();

		hasher.update(salt);
		hasher.update(secret.as_bytes());

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}
impl Debug for SecretHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SecretHash").field("salt", &self.salt).field("digest", &"<opaque>").finish()
	}
}
