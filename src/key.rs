//! Opaque byte-string object keys and their percent-encoded wire form.
//!
//! Keys are arbitrary bytes, separators and control bytes and non-ASCII content
//! included. The wire form percent-encodes everything outside the URL-safe unreserved
//! set, and decoding is the exact inverse, so any key round-trips byte-exactly through
//! path segments, listings, and cursors.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};
// self
use crate::_prelude::*;

/// Everything except RFC 3986 unreserved characters is escaped.
const KEY_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Opaque object key ordered lexicographically by raw bytes.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey(Vec<u8>);
impl ObjectKey {
	/// Wraps raw key bytes.
	pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
		Self(bytes.into())
	}

	/// Decodes the percent-encoded wire form back into raw bytes.
	///
	/// Decoding never fails: stray `%` sequences that are not valid escapes pass
	/// through as literal bytes, mirroring how they would have been encoded.
	pub fn decode(wire: &str) -> Self {
		Self(percent_decode_str(wire).collect())
	}

	/// Renders the percent-encoded wire form.
	pub fn encoded(&self) -> String {
		percent_encode(&self.0, KEY_ENCODE_SET).to_string()
	}

	/// Raw key bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Key length in bytes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` for the empty key (also the match-everything prefix).
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Byte-wise prefix test.
	pub fn starts_with(&self, prefix: &ObjectKey) -> bool {
		self.0.starts_with(&prefix.0)
	}
}
impl From<&str> for ObjectKey {
	fn from(value: &str) -> Self {
		Self(value.as_bytes().to_vec())
	}
}
impl From<String> for ObjectKey {
	fn from(value: String) -> Self {
		Self(value.into_bytes())
	}
}
impl From<&[u8]> for ObjectKey {
	fn from(value: &[u8]) -> Self {
		Self(value.to_vec())
	}
}
impl From<Vec<u8>> for ObjectKey {
	fn from(value: Vec<u8>) -> Self {
		Self(value)
	}
}
impl Debug for ObjectKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ObjectKey").field(&self.encoded()).finish()
	}
}
impl Display for ObjectKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.encoded())
	}
}
impl Serialize for ObjectKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(&self.encoded())
	}
}
impl<'de> Deserialize<'de> for ObjectKey {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let wire = String::deserialize(deserializer)?;

		Ok(Self::decode(&wire))
	}
}
