//! Stateless pagination cursors for the listing protocol.
//!
//! A cursor encodes everything needed to resume a listing (prefix, last returned key,
//! page size), so the server keeps no session and a cursor minted before a restart
//! remains valid afterward. The external form is base64url (no padding) over a JSON
//! body whose keys use the percent-encoded wire form, which round-trips arbitrary key
//! bytes exactly.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, error::RequestError, key::ObjectKey};

/// Opaque continuation token representing progress through a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
	/// Prefix the listing was started with; replay against another prefix is rejected.
	pub prefix: ObjectKey,
	/// Last key returned on the previous page; the next page starts strictly after it.
	pub last: ObjectKey,
	/// Page size requested when the cursor was minted.
	pub limit: usize,
}
impl PageCursor {
	/// Mints a cursor for the page that ended at `last`.
	pub fn new(prefix: ObjectKey, last: ObjectKey, limit: usize) -> Self {
		Self { prefix, last, limit }
	}

	/// Renders the opaque external encoding.
	pub fn encode(&self) -> String {
		// Serialization of this shape cannot fail; the fields are strings and an integer.
		let body = serde_json::to_vec(self).unwrap_or_default();

		URL_SAFE_NO_PAD.encode(body)
	}

	/// Parses the external encoding back into a cursor.
	pub fn decode(wire: &str) -> Result<Self, RequestError> {
		let bytes = URL_SAFE_NO_PAD.decode(wire).map_err(|e| RequestError::InvalidCursor {
			reason: format!("undecodable base64 ({e})"),
		})?;

		serde_json::from_slice(&bytes)
			.map_err(|e| RequestError::InvalidCursor { reason: format!("malformed body ({e})") })
	}

	/// Rejects replay against a prefix other than the one the cursor was minted for.
	pub fn ensure_prefix(&self, prefix: &ObjectKey) -> Result<(), RequestError> {
		if &self.prefix != prefix {
			return Err(RequestError::InvalidCursor {
				reason: format!(
					"cursor was minted for prefix `{}`, replayed with `{}`",
					self.prefix, prefix
				),
			});
		}

		Ok(())
	}
}
impl Display for PageCursor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.encode())
	}
}
