//! Permission scopes and the non-empty scope sets attached to tokens.

// std
use std::cmp::Ordering;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// A token must carry at least one scope.
	#[error("Scope set cannot be empty.")]
	Empty,
	/// The scope string names no known permission.
	#[error("Unknown scope: {scope}.")]
	Unknown {
		/// The offending scope string.
		scope: String,
	},
}

/// A named permission category granted to a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
	/// Read object bytes and listings (GET, HEAD, LIST).
	Read,
	/// Write object bytes (PUT).
	Write,
	/// Remove objects (DELETE).
	Delete,
}
impl Scope {
	/// Returns the stable lowercase label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Read => "read",
			Self::Write => "write",
			Self::Delete => "delete",
		}
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Scope {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"read" => Ok(Self::Read),
			"write" => Ok(Self::Write),
			"delete" => Ok(Self::Delete),
			other => Err(ScopeValidationError::Unknown { scope: other.to_owned() }),
		}
	}
}

/// Normalized, non-empty set of [`Scope`] values.
///
/// Scopes are deduplicated and sorted so equality, ordering, and hashing remain
/// consistent; emptiness is rejected at construction, which makes the "a token carries
/// at least one scope" invariant unrepresentable rather than checked downstream.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ScopeSet(Arc<[Scope]>);
impl ScopeSet {
	/// Creates a normalized scope set from any iterator of scope labels or values.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: TryInto<Scope, Error = ScopeValidationError>,
	{
		let mut sorted = Vec::new();

		for scope in scopes {
			sorted.push(scope.try_into()?);
		}

		sorted.sort_unstable();
		sorted.dedup();

		if sorted.is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Ok(Self(Arc::from(sorted)))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Always `false`; retained for API symmetry with collection types.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns `true` if the set grants the provided scope.
	pub fn contains(&self, scope: Scope) -> bool {
		self.0.binary_search(&scope).is_ok()
	}

	/// Iterator over the granted scopes in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
		self.0.iter().copied()
	}

	/// Returns the normalized string representation (space-delimited).
	pub fn normalized(&self) -> String {
		self.0.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ")
	}

	/// Returns the underlying slice of scopes.
	pub fn as_slice(&self) -> &[Scope] {
		&self.0
	}
}
impl PartialOrd for ScopeSet {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for ScopeSet {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.cmp(&other.0)
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.0).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl TryFrom<&str> for Scope {
	type Error = ScopeValidationError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl TryFrom<Vec<Scope>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(mut value: Vec<Scope>) -> Result<Self, Self::Error> {
		value.sort_unstable();
		value.dedup();

		if value.is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Ok(Self(Arc::from(value)))
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.split_whitespace())
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.0.len()))?;

		for scope in self.0.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<Scope>>::deserialize(deserializer)?;

		ScopeSet::try_from(values).map_err(DeError::custom)
	}
}
