//! Strongly typed token identifier enforced across the gateway domain.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Token identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Token identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier contains the `.` separator reserved by the presented-token shape.
	#[error("Token identifier cannot contain `.`.")]
	ContainsSeparator,
	/// The identifier exceeded the allowed character count.
	#[error("Token identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Unique identifier for an issued token; doubles as the principal name for
/// throttling and audit purposes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId(String);
impl TokenId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for TokenId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for TokenId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<TokenId> for String {
	fn from(value: TokenId) -> Self {
		value.0
	}
}
impl TryFrom<String> for TokenId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Borrow<str> for TokenId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenId({})", self.0)
	}
}
impl Display for TokenId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for TokenId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.contains('.') {
		return Err(IdentifierError::ContainsSeparator);
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
