//! Scope modeling helpers used by provider configurations and authorization URLs.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered, de-duplicated list of OAuth scopes.
///
/// Providers receive scopes in the order they were configured, so unlike a sorted set the
/// first occurrence of each scope fixes its position. Duplicates are dropped silently.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeList {
	scopes: Arc<[String]>,
}
impl ScopeList {
	/// Creates a validated scope list from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Ok(Self { scopes: normalize(scopes)? })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in configured order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Joins the scopes with `delimiter`, or returns `None` for an empty list.
	pub fn joined(&self, delimiter: char) -> Option<String> {
		if self.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, value) in self.scopes.iter().enumerate() {
			if idx > 0 {
				buf.push(delimiter);
			}

			buf.push_str(value);
		}

		Some(buf)
	}

	/// Returns the underlying slice of scope strings.
	pub fn as_slice(&self) -> &[String] {
		&self.scopes
	}
}
impl Debug for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeList").field(&self.scopes).finish()
	}
}
impl Display for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined(' ').unwrap_or_default())
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a ScopeList {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.scopes.iter() }
	}
}
impl TryFrom<Vec<String>> for ScopeList {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for ScopeList {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl Serialize for ScopeList {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeList {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeList::new(values).map_err(DeError::custom)
	}
}

fn normalize<I, S>(scopes: I) -> Result<Arc<[String]>, ScopeValidationError>
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	let mut list: Vec<String> = Vec::new();

	for scope in scopes {
		let owned: String = scope.into();

		if owned.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
		}
		if !list.contains(&owned) {
			list.push(owned);
		}
	}

	Ok(Arc::from(list))
}
