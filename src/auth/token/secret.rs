//! Redacting wrapper for access tokens, refresh tokens, and client secrets.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const FINGERPRINT_LEN: usize = 12;

/// Redacted secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns true when the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Short, non-reversible identifier safe to put in log lines.
	///
	/// The first twelve characters of the URL-safe base64 SHA-256 digest.
	pub fn fingerprint(&self) -> String {
		fingerprint(&self.0)
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

/// Computes the log fingerprint for a raw token string.
pub fn fingerprint(raw: &str) -> String {
	let digest = Sha256::digest(raw.as_bytes());
	let mut encoded = URL_SAFE_NO_PAD.encode(digest);

	encoded.truncate(FINGERPRINT_LEN);

	encoded
}
