//! Token sets produced by code exchanges and refreshes, plus their builder.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced by [`TokenSetBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenSetBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when the provider returned an empty access token.
	#[error("Access token cannot be empty.")]
	EmptyAccessToken,
}

/// Tokens handed back to the caller after an exchange.
///
/// The gateway never stores these; whoever receives the set owns its lifecycle.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenSet {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, present only when the provider grants offline access.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the provider (usually `bearer`).
	pub token_type: String,
	/// Instant the gateway received the tokens.
	pub issued_at: OffsetDateTime,
	/// Expiry instant, when the provider reported `expires_in`.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenSet {
	/// Returns a builder for assembling token sets from provider responses.
	pub fn builder() -> TokenSetBuilder {
		TokenSetBuilder::default()
	}
}
impl Debug for TokenSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSet")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenSet`].
#[derive(Clone, Debug, Default)]
pub struct TokenSetBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	token_type: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenSetBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the token type label.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets a relative expiry. Non-positive durations are treated as "unknown".
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = duration.is_positive().then_some(duration);

		self
	}

	/// Consumes the builder and produces a [`TokenSet`].
	pub fn build(self) -> Result<TokenSet, TokenSetBuilderError> {
		let access_token = self.access_token.ok_or(TokenSetBuilderError::MissingAccessToken)?;

		if access_token.is_empty() {
			return Err(TokenSetBuilderError::EmptyAccessToken);
		}

		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		// Empty refresh tokens count as absent.
		let refresh_token = self.refresh_token.filter(|secret| !secret.is_empty());

		Ok(TokenSet {
			access_token,
			refresh_token,
			token_type: self.token_type.unwrap_or_else(|| "bearer".into()),
			issued_at,
			expires_at: self.expires_in.map(|delta| issued_at + delta),
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn builder_handles_relative_expiry() {
		let set = TokenSet::builder()
			.access_token("secret")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::minutes(30))
			.build()
			.expect("Token set builder should support relative expiry calculations.");

		assert_eq!(set.expires_at, Some(macros::datetime!(2025-01-01 00:30 UTC)));
	}

	#[test]
	fn missing_expiry_never_expires() {
		let set = TokenSet::builder()
			.access_token("gho_token")
			.expires_in(Duration::ZERO)
			.build()
			.expect("Token set without expiry should build.");

		assert_eq!(set.expires_at, None);
		assert_eq!(set.token_type, "bearer");
	}

	#[test]
	fn empty_tokens_are_normalized_or_rejected() {
		let set = TokenSet::builder()
			.access_token("access")
			.refresh_token("")
			.build()
			.expect("Empty refresh token should be dropped, not rejected.");

		assert!(set.refresh_token.is_none());
		assert_eq!(
			TokenSet::builder().access_token("").build().expect_err("Empty access token."),
			TokenSetBuilderError::EmptyAccessToken
		);
		assert_eq!(
			TokenSet::builder().build().expect_err("Missing access token."),
			TokenSetBuilderError::MissingAccessToken
		);
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let set = TokenSet::builder()
			.access_token("access-secret")
			.refresh_token("refresh-secret")
			.build()
			.expect("Token set should build.");
		let rendered = format!("{set:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
	}
}
