//! Per-provider hooks applied around token endpoint calls.
//!
//! A strategy adds provider-specific form fields to outgoing token requests and maps
//! failed responses onto [`ProviderErrorKind`]. Neither hook sees a concrete HTTP client.

// self
use crate::{_prelude::*, provider::descriptor::GrantType};

/// Hooks a provider uses to decorate token requests and classify token endpoint failures.
pub trait ProviderStrategy: Send + Sync {
	/// Maps a failed token response onto the gateway error categories.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Adds provider-specific form fields before a token request is dispatched.
	///
	/// Does nothing by default.
	fn augment_token_request(&self, _grant: GrantType, _form: &mut BTreeMap<String, String>) {}
}

/// Categories a token endpoint failure can fall into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// The code or refresh token was rejected.
	InvalidGrant,
	/// Client credentials were rejected.
	InvalidClient,
	/// The requested scopes were rejected.
	InsufficientScope,
	/// The failure is temporary.
	Transient,
}
impl ProviderErrorKind {
	/// Returns `true` when the provider definitively refused the request.
	pub fn is_rejection(self) -> bool {
		!matches!(self, ProviderErrorKind::Transient)
	}
}

/// Facts about a failed token response, stripped down to primitives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Grant the failing request used.
	pub grant_type: GrantType,
	/// HTTP status code, when a response arrived.
	pub http_status: Option<u16>,
	/// OAuth `error` field.
	pub oauth_error: Option<String>,
	/// OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Leading slice of a non-JSON body.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates an empty context for `grant_type`.
	pub fn new(grant_type: GrantType) -> Self {
		Self {
			grant_type,
			http_status: None,
			oauth_error: None,
			error_description: None,
			body_preview: None,
		}
	}

	/// Records the HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Records the OAuth `error` field.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Records the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Records a truncated copy of the response body.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Strategy used by providers that follow RFC 6749 error reporting.
///
/// Classification looks at the OAuth `error` field first, then `error_description`,
/// then hints in the raw body, and finally the HTTP status.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		classify_fields(ctx.oauth_error.as_deref(), ctx.error_description.as_deref())
			.or_else(|| classify_body(ctx.body_preview.as_deref()))
			.unwrap_or_else(|| classify_status(ctx.http_status))
	}
}

/// Google asks for offline access on code exchanges so refresh tokens are issued.
#[derive(Debug, Default)]
pub struct GoogleStrategy;
impl Display for GoogleStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("google")
	}
}
impl ProviderStrategy for GoogleStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		DefaultProviderStrategy.classify_token_error(ctx)
	}

	fn augment_token_request(&self, grant: GrantType, form: &mut BTreeMap<String, String>) {
		if grant == GrantType::AuthorizationCode {
			form.insert("access_type".into(), "offline".into());
		}
	}
}

fn truncate_preview(body: String) -> String {
	match body.char_indices().nth(ProviderErrorContext::BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => {
			let mut preview = body[..cut].to_owned();

			preview.push('…');

			preview
		},
		None => body,
	}
}

fn classify_fields(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<ProviderErrorKind> {
	oauth_error
		.and_then(classify_code)
		.or_else(|| error_description.and_then(classify_code))
		.or_else(|| classify_body(error_description))
}

fn classify_code(value: &str) -> Option<ProviderErrorKind> {
	const CODES: [(&str, ProviderErrorKind); 8] = [
		("invalid_grant", ProviderErrorKind::InvalidGrant),
		("access_denied", ProviderErrorKind::InvalidGrant),
		("invalid_client", ProviderErrorKind::InvalidClient),
		("unauthorized_client", ProviderErrorKind::InvalidClient),
		("invalid_scope", ProviderErrorKind::InsufficientScope),
		("insufficient_scope", ProviderErrorKind::InsufficientScope),
		("temporarily_unavailable", ProviderErrorKind::Transient),
		("server_error", ProviderErrorKind::Transient),
	];

	let value = value.trim();

	CODES.iter().find(|(code, _)| code.eq_ignore_ascii_case(value)).map(|(_, kind)| *kind)
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	if lowered.contains("invalid_grant") || lowered.contains("bad_verification_code") {
		Some(ProviderErrorKind::InvalidGrant)
	} else if lowered.contains("invalid_client") || lowered.contains("incorrect_client_credentials")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else if lowered.contains("insufficient_scope") || lowered.contains("invalid_scope") {
		Some(ProviderErrorKind::InsufficientScope)
	} else if lowered.contains("temporarily_unavailable") || lowered.contains("retry") {
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}
