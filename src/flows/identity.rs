//! Identity lookups against provider userinfo endpoints.

// crates.io
use oauth2::http::{
	Method, Request,
	header::{ACCEPT, AUTHORIZATION},
};
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{
	_prelude::*,
	auth::fingerprint,
	error::{ConfigError, ProviderCallError, TransientError},
	flows::Gateway,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{FlowKind, FlowSpan},
	provider::{IdentityTokenPlacement, ProviderConfig, ProviderKind},
};

/// Identity returned by a provider's userinfo endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaim {
	/// Provider-assigned subject identifier.
	#[serde(rename = "id", default, deserialize_with = "deserialize_subject")]
	pub subject: String,
	/// Primary email, when the provider shares it.
	#[serde(default)]
	pub email: Option<String>,
	/// Whether the provider vouches for the email.
	#[serde(rename = "verified_email", default, deserialize_with = "deserialize_flag")]
	pub email_verified: bool,
	/// Error the provider embedded in the response body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ProviderErrorBody>,
}
impl IdentityClaim {
	/// Returns `true` when the claim names a subject and carries no provider error.
	pub fn is_valid(&self) -> bool {
		self.error.is_none() && !self.subject.is_empty()
	}
}

/// Provider error embedded in a userinfo response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProviderError")]
pub struct ProviderErrorBody {
	/// Numeric error code (often the HTTP status).
	pub code: Option<i64>,
	/// Human readable message.
	pub message: Option<String>,
	/// Symbolic status such as `UNAUTHENTICATED`.
	pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProviderError {
	Text(String),
	Detailed {
		#[serde(default)]
		code: Option<i64>,
		#[serde(default)]
		message: Option<String>,
		#[serde(default)]
		status: Option<String>,
	},
}
impl From<RawProviderError> for ProviderErrorBody {
	fn from(raw: RawProviderError) -> Self {
		match raw {
			RawProviderError::Text(message) =>
				Self { code: None, message: Some(message), status: None },
			RawProviderError::Detailed { code, message, status } => Self { code, message, status },
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubject {
	Text(String),
	Number(u64),
}

fn deserialize_subject<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Option::<RawSubject>::deserialize(deserializer)? {
		Some(RawSubject::Text(value)) => value,
		Some(RawSubject::Number(value)) => value.to_string(),
		None => String::new(),
	})
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
	D: Deserializer<'de>,
{
	match serde_json::Value::deserialize(deserializer)? {
		serde_json::Value::Null => Ok(false),
		serde_json::Value::Bool(flag) => Ok(flag),
		serde_json::Value::String(text) => Ok(text.eq_ignore_ascii_case("true")),
		other => Err(DeError::custom(format!("expected a boolean, found {other}"))),
	}
}

impl<C, M> Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Looks up the identity behind `access_token` at the provider's userinfo endpoint.
	///
	/// The body is parsed whatever the HTTP status. A non-success status without an
	/// embedded error is recorded as an error carrying the status code.
	pub async fn resolve_identity(
		&self,
		provider: ProviderKind,
		access_token: &str,
	) -> Result<IdentityClaim> {
		let span = FlowSpan::new(FlowKind::Identity, "resolve_identity");

		span.observe(async move {
			let config = self.registry.get(provider)?;
			let request = userinfo_request(config, access_token)?;
			let facade = self.facade(config)?;
			let response = facade
				.send("userinfo", request)
				.await
				.map_err(|source| Error::Identity { provider, source })?;
			let status = response.status();
			let mut claim = parse_claim(response.body(), status.as_u16())
				.map_err(|source| Error::Identity { provider, source })?;

			if !status.is_success() && claim.error.is_none() {
				claim.error = Some(ProviderErrorBody {
					code: Some(i64::from(status.as_u16())),
					message: status.canonical_reason().map(ToOwned::to_owned),
					status: None,
				});
			}

			tracing::debug!(
				%provider,
				token = %fingerprint(access_token),
				status = status.as_u16(),
				valid = claim.is_valid(),
				"resolved identity"
			);

			Ok(claim)
		})
		.await
	}
}

fn userinfo_request(
	config: &ProviderConfig,
	access_token: &str,
) -> Result<oauth2::HttpRequest, ConfigError> {
	let mut url = config.endpoints.userinfo.clone().ok_or(ConfigError::UnsupportedOperation {
		provider: config.kind,
		endpoint: "userinfo",
	})?;
	let mut builder = Request::builder().method(Method::GET).header(ACCEPT, "application/json");

	match config.quirks.identity_token_placement {
		IdentityTokenPlacement::Query => {
			url.query_pairs_mut().append_pair("access_token", access_token);
		},
		IdentityTokenPlacement::BearerHeader => {
			builder = builder.header(AUTHORIZATION, format!("Bearer {access_token}"));
		},
	}

	Ok(builder.uri(url.as_str()).body(Vec::new())?)
}

fn parse_claim(body: &[u8], status: u16) -> Result<IdentityClaim, ProviderCallError> {
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		TransientError::ResponseParse { endpoint: "userinfo", source, status: Some(status) }
			.into()
	})
}
