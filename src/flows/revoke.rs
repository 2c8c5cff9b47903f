//! Token revocation.

// crates.io
use oauth2::http::{
	Method, Request,
	header::{CONTENT_TYPE, HeaderValue},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::fingerprint,
	error::ConfigError,
	flows::Gateway,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{FlowKind, FlowSpan},
	provider::{ProviderConfig, ProviderKind},
};

/// What the provider said about a revocation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevocationOutcome {
	/// Provider answered 200.
	Revoked,
	/// Provider answered with another status.
	Rejected {
		/// HTTP status returned by the provider.
		status: u16,
	},
}
impl RevocationOutcome {
	/// Returns `true` when the token was revoked.
	pub fn is_success(self) -> bool {
		matches!(self, RevocationOutcome::Revoked)
	}
}

impl<C, M> Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Asks the provider to revoke `access_token`.
	///
	/// A non-200 answer is logged and returned as [`RevocationOutcome::Rejected`]; only
	/// transport failures produce [`Error::Revocation`].
	pub async fn revoke(
		&self,
		provider: ProviderKind,
		access_token: &str,
	) -> Result<RevocationOutcome> {
		let span = FlowSpan::new(FlowKind::Revocation, "revoke");

		span.observe(async move {
			let config = self.registry.get(provider)?;
			let request = revocation_request(config, access_token)?;
			let facade = self.facade(config)?;
			let response = facade
				.send("revocation", request)
				.await
				.map_err(|source| Error::Revocation { provider, source })?;
			let status = response.status().as_u16();

			if status == 200 {
				tracing::info!(%provider, token = %fingerprint(access_token), "revoked token");

				Ok(RevocationOutcome::Revoked)
			} else {
				tracing::warn!(
					%provider,
					token = %fingerprint(access_token),
					status,
					"provider refused revocation"
				);

				Ok(RevocationOutcome::Rejected { status })
			}
		})
		.await
	}
}

fn revocation_request(
	config: &ProviderConfig,
	access_token: &str,
) -> Result<oauth2::HttpRequest, ConfigError> {
	let endpoint = config.endpoints.revocation.as_ref().ok_or(
		ConfigError::UnsupportedOperation { provider: config.kind, endpoint: "revocation" },
	)?;
	let body = form_urlencoded::Serializer::new(String::new())
		.append_pair("token", access_token)
		.finish();

	Ok(Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"))
		.body(body.into_bytes())?)
}
