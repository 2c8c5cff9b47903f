//! Login redirect URLs for each provider.

// self
use crate::{
	_prelude::*,
	flows::Gateway,
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::{FlowKind, FlowSpan},
	provider::{AuthorizationStyle, ProviderConfig, ProviderKind},
};

/// OAuth `response_type` requested from the provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
	/// Authorization code flow.
	#[default]
	Code,
	/// Implicit flow; the provider returns the access token in the redirect fragment.
	Token,
}
impl ResponseMode {
	/// Returns the `response_type` value.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResponseMode::Code => "code",
			ResponseMode::Token => "token",
		}
	}
}
impl Display for ResponseMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A login redirect handed back to the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Provider the user is sent to.
	pub provider: ProviderKind,
	/// Response mode that was actually requested.
	pub response_mode: ResponseMode,
	/// Anti-forgery value the callback must echo back.
	pub state: String,
	/// Fully formed authorization URL.
	pub url: Url,
}

impl<C, M> Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Issues a state value and builds the login URL for `provider`.
	pub fn begin_login(
		&self,
		provider: ProviderKind,
		mode: ResponseMode,
	) -> Result<AuthorizationRequest> {
		FlowSpan::new(FlowKind::Authorize, "begin_login").observe_sync(|| {
			let config = self.registry.get(provider)?;
			let state = self.state.issue();
			let url = build_authorization_url(config, mode, &state)?;

			tracing::debug!(%provider, %mode, "built authorization url");

			Ok(AuthorizationRequest {
				provider,
				response_mode: effective_mode(config, mode),
				state,
				url,
			})
		})
	}
}

/// Builds the authorization URL for `config`.
///
/// Composed providers get `client_id`, `scope`, `redirect_uri`, `response_type`, the
/// optional `access_type=offline`, and `state`, in that order. Other providers go through
/// the `oauth2` client and always use the code flow.
pub fn build_authorization_url(
	config: &ProviderConfig,
	mode: ResponseMode,
	state: &str,
) -> Result<Url> {
	match config.quirks.authorization_style {
		AuthorizationStyle::Composed => Ok(composed_url(config, mode, state)),
		AuthorizationStyle::ClientLibrary => {
			if mode == ResponseMode::Token {
				tracing::debug!(
					provider = %config.kind,
					"implicit flow is not offered for this provider; using the code flow"
				);
			}

			Ok(oauth::client_library_authorize_url(config, state)?)
		},
	}
}

fn effective_mode(config: &ProviderConfig, mode: ResponseMode) -> ResponseMode {
	match config.quirks.authorization_style {
		AuthorizationStyle::Composed => mode,
		AuthorizationStyle::ClientLibrary => ResponseMode::Code,
	}
}

fn composed_url(config: &ProviderConfig, mode: ResponseMode, state: &str) -> Url {
	let mut url = config.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", &config.client_id);

	if let Some(scope) = config.scopes.joined(config.quirks.scope_delimiter) {
		pairs.append_pair("scope", &scope);
	}

	pairs.append_pair("redirect_uri", config.redirect_url.as_str());
	pairs.append_pair("response_type", mode.as_str());

	if mode == ResponseMode::Code && config.quirks.offline_access {
		pairs.append_pair("access_type", "offline");
	}

	pairs.append_pair("state", state);

	drop(pairs);

	url
}
