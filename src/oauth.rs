//! `oauth2` crate facade: client construction, token requests, and error mapping.

pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
	EndpointNotSet, EndpointSet, HttpClientError, HttpRequest, HttpResponse, RedirectUrl,
	RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	error::{ConfigError, ProviderCallError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{
		ClientAuthMethod, GrantType, ProviderConfig, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

pub(crate) type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderCallError>> + 'a + Send>>;

/// Maps transport failures into [`ProviderCallError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] raised while calling `endpoint`.
	fn map_transport_error(
		&self,
		endpoint: &'static str,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> ProviderCallError;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: &'static str,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> ProviderCallError {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => transient(
				endpoint,
				meta,
				format!(
					"HTTP client error occurred while calling the {endpoint} endpoint: {message}"
				),
			),
			_ => transient(
				endpoint,
				meta,
				format!("HTTP client error occurred while calling the {endpoint} endpoint"),
			),
		}
	}
}

/// Builds the `oauth2` client for `config`.
pub(crate) fn configured_client(
	config: &ProviderConfig,
) -> Result<ConfiguredBasicClient, ConfigError> {
	let field = |name: &str| format!("providers.{}.{name}", config.kind);
	let auth_url = AuthUrl::new(config.endpoints.authorization.to_string())
		.map_err(|source| ConfigError::InvalidUrl {
			field: field("authorization_endpoint"),
			source,
		})?;
	let token_url = TokenUrl::new(config.endpoints.token.to_string())
		.map_err(|source| ConfigError::InvalidUrl { field: field("token_endpoint"), source })?;
	let redirect_url = RedirectUrl::new(config.redirect_url.to_string())
		.map_err(|source| ConfigError::InvalidUrl { field: field("redirect_url"), source })?;
	let mut client = BasicClient::new(ClientId::new(config.client_id.clone()))
		.set_auth_uri(auth_url)
		.set_token_uri(token_url)
		.set_redirect_uri(redirect_url);

	if !config.client_secret.is_empty() {
		client =
			client.set_client_secret(ClientSecret::new(config.client_secret.expose().to_owned()));
	}
	if config.client_auth_method == ClientAuthMethod::ClientSecretPost {
		client = client.set_auth_type(AuthType::RequestBody);
	}

	Ok(client)
}

/// Builds a code-flow authorization URL through the `oauth2` client.
pub(crate) fn client_library_authorize_url(
	config: &ProviderConfig,
	state: &str,
) -> Result<Url, ConfigError> {
	let client = configured_client(config)?;
	let (url, _) = client
		.authorize_url(|| CsrfToken::new(state.to_owned()))
		.add_scopes(config.scopes.iter().map(|scope| Scope::new(scope.to_owned())))
		.url();

	Ok(url)
}

/// Token endpoint and raw HTTP access for one provider.
pub(crate) struct BasicFacade<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_config(
		config: &ProviderConfig,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self, ConfigError> {
		Ok(Self { oauth_client: configured_client(config)?, http_client, error_mapper })
	}

	/// Exchanges an authorization code at the token endpoint.
	pub(crate) fn exchange_authorization_code<'a>(
		&'a self,
		strategy: &'a dyn ProviderStrategy,
		code: &'a str,
	) -> FacadeFuture<'a, TokenSet> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let handle = self.http_client.with_metadata(meta.clone());
			let mut form = BTreeMap::new();

			strategy.augment_token_request(GrantType::AuthorizationCode, &mut form);

			let mut request =
				self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			for (key, value) in form {
				request = request.add_extra_param(key, value);
			}

			let response = request.request_async(&handle).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::AuthorizationCode,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

			token_set_from_response(&response)
		})
	}

	/// Exchanges a refresh token for a new access token.
	pub(crate) fn refresh_token<'a>(
		&'a self,
		strategy: &'a dyn ProviderStrategy,
		refresh_token: &'a str,
	) -> FacadeFuture<'a, TokenSet> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let handle = self.http_client.with_metadata(meta.clone());
			let secret = RefreshToken::new(refresh_token.to_owned());
			let mut form = BTreeMap::new();

			strategy.augment_token_request(GrantType::RefreshToken, &mut form);

			let mut request = self.oauth_client.exchange_refresh_token(&secret);

			for (key, value) in form {
				request = request.add_extra_param(key, value);
			}

			let response = request.request_async(&handle).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::RefreshToken,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

			token_set_from_response(&response)
		})
	}

	/// Sends a prepared request and returns the response whatever its status.
	pub(crate) fn send<'a>(
		&'a self,
		endpoint: &'static str,
		request: HttpRequest,
	) -> FacadeFuture<'a, HttpResponse> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let handle = self.http_client.with_metadata(meta.clone());

			handle.call(request).await.map_err(|err| {
				self.error_mapper.map_transport_error(endpoint, meta.take().as_ref(), err)
			})
		})
	}
}

fn token_set_from_response(response: &BasicTokenResponse) -> Result<TokenSet, ProviderCallError> {
	let mut builder = TokenSet::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(response.token_type().as_ref().to_owned())
		.issued_at(OffsetDateTime::now_utc());

	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}
	if let Some(secs) = response.expires_in().and_then(|ttl| i64::try_from(ttl.as_secs()).ok()) {
		builder = builder.expires_in(Duration::seconds(secs));
	}

	builder.build().map_err(|err| transient("token", None, err.to_string()))
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> ProviderCallError
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, grant, response, meta),
		RequestTokenError::Request(error) => mapper.map_transport_error("token", meta, error),
		RequestTokenError::Parse(source, body) =>
			map_unparsable_response(strategy, grant, meta, source, &body),
		RequestTokenError::Other(message) => transient(
			"token",
			meta,
			format!("Token endpoint returned an unexpected response: {message}"),
		),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> ProviderCallError {
	let mut ctx =
		ProviderErrorContext::new(grant).with_oauth_error(response.error().as_ref().to_owned());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let reason = response
		.error_description()
		.cloned()
		.unwrap_or_else(|| response.error().as_ref().to_owned());

	classified(strategy.classify_token_error(&ctx), reason, meta)
}

// Some providers answer failures with 200 and a body that is not a token response.
fn map_unparsable_response(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<&ResponseMetadata>,
	source: serde_path_to_error::Error<serde_json::Error>,
	body: &[u8],
) -> ProviderCallError {
	let preview = String::from_utf8_lossy(body).into_owned();
	let mut ctx = ProviderErrorContext::new(grant).with_body_preview(preview.clone());

	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	match strategy.classify_token_error(&ctx) {
		kind if kind.is_rejection() => classified(kind, preview, meta),
		_ => TransientError::ResponseParse { endpoint: "token", source, status: meta_status(meta) }
			.into(),
	}
}

fn classified(
	kind: ProviderErrorKind,
	reason: String,
	meta: Option<&ResponseMetadata>,
) -> ProviderCallError {
	match kind {
		ProviderErrorKind::InvalidGrant => ProviderCallError::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => ProviderCallError::InvalidClient { reason },
		ProviderErrorKind::InsufficientScope => ProviderCallError::InsufficientScope { reason },
		ProviderErrorKind::Transient => transient("token", meta, reason),
	}
}

fn map_reqwest_error(
	endpoint: &'static str,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> ProviderCallError {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Endpoint {
			endpoint,
			message: format!("Request timed out while calling the {endpoint} endpoint"),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn transient(
	endpoint: &'static str,
	meta: Option<&ResponseMetadata>,
	message: String,
) -> ProviderCallError {
	TransientError::Endpoint { endpoint, message, status: meta_status(meta) }.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::mock_provider_config, provider::ProviderKind};

	#[test]
	fn builds_clients_for_both_auth_methods() {
		let config = mock_provider_config(ProviderKind::GitHub, "http://127.0.0.1:9");
		let basic = ProviderConfig {
			client_auth_method: ClientAuthMethod::ClientSecretBasic,
			..config.clone()
		};

		assert!(configured_client(&config).is_ok());
		assert!(configured_client(&basic).is_ok());
	}

	#[test]
	fn client_library_url_carries_state_and_scopes() {
		let config = mock_provider_config(ProviderKind::Facebook, "http://127.0.0.1:9");
		let url = client_library_authorize_url(&config, "xyz").expect("URL should build.");
		let pairs = url.query_pairs().into_owned().collect::<HashMap<_, _>>();

		assert_eq!(url.path(), "/facebook/authorize");
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("facebook-client"));
		assert_eq!(pairs.get("state").map(String::as_str), Some("xyz"));
		assert_eq!(pairs.get("scope").map(String::as_str), Some("email profile"));
		assert_eq!(
			pairs.get("redirect_uri").map(String::as_str),
			Some("https://app.example.com/callback-facebook")
		);
	}

	#[test]
	fn server_errors_are_classified_by_strategy() {
		let response = BasicErrorResponse::new(
			oauth2::basic::BasicErrorResponseType::InvalidGrant,
			Some("Bad Request".into()),
			None,
		);
		let meta = ResponseMetadata { status: Some(400) };
		let err = map_server_response_error(
			&crate::provider::DefaultProviderStrategy,
			GrantType::RefreshToken,
			response,
			Some(&meta),
		);

		assert!(matches!(
			err,
			ProviderCallError::InvalidGrant { ref reason } if reason == "Bad Request"
		));
	}
}
