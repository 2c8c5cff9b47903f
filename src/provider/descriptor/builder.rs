// std
use std::iter::IntoIterator;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{ScopeList, ScopeValidationError, TokenSecret},
	provider::{
		ClientAuthMethod, GrantType, ProviderConfig, ProviderEndpoints, ProviderKind,
		ProviderQuirks, SupportedGrants,
	},
};

/// Errors raised while constructing or validating provider configurations.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderConfigError {
	/// Client identifier is mandatory.
	#[error("Missing client identifier.")]
	MissingClientId,
	/// Redirect URL is mandatory.
	#[error("Missing redirect URL.")]
	MissingRedirectUrl,
	/// At least one grant must be supported.
	#[error("Provider must enable at least one grant type.")]
	NoSupportedGrants,
	/// A built-in endpoint failed to parse.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Configured scopes are invalid.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] ScopeValidationError),
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`ProviderConfig`] values.
///
/// Endpoints, grants, and quirks start from the [`ProviderKind`] defaults; every setter
/// overrides one of them.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
	/// Provider the configuration targets.
	pub kind: ProviderKind,
	/// OAuth 2.0 client identifier.
	pub client_id: Option<String>,
	/// OAuth 2.0 client secret.
	pub client_secret: Option<String>,
	/// Redirect URL registered with the provider.
	pub redirect_url: Option<Url>,
	/// Requested scopes; `None` falls back to the provider defaults.
	pub scopes: Option<Vec<String>>,
	/// Authorization endpoint override.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint override.
	pub token_endpoint: Option<Url>,
	/// Userinfo endpoint override.
	pub userinfo_endpoint: Option<Url>,
	/// Revocation endpoint override.
	pub revocation_endpoint: Option<Url>,
	/// Grants enabled for the provider.
	pub supported_grants: SupportedGrants,
	/// Preferred client authentication method for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderConfigBuilder {
	/// Creates a new builder seeded with the provider defaults.
	pub fn new(kind: ProviderKind) -> Self {
		Self {
			kind,
			client_id: None,
			client_secret: None,
			redirect_url: None,
			scopes: None,
			authorization_endpoint: None,
			token_endpoint: None,
			userinfo_endpoint: None,
			revocation_endpoint: None,
			supported_grants: kind.default_grants(),
			client_auth_method: ClientAuthMethod::default(),
			quirks: kind.default_quirks(),
		}
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the redirect URL.
	pub fn redirect_url(mut self, url: Url) -> Self {
		self.redirect_url = Some(url);

		self
	}

	/// Sets the requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = Some(scopes.into_iter().map(Into::into).collect());

		self
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the userinfo endpoint.
	pub fn userinfo_endpoint(mut self, url: Url) -> Self {
		self.userinfo_endpoint = Some(url);

		self
	}

	/// Overrides the revocation endpoint.
	pub fn revocation_endpoint(mut self, url: Url) -> Self {
		self.revocation_endpoint = Some(url);

		self
	}

	/// Marks a single grant type as supported.
	pub fn support_grant(mut self, grant: GrantType) -> Self {
		self.supported_grants = self.supported_grants.enable(grant);

		self
	}

	/// Replaces the supported grant set.
	pub fn supported_grants(mut self, grants: SupportedGrants) -> Self {
		self.supported_grants = grants;

		self
	}

	/// Overrides the preferred client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ProviderConfigError> {
		let kind = self.kind;
		let client_id = self
			.client_id
			.filter(|id| !id.trim().is_empty())
			.ok_or(ProviderConfigError::MissingClientId)?;
		let redirect_url = self.redirect_url.ok_or(ProviderConfigError::MissingRedirectUrl)?;
		let scopes = match self.scopes {
			Some(scopes) => ScopeList::new(scopes)?,
			None => ScopeList::new(kind.default_scopes().iter().copied())?,
		};
		let authorization = endpoint_or_default(
			"authorization",
			self.authorization_endpoint,
			kind.default_authorization_endpoint(),
		)?;
		let token =
			endpoint_or_default("token", self.token_endpoint, kind.default_token_endpoint())?;
		let userinfo = endpoint_or_default(
			"userinfo",
			self.userinfo_endpoint,
			kind.default_userinfo_endpoint(),
		)?;
		let revocation = match (self.revocation_endpoint, kind.default_revocation_endpoint()) {
			(Some(url), _) => Some(url),
			(None, Some(default)) => Some(parse_default("revocation", default)?),
			(None, None) => None,
		};
		let config = ProviderConfig {
			kind,
			client_id,
			client_secret: TokenSecret::new(self.client_secret.unwrap_or_default()),
			redirect_url,
			scopes,
			endpoints: ProviderEndpoints {
				authorization,
				token,
				userinfo: Some(userinfo),
				revocation,
			},
			supported_grants: self.supported_grants,
			client_auth_method: self.client_auth_method,
			quirks: self.quirks,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ProviderConfig {
	/// Validates invariants for the configuration.
	fn validate(&self) -> Result<(), ProviderConfigError> {
		if self.supported_grants.is_empty() {
			return Err(ProviderConfigError::NoSupportedGrants);
		}

		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		if let Some(userinfo) = self.endpoints.userinfo.as_ref() {
			validate_endpoint("userinfo", userinfo)?;
		}
		if let Some(revocation) = self.endpoints.revocation.as_ref() {
			validate_endpoint("revocation", revocation)?;
		}

		validate_scope_delimiter(self.quirks.scope_delimiter)?;

		Ok(())
	}
}

fn endpoint_or_default(
	name: &'static str,
	configured: Option<Url>,
	default: &'static str,
) -> Result<Url, ProviderConfigError> {
	match configured {
		Some(url) => Ok(url),
		None => parse_default(name, default),
	}
}

fn parse_default(name: &'static str, raw: &'static str) -> Result<Url, ProviderConfigError> {
	Url::parse(raw)
		.map_err(|source| ProviderConfigError::InvalidEndpoint { endpoint: name, source })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderConfigError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(ProviderConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderConfigError> {
	if delimiter.is_control() {
		Err(ProviderConfigError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}
