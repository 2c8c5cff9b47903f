//! Provider configuration data structures and helpers shared by all flows.
//!
//! The module exposes validated client parameters, supporting builder utilities, and
//! grant-specific helpers so providers can describe their capabilities in a
//! transport-agnostic way.

/// Builder API for assembling provider configurations.
pub mod builder;
/// Grant helpers wired into provider configurations.
pub mod grant;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use grant::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ScopeList, TokenSecret},
	provider::ProviderKind,
};

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint end-users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges and refreshes.
	pub token: Url,
	/// Userinfo endpoint used to resolve identities behind access tokens.
	pub userinfo: Option<Url>,
	/// Revocation endpoint.
	pub revocation: Option<Url>,
}

/// Immutable OAuth client parameters for one provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
	/// Which provider this configuration targets.
	pub kind: ProviderKind,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the provider.
	pub redirect_url: Url,
	/// Scopes requested on every authorization, in configured order.
	pub scopes: ScopeList,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Supported grant flags.
	pub supported_grants: SupportedGrants,
	/// Preferred client authentication mechanism.
	pub client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderConfig {
	/// Creates a new builder seeded with the provider's default endpoints and quirks.
	pub fn builder(kind: ProviderKind) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(kind)
	}

	/// Checks whether the configuration supports a given grant.
	pub fn supports(&self, grant: GrantType) -> bool {
		self.supported_grants.supports(grant)
	}
}
impl Debug for ProviderConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderConfig")
			.field("kind", &self.kind)
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("redirect_url", &self.redirect_url)
			.field("scopes", &self.scopes)
			.field("endpoints", &self.endpoints)
			.field("supported_grants", &self.supported_grants)
			.field("client_auth_method", &self.client_auth_method)
			.field("quirks", &self.quirks)
			.finish()
	}
}
