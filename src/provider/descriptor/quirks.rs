// self
use crate::_prelude::*;

/// How the login redirect URL is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStyle {
	/// Query parameters are appended to the authorization endpoint by the gateway.
	Composed,
	/// The `oauth2` client builds the URL from state alone (code flow only).
	#[default]
	ClientLibrary,
}

/// Where the access token goes when calling the userinfo endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityTokenPlacement {
	/// `?access_token=<token>` query parameter.
	#[default]
	Query,
	/// `Authorization: Bearer <token>` header.
	BearerHeader,
}

/// Provider-specific quirks that influence how flows behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// How authorization URLs are built.
	pub authorization_style: AuthorizationStyle,
	/// Request `access_type=offline` so the code flow yields a refresh token.
	pub offline_access: bool,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Token placement for userinfo calls.
	pub identity_token_placement: IdentityTokenPlacement,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			authorization_style: AuthorizationStyle::default(),
			offline_access: false,
			scope_delimiter: ' ',
			identity_token_placement: IdentityTokenPlacement::default(),
		}
	}
}
