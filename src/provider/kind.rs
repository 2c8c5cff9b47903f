//! The identity providers the gateway knows how to talk to.

// self
use crate::{
	_prelude::*,
	provider::{
		AuthorizationStyle, DefaultProviderStrategy, GoogleStrategy, GrantType,
		IdentityTokenPlacement, ProviderQuirks, ProviderStrategy, SupportedGrants,
	},
};

/// Error returned when a provider label is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown provider `{0}`.")]
pub struct UnknownProvider(pub String);

/// Supported identity providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
	/// Google accounts (`accounts.google.com`).
	Google,
	/// Facebook login.
	Facebook,
	/// GitHub OAuth apps.
	#[serde(rename = "github")]
	GitHub,
}
impl ProviderKind {
	/// Every supported provider, in registry order.
	pub const ALL: [ProviderKind; 3] =
		[ProviderKind::Google, ProviderKind::Facebook, ProviderKind::GitHub];

	/// Returns a stable lowercase label used in config keys, routes, and logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProviderKind::Google => "google",
			ProviderKind::Facebook => "facebook",
			ProviderKind::GitHub => "github",
		}
	}

	/// Default authorization endpoint.
	pub const fn default_authorization_endpoint(self) -> &'static str {
		match self {
			ProviderKind::Google => "https://accounts.google.com/o/oauth2/auth",
			ProviderKind::Facebook => "https://www.facebook.com/v3.2/dialog/oauth",
			ProviderKind::GitHub => "https://github.com/login/oauth/authorize",
		}
	}

	/// Default token endpoint.
	pub const fn default_token_endpoint(self) -> &'static str {
		match self {
			ProviderKind::Google => "https://oauth2.googleapis.com/token",
			ProviderKind::Facebook => "https://graph.facebook.com/v3.2/oauth/access_token",
			ProviderKind::GitHub => "https://github.com/login/oauth/access_token",
		}
	}

	/// Default userinfo endpoint used for identity resolution and bearer verification.
	pub const fn default_userinfo_endpoint(self) -> &'static str {
		match self {
			ProviderKind::Google => "https://www.googleapis.com/oauth2/v2/userinfo",
			ProviderKind::Facebook => "https://graph.facebook.com/me?fields=id,email",
			ProviderKind::GitHub => "https://api.github.com/user",
		}
	}

	/// Default revocation endpoint, when the provider offers one.
	pub const fn default_revocation_endpoint(self) -> Option<&'static str> {
		match self {
			ProviderKind::Google => Some("https://oauth2.googleapis.com/revoke"),
			ProviderKind::Facebook | ProviderKind::GitHub => None,
		}
	}

	/// Grants enabled unless configuration says otherwise.
	pub fn default_grants(self) -> SupportedGrants {
		let grants = SupportedGrants::default().enable(GrantType::AuthorizationCode);

		match self {
			ProviderKind::Google => grants.enable(GrantType::RefreshToken),
			ProviderKind::Facebook | ProviderKind::GitHub => grants,
		}
	}

	/// Default quirks describing how the provider deviates from plain RFC 6749.
	pub fn default_quirks(self) -> ProviderQuirks {
		match self {
			ProviderKind::Google => ProviderQuirks {
				authorization_style: AuthorizationStyle::Composed,
				offline_access: true,
				..ProviderQuirks::default()
			},
			ProviderKind::Facebook => ProviderQuirks::default(),
			ProviderKind::GitHub => ProviderQuirks {
				identity_token_placement: IdentityTokenPlacement::BearerHeader,
				..ProviderQuirks::default()
			},
		}
	}

	/// Default scopes requested when configuration does not list any.
	pub const fn default_scopes(self) -> &'static [&'static str] {
		match self {
			ProviderKind::Google => &[
				"https://www.googleapis.com/auth/userinfo.profile",
				"https://www.googleapis.com/auth/userinfo.email",
				"openid",
			],
			ProviderKind::Facebook | ProviderKind::GitHub => &["email"],
		}
	}

	/// Strategy used to decorate token requests and classify provider errors.
	pub fn strategy(self) -> Arc<dyn ProviderStrategy> {
		match self {
			ProviderKind::Google => Arc::new(GoogleStrategy),
			ProviderKind::Facebook | ProviderKind::GitHub => Arc::new(DefaultProviderStrategy),
		}
	}
}
impl Display for ProviderKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ProviderKind {
	type Err = UnknownProvider;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| UnknownProvider(s.to_owned()))
	}
}
