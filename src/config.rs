//! Gateway configuration loaded from TOML with environment overrides.

// std
use std::{path::Path, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	flows::{ReqwestGateway, StateGuard, StateMode},
	http::ReqwestHttpClient,
	provider::{ClientAuthMethod, ProviderConfig, ProviderKind, ProviderRegistry},
};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "OAUTH2_GATEWAY_CONFIG";
/// Configuration file used when nothing else is given.
pub const DEFAULT_CONFIG_PATH: &str = "gateway.toml";

const PORT_ENV: &str = "OAUTH2_GATEWAY_PORT";
const STATE_ENV: &str = "OAUTH2_GATEWAY_STATE";

/// Complete gateway configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
	/// Listener and CORS settings.
	pub server: ServerSettings,
	/// Outbound HTTP settings.
	pub http: HttpSettings,
	/// Anti-forgery state settings.
	pub state: StateSettings,
	/// Bearer verification settings.
	pub bearer: BearerSettings,
	/// Login callback settings.
	pub callback: CallbackSettings,
	/// Log settings.
	pub log: LogSettings,
	/// Per-provider client settings.
	pub providers: ProvidersSection,
}
impl GatewayConfig {
	/// Reads `path`, parses it, and applies process environment overrides.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
		let mut config = Self::from_toml_str(&raw)?;

		config.apply_env_overrides(|name| std::env::var(name).ok())?;

		Ok(config)
	}

	/// Parses a TOML document.
	pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(raw)?)
	}

	/// Applies `OAUTH2_GATEWAY_*` overrides read through `lookup`.
	///
	/// Client id and secret overrides only touch providers that have a section.
	pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(port) = lookup(PORT_ENV) {
			self.server.port =
				port.trim().parse().map_err(|_| ConfigError::InvalidEnv { name: PORT_ENV })?;
		}
		if let Some(state) = lookup(STATE_ENV) {
			self.state.value = state;
		}

		for kind in ProviderKind::ALL {
			let Some(settings) = self.providers.get_mut(kind) else {
				continue;
			};
			let prefix = format!("OAUTH2_GATEWAY_{}", kind.as_str().to_ascii_uppercase());

			if let Some(id) = lookup(&format!("{prefix}_CLIENT_ID")) {
				settings.client_id = id;
			}
			if let Some(secret) = lookup(&format!("{prefix}_CLIENT_SECRET")) {
				settings.client_secret = secret;
			}
		}

		Ok(())
	}

	/// Validates every provider section and builds the registry.
	pub fn build_registry(&self) -> Result<ProviderRegistry, ConfigError> {
		let configs = self
			.providers
			.iter()
			.map(|(kind, settings)| settings.to_provider_config(kind))
			.collect::<Result<Vec<_>, _>>()?;

		if configs.is_empty() {
			return Err(ConfigError::NoProviders);
		}

		let registry = ProviderRegistry::new(configs);

		if !registry.contains(self.bearer.provider) {
			return Err(ConfigError::BearerProviderMissing { provider: self.bearer.provider });
		}

		Ok(registry)
	}

	/// Builds the state guard for the configured mode.
	pub fn build_state_guard(&self) -> Result<StateGuard, ConfigError> {
		match self.state.mode {
			StateMode::Static if self.state.value.is_empty() => Err(ConfigError::EmptyStaticState),
			StateMode::Static => Ok(StateGuard::fixed(self.state.value.clone())),
			StateMode::PerLogin => Ok(StateGuard::per_login(
				Duration::seconds(i64::from(self.state.ttl_secs)),
				self.state.capacity,
			)),
		}
	}

	/// Builds a reqwest-backed gateway from this configuration.
	pub fn build_gateway(&self) -> Result<ReqwestGateway, ConfigError> {
		let http_client =
			ReqwestHttpClient::with_timeout(StdDuration::from_secs(self.http.timeout_secs))?;

		Ok(ReqwestGateway::new(self.build_registry()?, self.build_state_guard()?, http_client))
	}
}

/// `[server]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
	/// Bind address.
	pub host: String,
	/// Bind port.
	pub port: u16,
	/// Origins allowed by CORS.
	pub cors_origins: Vec<String>,
}
impl Default for ServerSettings {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".into(),
			port: 8090,
			cors_origins: vec!["http://localhost:3001".into(), "http://localhost:3002".into()],
		}
	}
}

/// `[http]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
	/// Timeout for each outbound provider request, in seconds.
	pub timeout_secs: u64,
}
impl Default for HttpSettings {
	fn default() -> Self {
		Self { timeout_secs: 10 }
	}
}

/// `[state]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateSettings {
	/// Static or per-login values.
	pub mode: StateMode,
	/// Value used in static mode.
	pub value: String,
	/// Nonce lifetime in per-login mode, in seconds.
	pub ttl_secs: u32,
	/// Maximum outstanding nonces in per-login mode.
	pub capacity: usize,
}
impl Default for StateSettings {
	fn default() -> Self {
		Self {
			mode: StateMode::Static,
			value: String::new(),
			ttl_secs: 600,
			capacity: StateGuard::DEFAULT_CAPACITY,
		}
	}
}

/// `[bearer]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BearerSettings {
	/// Provider whose userinfo endpoint vouches for bearer tokens.
	pub provider: ProviderKind,
}
impl Default for BearerSettings {
	fn default() -> Self {
		Self { provider: ProviderKind::Google }
	}
}

/// `[callback]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CallbackSettings {
	/// Look up and log the identity after each code exchange.
	pub resolve_identity: bool,
}
impl Default for CallbackSettings {
	fn default() -> Self {
		Self { resolve_identity: true }
	}
}

/// `[log]` section.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
	/// Default filter directive; `RUST_LOG` takes precedence.
	pub level: String,
}
impl Default for LogSettings {
	fn default() -> Self {
		Self { level: "info".into() }
	}
}

/// `[providers.*]` sections.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvidersSection {
	/// `[providers.google]`.
	pub google: Option<ProviderSettings>,
	/// `[providers.facebook]`.
	pub facebook: Option<ProviderSettings>,
	/// `[providers.github]`.
	pub github: Option<ProviderSettings>,
}
impl ProvidersSection {
	/// Settings for `kind`, if present.
	pub fn get(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
		match kind {
			ProviderKind::Google => self.google.as_ref(),
			ProviderKind::Facebook => self.facebook.as_ref(),
			ProviderKind::GitHub => self.github.as_ref(),
		}
	}

	fn get_mut(&mut self, kind: ProviderKind) -> Option<&mut ProviderSettings> {
		match kind {
			ProviderKind::Google => self.google.as_mut(),
			ProviderKind::Facebook => self.facebook.as_mut(),
			ProviderKind::GitHub => self.github.as_mut(),
		}
	}

	/// Present sections in [`ProviderKind::ALL`] order.
	pub fn iter(&self) -> impl Iterator<Item = (ProviderKind, &ProviderSettings)> {
		ProviderKind::ALL.into_iter().filter_map(|kind| self.get(kind).map(|s| (kind, s)))
	}
}

/// Client settings for one provider. Unset endpoints fall back to the provider defaults.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSettings {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: String,
	/// Redirect URL registered with the provider.
	pub redirect_url: String,
	/// Requested scopes; provider defaults when absent.
	pub scopes: Option<Vec<String>>,
	/// Authorization endpoint override.
	pub authorization_endpoint: Option<String>,
	/// Token endpoint override.
	pub token_endpoint: Option<String>,
	/// Userinfo endpoint override.
	pub userinfo_endpoint: Option<String>,
	/// Revocation endpoint override.
	pub revocation_endpoint: Option<String>,
	/// Token endpoint client authentication.
	pub client_auth_method: Option<ClientAuthMethod>,
}
impl ProviderSettings {
	/// Validates the section and converts it into a [`ProviderConfig`].
	pub fn to_provider_config(&self, kind: ProviderKind) -> Result<ProviderConfig, ConfigError> {
		let url = |name: &str, raw: &str| {
			Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
				field: format!("providers.{kind}.{name}"),
				source,
			})
		};
		let mut builder = ProviderConfig::builder(kind)
			.client_id(self.client_id.clone())
			.client_secret(self.client_secret.clone());

		if !self.redirect_url.is_empty() {
			builder = builder.redirect_url(url("redirect_url", &self.redirect_url)?);
		}
		if let Some(scopes) = &self.scopes {
			builder = builder.scopes(scopes.iter().cloned());
		}
		if let Some(raw) = &self.authorization_endpoint {
			builder = builder.authorization_endpoint(url("authorization_endpoint", raw)?);
		}
		if let Some(raw) = &self.token_endpoint {
			builder = builder.token_endpoint(url("token_endpoint", raw)?);
		}
		if let Some(raw) = &self.userinfo_endpoint {
			builder = builder.userinfo_endpoint(url("userinfo_endpoint", raw)?);
		}
		if let Some(raw) = &self.revocation_endpoint {
			builder = builder.revocation_endpoint(url("revocation_endpoint", raw)?);
		}
		if let Some(method) = self.client_auth_method {
			builder = builder.client_auth_method(method);
		}

		builder.build().map_err(|source| ConfigError::InvalidProvider { provider: kind, source })
	}
}
impl Debug for ProviderSettings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderSettings")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("redirect_url", &self.redirect_url)
			.field("scopes", &self.scopes)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::ProviderConfigError;

	const SAMPLE: &str = r#"
[server]
port = 9000

[state]
value = "xyz"

[providers.google]
client_id = "google-client"
client_secret = "google-secret"
redirect_url = "http://localhost:3001/callback-google"

[providers.github]
client_id = "github-client"
client_secret = "github-secret"
redirect_url = "http://localhost:3001/callback-github"
scopes = ["read:user", "user:email"]
"#;

	fn sample() -> GatewayConfig {
		GatewayConfig::from_toml_str(SAMPLE).expect("Sample config should parse.")
	}

	#[test]
	fn defaults_fill_missing_sections() {
		let config = sample();

		assert_eq!(config.server.port, 9000);
		assert_eq!(config.server.host, "0.0.0.0");
		assert_eq!(config.server.cors_origins.len(), 2);
		assert_eq!(config.http.timeout_secs, 10);
		assert_eq!(config.state.mode, StateMode::Static);
		assert_eq!(config.bearer.provider, ProviderKind::Google);
		assert!(config.callback.resolve_identity);
		assert_eq!(config.log.level, "info");
	}

	#[test]
	fn builds_registry_from_present_sections() {
		let registry = sample().build_registry().expect("Sample registry should build.");

		assert_eq!(registry.kinds(), vec![ProviderKind::Google, ProviderKind::GitHub]);

		let github = registry.get(ProviderKind::GitHub).expect("GitHub should be configured.");

		assert_eq!(github.scopes.joined(' ').as_deref(), Some("read:user user:email"));
		assert_eq!(github.endpoints.token.as_str(), "https://github.com/login/oauth/access_token");
	}

	#[test]
	fn env_overrides_apply_to_existing_sections() {
		let mut config = sample();
		let env = HashMap::from([
			("OAUTH2_GATEWAY_PORT", "8443"),
			("OAUTH2_GATEWAY_STATE", "from-env"),
			("OAUTH2_GATEWAY_GOOGLE_CLIENT_ID", "env-client"),
			("OAUTH2_GATEWAY_FACEBOOK_CLIENT_ID", "ignored"),
		]);

		config
			.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()))
			.expect("Overrides should apply.");

		assert_eq!(config.server.port, 8443);
		assert_eq!(config.state.value, "from-env");
		assert_eq!(
			config.providers.google.as_ref().map(|p| p.client_id.as_str()),
			Some("env-client")
		);
		assert!(config.providers.facebook.is_none());

		let err = config
			.apply_env_overrides(|name| (name == "OAUTH2_GATEWAY_PORT").then(|| "http".into()))
			.expect_err("Non-numeric port must be rejected.");

		assert!(matches!(err, ConfigError::InvalidEnv { name: "OAUTH2_GATEWAY_PORT" }));
	}

	#[test]
	fn validation_failures_are_fatal() {
		assert!(matches!(
			GatewayConfig::default().build_registry(),
			Err(ConfigError::NoProviders)
		));

		let mut config = sample();

		config.bearer.provider = ProviderKind::Facebook;

		assert!(matches!(
			config.build_registry(),
			Err(ConfigError::BearerProviderMissing { provider: ProviderKind::Facebook })
		));

		let mut config = sample();

		if let Some(google) = config.providers.google.as_mut() {
			google.token_endpoint = Some("http://oauth.example.com/token".into());
		}

		assert!(matches!(
			config.build_registry(),
			Err(ConfigError::InvalidProvider {
				provider: ProviderKind::Google,
				source: ProviderConfigError::InsecureEndpoint { endpoint: "token", .. },
			})
		));

		let mut config = sample();

		if let Some(github) = config.providers.github.as_mut() {
			github.redirect_url = "not a url".into();
		}

		assert!(matches!(config.build_registry(), Err(ConfigError::InvalidUrl { .. })));
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(GatewayConfig::from_toml_str("[server]\nprot = 1\n").is_err());
	}

	#[test]
	fn state_guard_follows_mode() {
		let mut config = sample();

		assert_eq!(
			config.build_state_guard().expect("Static guard should build.").issue(),
			"xyz"
		);

		config.state.value.clear();

		assert!(matches!(config.build_state_guard(), Err(ConfigError::EmptyStaticState)));

		config.state.mode = StateMode::PerLogin;

		assert_eq!(
			config.build_state_guard().expect("Per-login guard should build.").mode(),
			StateMode::PerLogin
		);
	}

	#[test]
	fn debug_output_redacts_client_secret() {
		let rendered = format!("{:?}", sample().providers);

		assert!(!rendered.contains("google-secret"));
	}
}
