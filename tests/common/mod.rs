#![allow(dead_code)]

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::MockServer;
// self
use oauth2_gateway::{
	flows::{ReqwestGateway, StateGuard},
	http::ReqwestHttpClient,
	provider::{ProviderConfig, ProviderKind, ProviderRegistry},
	url::Url,
};

pub const STATE: &str = "state-fixture";

/// Provider configuration whose endpoints live under `/<kind>/...` on `server`.
pub fn provider_config(server: &MockServer, kind: ProviderKind) -> ProviderConfig {
	let endpoint = |suffix: &str| {
		Url::parse(&server.url(format!("/{kind}/{suffix}")))
			.expect("Mock provider endpoint should parse.")
	};
	let mut builder = ProviderConfig::builder(kind)
		.client_id(format!("{kind}-client"))
		.client_secret(format!("{kind}-secret"))
		.redirect_url(
			Url::parse(&format!("https://app.example.com/callback-{kind}"))
				.expect("Redirect URL fixture should parse."),
		)
		.scopes(["email", "profile"])
		.authorization_endpoint(endpoint("authorize"))
		.token_endpoint(endpoint("token"))
		.userinfo_endpoint(endpoint("userinfo"));

	if kind == ProviderKind::Google {
		builder = builder.revocation_endpoint(endpoint("revoke"));
	}

	builder.build().expect("Mock provider configuration should build.")
}

pub fn registry(server: &MockServer) -> ProviderRegistry {
	ProviderRegistry::new(ProviderKind::ALL.into_iter().map(|kind| provider_config(server, kind)))
}

pub fn http_client() -> ReqwestHttpClient {
	ReqwestHttpClient::with_timeout(StdDuration::from_secs(5))
		.expect("Test HTTP client should build.")
}

/// Gateway pointed at `server` that expects [`STATE`] on every callback.
pub fn gateway(server: &MockServer) -> ReqwestGateway {
	ReqwestGateway::new(registry(server), StateGuard::fixed(STATE), http_client())
}

pub fn token_body(access: &str, refresh: Option<&str>) -> String {
	match refresh {
		Some(refresh) => format!(
			"{{\"access_token\":\"{access}\",\"refresh_token\":\"{refresh}\",\"token_type\":\"bearer\",\"expires_in\":3599}}"
		),
		None => format!("{{\"access_token\":\"{access}\",\"token_type\":\"bearer\"}}"),
	}
}
