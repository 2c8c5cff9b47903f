//! Multi-provider OAuth 2.0 gateway: Google, Facebook, and GitHub login flows, code
//! exchange, refresh, revocation, and bearer verification behind one axum service.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod server;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::{Gateway, StateGuard},
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::{ProviderConfig, ProviderKind, ProviderRegistry},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a provider configuration whose endpoints all live under `base`.
	///
	/// Paths follow the pattern `/<kind>/authorize`, `/<kind>/token`, `/<kind>/userinfo`,
	/// and (Google only) `/<kind>/revoke`.
	pub fn mock_provider_config(kind: ProviderKind, base: &str) -> ProviderConfig {
		let endpoint = |suffix: &str| {
			Url::parse(&format!("{}/{kind}/{suffix}", base.trim_end_matches('/')))
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

	/// Registry with every provider pointed at the mock server rooted at `base`.
	pub fn mock_registry(base: &str) -> ProviderRegistry {
		ProviderRegistry::new(
			[ProviderKind::Google, ProviderKind::Facebook, ProviderKind::GitHub]
				.into_iter()
				.map(|kind| mock_provider_config(kind, base)),
		)
	}

	/// Constructs a [`Gateway`] backed by the mock registry, a static state guard, and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_gateway(base: &str, expected_state: &str) -> ReqwestTestGateway {
		Gateway::with_http_client(
			mock_registry(base),
			StateGuard::fixed(expected_state),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use error::{Error, Result};
pub use reqwest;
pub use time;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tower as _};
