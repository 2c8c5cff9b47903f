//! axum HTTP boundary: routes, bearer middleware, error responses, and process startup.

pub mod bearer;
pub mod logging;
pub mod response;
pub mod routes;

pub use bearer::*;
pub use logging::*;
pub use response::*;

// std
use std::path::PathBuf;
// crates.io
use axum::{
	Router,
	http::{
		HeaderValue, Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
	middleware,
	routing::{get, post},
};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{
	cors::{AllowOrigin, CorsLayer},
	trace::TraceLayer,
};
// self
use crate::{
	_prelude::*,
	config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, GatewayConfig},
	error::ConfigError,
	flows::ReqwestGateway,
	provider::ProviderKind,
};

/// Command line arguments of the `oauth2-gateway` binary.
#[derive(Debug, Parser)]
#[command(version, about = "Multi-provider OAuth 2.0 gateway.")]
pub struct ServeArgs {
	/// TOML configuration file.
	#[arg(short, long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
	pub config: PathBuf,
	/// Log filter overriding `[log] level`; `RUST_LOG` still wins.
	#[arg(long)]
	pub log_level: Option<String>,
}

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Flow orchestrator.
	pub gateway: ReqwestGateway,
	/// Provider used to verify bearer tokens on protected routes.
	pub bearer_provider: ProviderKind,
	/// Look up the identity after each callback exchange.
	pub resolve_identity: bool,
}
impl AppState {
	/// State verifying bearer tokens with Google and resolving callback identities.
	pub fn new(gateway: ReqwestGateway) -> Self {
		Self { gateway, bearer_provider: ProviderKind::Google, resolve_identity: true }
	}

	/// Builds the gateway and state from a loaded configuration.
	pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
		Ok(Self {
			gateway: config.build_gateway()?,
			bearer_provider: config.bearer.provider,
			resolve_identity: config.callback.resolve_identity,
		})
	}

	/// Overrides the bearer verification provider.
	pub fn with_bearer_provider(mut self, provider: ProviderKind) -> Self {
		self.bearer_provider = provider;

		self
	}

	/// Turns identity lookup after callbacks on or off.
	pub fn with_identity_resolution(mut self, enabled: bool) -> Self {
		self.resolve_identity = enabled;

		self
	}
}

/// Builds the route table. `/me` sits behind the bearer middleware.
pub fn router(state: AppState) -> Router {
	let protected = Router::new()
		.route("/me", get(routes::me))
		.route_layer(middleware::from_fn_with_state(state.clone(), bearer::require_bearer));

	Router::new()
		.route("/", get(routes::landing))
		.route("/login-google", get(routes::login_google))
		.route("/login-google-implicit", get(routes::login_google_implicit))
		.route("/callback-google", post(routes::callback_google))
		.route("/revoke-token-google", post(routes::revoke_token_google))
		.route("/get-new-token", post(routes::get_new_token))
		.route("/login-facebook", get(routes::login_facebook))
		.route("/login-github", get(routes::login_github))
		.route("/callback-github", post(routes::callback_github))
		.merge(protected)
		.with_state(state)
}

/// CORS policy allowing credentials from the listed origins.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, ConfigError> {
	let origins = origins
		.iter()
		.map(|origin| {
			HeaderValue::from_str(origin)
				.map_err(|_| ConfigError::InvalidCorsOrigin { origin: origin.clone() })
		})
		.collect::<Result<Vec<_>, _>>()?;

	Ok(CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
		.allow_headers([CONTENT_TYPE, AUTHORIZATION, ACCEPT])
		.allow_credentials(true))
}

/// Serves the gateway until Ctrl-C.
pub async fn serve(config: &GatewayConfig) -> Result<()> {
	let state = AppState::from_config(config)?;
	let providers = state.gateway.registry.kinds();
	let app = router(state)
		.layer(cors_layer(&config.server.cors_origins)?)
		.layer(TraceLayer::new_for_http());
	let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;

	tracing::info!(address = %listener.local_addr()?, ?providers, "gateway listening");

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

	tracing::info!("gateway stopped");

	Ok(())
}

/// Loads configuration, installs logging, and serves.
pub async fn run(args: ServeArgs) -> Result<()> {
	let config = GatewayConfig::load(&args.config)?;

	init_tracing(args.log_level.as_deref().unwrap_or(&config.log.level))?;

	tracing::info!(config = %args.config.display(), "configuration loaded");

	serve(&config).await
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "cannot listen for Ctrl-C; shutdown must come from outside");

		std::future::pending::<()>().await;
	}

	tracing::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn cors_origins_must_be_header_values() {
		assert!(cors_layer(&["http://localhost:3001".into()]).is_ok());
		assert!(matches!(
			cors_layer(&["http://bad\norigin".into()]),
			Err(ConfigError::InvalidCorsOrigin { .. })
		));
	}

	#[test]
	fn cli_defaults_to_gateway_toml() {
		let args = ServeArgs::try_parse_from(["oauth2-gateway"]).expect("Defaults should parse.");

		assert!(args.log_level.is_none());
		assert!(
			args.config.ends_with(DEFAULT_CONFIG_PATH)
				|| std::env::var_os(CONFIG_PATH_ENV).is_some()
		);
	}
}
