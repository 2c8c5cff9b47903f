//! Gateway flows: authorization URLs, callbacks, code exchange, refresh, revocation,
//! identity resolution, and bearer verification.

pub mod authorize;
pub mod exchange;
pub mod identity;
pub mod refresh;
pub mod revoke;
pub mod state;
pub mod verify;

pub use authorize::*;
pub use exchange::*;
pub use identity::*;
pub use refresh::*;
pub use revoke::*;
pub use state::*;
pub use verify::*;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{BasicFacade, ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{GrantType, ProviderConfig, ProviderRegistry},
};

/// Gateway specialized for the crate's default reqwest transport stack.
pub type ReqwestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs OAuth flows against every configured provider.
///
/// Holds the immutable provider registry, the anti-forgery state guard, and the shared
/// HTTP transport. Cloning is cheap; all fields are reference counted.
pub struct Gateway<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Provider configurations loaded at startup.
	pub registry: Arc<ProviderRegistry>,
	/// Issues and checks callback `state` values.
	pub state: Arc<StateGuard>,
}
impl<C, M> Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Creates a gateway that reuses the caller-provided transport and mapper pair.
	pub fn with_http_client(
		registry: ProviderRegistry,
		state: StateGuard,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			registry: Arc::new(registry),
			state: Arc::new(state),
		}
	}

	fn facade(&self, config: &ProviderConfig) -> Result<BasicFacade<C, M>, ConfigError> {
		BasicFacade::from_config(config, self.http_client.clone(), self.transport_mapper.clone())
	}
}
impl ReqwestGateway {
	/// Creates a gateway backed by the given reqwest client wrapper.
	pub fn new(
		registry: ProviderRegistry,
		state: StateGuard,
		http_client: ReqwestHttpClient,
	) -> Self {
		Self::with_http_client(registry, state, http_client, Arc::new(ReqwestTransportErrorMapper))
	}
}
impl<C, M> Clone for Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			registry: self.registry.clone(),
			state: self.state.clone(),
		}
	}
}
impl<C, M> Debug for Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("providers", &self.registry.kinds())
			.field("state_mode", &self.state.mode())
			.finish()
	}
}

fn ensure_grant(config: &ProviderConfig, grant: GrantType) -> Result<(), ConfigError> {
	if config.supports(grant) {
		Ok(())
	} else {
		Err(ConfigError::UnsupportedGrant { provider: config.kind, grant: grant.as_str() })
	}
}
