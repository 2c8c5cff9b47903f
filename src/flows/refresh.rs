//! Refresh token exchange.

// self
use crate::{
	_prelude::*,
	auth::{TokenSet, fingerprint},
	error::ProviderCallError,
	flows::{Gateway, ensure_grant},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{FlowKind, FlowSpan},
	provider::{GrantType, ProviderKind},
};

impl<C, M> Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Exchanges `refresh_token` for a new access token.
	///
	/// An empty refresh token is rejected without a network call. Provider rejections
	/// and transport failures both surface as [`Error::Refresh`]; the source tells them apart.
	pub async fn refresh(&self, provider: ProviderKind, refresh_token: &str) -> Result<TokenSet> {
		let span = FlowSpan::new(FlowKind::Refresh, "refresh");

		span.observe(async move {
			if refresh_token.trim().is_empty() {
				return Err(Error::Refresh {
					provider,
					source: ProviderCallError::InvalidGrant {
						reason: "refresh token is empty".into(),
					},
				});
			}

			let config = self.registry.get(provider)?;

			ensure_grant(config, GrantType::RefreshToken)?;

			let facade = self.facade(config)?;
			let strategy = provider.strategy();
			let result = facade.refresh_token(strategy.as_ref(), refresh_token).await;

			match result {
				Ok(tokens) => {
					tracing::info!(
						%provider,
						refresh_token = %fingerprint(refresh_token),
						token = %tokens.access_token.fingerprint(),
						"refreshed access token"
					);

					Ok(tokens)
				},
				Err(source) => {
					tracing::warn!(
						%provider,
						refresh_token = %fingerprint(refresh_token),
						rejected = source.is_rejection(),
						error = %source,
						"refresh failed"
					);

					Err(Error::Refresh { provider, source })
				},
			}
		})
		.await
	}
}
