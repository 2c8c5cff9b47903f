//! Authorization code exchange and login callback handling.

// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	flows::{Gateway, IdentityClaim, ensure_grant},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{FlowKind, FlowSpan},
	provider::{GrantType, ProviderKind},
};

/// Result of a completed login callback.
#[derive(Clone, Debug)]
pub struct CallbackOutcome {
	/// Tokens issued by the provider.
	pub tokens: TokenSet,
	/// Identity behind the access token, when it was looked up and succeeded.
	pub identity: Option<IdentityClaim>,
}

impl<C, M> Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code for tokens.
	///
	/// An empty code fails with [`Error::EmptyCode`] before any network call.
	pub async fn exchange_code(&self, provider: ProviderKind, code: &str) -> Result<TokenSet> {
		let span = FlowSpan::new(FlowKind::AuthorizationCode, "exchange_code");

		span.observe(async move {
			if code.trim().is_empty() {
				return Err(Error::EmptyCode);
			}

			let config = self.registry.get(provider)?;

			ensure_grant(config, GrantType::AuthorizationCode)?;

			let facade = self.facade(config)?;
			let strategy = provider.strategy();
			let tokens = facade
				.exchange_authorization_code(strategy.as_ref(), code)
				.await
				.map_err(|source| Error::Exchange { provider, source })?;

			tracing::info!(
				%provider,
				token = %tokens.access_token.fingerprint(),
				refresh_token = tokens.refresh_token.is_some(),
				"exchanged authorization code"
			);

			Ok(tokens)
		})
		.await
	}

	/// Verifies the callback `state`, exchanges the code, and optionally resolves the identity.
	///
	/// A state mismatch fails before the code is looked at. Identity lookup failures are
	/// logged and leave [`CallbackOutcome::identity`] empty.
	pub async fn complete_callback(
		&self,
		provider: ProviderKind,
		state: &str,
		code: &str,
		resolve_identity: bool,
	) -> Result<CallbackOutcome> {
		if let Err(e) = self.state.verify(state) {
			tracing::warn!(%provider, "callback state mismatch");

			return Err(e);
		}

		let tokens = self.exchange_code(provider, code).await?;
		let identity = if resolve_identity {
			match self.resolve_identity(provider, tokens.access_token.expose()).await {
				Ok(claim) => {
					tracing::info!(
						%provider,
						subject = %claim.subject,
						email = claim.email.as_deref().unwrap_or_default(),
						"callback identity"
					);

					Some(claim)
				},
				Err(e) => {
					tracing::warn!(%provider, error = %e, "callback identity lookup failed");

					None
				},
			}
		} else {
			None
		};

		Ok(CallbackOutcome { tokens, identity })
	}
}
