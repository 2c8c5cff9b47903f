//! Bearer token verification for protected routes.
//!
//! A request moves from unauthenticated to an extracted token, then to an introspected
//! claim, and ends authorized or rejected. Each rejection maps onto one
//! [`UnauthorizedReason`].

// self
use crate::{
	_prelude::*,
	auth::fingerprint,
	error::UnauthorizedReason,
	flows::{Gateway, IdentityClaim},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{FlowKind, FlowSpan},
	provider::ProviderKind,
};

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
///
/// The value must split on single spaces into exactly two parts, the first being `Bearer`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, UnauthorizedReason> {
	let header = match header {
		Some(value) if !value.is_empty() => value,
		_ => return Err(UnauthorizedReason::MissingHeader),
	};
	let mut parts = header.split(' ');

	match (parts.next(), parts.next(), parts.next()) {
		(Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
		_ => Err(UnauthorizedReason::MalformedHeader),
	}
}

impl<C, M> Gateway<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Verifies an `Authorization` header value against `provider`'s userinfo endpoint.
	///
	/// Makes one provider round trip per call and never accepts a token the provider
	/// could not vouch for.
	pub async fn verify_bearer(
		&self,
		provider: ProviderKind,
		header: Option<&str>,
	) -> Result<IdentityClaim> {
		let span = FlowSpan::new(FlowKind::BearerVerification, "verify_bearer");

		span.observe(async move {
			let token = extract_bearer(header).map_err(Error::Unauthorized)?;
			let claim = self.resolve_identity(provider, token).await.map_err(|e| {
				tracing::warn!(
					%provider,
					token = %fingerprint(token),
					error = %e,
					"cannot validate token"
				);

				Error::Unauthorized(UnauthorizedReason::VerificationFailed)
			})?;

			if claim.is_valid() {
				Ok(claim)
			} else {
				tracing::info!(
					%provider,
					token = %fingerprint(token),
					code = claim.error.as_ref().and_then(|e| e.code),
					"provider rejected bearer token"
				);

				Err(Error::Unauthorized(UnauthorizedReason::InvalidToken))
			}
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn extracts_well_formed_tokens() {
		assert_eq!(extract_bearer(Some("Bearer abc.def")), Ok("abc.def"));
	}

	#[test]
	fn missing_and_malformed_headers_are_distinguished() {
		assert_eq!(extract_bearer(None), Err(UnauthorizedReason::MissingHeader));
		assert_eq!(extract_bearer(Some("")), Err(UnauthorizedReason::MissingHeader));

		for header in
			["Basic abc", "Bearer", "Bearer ", "Bearer  abc", "Bearer a b", "bearer abc"]
		{
			assert_eq!(
				extract_bearer(Some(header)),
				Err(UnauthorizedReason::MalformedHeader),
				"{header:?} must be rejected as malformed."
			);
		}
	}
}
