//! Gateway-level error types shared across flows, providers, and the HTTP boundary.

// self
use crate::{_prelude::*, provider::ProviderKind};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Server socket or process-level I/O failure.
	#[error("Gateway server I/O failed.")]
	Io(#[from] std::io::Error),
	/// Global tracing subscriber was already installed.
	#[error("Tracing subscriber could not be installed.")]
	Tracing(#[from] tracing_subscriber::util::TryInitError),

	/// The requested provider has no entry in the registry.
	#[error("Provider `{provider}` is not configured.")]
	ProviderNotConfigured {
		/// Provider that was requested.
		provider: ProviderKind,
	},
	/// Callback `state` did not match the expected anti-forgery value.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// Callback arrived without an authorization code.
	#[error("Code Not Found to provide AccessToken..")]
	EmptyCode,
	/// Authorization code exchange failed.
	#[error("Authorization code exchange with `{provider}` failed.")]
	Exchange {
		/// Provider that served the token endpoint.
		provider: ProviderKind,
		/// Classified provider failure.
		#[source]
		source: ProviderCallError,
	},
	/// Refresh token exchange failed.
	#[error("Refresh token exchange with `{provider}` failed.")]
	Refresh {
		/// Provider that served the token endpoint.
		provider: ProviderKind,
		/// Classified provider failure.
		#[source]
		source: ProviderCallError,
	},
	/// Revocation request could not be delivered.
	#[error("Token revocation with `{provider}` failed.")]
	Revocation {
		/// Provider that served the revocation endpoint.
		provider: ProviderKind,
		/// Classified provider failure.
		#[source]
		source: ProviderCallError,
	},
	/// Userinfo lookup failed.
	#[error("Identity lookup with `{provider}` failed.")]
	Identity {
		/// Provider that served the userinfo endpoint.
		provider: ProviderKind,
		/// Classified provider failure.
		#[source]
		source: ProviderCallError,
	},
	/// Bearer verification rejected the request.
	#[error("{0}")]
	Unauthorized(UnauthorizedReason),
}

/// Why bearer verification rejected a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnauthorizedReason {
	/// No `Authorization` header was supplied.
	MissingHeader,
	/// The header is not `Bearer <token>`.
	MalformedHeader,
	/// The provider could not be reached or its answer could not be parsed.
	VerificationFailed,
	/// The provider reported the token as invalid.
	InvalidToken,
}
impl UnauthorizedReason {
	/// Returns the plain-text body sent back to the client.
	pub const fn as_str(self) -> &'static str {
		match self {
			UnauthorizedReason::MissingHeader => "Unauthorized",
			UnauthorizedReason::MalformedHeader => "Invalid token format",
			UnauthorizedReason::VerificationFailed => "Cannot validate token",
			UnauthorizedReason::InvalidToken => "Invalid token",
		}
	}
}
impl Display for UnauthorizedReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Classified failure of a single provider round trip.
#[derive(Debug, ThisError)]
pub enum ProviderCallError {
	/// Request could not be constructed locally.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary or unexpected upstream failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Provider rejected the grant (bad code, expired or revoked refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or gateway-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or gateway-supplied reason string.
		reason: String,
	},
	/// Requested scopes exceed what was granted.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or gateway-supplied reason string.
		reason: String,
	},
}
impl ProviderCallError {
	/// Returns `true` when the provider answered and refused the request, as opposed to
	/// the call failing in transit.
	pub fn is_rejection(&self) -> bool {
		matches!(
			self,
			Self::InvalidGrant { .. } | Self::InvalidClient { .. } | Self::InsufficientScope { .. }
		)
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider configuration contains an invalid URL.
	#[error("Configuration field `{field}` is not a valid URL.")]
	InvalidUrl {
		/// Dotted path of the offending field.
		field: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider configuration failed validation.
	#[error("Provider `{provider}` is misconfigured.")]
	InvalidProvider {
		/// Provider whose configuration failed.
		provider: ProviderKind,
		/// Validation failure.
		#[source]
		source: crate::provider::ProviderConfigError,
	},
	/// Configuration file could not be read.
	#[error("Configuration file `{path}` could not be read.")]
	Read {
		/// Path that was read.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Configuration file is not valid TOML for [`crate::config::GatewayConfig`].
	#[error("Configuration file is malformed.")]
	Parse(#[from] toml::de::Error),
	/// Environment override could not be applied.
	#[error("Environment variable `{name}` holds an invalid value.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
	},
	/// No provider sections are present.
	#[error("At least one provider must be configured.")]
	NoProviders,
	/// Static state mode needs a non-empty value.
	#[error("Static state mode requires a non-empty `state.value`.")]
	EmptyStaticState,
	/// A CORS origin is not a valid header value.
	#[error("CORS origin `{origin}` is invalid.")]
	InvalidCorsOrigin {
		/// Origin as configured.
		origin: String,
	},
	/// Bearer verification names a provider that has no configuration.
	#[error("Bearer verification provider `{provider}` is not configured.")]
	BearerProviderMissing {
		/// Provider named by `bearer.provider`.
		provider: ProviderKind,
	},

	/// Provider does not enable the requested grant.
	#[error("Provider `{provider}` does not enable the {grant} grant.")]
	UnsupportedGrant {
		/// Provider identifier.
		provider: ProviderKind,
		/// Disabled grant label.
		grant: &'static str,
	},
	/// Provider lacks the endpoint an operation needs.
	#[error("Provider `{provider}` has no {endpoint} endpoint.")]
	UnsupportedOperation {
		/// Provider identifier.
		provider: ProviderKind,
		/// Missing endpoint label.
		endpoint: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary or unexpected upstream failures.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("The {endpoint} endpoint returned an unexpected response: {message}.")]
	Endpoint {
		/// Endpoint label (`token`, `userinfo`, `revocation`).
		endpoint: &'static str,
		/// Provider- or gateway-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Provider responded with JSON that could not be parsed.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	ResponseParse {
		/// Endpoint label (`token`, `userinfo`, `revocation`).
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unauthorized_reasons_render_client_messages() {
		assert_eq!(
			Error::Unauthorized(UnauthorizedReason::MissingHeader).to_string(),
			"Unauthorized"
		);
		assert_eq!(UnauthorizedReason::MalformedHeader.to_string(), "Invalid token format");
		assert_eq!(UnauthorizedReason::VerificationFailed.to_string(), "Cannot validate token");
		assert_eq!(UnauthorizedReason::InvalidToken.to_string(), "Invalid token");
	}

	#[test]
	fn rejections_are_distinguished_from_transport_failures() {
		let rejected = ProviderCallError::InvalidGrant { reason: "expired".into() };
		let network = ProviderCallError::from(TransportError::Io(std::io::Error::other("reset")));

		assert!(rejected.is_rejection());
		assert!(!network.is_rejection());
	}
}
