//! Flow observability: tracing spans and optional metrics.
//!
//! Every flow runs inside a span named `oauth2_gateway.flow` carrying `flow` and `stage`
//! fields. With the `metrics` feature enabled, `oauth2_gateway_flow_total` counts each
//! attempt, success, and failure, labeled by `flow` and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flows observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization URL construction.
	Authorize,
	/// Authorization code exchange.
	AuthorizationCode,
	/// Refresh token exchange.
	Refresh,
	/// Token revocation.
	Revocation,
	/// Userinfo lookup.
	Identity,
	/// Bearer verification on protected routes.
	BearerVerification,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorize => "authorize",
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::Refresh => "refresh",
			FlowKind::Revocation => "revocation",
			FlowKind::Identity => "identity",
			FlowKind::BearerVerification => "bearer_verification",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a flow result onto its terminal outcome.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
