// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome, record_flow_outcome},
};

/// Span wrapper used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	span: Span,
}
impl FlowSpan {
	/// Creates a span tagged with the flow kind and call site.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		let span = tracing::info_span!("oauth2_gateway.flow", flow = kind.as_str(), stage);

		Self { kind, span }
	}

	/// Flow this span describes.
	pub fn kind(&self) -> FlowKind {
		self.kind
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> FlowSpanGuard {
		FlowSpanGuard { _guard: self.span.entered() }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}

	/// Runs `f` inside the entered span and records attempt plus terminal outcome.
	pub fn observe_sync<F, T, E>(self, f: F) -> std::result::Result<T, E>
	where
		F: FnOnce() -> std::result::Result<T, E>,
	{
		let kind = self.kind;
		let _guard = self.entered();

		record_flow_outcome(kind, FlowOutcome::Attempt);

		let result = f();

		record_flow_outcome(kind, FlowOutcome::of(&result));

		result
	}

	/// Runs `fut` inside the span and records attempt plus terminal outcome.
	pub async fn observe<Fut, T, E>(&self, fut: Fut) -> std::result::Result<T, E>
	where
		Fut: Future<Output = std::result::Result<T, E>>,
	{
		record_flow_outcome(self.kind, FlowOutcome::Attempt);

		let result = self.instrument(fut).await;

		record_flow_outcome(self.kind, FlowOutcome::of(&result));

		result
	}
}

/// RAII guard returned by [`FlowSpan::entered`].
pub struct FlowSpanGuard {
	_guard: tracing::span::EnteredSpan,
}
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FlowSpanGuard(..)")
	}
}
