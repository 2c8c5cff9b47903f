// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counts a flow outcome through the global metrics recorder when the `metrics` feature is on.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_gateway_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
