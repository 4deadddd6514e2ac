// self
use crate::{
	oauth::http::StatusCode,
	obs::{FlowKind, FlowOutcome},
};

/// Counter incremented once per flow outcome, labeled by `flow` and `outcome`.
pub const FLOW_COUNTER: &str = "fakturoid_flow_total";
/// Counter incremented once per API response received by the dispatcher, labeled by `class`.
pub const RESPONSE_COUNTER: &str = "fakturoid_response_total";

/// Bumps [`FLOW_COUNTER`]. Without the `metrics` feature this compiles to nothing.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_COUNTER, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Bumps [`RESPONSE_COUNTER`] for a response that came back from the API, before any
/// 4xx/5xx classification.
pub fn record_response_status(status: StatusCode) {
	#[cfg(feature = "metrics")]
	metrics::counter!(RESPONSE_COUNTER, "class" => status_class(status)).increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = status;
}

/// Collapses a status code into its `Nxx` family.
pub fn status_class(status: StatusCode) -> &'static str {
	match status.as_u16() {
		100..=199 => "1xx",
		200..=299 => "2xx",
		300..=399 => "3xx",
		400..=499 => "4xx",
		_ => "5xx",
	}
}
