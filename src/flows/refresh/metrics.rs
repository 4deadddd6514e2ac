// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::FlowOutcome;

/// Point-in-time copy of [`RefreshMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
	/// Renewals started, whether by [`refresh`](crate::flows::AuthProvider::refresh) or by
	/// [`re_auth`](crate::flows::AuthProvider::re_auth).
	pub attempts: u64,
	/// Renewals that stored new credentials.
	pub successes: u64,
	/// Renewals that returned an error and left the previous credentials in place.
	pub failures: u64,
}
impl RefreshStats {
	/// Renewals started but not yet finished.
	pub fn in_flight(&self) -> u64 {
		self.attempts.saturating_sub(self.successes + self.failures)
	}
}

/// Renewal counters shared by every clone of an [`AuthProvider`](crate::flows::AuthProvider).
///
/// Indexed by [`FlowOutcome`] so the same labels feed these counters and the optional
/// `fakturoid_flow_total` metric.
#[derive(Debug, Default)]
pub struct RefreshMetrics([AtomicU64; 3]);
impl RefreshMetrics {
	/// Renewals started.
	pub fn attempts(&self) -> u64 {
		self.get(FlowOutcome::Attempt)
	}

	/// Renewals that stored new credentials.
	pub fn successes(&self) -> u64 {
		self.get(FlowOutcome::Success)
	}

	/// Renewals that returned an error.
	pub fn failures(&self) -> u64 {
		self.get(FlowOutcome::Failure)
	}

	/// Point-in-time copy of all counters.
	pub fn snapshot(&self) -> RefreshStats {
		RefreshStats {
			attempts: self.attempts(),
			successes: self.successes(),
			failures: self.failures(),
		}
	}

	pub(crate) fn record(&self, outcome: FlowOutcome) {
		self.0[Self::slot(outcome)].fetch_add(1, Ordering::Relaxed);
	}

	fn get(&self, outcome: FlowOutcome) -> u64 {
		self.0[Self::slot(outcome)].load(Ordering::Relaxed)
	}

	const fn slot(outcome: FlowOutcome) -> usize {
		match outcome {
			FlowOutcome::Attempt => 0,
			FlowOutcome::Success => 1,
			FlowOutcome::Failure => 2,
		}
	}
}
