//! Optional observability helpers for token manager operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `caspio_auth.flow` with the
//!   `flow` (operation) and `stage` (call site) fields, plus events for acquisitions,
//!   invalidations, retries, and failures. Tokens only ever appear as fingerprints.
//! - Enable `metrics` to increment the `caspio_auth_flow_total` counter for every
//!   attempt/outcome, labeled by `flow` + `outcome`.

mod tracing;

pub use tracing::*;

// self
use crate::_prelude::*;

/// Token manager operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Cached-or-refreshed token lookup.
	GetToken,
	/// Unconditional token endpoint round trip.
	RefreshToken,
	/// Wrapped request with one-shot 401 recovery.
	HandleRequest,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::GetToken => "get_token",
			FlowKind::RefreshToken => "refresh_token",
			FlowKind::HandleRequest => "handle_request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an operation.
	Attempt,
	/// Cached credential reused without contacting the token endpoint.
	CacheHit,
	/// Wrapped request rejected with 401 and replayed once.
	Retry,
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
			FlowOutcome::CacheHit => "cache_hit",
			FlowOutcome::Retry => "retry",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"caspio_auth_flow_total",
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
