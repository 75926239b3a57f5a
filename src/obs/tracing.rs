// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by token manager operations.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("caspio_auth.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a freshly cached credential by fingerprint.
pub(crate) fn token_acquired(fingerprint: &str, expires_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(fingerprint, ?expires_at, "Cached a new access token.");
	#[cfg(not(feature = "tracing"))]
	let _ = (fingerprint, expires_at);
}

/// Logs a forced cache invalidation.
pub(crate) fn token_invalidated(had_token: bool) {
	#[cfg(feature = "tracing")]
	tracing::debug!(had_token, "Cleared the cached access token.");
	#[cfg(not(feature = "tracing"))]
	let _ = had_token;
}

/// Logs the replay of a request rejected with 401.
pub(crate) fn unauthorized_retry() {
	#[cfg(feature = "tracing")]
	tracing::info!("Upstream rejected the access token; retrying once with a fresh token.");
}

/// Logs a failure surfaced to the caller.
pub(crate) fn flow_failed(kind: FlowKind, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(flow = kind.as_str(), error = %error, "Token manager operation failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, error);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn event_helpers_are_safe_without_subscriber() {
		token_acquired("ba7816bf8f01", OffsetDateTime::now_utc());
		token_invalidated(true);
		unauthorized_retry();
		flow_failed(FlowKind::GetToken, &std::io::Error::other("offline"));
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::RefreshToken, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
