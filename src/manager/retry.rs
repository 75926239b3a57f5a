//! One-shot recovery for requests rejected with HTTP 401.
//!
//! [`TokenManager::handle_request`] runs a request closure, and when the first attempt fails
//! with exactly 401 it clears the cached credential and runs the closure once more. The second
//! outcome is final. Any other failure is returned untouched.

// self
use crate::{
	_prelude::*,
	error::UpstreamError,
	exchange::TransportErrorMapper,
	http::TokenHttpClient,
	manager::TokenManager,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const UNAUTHORIZED: u16 = 401;

/// Errors that may carry the HTTP status of a failed request.
pub trait HttpStatus {
	/// Status code of the response that caused the failure, if one was received.
	fn http_status(&self) -> Option<u16>;
}
impl HttpStatus for Error {
	fn http_status(&self) -> Option<u16> {
		match self {
			Self::Upstream(e) => e.http_status(),
			// Token endpoint rejections must never replay the wrapped request.
			Self::Authentication(_) | Self::Config(_) => None,
		}
	}
}
impl HttpStatus for UpstreamError {
	fn http_status(&self) -> Option<u16> {
		self.status
	}
}
#[cfg(feature = "reqwest")]
impl HttpStatus for ReqwestError {
	fn http_status(&self) -> Option<u16> {
		self.status().map(|status| status.as_u16())
	}
}

/// Stage of a [`TokenManager::handle_request`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
	/// First invocation of the request closure.
	Attempting,
	/// Replay after a 401 and a cache invalidation.
	Retrying,
}
impl RetryState {
	/// Decides the next stage after a failed invocation, or `None` when the failure is final.
	pub fn after_failure(self, status: Option<u16>) -> Option<Self> {
		match (self, status) {
			(Self::Attempting, Some(UNAUTHORIZED)) => Some(Self::Retrying),
			_ => None,
		}
	}
}

impl<C, M> TokenManager<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Runs `request_fn`, replaying it once with a fresh token if it fails with HTTP 401.
	///
	/// The closure should build its request through
	/// [`TokenManager::create_authenticated_request`] so the replay picks up the newly acquired
	/// token. The closure is invoked at most twice and its error is returned unchanged.
	pub async fn handle_request<F, Fut, T, E>(&self, mut request_fn: F) -> Result<T, E>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: HttpStatus,
	{
		const KIND: FlowKind = FlowKind::HandleRequest;

		let span = FlowSpan::new(KIND, "handle_request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		span.instrument(async move {
			let mut state = RetryState::Attempting;

			loop {
				match request_fn().await {
					Ok(value) => {
						obs::record_flow_outcome(KIND, FlowOutcome::Success);

						return Ok(value);
					},
					Err(e) => match state.after_failure(e.http_status()) {
						Some(next) => {
							self.invalidate();
							self.metrics.record_retry();
							obs::record_flow_outcome(KIND, FlowOutcome::Retry);
							obs::unauthorized_retry();

							state = next;
						},
						None => {
							obs::record_flow_outcome(KIND, FlowOutcome::Failure);

							return Err(e);
						},
					},
				}
			}
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::manager::fixture::*;

	#[derive(Debug, PartialEq)]
	struct StatusFailure(Option<u16>);
	impl HttpStatus for StatusFailure {
		fn http_status(&self) -> Option<u16> {
			self.0
		}
	}

	#[test]
	fn only_a_first_401_leads_to_a_retry() {
		assert_eq!(RetryState::Attempting.after_failure(Some(401)), Some(RetryState::Retrying));
		assert_eq!(RetryState::Attempting.after_failure(Some(403)), None);
		assert_eq!(RetryState::Attempting.after_failure(None), None);
		assert_eq!(RetryState::Retrying.after_failure(Some(401)), None);
	}

	#[test]
	fn authentication_errors_report_no_status() {
		let err = Error::from(crate::error::AuthenticationError::Status {
			status: 401,
			body: None,
			retry_after: None,
		});

		assert_eq!(err.http_status(), None);
		assert_eq!(Error::from(UpstreamError::status(401, b"", None)).http_status(), Some(401));
	}

	#[tokio::test]
	async fn unauthorized_then_success_returns_second_result() {
		let endpoint = ScriptedTokenEndpoint::default().token("stale", 3600).token("fresh", 3600);
		let (manager, endpoint, _clock) = scripted_manager(endpoint, Duration::minutes(5));
		let manager = &manager;
		let calls = &AtomicUsize::new(0);
		let seen = &Mutex::new(Vec::new());
		let result = manager
			.handle_request(move || async move {
				let token = manager.get_token().await.expect("Token should resolve.");

				seen.lock().push(token.expose().to_owned());

				match calls.fetch_add(1, Ordering::SeqCst) {
					0 => Err(StatusFailure(Some(401))),
					_ => Ok("payload"),
				}
			})
			.await;

		assert_eq!(result, Ok("payload"));
		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert_eq!(*seen.lock(), ["stale", "fresh"]);
		assert_eq!(endpoint.calls(), 2);
		assert_eq!(manager.metrics.retries(), 1);
		assert_eq!(manager.get_token().await.expect("Cache hit.").expose(), "fresh");
	}

	#[tokio::test]
	async fn repeated_unauthorized_is_not_retried_twice() {
		struct Rejected {
			attempt: usize,
		}
		impl HttpStatus for Rejected {
			fn http_status(&self) -> Option<u16> {
				Some(401)
			}
		}

		let (manager, _endpoint, _clock) =
			scripted_manager(ScriptedTokenEndpoint::default(), Duration::minutes(5));
		let calls = &AtomicUsize::new(0);
		let result: Result<(), _> = manager
			.handle_request(move || async move {
				Err(Rejected { attempt: calls.fetch_add(1, Ordering::SeqCst) })
			})
			.await;

		assert_eq!(result.map_err(|rejected| rejected.attempt), Err(1));
		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert_eq!(manager.metrics.retries(), 1);
	}

	#[tokio::test]
	async fn other_failures_short_circuit_without_touching_cache() {
		let endpoint = ScriptedTokenEndpoint::default().token("kept", 3600);
		let (manager, endpoint, _clock) = scripted_manager(endpoint, Duration::minutes(5));

		manager.get_token().await.expect("Initial acquisition should succeed.");

		for status in [Some(500), Some(403), None] {
			let calls = &AtomicUsize::new(0);
			let result: Result<(), _> = manager
				.handle_request(move || async move {
					calls.fetch_add(1, Ordering::SeqCst);

					Err(StatusFailure(status))
				})
				.await;

			assert_eq!(result, Err(StatusFailure(status)));
			assert_eq!(calls.load(Ordering::SeqCst), 1);
		}

		assert!(manager.has_valid_token());
		assert_eq!(manager.get_token().await.expect("Cache hit.").expose(), "kept");
		assert_eq!(endpoint.calls(), 1);
		assert_eq!(manager.metrics.retries(), 0);
		assert_eq!(manager.metrics.invalidations(), 0);
	}

	#[tokio::test]
	async fn retry_invalidates_even_a_valid_credential() {
		let endpoint =
			ScriptedTokenEndpoint::default().token("revoked", 3600).token("renewed", 3600);
		let (manager, endpoint, _clock) = scripted_manager(endpoint, Duration::minutes(5));

		manager.get_token().await.expect("Initial acquisition should succeed.");

		let manager = &manager;
		let calls = &AtomicUsize::new(0);
		let result = manager
			.handle_request(move || async move {
				if calls.fetch_add(1, Ordering::SeqCst) == 0 {
					return Err(StatusFailure(Some(401)));
				}

				assert!(!manager.has_valid_token());

				Ok(())
			})
			.await;

		assert_eq!(result, Ok(()));
		assert_eq!(manager.metrics.invalidations(), 1);
		assert_eq!(manager.get_token().await.expect("Re-acquired.").expose(), "renewed");
		assert_eq!(endpoint.calls(), 2);
	}
}
