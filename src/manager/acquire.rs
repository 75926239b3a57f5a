//! Token lookup and acquisition with a shared refresh guard.
//!
//! [`TokenManager::get_token`] serves the cached credential while it sits outside the safety
//! buffer. Otherwise it takes the refresh guard, re-checks the cache (another caller may have
//! refreshed while it waited), and only then calls the token endpoint.
//! [`TokenManager::refresh_token`] takes the same guard but always calls the endpoint.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	error::AuthenticationError,
	exchange::{self, TransportErrorMapper},
	http::TokenHttpClient,
	manager::TokenManager,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> TokenManager<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a valid access token, acquiring a new one when none is cached or the cached one
	/// is inside the safety buffer.
	///
	/// Acquisition failures surface as [`Error::Authentication`] and leave the cache untouched.
	pub async fn get_token(&self) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::GetToken;

		if let Some(credential) = self.valid_cached() {
			self.metrics.record_cache_hit();
			obs::record_flow_outcome(KIND, FlowOutcome::CacheHit);

			return Ok(credential.token);
		}

		let span = FlowSpan::new(KIND, "get_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;

				if let Some(credential) = self.valid_cached() {
					self.metrics.record_cache_hit();

					return Ok(credential.token);
				}

				self.acquire().await
			})
			.await;

		conclude(KIND, result)
	}

	/// Calls the token endpoint unconditionally and caches the returned credential.
	pub async fn refresh_token(&self) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::RefreshToken;

		let span = FlowSpan::new(KIND, "refresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;

				self.acquire().await
			})
			.await;

		conclude(KIND, result)
	}

	async fn acquire(&self) -> Result<TokenSecret> {
		match self.exchange().await {
			Ok(credential) => {
				let token = credential.token.clone();

				self.metrics.record_acquisition();
				self.store(credential);

				Ok(token)
			},
			Err(e) => {
				self.metrics.record_acquisition_failure();

				Err(e.into())
			},
		}
	}

	async fn exchange(&self) -> Result<Credential, AuthenticationError> {
		let request = exchange::build_token_request(&self.config)?;
		let response = self
			.http_client
			.execute(request)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(e))?;

		exchange::read_token_response(&response, self.clock.now())
	}
}

fn conclude<T>(kind: FlowKind, result: Result<T>) -> Result<T> {
	match &result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(e) => {
			obs::record_flow_outcome(kind, FlowOutcome::Failure);
			obs::flow_failed(kind, e);
		},
	}

	result
}
