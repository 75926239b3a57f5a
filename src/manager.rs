//! The token manager: one cached bearer credential per instance, refreshed lazily.
//!
//! [`TokenManager`] owns the transport, the config, and the credential cache so callers never
//! reason about expiry. Construct one per upstream API at startup and hand clones to every
//! component that needs authenticated requests; clones share the cache, the refresh guard, and
//! the counters.

pub mod request;
pub mod retry;

mod acquire;
#[cfg(test)]
mod fixture;
mod metrics;

pub use metrics::TokenMetrics;
pub use request::*;
pub use retry::*;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	clock::{Clock, SystemClock},
	config::TokenManagerConfig,
	exchange::TransportErrorMapper,
	http::TokenHttpClient,
	obs,
};
#[cfg(feature = "reqwest")]
use crate::{exchange::ReqwestTransportErrorMapper, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Token manager specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenManager = TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Acquires, caches, and refreshes the bearer credential for one upstream API.
///
/// The cache holds at most one [`Credential`]; refreshes replace it wholesale and
/// invalidation clears it. Refreshes started by [`TokenManager::get_token`] are serialized by a
/// single guard so concurrent callers that find the token stale share one token endpoint call.
pub struct TokenManager<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for token endpoint requests.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Endpoint, client credentials, and safety buffer.
	pub config: TokenManagerConfig,
	/// Clock consulted for every validity check and acquisition timestamp.
	pub clock: Arc<dyn Clock>,
	/// Shared counters for acquisitions, cache hits, invalidations, and retries.
	pub metrics: Arc<TokenMetrics>,
	cache: Arc<RwLock<Option<Credential>>>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> TokenManager<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: TokenManagerConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config,
			clock: Arc::new(SystemClock),
			metrics: Default::default(),
			cache: Default::default(),
			refresh_guard: Arc::new(AsyncMutex::new(())),
		}
	}

	/// Replaces the clock used for expiry decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Drops the cached credential so the next [`TokenManager::get_token`] call re-acquires.
	pub fn invalidate(&self) {
		let previous = self.cache.write().take();

		if previous.is_some() {
			self.metrics.record_invalidation();
		}

		obs::token_invalidated(previous.is_some());
	}

	/// Expiry of the cached credential, if one is cached.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.cache.read().as_ref().map(|credential| credential.expires_at)
	}

	/// Returns `true` when a cached credential is valid right now.
	pub fn has_valid_token(&self) -> bool {
		self.valid_cached().is_some()
	}

	fn valid_cached(&self) -> Option<Credential> {
		let now = self.clock.now();

		self.cache
			.read()
			.as_ref()
			.filter(|credential| credential.is_valid_at(now, self.config.safety_buffer))
			.cloned()
	}

	fn store(&self, credential: Credential) {
		obs::token_acquired(&credential.token.fingerprint(), credential.expires_at);

		*self.cache.write() = Some(credential);
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a manager backed by a default reqwest transport.
	pub fn new(config: TokenManagerConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Clone for TokenManager<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
			clock: self.clock.clone(),
			metrics: self.metrics.clone(),
			cache: self.cache.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<C, M> Debug for TokenManager<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("token_endpoint", &self.config.token_endpoint.as_str())
			.field("client_id", &self.config.client_id.as_str())
			.field("safety_buffer", &self.config.safety_buffer)
			.field("expires_at", &self.expires_at())
			.finish()
	}
}
