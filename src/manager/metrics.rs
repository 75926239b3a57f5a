// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how a token manager has been used.
#[derive(Debug, Default)]
pub struct TokenMetrics {
	acquisitions: AtomicU64,
	acquisition_failures: AtomicU64,
	cache_hits: AtomicU64,
	invalidations: AtomicU64,
	retries: AtomicU64,
}
impl TokenMetrics {
	/// Returns the number of token endpoint calls that produced a credential.
	pub fn acquisitions(&self) -> u64 {
		self.acquisitions.load(Ordering::Relaxed)
	}

	/// Returns the number of token endpoint calls that failed.
	pub fn acquisition_failures(&self) -> u64 {
		self.acquisition_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of token lookups served from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of times a cached credential was discarded.
	pub fn invalidations(&self) -> u64 {
		self.invalidations.load(Ordering::Relaxed)
	}

	/// Returns the number of wrapped requests replayed after a 401.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	pub(crate) fn record_acquisition(&self) {
		self.acquisitions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_acquisition_failure(&self) {
		self.acquisition_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_invalidation(&self) {
		self.invalidations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}
}
