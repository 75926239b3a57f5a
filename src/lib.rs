//! Client-credentials token lifecycle for Caspio-style REST APIs: cached bearer tokens with
//! expiry buffers, de-duplicated refreshes, and one-shot recovery from `401 Unauthorized`.

#![cfg_attr(
	all(feature = "reqwest", not(feature = "test")),
	doc = "\n\nTest helpers are compiled only for the crate's own tests or under the `test` feature:\n\n```compile_fail\nlet _ = caspio_auth::_preludet::test_reqwest_http_client();\n```"
)]
#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod exchange;
pub mod http;
pub mod manager;
pub mod obs;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for unit and integration tests; enabled via `cfg(test)`
	//! or the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		clock::{Clock, ManualClock},
		config::TokenManagerConfig,
		http::ReqwestHttpClient,
		manager::ReqwestTokenManager,
	};

	/// Client identifier used by test fixtures.
	pub const TEST_CLIENT_ID: &str = "test-client";
	/// Client secret used by test fixtures.
	pub const TEST_CLIENT_SECRET: &str = "test-secret";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		ReqwestHttpClient::from_builder(
			ReqwestClient::builder()
				.danger_accept_invalid_certs(true)
				.danger_accept_invalid_hostnames(true),
		)
		.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Builds a config pointing at `token_endpoint` with the fixture credentials.
	pub fn test_config(token_endpoint: &str, safety_buffer: Duration) -> TokenManagerConfig {
		TokenManagerConfig::builder()
			.token_endpoint(Url::parse(token_endpoint).expect("Test token endpoint should parse."))
			.client_id(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.safety_buffer(safety_buffer)
			.build()
			.expect("Test config should pass validation.")
	}

	/// Constructs a reqwest-backed [`ReqwestTokenManager`] driven by a [`ManualClock`].
	pub fn build_reqwest_test_manager(
		token_endpoint: &str,
		safety_buffer: Duration,
	) -> (ReqwestTokenManager, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
		let shared: Arc<dyn Clock> = clock.clone();
		let manager = ReqwestTokenManager::with_http_client(
			test_config(token_endpoint, safety_buffer),
			test_reqwest_http_client(),
			crate::exchange::ReqwestTransportErrorMapper,
		)
		.with_clock(shared);

		(manager, clock)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
