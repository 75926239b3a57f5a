//! Transport primitives for token endpoint exchanges.
//!
//! [`TokenHttpClient`] is the token manager's only dependency on an HTTP stack. The crate ships
//! [`ReqwestHttpClient`]; custom stacks implement the trait and pair it with a
//! [`TransportErrorMapper`](crate::exchange::TransportErrorMapper) for their error type.

// std
use std::ops::Deref;
// crates.io
use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{HeaderMap, header::RETRY_AFTER},
};
#[cfg(feature = "reqwest")] use reqwest::{ClientBuilder, redirect::Policy};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`TokenHttpClient::execute`].
pub type TokenHttpFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError<E>>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing token endpoint requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back every clone of a
/// token manager, and the returned future must be `Send` so callers can spawn it. Any HTTP
/// status (success or not) is returned as a response; only failures that produced no response
/// belong in the error.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and resolves with the complete response.
	fn execute(&self, request: HttpRequest) -> TokenHttpFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token endpoints answer directly, so configure any custom [`ReqwestClient`] to disable
/// redirect following before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds the wrapped client from `builder` with redirect following turned off.
	///
	/// A builder that cannot produce a client (bad TLS material, an invalid default header)
	/// yields [`ConfigError::HttpClientBuild`].
	pub fn from_builder(builder: ClientBuilder) -> Result<Self, ConfigError> {
		Ok(Self(builder.redirect(Policy::none()).build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> TokenHttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Reads a `Retry-After` header expressed either in seconds or as an RFC 2822 date.
pub(crate) fn parse_retry_after(headers: &HeaderMap, now: OffsetDateTime) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - now;

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::HeaderValue;
	use time::macros;
	// self
	use super::*;

	fn headers(value: &'static str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static(value));

		headers
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn from_builder_reports_client_build_failures() {
		let err = ReqwestHttpClient::from_builder(ReqwestClient::builder().user_agent("bad\nagent"))
			.expect_err("A user agent with a newline cannot become a header value.");

		assert!(matches!(err, ConfigError::HttpClientBuild { .. }));
		assert_eq!(Error::from(err).report().status, 500);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn from_builder_wraps_a_valid_client() {
		ReqwestHttpClient::from_builder(ReqwestClient::builder().user_agent("caspio-auth/test"))
			.expect("A plain builder should produce a client.");
	}

	#[test]
	fn retry_after_accepts_seconds_and_dates() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);

		assert_eq!(parse_retry_after(&headers("120"), now), Some(Duration::seconds(120)));
		assert_eq!(
			parse_retry_after(&headers("Wed, 01 Jan 2025 00:00:30 +0000"), now),
			Some(Duration::seconds(30))
		);
		assert_eq!(parse_retry_after(&headers("Tue, 31 Dec 2024 23:00:00 +0000"), now), None);
		assert_eq!(parse_retry_after(&headers("soon"), now), None);
		assert_eq!(parse_retry_after(&HeaderMap::new(), now), None);
	}
}
