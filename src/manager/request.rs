//! Bearer header injection for outbound requests.

// crates.io
use oauth2::http::{HeaderValue, Request, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	exchange::TransportErrorMapper,
	http::TokenHttpClient,
	manager::TokenManager,
};
#[cfg(feature = "reqwest")]
use crate::error::UpstreamError;

/// Request types that can produce a copy of themselves carrying a bearer token.
///
/// Implementations must leave `self` untouched and replace any `Authorization` header already
/// present on the copy.
pub trait BearerRequest
where
	Self: Sized,
{
	/// Returns a copy of `self` with `Authorization: Bearer <token>` set.
	fn with_bearer(&self, token: &TokenSecret) -> Result<Self>;
}
impl<B> BearerRequest for Request<B>
where
	B: Clone,
{
	fn with_bearer(&self, token: &TokenSecret) -> Result<Self> {
		let mut signed = Request::new(self.body().clone());

		*signed.method_mut() = self.method().clone();
		*signed.uri_mut() = self.uri().clone();
		*signed.version_mut() = self.version();
		*signed.headers_mut() = self.headers().clone();
		*signed.extensions_mut() = self.extensions().clone();

		signed.headers_mut().insert(AUTHORIZATION, bearer_header(token)?);

		Ok(signed)
	}
}
#[cfg(feature = "reqwest")]
impl BearerRequest for reqwest::Request {
	fn with_bearer(&self, token: &TokenSecret) -> Result<Self> {
		let mut signed = self.try_clone().ok_or(ConfigError::RequestNotCloneable)?;

		signed.headers_mut().insert(AUTHORIZATION, bearer_header(token)?);

		Ok(signed)
	}
}

impl<C, M> TokenManager<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a copy of `request` authorized with the current access token.
	///
	/// The token comes from [`TokenManager::get_token`], so this may trigger an acquisition.
	pub async fn create_authenticated_request<R>(&self, request: &R) -> Result<R>
	where
		R: BearerRequest,
	{
		let token = self.get_token().await?;

		request.with_bearer(&token)
	}

	/// Sends an authorized copy of `request` with `client`, retrying once on HTTP 401.
	///
	/// Non-success responses become [`Error::Upstream`] carrying the status, the normalized
	/// body, and the `x-caspio-request-id` header when present.
	#[cfg(feature = "reqwest")]
	pub async fn execute(
		&self,
		client: &ReqwestClient,
		request: &reqwest::Request,
	) -> Result<reqwest::Response> {
		self.handle_request(move || self.send_authorized(client, request)).await
	}

	#[cfg(feature = "reqwest")]
	async fn send_authorized(
		&self,
		client: &ReqwestClient,
		request: &reqwest::Request,
	) -> Result<reqwest::Response> {
		let signed = self.create_authenticated_request(request).await?;
		let response = client.execute(signed).await.map_err(UpstreamError::from)?;
		let status = response.status();

		if status.is_success() {
			return Ok(response);
		}

		let request_id = response
			.headers()
			.get(UpstreamError::REQUEST_ID_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(ToOwned::to_owned);
		let body = response.bytes().await.map_err(UpstreamError::from)?;

		Err(UpstreamError::status(status.as_u16(), &body, request_id).into())
	}
}

fn bearer_header(token: &TokenSecret) -> Result<HeaderValue> {
	let mut value =
		HeaderValue::from_str(&format!("Bearer {}", token.expose())).map_err(ConfigError::from)?;

	value.set_sensitive(true);

	Ok(value)
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{Method, Version};
	// self
	use super::*;

	fn token() -> TokenSecret {
		TokenSecret::new("abc")
	}

	#[test]
	fn http_request_copy_carries_bearer_and_leaves_input_alone() {
		let original = Request::builder()
			.method(Method::PUT)
			.uri("https://api.example.com/rest/v2/tables/Orders/records")
			.version(Version::HTTP_11)
			.header("x-trace", "t-1")
			.body(b"{\"Status\":\"open\"}".to_vec())
			.expect("Fixture request should build.");
		let signed = original.with_bearer(&token()).expect("Signing should succeed.");
		let authorization = signed.headers().get(AUTHORIZATION).expect("Header should be set.");

		assert_eq!(authorization.to_str().ok(), Some("Bearer abc"));
		assert!(authorization.is_sensitive());
		assert_eq!(signed.method(), Method::PUT);
		assert_eq!(signed.uri(), original.uri());
		assert_eq!(signed.version(), Version::HTTP_11);
		assert_eq!(signed.headers().get("x-trace"), original.headers().get("x-trace"));
		assert_eq!(signed.body(), original.body());
		assert!(original.headers().get(AUTHORIZATION).is_none());
	}

	#[test]
	fn http_request_copy_keeps_extensions() {
		#[derive(Clone, Debug, PartialEq)]
		struct TableContext(&'static str);

		let mut original = Request::new(());

		original.extensions_mut().insert(TableContext("Orders"));

		let signed = original.with_bearer(&token()).expect("Signing should succeed.");

		assert_eq!(signed.extensions().get::<TableContext>(), Some(&TableContext("Orders")));
		assert_eq!(original.extensions().get::<TableContext>(), Some(&TableContext("Orders")));
	}

	#[test]
	fn existing_authorization_header_is_replaced() {
		let original = Request::builder()
			.uri("https://api.example.com/")
			.header(AUTHORIZATION, "Bearer stale")
			.body(())
			.expect("Fixture request should build.");
		let signed = original.with_bearer(&token()).expect("Signing should succeed.");
		let values = signed.headers().get_all(AUTHORIZATION).iter().collect::<Vec<_>>();

		assert_eq!(values.len(), 1);
		assert_eq!(values[0].to_str().ok(), Some("Bearer abc"));
		assert_eq!(
			original.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer stale")
		);
	}

	#[test]
	fn token_with_control_characters_is_rejected() {
		let original = Request::new(());
		let err = original
			.with_bearer(&TokenSecret::new("bad\ntoken"))
			.expect_err("Newlines cannot appear in header values.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidHeaderValue(_))));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_request_copy_carries_bearer() {
		let original = reqwest::Request::new(
			Method::GET,
			Url::parse("https://api.example.com/rest/v2/tables").expect("Fixture URL should parse."),
		);
		let signed = original.with_bearer(&token()).expect("Signing should succeed.");

		assert_eq!(
			signed.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer abc")
		);
		assert!(original.headers().get(AUTHORIZATION).is_none());
		assert_eq!(signed.url(), original.url());
	}
}
