//! Client-credentials token exchange: request assembly, response mapping, and transport error
//! classification.

// crates.io
use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{
		HeaderValue, Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	config::TokenManagerConfig,
	error::{AuthenticationError, TransportError},
	http,
};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::seconds(3600);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";
const BODY_PREVIEW_LIMIT: usize = 256;

/// Maps HTTP transport failures into [`AuthenticationError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an authentication error.
	fn map_transport_error(&self, error: HttpClientError<E>) -> AuthenticationError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: HttpClientError<ReqwestError>) -> AuthenticationError {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => AuthenticationError::Request(inner),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => AuthenticationError::Other { message },
			_ => AuthenticationError::Other { message: "unrecognized transport failure".into() },
		}
	}
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	#[serde(default)]
	expires_in: Option<i64>,
}

/// Builds the `grant_type=client_credentials` request for `config`.
pub fn build_token_request(
	config: &TokenManagerConfig,
) -> Result<HttpRequest, AuthenticationError> {
	let body = url::form_urlencoded::Serializer::new(String::new())
		.append_pair("grant_type", "client_credentials")
		.finish();
	let mut authorization = HeaderValue::from_str(&config.basic_authorization())
		.map_err(|e| AuthenticationError::Request(e.into()))?;

	authorization.set_sensitive(true);

	let request = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(config.token_endpoint.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_CONTENT_TYPE)
		.header(AUTHORIZATION, authorization)
		.body(body.into_bytes())?;

	Ok(request)
}

/// Turns a token endpoint response into a [`Credential`] acquired at `now`.
///
/// A missing, `null`, or zero `expires_in` falls back to [`DEFAULT_EXPIRES_IN`].
pub fn read_token_response(
	response: &HttpResponse,
	now: OffsetDateTime,
) -> Result<Credential, AuthenticationError> {
	let status = response.status();

	if !status.is_success() {
		return Err(AuthenticationError::Status {
			status: status.as_u16(),
			body: body_preview(response.body()),
			retry_after: http::parse_retry_after(response.headers(), now),
		});
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let parsed: TokenEndpointResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| AuthenticationError::Parse { source, status: status.as_u16() })?;
	let token = TokenSecret::new(parsed.access_token);

	if token.is_empty() {
		return Err(AuthenticationError::MissingAccessToken);
	}

	let expires_in = match parsed.expires_in {
		None | Some(0) => DEFAULT_EXPIRES_IN,
		Some(value) if value < 0 => return Err(AuthenticationError::NegativeExpiresIn { value }),
		Some(value) => Duration::seconds(value),
	};

	Credential::expiring_in(token, now, expires_in).ok_or(AuthenticationError::ExpiresInOutOfRange)
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> AuthenticationError {
	if err.is_builder() {
		return AuthenticationError::Other { message: err.to_string() };
	}
	if err.is_timeout() {
		return AuthenticationError::Timeout { source: Box::new(err) };
	}

	TransportError::from(err).into()
}

fn body_preview(body: &[u8]) -> Option<String> {
	if body.is_empty() {
		return None;
	}

	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= BODY_PREVIEW_LIMIT {
		return Some(text.into_owned());
	}

	let mut buf: String = text.chars().take(BODY_PREVIEW_LIMIT).collect();

	buf.push('…');

	Some(buf)
}
