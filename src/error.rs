//! Crate-level error types shared by the token manager, transports, and request helpers.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, config::ConfigValidationError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The token endpoint did not yield a usable credential.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A request to the upstream API failed.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
}
impl Error {
	/// Returns `true` when the failure came from acquiring a token.
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::Authentication(_))
	}

	/// Summarizes the error as a status code plus a serializable body.
	pub fn report(&self) -> ErrorReport {
		match self {
			Self::Authentication(err) => ErrorReport::new(
				err.report_status(),
				ErrorBody::new(self.to_string()).with_code("token_acquisition_failed"),
			),
			Self::Config(_) =>
				ErrorReport::new(500, ErrorBody::new(self.to_string()).with_code("config")),
			Self::Upstream(err) => err.report(),
		}
	}
}
impl From<ConfigValidationError> for Error {
	fn from(e: ConfigValidationError) -> Self {
		ConfigError::from(e).into()
	}
}

/// Token acquisition failure (token endpoint unreachable, rejected, or malformed).
///
/// Every variant leaves the cached credential untouched.
#[derive(Debug, ThisError)]
pub enum AuthenticationError {
	/// Network or I/O failure while calling the token endpoint.
	#[error("Token endpoint could not be reached.")]
	Transport(
		#[from]
		#[source]
		TransportError,
	),
	/// Token endpoint request timed out.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout {
		/// Underlying transport failure.
		#[source]
		source: BoxError,
	},
	/// Token request could not be assembled.
	#[error("Token request could not be built.")]
	Request(
		#[from]
		#[source]
		oauth2::http::Error,
	),
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint responded with HTTP {status}.")]
	Status {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Truncated response body, when one was returned.
		body: Option<String>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that does not match the expected shape.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Response carried an empty `access_token`.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Response carried a negative `expires_in`.
	#[error("The expires_in value {value} is negative.")]
	NegativeExpiresIn {
		/// Raw value from the response.
		value: i64,
	},
	/// Response carried an `expires_in` that overflows the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Transport reported a failure the crate cannot classify further.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl AuthenticationError {
	fn report_status(&self) -> u16 {
		match self {
			Self::Transport(_) | Self::Timeout { .. } => 503,
			_ => 502,
		}
	}
}

/// Configuration and request construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Config values failed validation.
	#[error(transparent)]
	Validation(#[from] ConfigValidationError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request body cannot be duplicated, so an authorized copy cannot be produced.
	#[error("Request body cannot be cloned for signing.")]
	RequestNotCloneable,
	/// Access token contains bytes that are not allowed in a header value.
	#[error("Access token cannot be used as an Authorization header value.")]
	InvalidHeaderValue(#[from] oauth2::http::header::InvalidHeaderValue),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Coarse classification of an [`UpstreamError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
	/// Upstream answered with a non-success status.
	Status,
	/// Connection could not be established.
	Connect,
	/// Request timed out.
	Timeout,
	/// Any other transport failure.
	Transport,
}
impl UpstreamErrorKind {
	/// Returns a stable label suitable for error bodies and log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			UpstreamErrorKind::Status => "status",
			UpstreamErrorKind::Connect => "connect",
			UpstreamErrorKind::Timeout => "timeout",
			UpstreamErrorKind::Transport => "transport",
		}
	}
}

/// Failure of a request sent to the upstream API (not the token endpoint).
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct UpstreamError {
	/// Classification of the failure.
	pub kind: UpstreamErrorKind,
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
	/// Human-readable summary.
	pub message: String,
	/// Structured detail extracted from the response body.
	pub details: Option<Value>,
	/// Upstream request identifier (`x-caspio-request-id`).
	pub request_id: Option<String>,
	/// Underlying transport failure, if any.
	#[source]
	pub source: Option<BoxError>,
}
impl UpstreamError {
	/// Response header carrying the upstream request identifier.
	pub const REQUEST_ID_HEADER: &'static str = "x-caspio-request-id";

	/// Builds an error for a non-success response.
	pub fn status(status: u16, body: &[u8], request_id: Option<String>) -> Self {
		Self {
			kind: UpstreamErrorKind::Status,
			status: Some(status),
			message: format!("Upstream request failed with HTTP {status}."),
			details: extract_details(body),
			request_id,
			source: None,
		}
	}

	/// Builds an error for a transport failure that produced no response.
	pub fn transport(
		kind: UpstreamErrorKind,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		let message = match kind {
			UpstreamErrorKind::Connect => "Upstream API could not be reached.",
			UpstreamErrorKind::Timeout => "Upstream request timed out.",
			_ => "Upstream request failed.",
		};

		Self {
			kind,
			status: None,
			message: message.into(),
			details: None,
			request_id: None,
			source: Some(Box::new(src)),
		}
	}

	/// Summarizes the failure as a status code plus a serializable body.
	///
	/// The upstream status is reused when known; connection failures map to 503, everything
	/// else to 500.
	pub fn report(&self) -> ErrorReport {
		let status = self.status.unwrap_or(match self.kind {
			UpstreamErrorKind::Connect => 503,
			_ => 500,
		});
		let mut body = ErrorBody::new(self.message.clone()).with_code(self.kind.as_str());

		body.details = self.details.clone();
		body.request_id = self.request_id.clone();

		ErrorReport::new(status, body)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for UpstreamError {
	fn from(e: ReqwestError) -> Self {
		let kind = if e.is_connect() {
			UpstreamErrorKind::Connect
		} else if e.is_timeout() {
			UpstreamErrorKind::Timeout
		} else {
			UpstreamErrorKind::Transport
		};
		let status = e.status().map(|code| code.as_u16());
		let mut err = Self::transport(kind, e);

		err.status = status;

		err
	}
}

/// Status code plus body describing an error to an API consumer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorReport {
	/// HTTP status the consumer should receive.
	pub status: u16,
	/// JSON body.
	pub body: ErrorBody,
}
impl ErrorReport {
	fn new(status: u16, body: ErrorBody) -> Self {
		Self { status, body }
	}
}

/// Serializable error body (`{ error, message, details, code, requestId }`).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
	/// Always `true`.
	pub error: bool,
	/// Human-readable summary.
	pub message: String,
	/// Structured detail, if any.
	pub details: Option<Value>,
	/// Stable machine-readable code.
	pub code: Option<String>,
	/// Upstream request identifier, if any.
	pub request_id: Option<String>,
}
impl ErrorBody {
	fn new(message: String) -> Self {
		Self { error: true, message, details: None, code: None, request_id: None }
	}

	fn with_code(mut self, code: &str) -> Self {
		self.code = Some(code.into());

		self
	}
}

/// Normalizes an upstream body into a JSON detail value.
///
/// JSON objects keep their fields, with the platform's `Code`/`Message` keys renamed to
/// `code`/`message`; other JSON values pass through; non-JSON bodies become strings.
fn extract_details(body: &[u8]) -> Option<Value> {
	if body.is_empty() {
		return None;
	}

	match serde_json::from_slice::<Value>(body) {
		Ok(Value::Object(fields)) => {
			let mut normalized = Map::with_capacity(fields.len());

			for (key, value) in fields {
				let key = match key.as_str() {
					"Code" => "code".to_owned(),
					"Message" => "message".to_owned(),
					_ => key,
				};

				normalized.insert(key, value);
			}

			Some(Value::Object(normalized))
		},
		Ok(value) => Some(value),
		Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
	}
}
