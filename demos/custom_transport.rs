//! Demonstrates plugging a non-reqwest transport and mapper into the token manager.
//!
//! 1. Implement [`TokenHttpClient`] for the transport and pick its error type.
//! 2. Provide a [`TransportErrorMapper`] that turns [`HttpClientError`] values carrying that error
//!    type into [`AuthenticationError`]s.
//! 3. Hand both to [`TokenManager::with_http_client`].

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use caspio_auth::{
	config::TokenManagerConfig,
	error::{AuthenticationError, TransportError},
	exchange::TransportErrorMapper,
	http::{TokenHttpClient, TokenHttpFuture},
	manager::TokenManager,
	oauth2::{HttpClientError, HttpRequest, HttpResponse, http::StatusCode},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = TokenManagerConfig::builder()
		.token_endpoint(Url::parse("https://acme.caspio.com/oauth/token")?)
		.client_id("demo-client")
		.client_secret("demo-secret")
		.build()?;
	let manager: TokenManager<MockHttpClient, MockTransportErrorMapper> =
		TokenManager::with_http_client(
			config.clone(),
			MockHttpClient::Success,
			MockTransportErrorMapper,
		);
	let token = manager.get_token().await?;

	println!("Access token issued by the mock transport: {}.", token.fingerprint());
	println!("Cached until: {:?}.", manager.expires_at());

	let failing: TokenManager<MockHttpClient, MockTransportErrorMapper> =
		TokenManager::with_http_client(
			config.clone(),
			MockHttpClient::Failure(MockTransportError::DnsFailure { host: "acme.caspio.com" }),
			MockTransportErrorMapper,
		);

	match failing.get_token().await {
		Ok(_) => println!("Mock transport unexpectedly succeeded."),
		Err(e) => println!(
			"Transport error mapped by the manager: {e} (reported as HTTP {}).",
			e.report().status
		),
	}

	let other: TokenManager<MockHttpClient, MockTransportErrorMapper> =
		TokenManager::with_http_client(
			config,
			MockHttpClient::Other("upstream connection closed"),
			MockTransportErrorMapper,
		);

	match other.get_token().await {
		Ok(_) => println!("Mock transport unexpectedly produced a token."),
		Err(e) => println!("An HttpClientError::Other variant made it through the mapper: {e}"),
	}

	Ok(())
}

#[derive(Clone, Debug)]
enum MockTransportError {
	DnsFailure { host: &'static str },
}
impl Display for MockTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::DnsFailure { host } => write!(f, "DNS lookup failed for {host}"),
		}
	}
}
impl StdError for MockTransportError {}

#[derive(Clone)]
enum MockHttpClient {
	Success,
	Failure(MockTransportError),
	Other(&'static str),
}
impl TokenHttpClient for MockHttpClient {
	type TransportError = MockTransportError;

	fn execute(&self, _request: HttpRequest) -> TokenHttpFuture<'_, Self::TransportError> {
		let behavior = self.clone();

		Box::pin(async move {
			match behavior {
				Self::Success => {
					let mut response = HttpResponse::new(
						b"{\"access_token\":\"mock-access\",\"expires_in\":900}".to_vec(),
					);

					*response.status_mut() = StatusCode::OK;

					Ok(response)
				},
				// oauth2 names the variant after reqwest, but it carries any transport error.
				Self::Failure(error) => Err(HttpClientError::Reqwest(Box::new(error))),
				Self::Other(message) => Err(HttpClientError::Other(message.to_owned())),
			}
		})
	}
}

struct MockTransportErrorMapper;
impl TransportErrorMapper<MockTransportError> for MockTransportErrorMapper {
	fn map_transport_error(&self, error: HttpClientError<MockTransportError>) -> AuthenticationError {
		match error {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			HttpClientError::Other(text) =>
				AuthenticationError::Other { message: format!("mock transport: {text}") },
			other => AuthenticationError::Other { message: format!("{other:?}") },
		}
	}
}
