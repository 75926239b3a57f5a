//! Scripted token endpoint shared by the manager unit tests.

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicUsize, Ordering},
};
// crates.io
use oauth2::{HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
// self
use crate::{
	_prelude::*,
	clock::{Clock, ManualClock},
	config::TokenManagerConfig,
	error::{AuthenticationError, TransportError},
	exchange::TransportErrorMapper,
	http::{TokenHttpClient, TokenHttpFuture},
	manager::TokenManager,
};

pub(crate) type ScriptedManager = TokenManager<ScriptedTokenEndpoint, ScriptedMapper>;

#[derive(Debug)]
pub(crate) struct ScriptedFailure;
impl Display for ScriptedFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("scripted transport failure")
	}
}
impl StdError for ScriptedFailure {}

/// Replays canned token endpoint responses in order; an exhausted script fails the transport.
#[derive(Default)]
pub(crate) struct ScriptedTokenEndpoint {
	responses: Mutex<VecDeque<Option<(u16, String)>>>,
	calls: AtomicUsize,
}
impl ScriptedTokenEndpoint {
	pub(crate) fn respond(self, status: u16, body: &str) -> Self {
		self.responses.lock().push_back(Some((status, body.to_owned())));

		self
	}

	pub(crate) fn token(self, access_token: &str, expires_in: i64) -> Self {
		self.respond(
			200,
			&format!(r#"{{"access_token":"{access_token}","expires_in":{expires_in}}}"#),
		)
	}

	pub(crate) fn fail(self) -> Self {
		self.responses.lock().push_back(None);

		self
	}

	pub(crate) fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl TokenHttpClient for ScriptedTokenEndpoint {
	type TransportError = ScriptedFailure;

	fn execute(&self, _request: HttpRequest) -> TokenHttpFuture<'_, Self::TransportError> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let next = self.responses.lock().pop_front().flatten();

		Box::pin(async move {
			let (status, body) =
				next.ok_or_else(|| HttpClientError::Reqwest(Box::new(ScriptedFailure)))?;
			let mut response = HttpResponse::new(body.into_bytes());

			*response.status_mut() =
				StatusCode::from_u16(status).expect("Scripted status should be valid.");

			Ok(response)
		})
	}
}

pub(crate) struct ScriptedMapper;
impl TransportErrorMapper<ScriptedFailure> for ScriptedMapper {
	fn map_transport_error(&self, err: HttpClientError<ScriptedFailure>) -> AuthenticationError {
		match err {
			HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
			other => AuthenticationError::Other { message: other.to_string() },
		}
	}
}

pub(crate) fn scripted_manager(
	endpoint: ScriptedTokenEndpoint,
	safety_buffer: Duration,
) -> (ScriptedManager, Arc<ScriptedTokenEndpoint>, Arc<ManualClock>) {
	let endpoint = Arc::new(endpoint);
	let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
	let shared: Arc<dyn Clock> = clock.clone();
	let config = TokenManagerConfig::builder()
		.token_endpoint(Url::parse("https://example.com/token").expect("URL should parse."))
		.client_id("client")
		.client_secret("secret")
		.safety_buffer(safety_buffer)
		.build()
		.expect("Config should build.");
	let manager =
		TokenManager::with_http_client(config, endpoint.clone(), ScriptedMapper).with_clock(shared);

	(manager, endpoint, clock)
}
