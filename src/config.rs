//! Validated token manager configuration and its builder.
//!
//! A [`TokenManagerConfig`] fixes the token endpoint and client credentials for the lifetime of
//! a manager. Values come from [`TokenManagerConfig::builder`] or from any serde source shaped
//! like [`TokenManagerSettings`]; both paths run the same validation.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::{ClientId, ClientSecret};
use url::Host;
// self
use crate::_prelude::*;

/// Errors raised while constructing or validating a [`TokenManagerConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigValidationError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Client identifier is mandatory.
	#[error("Missing client identifier.")]
	MissingClientId,
	/// Client secret is mandatory.
	#[error("Missing client secret.")]
	MissingClientSecret,
	/// Client identifier was blank.
	#[error("Client identifier must not be empty.")]
	EmptyClientId,
	/// Client secret was blank.
	#[error("Client secret must not be empty.")]
	EmptyClientSecret,
	/// Token endpoint must use HTTPS unless it targets a loopback host.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Safety buffer cannot be negative.
	#[error("The safety buffer must not be negative.")]
	NegativeSafetyBuffer,
}

/// Immutable configuration consumed by [`TokenManager`](crate::manager::TokenManager).
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "TokenManagerSettings")]
pub struct TokenManagerConfig {
	/// Endpoint that exchanges client credentials for an access token.
	pub token_endpoint: Url,
	/// Client-credentials grant identifier.
	pub client_id: ClientId,
	/// Client-credentials grant secret.
	pub client_secret: ClientSecret,
	/// Margin subtracted from the declared expiry before a token counts as stale.
	pub safety_buffer: Duration,
}
impl TokenManagerConfig {
	/// Safety buffer applied when none is configured.
	pub const DEFAULT_SAFETY_BUFFER: Duration = Duration::minutes(5);

	/// Creates an empty builder.
	pub fn builder() -> TokenManagerConfigBuilder {
		TokenManagerConfigBuilder::default()
	}

	/// Value of the `Authorization` header for HTTP Basic client authentication.
	pub fn basic_authorization(&self) -> String {
		let pair = format!("{}:{}", self.client_id.as_str(), self.client_secret.secret());

		format!("Basic {}", STANDARD.encode(pair))
	}

	fn validate(&self) -> Result<(), ConfigValidationError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigValidationError::EmptyClientId);
		}
		if self.client_secret.secret().trim().is_empty() {
			return Err(ConfigValidationError::EmptyClientSecret);
		}
		if self.safety_buffer.is_negative() {
			return Err(ConfigValidationError::NegativeSafetyBuffer);
		}

		validate_endpoint(&self.token_endpoint)
	}
}

/// Builder for [`TokenManagerConfig`] values.
#[derive(Debug, Default)]
pub struct TokenManagerConfigBuilder {
	token_endpoint: Option<Url>,
	client_id: Option<String>,
	client_secret: Option<String>,
	safety_buffer: Option<Duration>,
}
impl TokenManagerConfigBuilder {
	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(client_secret.into());

		self
	}

	/// Overrides the safety buffer (defaults to five minutes).
	pub fn safety_buffer(mut self, buffer: Duration) -> Self {
		self.safety_buffer = Some(buffer);

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<TokenManagerConfig, ConfigValidationError> {
		let token_endpoint =
			self.token_endpoint.ok_or(ConfigValidationError::MissingTokenEndpoint)?;
		let client_id = self.client_id.ok_or(ConfigValidationError::MissingClientId)?;
		let client_secret = self.client_secret.ok_or(ConfigValidationError::MissingClientSecret)?;
		let config = TokenManagerConfig {
			token_endpoint,
			client_id: ClientId::new(client_id),
			client_secret: ClientSecret::new(client_secret),
			safety_buffer: self.safety_buffer.unwrap_or(TokenManagerConfig::DEFAULT_SAFETY_BUFFER),
		};

		config.validate()?;

		Ok(config)
	}
}

/// Serialized form of a [`TokenManagerConfig`].
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenManagerSettings {
	/// Token endpoint URL.
	pub token_endpoint: Url,
	/// Client identifier.
	pub client_id: String,
	/// Client secret.
	pub client_secret: String,
	/// Safety buffer in whole seconds.
	#[serde(default)]
	pub safety_buffer_secs: Option<i64>,
}
impl TryFrom<TokenManagerSettings> for TokenManagerConfig {
	type Error = ConfigValidationError;

	fn try_from(settings: TokenManagerSettings) -> Result<Self, Self::Error> {
		let mut builder = TokenManagerConfig::builder()
			.token_endpoint(settings.token_endpoint)
			.client_id(settings.client_id)
			.client_secret(settings.client_secret);

		if let Some(secs) = settings.safety_buffer_secs {
			builder = builder.safety_buffer(Duration::seconds(secs));
		}

		builder.build()
	}
}

fn validate_endpoint(url: &Url) -> Result<(), ConfigValidationError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ConfigValidationError::InsecureEndpoint { url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
