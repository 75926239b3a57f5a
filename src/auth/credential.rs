//! The cached bearer credential and its validity window.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifecycle status of a [`Credential`] relative to an instant and a safety buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// Token may be attached to outgoing requests.
	Valid,
	/// Token has not expired yet but sits inside the safety buffer; it must be renewed.
	Stale,
	/// Token exceeded its declared expiry instant.
	Expired,
}

/// Bearer token plus the absolute instant after which it must not be reused.
///
/// A credential is replaced as a whole; token and expiry never change independently.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	/// Access token secret; callers must avoid logging it.
	pub token: TokenSecret,
	/// Instant the credential was acquired from the token endpoint.
	pub acquired_at: OffsetDateTime,
	/// Server-declared expiry (`acquired_at + expires_in`).
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Creates a credential with an absolute expiry.
	pub fn new(token: TokenSecret, acquired_at: OffsetDateTime, expires_at: OffsetDateTime) -> Self {
		Self { token, acquired_at, expires_at }
	}

	/// Creates a credential expiring `expires_in` after `acquired_at`.
	///
	/// Returns `None` when the expiry would overflow the supported date range.
	pub fn expiring_in(
		token: TokenSecret,
		acquired_at: OffsetDateTime,
		expires_in: Duration,
	) -> Option<Self> {
		let expires_at = acquired_at.checked_add(expires_in)?;

		Some(Self::new(token, acquired_at, expires_at))
	}

	/// Computes the status at `instant`, treating the final `safety_buffer` of the lifetime as
	/// stale.
	pub fn status_at(&self, instant: OffsetDateTime, safety_buffer: Duration) -> CredentialStatus {
		if instant >= self.expires_at {
			return CredentialStatus::Expired;
		}

		match self.expires_at.checked_sub(safety_buffer) {
			Some(deadline) if instant < deadline => CredentialStatus::Valid,
			_ => CredentialStatus::Stale,
		}
	}

	/// Returns `true` while `instant < expires_at - safety_buffer`.
	pub fn is_valid_at(&self, instant: OffsetDateTime, safety_buffer: Duration) -> bool {
		matches!(self.status_at(instant, safety_buffer), CredentialStatus::Valid)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token", &"<redacted>")
			.field("acquired_at", &self.acquired_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
