//! Auth-domain models: the cached bearer credential and its redacting secret wrapper.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
