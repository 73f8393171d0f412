//! Provider-facing grant vocabulary and error-classification strategy hooks.

pub mod strategy;

pub use strategy::*;

// self
use crate::_prelude::*;

/// OAuth 2.0 grant types executed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// Client Credentials grant for app-only tokens.
	ClientCredentials,
	/// On-Behalf-Of grant exchanging an inbound user assertion.
	OnBehalfOf,
}
impl GrantType {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::ClientCredentials => "client_credentials",
			GrantType::OnBehalfOf => "on_behalf_of",
		}
	}

	/// Returns the `grant_type` value sent on the wire.
	///
	/// The on-behalf-of exchange rides the JWT bearer assertion grant; there is no
	/// dedicated RFC 6749 identifier for it.
	pub const fn wire_value(self) -> &'static str {
		match self {
			GrantType::ClientCredentials => "client_credentials",
			GrantType::OnBehalfOf => "urn:ietf:params:oauth:grant-type:jwt-bearer",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
