//! Acquired-token model produced by the grant executor.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
};

/// Access token minted by the identity provider for a resolved scope.
#[derive(Clone)]
pub struct AcquiredToken {
	/// Normalized scopes the token was requested for.
	pub scope: ScopeSet,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token type reported by the provider (`Bearer` for the supported grants).
	pub token_type: String,
	/// Issued-at instant recorded when the response was mapped.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from issued_at plus the provider's expires_in.
	pub expires_at: OffsetDateTime,
}
impl AcquiredToken {
	/// Creates a token record from the provider response fields.
	pub fn new(
		scope: ScopeSet,
		access_token: impl Into<String>,
		token_type: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
	) -> Self {
		Self {
			scope,
			access_token: TokenSecret::new(access_token),
			token_type: token_type.into(),
			issued_at,
			expires_at: issued_at + expires_in,
		}
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for AcquiredToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AcquiredToken")
			.field("scope", &self.scope)
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
