//! Redacted wrappers for the secret material the engine handles.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping token material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Inbound user assertion exchanged (never forwarded) during the on-behalf-of grant.
///
/// The raw value is exposed only to build the grant form; it must never appear in logs,
/// error messages, or response payloads. [`fingerprint`](Self::fingerprint) yields a
/// stable digest safe to attach to spans for correlation.
#[derive(Clone)]
pub struct UserAssertion(String);
impl UserAssertion {
	/// Wraps the inbound assertion token.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw assertion for the `assertion` form parameter only.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Base64 (no padding) SHA-256 digest of the assertion.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.0.as_bytes());

		let digest = hasher.finalize();

		STANDARD_NO_PAD.encode(digest)
	}
}
impl Debug for UserAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("UserAssertion").field(&"<redacted>").finish()
	}
}
impl Display for UserAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn assertion_formatters_redact() {
		let assertion = UserAssertion::new("header.payload.signature");

		assert_eq!(format!("{assertion:?}"), "UserAssertion(\"<redacted>\")");
		assert_eq!(format!("{assertion}"), "<redacted>");
	}

	#[test]
	fn assertion_fingerprint_is_stable_and_opaque() {
		let lhs = UserAssertion::new("header.payload.signature");
		let rhs = UserAssertion::new("header.payload.signature");
		let other = UserAssertion::new("different.payload.signature");

		assert_eq!(lhs.fingerprint(), rhs.fingerprint());
		assert_ne!(lhs.fingerprint(), other.fingerprint());
		assert!(!lhs.fingerprint().contains("payload"));
	}
}
