//! Engine-level error types shared across validation, resolution, and acquisition.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ResourceKey, ScopeError},
	provider::{GrantType, ProviderErrorKind},
};

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Request failed validation; no provider call was made.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// A requested resource could not be resolved to a scope; no provider call was made.
	#[error(transparent)]
	Resolution(#[from] ResolutionError),
	/// The identity provider rejected the grant.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) or malformed provider payload.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Maps the error onto the response class the HTTP collaborator should render.
	pub fn class(&self) -> ErrorClass {
		match self {
			Error::Validation(_) | Error::Resolution(_) | Error::Provider(_) =>
				ErrorClass::BadRequest,
			Error::Config(_) | Error::Transport(_) => ErrorClass::Internal,
		}
	}

	/// Message safe to hand back to the caller.
	///
	/// Client-class failures carry their full text, including the provider's diagnostics
	/// for rejected grants. Server-class failures collapse to a generic message; the full
	/// detail belongs in server-side logs only.
	pub fn client_message(&self) -> String {
		match self.class() {
			ErrorClass::BadRequest => self.to_string(),
			ErrorClass::Internal => "Error acquiring token.".into(),
		}
	}
}

/// Coarse response class used when rendering errors over HTTP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
	/// Caller mistake; render as a 400-class response carrying the error text.
	BadRequest,
	/// Server-side condition; render as a 500-class response with a generic message.
	Internal,
}

/// Request validation failures raised before any network activity.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// One or more required request fields were absent or empty.
	#[error("Missing required field(s): {}.", .fields.join(", "))]
	MissingFields {
		/// Names of the missing fields, in request-schema spelling.
		fields: Vec<&'static str>,
	},
	/// The tenant identifier failed identifier validation.
	#[error("Field `tenantId` is invalid: {source}")]
	InvalidTenant {
		/// Underlying identifier failure.
		#[source]
		source: IdentifierError,
	},
	/// The organization URL could not be parsed.
	#[error("Field `orgUrl` is not a valid URL.")]
	InvalidOrgUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Scope resolution failures for resources that are recognized but unusable as requested.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ResolutionError {
	/// A resolvable resource needs the organization URL that the request omitted.
	#[error("Resource `{resource}` requires `orgUrl` in the request body.")]
	MissingOrganizationUrl {
		/// Resource key whose scope template needs the organization URL.
		resource: ResourceKey,
	},
	/// The rendered scope failed scope validation.
	#[error("Resolved scope for resource `{resource}` is invalid.")]
	InvalidScope {
		/// Resource key whose rendered scope was rejected.
		resource: ResourceKey,
		/// Underlying scope failure.
		#[source]
		source: ScopeError,
	},
}

/// Typed failure returned when the identity provider rejects a grant.
///
/// The provider's `error` code and `error_description` are deliberately surfaced to the
/// caller so consent and credential problems stay actionable; the inbound assertion is
/// never part of the message.
#[derive(Clone, Debug)]
pub struct ProviderError {
	/// Classified failure category.
	pub kind: ProviderErrorKind,
	/// Grant that was being executed.
	pub grant: GrantType,
	/// OAuth `error` code returned by the provider, when present.
	pub code: Option<String>,
	/// OAuth `error_description` returned by the provider, when present.
	pub description: Option<String>,
	/// HTTP status code returned by the token endpoint, when available.
	pub status: Option<u16>,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}
impl ProviderError {
	/// Provider error recorded when an acquisition exceeds its bounded timeout.
	pub fn timed_out(grant: GrantType) -> Self {
		Self {
			kind: ProviderErrorKind::Transient,
			grant,
			code: None,
			description: Some("request timed out while calling the token endpoint".into()),
			status: None,
			retry_after: None,
		}
	}
}
impl Display for ProviderError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Error acquiring token during the {} grant", self.grant)?;

		match (&self.code, &self.description) {
			(Some(code), Some(description)) => write!(f, ": {code}: {description}."),
			(Some(code), None) => write!(f, ": {code}."),
			(None, Some(description)) => write!(f, ": {description}."),
			(None, None) => match self.status {
				Some(status) => write!(f, " (HTTP {status})."),
				None => f.write_str("."),
			},
		}
	}
}
impl StdError for ProviderError {}

/// Configuration and validation failures raised by the engine.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Authority base URL could not be parsed or lacks a host.
	#[error("Authority base URL is invalid: {url}.")]
	InvalidAuthorityBase {
		/// Offending URL string.
		url: String,
	},
	/// Authority base URL must use HTTPS.
	#[error("Authority base URL must use HTTPS: {url}.")]
	InsecureAuthority {
		/// Offending URL string.
		url: String,
	},
	/// Tenant-qualified authority URL could not be derived.
	#[error("Authority URL could not be derived for tenant `{tenant}`.")]
	InvalidAuthority {
		/// Tenant identifier that broke authority derivation.
		tenant: String,
	},
	/// App-only flow configuration is incomplete.
	#[error("App-only flow requires {missing} in the engine configuration.")]
	AppFlowUnconfigured {
		/// Description of the missing configuration piece.
		missing: &'static str,
	},
	/// The application's own credentials were rejected by the provider.
	///
	/// Raised by the app-only flow, where a rejected grant points at the process
	/// configuration rather than at the caller; the provider detail stays on the source
	/// chain for server-side logs.
	#[error("Application credentials were rejected by the identity provider.")]
	AppCredentialRejected {
		/// Provider rejection that triggered the failure.
		#[source]
		source: ProviderError,
	},
	/// Request timeout must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] ScopeError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, malformed payloads).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the transport's bounded timeout.
	#[error("Request timed out while calling the token endpoint.")]
	TimedOut,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			return Self::TimedOut;
		}

		Self::network(e)
	}
}
