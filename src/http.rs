//! Transport primitives for token endpoint calls.
//!
//! [`TokenHttpClient`] is the engine's only dependency on an HTTP stack: one form POST
//! per grant, returning the raw status, body, and a Retry-After hint. The default
//! reqwest implementation applies the bounded request timeout and never follows
//! redirects, matching OAuth 2.0 guidance that token endpoints answer directly instead
//! of delegating to another URI.

// std
#[cfg(feature = "reqwest")] use std::time::Duration as StdDuration;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	header::{HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::{_prelude::*, error::TransportError};

/// Raw token endpoint response captured by a transport.
#[derive(Clone, Debug)]
pub struct WireResponse {
	/// HTTP status code returned by the token endpoint.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Raw response body bytes.
	pub body: Vec<u8>,
}
impl WireResponse {
	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Future returned by [`TokenHttpClient::post_form`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<WireResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of posting token endpoint forms.
///
/// Implementations must be `Send + Sync + 'static` so one transport can serve
/// concurrent requests behind an `Arc`. Timeouts are the transport's concern and must
/// surface as [`TransportError::TimedOut`] so the engine reports them as provider
/// failures instead of silently dropping the outcome.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Posts an `application/x-www-form-urlencoded` body to the token endpoint.
	fn post_form<'a>(
		&'a self,
		endpoint: &'a Url,
		form: &'a [(&'static str, String)],
	) -> TransportFuture<'a>;
}

#[cfg(feature = "reqwest")]
/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone)]
pub struct ReqwestHttpClient(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with the bounded per-request timeout and redirects disabled.
	pub fn new(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// The wrapper applies no policy of its own, so configure the client with a request
	/// timeout and redirects disabled before passing it in.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	fn post_form<'a>(
		&'a self,
		endpoint: &'a Url,
		form: &'a [(&'static str, String)],
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.post(endpoint.clone())
				.form(form)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(WireResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
