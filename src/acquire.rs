//! Grant execution against the token endpoint (form encoding, response mapping).
//!
//! The module consolidates the client-credentials and on-behalf-of paths into one
//! execute step: build the grant form, POST it exactly once through the transport seam,
//! then map the success payload or classify the provider's rejection. No retries happen
//! here; retry policy belongs to the HTTP-layer collaborator.

// self
use crate::{
	_prelude::*,
	auth::{AcquiredToken, ScopeSet, UserAssertion},
	client::ConfidentialClient,
	error::{ConfigError, ProviderError, TransportError},
	http::{TokenHttpClient, WireResponse},
	provider::{GrantType, ProviderErrorContext, ProviderStrategy},
};

/// Executes OAuth grants for confidential-client handles over the transport seam.
#[derive(Clone)]
pub struct TokenAcquirer {
	http_client: Arc<dyn TokenHttpClient>,
	strategy: Arc<dyn ProviderStrategy>,
}
impl TokenAcquirer {
	/// Creates an acquirer from a transport and a provider strategy.
	pub fn new(http_client: Arc<dyn TokenHttpClient>, strategy: Arc<dyn ProviderStrategy>) -> Self {
		Self { http_client, strategy }
	}

	/// Executes the client-credentials grant; the token represents the application's
	/// own identity, with no user context.
	pub async fn client_credentials(
		&self,
		client: &ConfidentialClient,
		scope: &ScopeSet,
	) -> Result<AcquiredToken> {
		self.execute(client, GrantType::ClientCredentials, scope, None).await
	}

	/// Executes the on-behalf-of grant, exchanging the inbound assertion for a token
	/// scoped to `scope` while asserting the original user's identity downstream.
	///
	/// The assertion is only ever written into the grant form; it never reaches logs,
	/// error messages, or the returned token.
	pub async fn on_behalf_of(
		&self,
		client: &ConfidentialClient,
		scope: &ScopeSet,
		assertion: &UserAssertion,
	) -> Result<AcquiredToken> {
		self.execute(client, GrantType::OnBehalfOf, scope, Some(assertion)).await
	}

	async fn execute(
		&self,
		client: &ConfidentialClient,
		grant: GrantType,
		scope: &ScopeSet,
		assertion: Option<&UserAssertion>,
	) -> Result<AcquiredToken> {
		let mut form = grant_form(client, grant, scope, assertion);

		self.strategy.augment_token_request(grant, &mut form);

		let response = match self.http_client.post_form(client.token_endpoint(), &form).await {
			Ok(response) => response,
			Err(TransportError::TimedOut) => return Err(ProviderError::timed_out(grant).into()),
			Err(err) => return Err(err.into()),
		};

		if response.is_success() {
			map_success(scope, &response)
		} else {
			Err(map_provider_rejection(self.strategy.as_ref(), grant, &response).into())
		}
	}
}
impl Debug for TokenAcquirer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenAcquirer(..)")
	}
}

/// Success payload returned by the token endpoint.
#[derive(Deserialize)]
struct TokenEndpointSuccess {
	access_token: String,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	expires_in: Option<u64>,
}

/// Error payload returned by the token endpoint.
#[derive(Deserialize)]
struct TokenEndpointRejection {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

fn grant_form(
	client: &ConfidentialClient,
	grant: GrantType,
	scope: &ScopeSet,
	assertion: Option<&UserAssertion>,
) -> Vec<(&'static str, String)> {
	let mut form = vec![
		("grant_type", grant.wire_value().to_owned()),
		("client_id", client.client_id().to_string()),
		("client_secret", client.client_secret().expose().to_owned()),
	];

	if let Some(assertion) = assertion {
		form.push(("assertion", assertion.expose().to_owned()));
		form.push(("requested_token_use", "on_behalf_of".to_owned()));
	}
	if !scope.is_empty() {
		form.push(("scope", scope.normalized()));
	}

	form
}

fn map_success(scope: &ScopeSet, response: &WireResponse) -> Result<AcquiredToken> {
	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
	let payload: TokenEndpointSuccess = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransportError::ResponseParse {
			source,
			status: Some(response.status),
		})?;
	let expires_in = payload.expires_in.ok_or(ConfigError::MissingExpiresIn)?;
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	let token_type = payload.token_type.unwrap_or_else(|| "Bearer".into());
	let issued_at = OffsetDateTime::now_utc();

	Ok(AcquiredToken::new(
		scope.clone(),
		payload.access_token,
		token_type,
		issued_at,
		Duration::seconds(expires_in),
	))
}

fn map_provider_rejection(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: &WireResponse,
) -> ProviderError {
	let mut ctx = ProviderErrorContext::new(grant).with_http_status(response.status);
	let parsed: Option<TokenEndpointRejection> = serde_json::from_slice(&response.body).ok();
	let (code, description) = match parsed {
		Some(rejection) => {
			if let Some(error) = &rejection.error {
				ctx = ctx.with_oauth_error(error.clone());
			}
			if let Some(description) = &rejection.error_description {
				ctx = ctx.with_error_description(description.clone());
			}

			(rejection.error, rejection.error_description)
		},
		None => {
			let preview = String::from_utf8_lossy(&response.body);
			let preview = preview.trim();

			if !preview.is_empty() {
				ctx = ctx.with_body_preview(preview);
			}

			(None, None)
		},
	};
	let kind = strategy.classify_token_error(&ctx);
	let description = description.or(ctx.body_preview);

	ProviderError {
		kind,
		grant,
		code,
		description,
		status: Some(response.status),
		retry_after: response.retry_after,
	}
}
