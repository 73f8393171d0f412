//! The consolidated token-acquisition engine.
//!
//! One validated request type and one acquisition/aggregation path serve every endpoint
//! variant; the HTTP collaborator only chooses which operation to call. Validation and
//! resolution failures return before any handle is built or any network call is made.

// self
use crate::{
	_prelude::*,
	acquire::TokenAcquirer,
	auth::{ScopeSet, TenantId},
	client::{ClientCache, ConfidentialClient},
	config::EngineConfig,
	error::ConfigError,
	http::TokenHttpClient,
	obs::{self, ExchangeId, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderStrategy,
	request::ExchangeRequest,
	resolve::{ResolvedScope, ScopeResolver, default_scope_of},
	response::{self, AcquisitionOutcome, AggregationPolicy, AppTokenResponse, TokenResponse},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, provider::EntraProviderStrategy};

/// Coordinates validation, scope resolution, handle caching, grant execution, and
/// outcome aggregation for both endpoint variants.
///
/// Engines are cheap to share behind an `Arc`; the only cross-request state is the
/// read-mostly confidential-client handle cache.
pub struct ExchangeEngine {
	config: EngineConfig,
	resolver: ScopeResolver,
	clients: ClientCache,
	acquirer: TokenAcquirer,
	policy: AggregationPolicy,
}
impl ExchangeEngine {
	/// Creates an engine over a caller-provided transport + strategy pair.
	///
	/// Tests substitute a stub transport here to exercise the engine without network
	/// access.
	pub fn with_http_client(
		config: EngineConfig,
		http_client: Arc<dyn TokenHttpClient>,
		strategy: Arc<dyn ProviderStrategy>,
	) -> Result<Self> {
		config.validate()?;

		let clients = ClientCache::new(config.authority.clone());
		let acquirer = TokenAcquirer::new(http_client, strategy);

		Ok(Self {
			config,
			resolver: ScopeResolver::default(),
			clients,
			acquirer,
			policy: AggregationPolicy::default(),
		})
	}

	/// Replaces the resolver table, e.g. to add deployment-specific resources.
	pub fn with_resolver(mut self, resolver: ScopeResolver) -> Self {
		self.resolver = resolver;

		self
	}

	/// Overrides the aggregation policy (defaults to fail-fast).
	pub fn with_policy(mut self, policy: AggregationPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Handle cache shared across requests.
	pub fn clients(&self) -> &ClientCache {
		&self.clients
	}

	/// Acquires an app-only token bound to the application's own identity.
	///
	/// Requires `app_tenant` and `app_resource` in the configuration; the scope is the
	/// resource's `.default` audience. Callers should render any failure as a
	/// server-side condition with a generic message—the application's own credentials
	/// failing is not a caller mistake.
	pub async fn app_token(&self) -> Result<AppTokenResponse> {
		const KIND: FlowKind = FlowKind::AppToken;

		let span = FlowSpan::new(KIND, "app_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run_app_token()).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Runs the on-behalf-of exchange: validate, resolve each requested resource,
	/// acquire one token per distinct resource, and aggregate the outcomes.
	pub async fn exchange(&self, request: ExchangeRequest) -> Result<TokenResponse> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "exchange");
		let exchange_id = ExchangeId::generate();

		span.record_exchange(&exchange_id);
		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run_exchange(&span, request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn run_app_token(&self) -> Result<AppTokenResponse> {
		let tenant = self
			.config
			.app_tenant
			.clone()
			.ok_or(ConfigError::AppFlowUnconfigured { missing: "an app tenant" })?;
		let resource = self
			.config
			.app_resource
			.clone()
			.ok_or(ConfigError::AppFlowUnconfigured { missing: "an app resource URL" })?;
		let scope = ScopeSet::single(default_scope_of(&resource)).map_err(ConfigError::from)?;
		let client = self.handle_for(&tenant)?;
		let token = match self.acquirer.client_credentials(&client, &scope).await {
			Ok(token) => token,
			// The app's own credentials failing is a configuration condition, not a
			// caller mistake; reclassify so the collaborator renders a generic 500.
			Err(Error::Provider(source)) =>
				return Err(ConfigError::AppCredentialRejected { source }.into()),
			Err(err) => return Err(err),
		};

		Ok(AppTokenResponse { token: token.access_token })
	}

	async fn run_exchange(
		&self,
		span: &FlowSpan,
		request: ExchangeRequest,
	) -> Result<TokenResponse> {
		let request = request.validate()?;

		span.record_assertion_digest(&request.assertion.fingerprint());

		let mut targets: Vec<ResolvedScope> = Vec::new();
		let mut outcomes: Vec<AcquisitionOutcome> = Vec::new();

		for requested in &request.resources {
			let resolved = self.resolver.resolve(requested, request.org_url.as_ref())?;

			if resolved.is_empty() {
				outcomes.push(AcquisitionOutcome::Skipped { requested: requested.clone() });

				continue;
			}

			for candidate in resolved {
				// One acquisition per distinct resource, even when names overlap.
				if targets.iter().any(|existing| existing.key == candidate.key) {
					continue;
				}

				targets.push(candidate);
			}
		}

		if targets.is_empty() {
			return response::aggregate(outcomes, self.policy).map_err(Error::from);
		}

		let client = self.handle_for(&request.tenant)?;

		for ResolvedScope { key, scope } in targets {
			match self.acquirer.on_behalf_of(&client, &scope, &request.assertion).await {
				Ok(token) => outcomes.push(AcquisitionOutcome::Acquired { key, token }),
				Err(Error::Provider(error)) => {
					outcomes.push(AcquisitionOutcome::Failed { key, error });

					// Once the exchange is doomed the remaining acquisitions are
					// pointless round trips.
					if self.policy == AggregationPolicy::FailFast {
						break;
					}
				},
				Err(err) => return Err(err),
			}
		}

		response::aggregate(outcomes, self.policy).map_err(Error::from)
	}

	fn handle_for(&self, tenant: &TenantId) -> Result<Arc<ConfidentialClient>> {
		Ok(self.clients.get_or_build(
			&self.config.client_id,
			&self.config.client_secret,
			tenant,
		)?)
	}
}
#[cfg(feature = "reqwest")]
impl ExchangeEngine {
	/// Creates an engine with the default reqwest transport and the Entra strategy.
	///
	/// The transport applies the configuration's bounded request timeout and never
	/// follows redirects.
	pub fn new(config: EngineConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::new(config.request_timeout)?;

		Self::with_http_client(config, Arc::new(http_client), Arc::new(EntraProviderStrategy))
	}
}
impl Debug for ExchangeEngine {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExchangeEngine")
			.field("config", &self.config)
			.field("policy", &self.policy)
			.field("clients", &self.clients)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		auth::ClientId,
		error::{Error, ResolutionError, TransportError, ValidationError},
		http::{TransportFuture, WireResponse},
		provider::EntraProviderStrategy,
	};

	/// Stub transport that counts invocations and replays a canned response.
	#[derive(Debug, Default)]
	struct CountingTransport {
		calls: AtomicUsize,
		response: Option<WireResponse>,
	}
	impl CountingTransport {
		fn calls(&self) -> usize {
			self.calls.load(Ordering::Relaxed)
		}
	}
	impl TokenHttpClient for CountingTransport {
		fn post_form<'a>(
			&'a self,
			_endpoint: &'a Url,
			_form: &'a [(&'static str, String)],
		) -> TransportFuture<'a> {
			self.calls.fetch_add(1, Ordering::Relaxed);

			Box::pin(async move {
				match &self.response {
					Some(response) => Ok(response.clone()),
					None => Err(TransportError::TimedOut),
				}
			})
		}
	}

	fn engine_with(transport: Arc<CountingTransport>) -> ExchangeEngine {
		let config = EngineConfig::builder(
			ClientId::new("client-app").expect("Client fixture should be valid."),
			"secret",
		)
		.build()
		.expect("Configuration fixture should validate.");

		ExchangeEngine::with_http_client(config, transport, Arc::new(EntraProviderStrategy))
			.expect("Engine fixture should build.")
	}

	fn request(body: &str) -> ExchangeRequest {
		serde_json::from_str(body).expect("Request fixture should deserialize.")
	}

	#[tokio::test]
	async fn validation_failures_never_reach_the_transport() {
		let transport = Arc::new(CountingTransport::default());
		let engine = engine_with(transport.clone());
		let err = engine
			.exchange(request(r#"{"resources":"graph"}"#))
			.await
			.expect_err("Missing fields must fail validation.");

		assert!(matches!(
			err,
			Error::Validation(ValidationError::MissingFields { .. }),
		));
		assert_eq!(transport.calls(), 0);
		assert!(engine.clients().is_empty());
	}

	#[tokio::test]
	async fn resolution_failures_never_reach_the_transport() {
		let transport = Arc::new(CountingTransport::default());
		let engine = engine_with(transport.clone());
		let err = engine
			.exchange(request(r#"{"tenantId":"t-1","token":"a.b.c","resources":"dataverse"}"#))
			.await
			.expect_err("Dataverse without an org URL must fail resolution.");

		assert!(matches!(
			err,
			Error::Resolution(ResolutionError::MissingOrganizationUrl { .. }),
		));
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn unknown_resources_short_circuit_to_an_empty_response() {
		let transport = Arc::new(CountingTransport::default());
		let engine = engine_with(transport.clone());
		let response = engine
			.exchange(request(r#"{"tenantId":"t-1","token":"a.b.c","resources":"sharepoint"}"#))
			.await
			.expect("Unknown resources are skipped, not failed.");

		assert!(response.is_empty());
		assert_eq!(transport.calls(), 0);
		assert!(engine.clients().is_empty());
	}

	#[tokio::test]
	async fn duplicate_keywords_acquire_once() {
		let transport = Arc::new(CountingTransport {
			calls: AtomicUsize::new(0),
			response: Some(WireResponse {
				status: 200,
				retry_after: None,
				body: br#"{"access_token":"issued","token_type":"Bearer","expires_in":3600}"#
					.to_vec(),
			}),
		});
		let engine = engine_with(transport.clone());
		let response = engine
			.exchange(request(
				r#"{"tenantId":"t-1","token":"a.b.c","resources":["graph","GRAPH api"]}"#,
			))
			.await
			.expect("Duplicate keywords should still exchange successfully.");

		assert_eq!(response.len(), 1);
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn app_flow_requires_configuration() {
		let transport = Arc::new(CountingTransport::default());
		let engine = engine_with(transport.clone());
		let err = engine
			.app_token()
			.await
			.expect_err("Unconfigured app flow must fail before any call.");

		assert!(matches!(err, Error::Config(ConfigError::AppFlowUnconfigured { .. })));
		assert_eq!(transport.calls(), 0);
	}
}
