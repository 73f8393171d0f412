// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use obo_exchange::{
	auth::{ClientId, TenantId},
	config::EngineConfig,
	engine::ExchangeEngine,
	error::{ConfigError, Error, ErrorClass},
	http::ReqwestHttpClient,
	provider::EntraProviderStrategy,
	reqwest,
	url::Url,
};

const CLIENT_ID: &str = "client-app";
const CLIENT_SECRET: &str = "client-secret";
const APP_TENANT: &str = "app-tenant";

fn insecure_http_client() -> ReqwestHttpClient {
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(reqwest::redirect::Policy::none())
		.timeout(Duration::from_secs(5))
		.build()
		.expect("Failed to build insecure reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

fn build_engine(server: &MockServer) -> ExchangeEngine {
	let config = EngineConfig::builder(
		ClientId::new(CLIENT_ID).expect("Client identifier should be valid."),
		CLIENT_SECRET,
	)
	.authority(Url::parse(&server.url("")).expect("Mock server URL should parse."))
	.app_tenant(TenantId::new(APP_TENANT).expect("App tenant should be valid."))
	.app_resource(
		Url::parse("https://org.contoso.example").expect("App resource URL should parse."),
	)
	.build()
	.expect("Engine configuration should validate.");

	ExchangeEngine::with_http_client(
		config,
		Arc::new(insecure_http_client()),
		Arc::new(EntraProviderStrategy),
	)
	.expect("Engine should build against the mock authority.")
}

#[tokio::test]
async fn app_token_runs_the_client_credentials_grant() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/{APP_TENANT}/oauth2/v2.0/token"))
				.body_includes("grant_type=client_credentials")
				.body_includes(format!("client_id={CLIENT_ID}"))
				.body_includes("org.contoso.example");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"app-only-token","token_type":"Bearer","expires_in":3600}"#,
			);
		})
		.await;
	let response = engine.app_token().await.expect("App-only acquisition should succeed.");
	let json = serde_json::to_value(&response).expect("Response should serialize.");

	assert_eq!(json, serde_json::json!({ "token": "app-only-token" }));

	mock.assert_async().await;
}

#[tokio::test]
async fn rejected_app_credentials_surface_as_internal() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/{APP_TENANT}/oauth2/v2.0/token"));
			then.status(401).header("content-type", "application/json").body(
				r#"{"error":"invalid_client","error_description":"AADSTS7000215: invalid client secret"}"#,
			);
		})
		.await;
	let err = engine
		.app_token()
		.await
		.expect_err("Rejected app credentials must fail the operation.");

	assert!(matches!(err, Error::Config(ConfigError::AppCredentialRejected { .. })));
	assert_eq!(err.class(), ErrorClass::Internal);
	assert_eq!(err.client_message(), "Error acquiring token.");

	mock.assert_async().await;
}

#[tokio::test]
async fn identical_app_requests_reuse_the_cached_handle() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/{APP_TENANT}/oauth2/v2.0/token"));
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"app-only-token","token_type":"Bearer","expires_in":3600}"#,
			);
		})
		.await;
	let first = engine.app_token().await.expect("First acquisition should succeed.");
	let second = engine.app_token().await.expect("Second acquisition should succeed.");

	assert_eq!(first.token.expose(), second.token.expose());
	assert_eq!(engine.clients().len(), 1);

	mock.assert_calls_async(2).await;
}
