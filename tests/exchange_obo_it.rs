// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use obo_exchange::{
	auth::ClientId,
	config::EngineConfig,
	engine::ExchangeEngine,
	error::{Error, ErrorClass},
	http::ReqwestHttpClient,
	provider::EntraProviderStrategy,
	request::ExchangeRequest,
	reqwest,
	url::Url,
};

const CLIENT_ID: &str = "client-app";
const CLIENT_SECRET: &str = "client-secret";
const ASSERTION: &str = "inbound-user-assertion.jwt";

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
	.build()
	.expect("Engine configuration should validate.");

	ExchangeEngine::with_http_client(
		config,
		Arc::new(insecure_http_client()),
		Arc::new(EntraProviderStrategy),
	)
	.expect("Engine should build against the mock authority.")
}

fn token_path(tenant: &str) -> String {
	format!("/{tenant}/oauth2/v2.0/token")
}

fn request(body: &str) -> ExchangeRequest {
	serde_json::from_str(body).expect("Request body fixture should deserialize.")
}

fn token_body(token: &str) -> String {
	format!(r#"{{"access_token":"{token}","token_type":"Bearer","expires_in":3600}}"#)
}

#[tokio::test]
async fn exchange_returns_tokens_for_graph_and_dataverse() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(token_path("tenant-a"))
				.body_includes("requested_token_use=on_behalf_of")
				.body_includes(format!("assertion={ASSERTION}"))
				.body_includes("graph.microsoft.com");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("graph-token"));
		})
		.await;
	let dataverse_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(token_path("tenant-a"))
				.body_includes("contoso.crm.dynamics.com");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("dataverse-token"));
		})
		.await;
	let response = engine
		.exchange(request(&format!(
			r#"{{"tenantId":"tenant-a","token":"{ASSERTION}","resources":["graph","dataverse"],"orgUrl":"https://contoso.crm.dynamics.com"}}"#,
		)))
		.await
		.expect("Exchange naming graph and dataverse should succeed.");
	let json = serde_json::to_value(&response).expect("Response should serialize.");

	assert_eq!(
		json,
		serde_json::json!({
			"graphToken": "graph-token",
			"dataverseToken": "dataverse-token",
		}),
	);

	graph_mock.assert_async().await;
	dataverse_mock.assert_async().await;
}

#[tokio::test]
async fn missing_fields_fail_before_any_provider_call() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST);
			then.status(200).header("content-type", "application/json").body(token_body("x"));
		})
		.await;
	let err = engine
		.exchange(request(r#"{"resources":"graph"}"#))
		.await
		.expect_err("Missing tenant and token must fail validation.");

	assert_eq!(err.class(), ErrorClass::BadRequest);
	assert!(err.to_string().contains("tenantId"));
	assert!(err.to_string().contains("token"));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn dataverse_without_org_url_never_calls_the_provider() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST);
			then.status(200).header("content-type", "application/json").body(token_body("x"));
		})
		.await;
	let err = engine
		.exchange(request(&format!(
			r#"{{"tenantId":"tenant-a","token":"{ASSERTION}","resources":"dataverse"}}"#,
		)))
		.await
		.expect_err("Dataverse without an org URL must fail resolution.");

	assert!(matches!(err, Error::Resolution(_)));
	assert!(err.to_string().contains("dataverse"));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn one_provider_rejection_fails_the_whole_exchange() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(token_path("tenant-a")).body_includes("graph.microsoft.com");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("graph-token"));
		})
		.await;
	let dataverse_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(token_path("tenant-a"))
				.body_includes("contoso.crm.dynamics.com");
			then.status(400).header("content-type", "application/json").body(
				r#"{"error":"invalid_grant","error_description":"AADSTS50013: assertion audience mismatch"}"#,
			);
		})
		.await;
	let err = engine
		.exchange(request(&format!(
			r#"{{"tenantId":"tenant-a","token":"{ASSERTION}","resources":["graph","dataverse"],"orgUrl":"https://contoso.crm.dynamics.com"}}"#,
		)))
		.await
		.expect_err("A rejected resource must fail the whole exchange.");

	assert_eq!(err.class(), ErrorClass::BadRequest);
	assert!(err.to_string().contains("AADSTS50013"));
	// The successful resource's token and the inbound assertion must not leak into the
	// failure surface.
	assert!(!err.to_string().contains("graph-token"));
	assert!(!err.to_string().contains(ASSERTION));

	graph_mock.assert_async().await;
	dataverse_mock.assert_async().await;
}

#[tokio::test]
async fn unknown_keywords_are_skipped_silently() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(token_path("tenant-a")).body_includes("graph.microsoft.com");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("graph-token"));
		})
		.await;
	let response = engine
		.exchange(request(&format!(
			r#"{{"tenantId":"tenant-a","token":"{ASSERTION}","resources":["graph","contoso-billing"]}}"#,
		)))
		.await
		.expect("Unknown keywords must not fail the exchange.");
	let json = serde_json::to_value(&response).expect("Response should serialize.");

	assert_eq!(json, serde_json::json!({ "graphToken": "graph-token" }));

	graph_mock.assert_async().await;
}

#[tokio::test]
async fn concurrent_exchanges_stay_tenant_isolated() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let tenant_one_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(token_path("tenant-one"));
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("tenant-one-token"));
		})
		.await;
	let tenant_two_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(token_path("tenant-two"));
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("tenant-two-token"));
		})
		.await;
	let one = request(&format!(
		r#"{{"tenantId":"tenant-one","token":"{ASSERTION}","resources":"graph"}}"#,
	));
	let two = request(&format!(
		r#"{{"tenantId":"tenant-two","token":"{ASSERTION}","resources":"graph"}}"#,
	));
	let (one, two) = tokio::join!(engine.exchange(one), engine.exchange(two));
	let one = one.expect("Tenant-one exchange should succeed.");
	let two = two.expect("Tenant-two exchange should succeed.");

	assert_eq!(
		one.token("graph").map(|token| token.expose().to_owned()),
		Some("tenant-one-token".to_owned()),
	);
	assert_eq!(
		two.token("graph").map(|token| token.expose().to_owned()),
		Some("tenant-two-token".to_owned()),
	);
	assert_eq!(engine.clients().len(), 2);

	tenant_one_mock.assert_async().await;
	tenant_two_mock.assert_async().await;
}

#[tokio::test]
async fn identical_requests_succeed_independently() {
	let server = MockServer::start_async().await;
	let engine = build_engine(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(token_path("tenant-a"));
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("graph-token"));
		})
		.await;
	let body = format!(r#"{{"tenantId":"tenant-a","token":"{ASSERTION}","resources":"graph"}}"#);
	let first = engine
		.exchange(request(&body))
		.await
		.expect("First identical exchange should succeed.");
	let second = engine
		.exchange(request(&body))
		.await
		.expect("Second identical exchange should succeed.");

	assert_eq!(
		first.token("graph").map(|token| token.expose().to_owned()),
		second.token("graph").map(|token| token.expose().to_owned()),
	);

	mock.assert_calls_async(2).await;
}
