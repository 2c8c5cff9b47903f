mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use axum::{
	body::Body,
	http::{Request, StatusCode, header},
};
use httpmock::prelude::*;
use tower::ServiceExt;
// self
use oauth2_gateway::{
	Error,
	error::{ProviderCallError, TransientError},
	flows::{ReqwestGateway, StateGuard},
	http::ReqwestHttpClient,
	provider::ProviderKind,
	server::{AppState, router},
};

fn impatient_gateway(server: &MockServer) -> ReqwestGateway {
	ReqwestGateway::new(
		common::registry(server),
		StateGuard::fixed(common::STATE),
		ReqwestHttpClient::with_timeout(StdDuration::from_secs(1))
			.expect("Test HTTP client should build."),
	)
}

async fn slow_token_endpoint(server: &MockServer) {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/google/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_secs(3))
				.body(common::token_body("ya29.late", Some("1//late")));
		})
		.await;
}

#[tokio::test]
async fn slow_token_endpoints_time_out_as_transient_failures() {
	let server = MockServer::start_async().await;

	slow_token_endpoint(&server).await;

	let err = impatient_gateway(&server)
		.exchange_code(ProviderKind::Google, "4/auth-code")
		.await
		.expect_err("Exchange should give up after the client timeout.");

	assert!(matches!(
		err,
		Error::Exchange {
			provider: ProviderKind::Google,
			source: ProviderCallError::Transient(TransientError::Endpoint { endpoint: "token", .. })
		}
	));
}

#[tokio::test]
async fn refresh_route_answers_empty_string_on_timeout() {
	let server = MockServer::start_async().await;

	slow_token_endpoint(&server).await;

	let app = router(AppState::new(impatient_gateway(&server)));
	let request = Request::post("/get-new-token")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from("{\"refreshToken\":\"1//slow\"}"))
		.expect("Request fixture should build.");
	let response = app.oneshot(request).await.expect("Router should not fail.");
	let status = response.status();
	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		serde_json::from_slice::<serde_json::Value>(&body).expect("Response body should be JSON."),
		serde_json::json!("")
	);
}
