mod common;

// crates.io
use axum::{
	Router,
	body::{Body, Bytes},
	http::{Request, StatusCode, header},
};
use httpmock::prelude::*;
use tower::ServiceExt;
// self
use oauth2_gateway::server::{AppState, router};

fn app(server: &MockServer) -> Router {
	router(AppState::new(common::gateway(server)).with_identity_resolution(false))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
	Request::post(uri)
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_owned()))
		.expect("Request fixture should build.")
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
	Request::post(uri)
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from(body.to_owned()))
		.expect("Request fixture should build.")
}

fn get(uri: &str) -> Request<Body> {
	Request::get(uri).body(Body::empty()).expect("Request fixture should build.")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Bytes) {
	let response = app.oneshot(request).await.expect("Router should not fail.");
	let status = response.status();
	let headers = response.headers().clone();
	let body = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");

	(status, headers, body)
}

fn json(body: &Bytes) -> serde_json::Value {
	serde_json::from_slice(body).expect("Response body should be JSON.")
}

#[tokio::test]
async fn login_google_answers_the_authorization_url() {
	let server = MockServer::start_async().await;
	let (status, _, body) = send(app(&server), get("/login-google")).await;
	let url = json(&body);
	let url = url.as_str().expect("Login route should answer a JSON string.");

	assert_eq!(status, StatusCode::OK);
	assert!(url.starts_with(&server.url("/google/authorize?client_id=google-client")));
	assert!(url.ends_with("response_type=code&access_type=offline&state=state-fixture"));
}

#[tokio::test]
async fn implicit_and_other_provider_logins_are_routed() {
	let server = MockServer::start_async().await;
	let (_, _, implicit) = send(app(&server), get("/login-google-implicit")).await;
	let (_, _, facebook) = send(app(&server), get("/login-facebook")).await;
	let (_, _, github) = send(app(&server), get("/login-github")).await;

	assert!(json(&implicit).as_str().is_some_and(|url| url.contains("response_type=token")));
	assert!(json(&facebook).as_str().is_some_and(|url| url.contains("/facebook/authorize?")));
	assert!(json(&github).as_str().is_some_and(|url| url.contains("/github/authorize?")));
}

#[tokio::test]
async fn forged_state_redirects_home_without_an_exchange() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/google/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(common::token_body("unused", None));
		})
		.await;
	let (status, headers, _) =
		send(app(&server), post_json("/callback-google?state=forged", "{\"authCode\":\"4/x\"}"))
			.await;

	assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(headers.get(header::LOCATION).and_then(|v| v.to_str().ok()), Some("/"));

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn forged_form_state_wins_over_the_query() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/google/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(common::token_body("unused", None));
		})
		.await;
	let (status, headers, _) = send(
		app(&server),
		post_form("/callback-google?state=state-fixture", "state=forged&authCode=4%2Fx"),
	)
	.await;

	assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
	assert_eq!(headers.get(header::LOCATION).and_then(|v| v.to_str().ok()), Some("/"));

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn form_callbacks_exchange_the_code() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/github/token").form_urlencoded_tuple("code", "gh/form");
			then.status(200)
				.header("content-type", "application/json")
				.body(common::token_body("gho_form", None));
		})
		.await;
	let (status, _, body) =
		send(app(&server), post_form("/callback-github", "state=state-fixture&authCode=gh%2Fform"))
			.await;

	token.assert_async().await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json(&body), serde_json::json!({ "accessToken": "gho_form" }));
}

#[tokio::test]
async fn google_callback_returns_both_tokens() {
	let server = MockServer::start_async().await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/google/token").form_urlencoded_tuple("code", "4/good");
			then.status(200)
				.header("content-type", "application/json")
				.body(common::token_body("ya29.access", Some("1//refresh")));
		})
		.await;
	let (status, _, body) = send(
		app(&server),
		post_json("/callback-google?state=state-fixture", "{\"authCode\":\"4/good\"}"),
	)
	.await;

	token.assert_async().await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		json(&body),
		serde_json::json!({ "accessToken": "ya29.access", "refreshToken": "1//refresh" })
	);
}

#[tokio::test]
async fn github_callback_returns_the_access_token_only() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/github/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(common::token_body("gho_access", None));
		})
		.await;

	let (status, _, body) = send(
		app(&server),
		post_json("/callback-github?state=state-fixture", "{\"authCode\":\"gh\"}"),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json(&body), serde_json::json!({ "accessToken": "gho_access" }));
}

#[tokio::test]
async fn callback_body_problems() {
	let server = MockServer::start_async().await;
	let (status, _, body) =
		send(app(&server), post_json("/callback-google?state=state-fixture", "{oops")).await;

	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
	assert!(json(&body).get("error").is_some());

	let (status, _, body) = send(
		app(&server),
		post_json("/callback-google?state=state-fixture", "{\"authCode\":\"\"}"),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, Bytes::from_static(b"Code Not Found to provide AccessToken..\n"));
}

#[tokio::test]
async fn get_new_token_answers_the_access_token_or_empty() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/google/token")
				.form_urlencoded_tuple("refresh_token", "1//good");
			then.status(200)
				.header("content-type", "application/json")
				.body(common::token_body("ya29.fresh", None));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/google/token")
				.form_urlencoded_tuple("refresh_token", "1//bad");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;

	let (status, _, body) =
		send(app(&server), post_json("/get-new-token", "{\"refreshToken\":\"1//good\"}")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json(&body), serde_json::json!("ya29.fresh"));

	let (status, _, body) =
		send(app(&server), post_json("/get-new-token", "{\"refreshToken\":\"1//bad\"}")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(json(&body), serde_json::json!(""));
}

#[tokio::test]
async fn revoke_route_maps_outcomes_to_statuses() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/google/revoke").form_urlencoded_tuple("token", "ya29.ok");
			then.status(200);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/google/revoke").form_urlencoded_tuple("token", "ya29.gone");
			then.status(400).body("{\"error\":\"invalid_token\"}");
		})
		.await;

	let (status, _, body) =
		send(app(&server), post_json("/revoke-token-google", "{\"accessToken\":\"ya29.ok\"}"))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert!(body.is_empty());

	let (status, _, body) =
		send(app(&server), post_json("/revoke-token-google", "{\"accessToken\":\"ya29.gone\"}"))
			.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(json(&body), serde_json::json!({ "outcome": "rejected", "status": 400 }));
}

#[tokio::test]
async fn me_requires_a_verified_bearer_token() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/google/userinfo").query_param("access_token", "ya29.good");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"1089\",\"email\":\"user@example.com\",\"verified_email\":true}");
		})
		.await;

	let (status, _, body) = send(app(&server), get("/me")).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body, Bytes::from_static(b"Unauthorized"));

	let request = Request::get("/me")
		.header(header::AUTHORIZATION, "Token ya29.good")
		.body(Body::empty())
		.expect("Request fixture should build.");
	let (status, _, body) = send(app(&server), request).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body, Bytes::from_static(b"Invalid token format"));

	let request = Request::get("/me")
		.header(header::AUTHORIZATION, "Bearer ya29.good")
		.body(Body::empty())
		.expect("Request fixture should build.");
	let (status, _, body) = send(app(&server), request).await;
	let claim = json(&body);

	assert_eq!(status, StatusCode::OK);
	assert_eq!(claim["id"], "1089");
	assert_eq!(claim["email"], "user@example.com");
}

#[tokio::test]
async fn landing_lists_configured_providers() {
	let server = MockServer::start_async().await;
	let (status, _, body) = send(app(&server), get("/")).await;
	let text = String::from_utf8(body.to_vec()).expect("Landing page should be UTF-8.");

	assert_eq!(status, StatusCode::OK);
	assert!(text.contains("google, facebook, github"));
}
