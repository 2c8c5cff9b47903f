mod common;

// crates.io
use httpmock::prelude::*;
// self
use oauth2_gateway::{Error, error::UnauthorizedReason, provider::ProviderKind};

fn unauthorized(err: Error) -> UnauthorizedReason {
	match err {
		Error::Unauthorized(reason) => reason,
		other => panic!("Expected an unauthorized error, got {other:?}."),
	}
}

#[tokio::test]
async fn valid_tokens_yield_the_identity() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/google/userinfo").query_param("access_token", "ya29.good");
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":\"1089\",\"email\":\"user@example.com\",\"verified_email\":true}",
			);
		})
		.await;
	let gateway = common::gateway(&server);
	let claim = gateway
		.verify_bearer(ProviderKind::Google, Some("Bearer ya29.good"))
		.await
		.expect("Valid bearer token should be accepted.");

	mock.assert_async().await;

	assert_eq!(claim.subject, "1089");
	assert!(claim.email_verified);
}

#[tokio::test]
async fn header_problems_are_rejected_without_a_provider_call() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/google/userinfo");
			then.status(200).header("content-type", "application/json").body("{\"id\":\"1\"}");
		})
		.await;
	let gateway = common::gateway(&server);
	let cases = [
		(None, UnauthorizedReason::MissingHeader),
		(Some(""), UnauthorizedReason::MissingHeader),
		(Some("ya29.good"), UnauthorizedReason::MalformedHeader),
		(Some("Basic abc"), UnauthorizedReason::MalformedHeader),
		(Some("Bearer a b"), UnauthorizedReason::MalformedHeader),
		(Some("Bearer "), UnauthorizedReason::MalformedHeader),
	];

	for (header, expected) in cases {
		let err = gateway
			.verify_bearer(ProviderKind::Google, header)
			.await
			.expect_err("Malformed header should be rejected.");

		assert_eq!(unauthorized(err), expected, "header: {header:?}");
	}

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn provider_errors_mark_the_token_invalid() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/google/userinfo");
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":{\"code\":401,\"message\":\"Request had invalid authentication credentials.\",\"status\":\"UNAUTHENTICATED\"}}",
			);
		})
		.await;

	let gateway = common::gateway(&server);
	let err = gateway
		.verify_bearer(ProviderKind::Google, Some("Bearer ya29.expired"))
		.await
		.expect_err("Expired token should be rejected.");

	assert_eq!(unauthorized(err), UnauthorizedReason::InvalidToken);
}

#[tokio::test]
async fn error_statuses_without_a_body_error_still_reject() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/google/userinfo");
			then.status(403).header("content-type", "application/json").body("{\"id\":\"1089\"}");
		})
		.await;

	let gateway = common::gateway(&server);
	let err = gateway
		.verify_bearer(ProviderKind::Google, Some("Bearer ya29.forbidden"))
		.await
		.expect_err("Non-success status should never pass verification.");

	assert_eq!(unauthorized(err), UnauthorizedReason::InvalidToken);
}

#[tokio::test]
async fn unreadable_answers_cannot_validate() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/google/userinfo");
			then.status(502).body("<html>bad gateway</html>");
		})
		.await;

	let gateway = common::gateway(&server);
	let err = gateway
		.verify_bearer(ProviderKind::Google, Some("Bearer ya29.any"))
		.await
		.expect_err("Unparsable answer should fail verification.");

	assert_eq!(unauthorized(err), UnauthorizedReason::VerificationFailed);
}
