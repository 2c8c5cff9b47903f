//! Bearer verification middleware for protected routes.

// crates.io
use axum::{
	extract::{Request, State},
	http::header::AUTHORIZATION,
	middleware::Next,
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	error::UnauthorizedReason,
	flows::IdentityClaim,
	server::{ApiError, AppState},
};

/// Identity attached to requests that passed bearer verification.
#[derive(Clone, Debug)]
pub struct VerifiedIdentity(pub Arc<IdentityClaim>);

/// Verifies the `Authorization` header and attaches [`VerifiedIdentity`] before running
/// the next handler. Rejections answer 401 with a plain-text reason; a header that is not
/// visible ASCII counts as malformed.
pub async fn require_bearer(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Response {
	let header = match request.headers().get(AUTHORIZATION).map(|value| value.to_str()) {
		Some(Ok(value)) => Some(value.to_owned()),
		Some(Err(_)) =>
			return ApiError::from(Error::Unauthorized(UnauthorizedReason::MalformedHeader))
				.into_response(),
		None => None,
	};

	match state.gateway.verify_bearer(state.bearer_provider, header.as_deref()).await {
		Ok(claim) => {
			request.extensions_mut().insert(VerifiedIdentity(Arc::new(claim)));

			next.run(request).await
		},
		Err(e) => ApiError::from(e).into_response(),
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use axum::{
		Router,
		body::{Body, to_bytes},
		http::{HeaderValue, Request as HttpRequest, StatusCode},
		middleware,
		routing::get,
	};
	use tower::ServiceExt;
	// self
	use super::*;
	use crate::_preludet::build_reqwest_test_gateway;

	fn guarded_app(counter: Arc<AtomicUsize>) -> Router {
		let state = AppState::new(build_reqwest_test_gateway("http://127.0.0.1:9", "xyz"));

		Router::new()
			.route(
				"/guarded",
				get(move || {
					let counter = counter.clone();

					async move {
						counter.fetch_add(1, Ordering::SeqCst);

						"ok"
					}
				}),
			)
			.route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
			.with_state(state)
	}

	#[tokio::test]
	async fn rejected_requests_never_reach_the_handler() {
		let calls = Arc::new(AtomicUsize::new(0));
		let app = guarded_app(calls.clone());

		for header in [None, Some("Basic abc"), Some("Bearer")] {
			let mut request = HttpRequest::get("/guarded");

			if let Some(value) = header {
				request = request.header(AUTHORIZATION, value);
			}

			let response = app
				.clone()
				.oneshot(request.body(Body::empty()).expect("Request fixture should build."))
				.await
				.expect("Router should not fail.");

			assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header: {header:?}");
		}

		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn non_ascii_headers_are_malformed() {
		let calls = Arc::new(AtomicUsize::new(0));
		let mut request = HttpRequest::get("/guarded")
			.body(Body::empty())
			.expect("Request fixture should build.");

		request.headers_mut().insert(
			AUTHORIZATION,
			HeaderValue::from_bytes(b"Bearer \xffabc")
				.expect("Opaque header bytes should be accepted."),
		);

		let response =
			guarded_app(calls.clone()).oneshot(request).await.expect("Router should not fail.");
		let status = response.status();
		let body = to_bytes(response.into_body(), usize::MAX)
			.await
			.expect("Response body should be readable.");

		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(&body[..], b"Invalid token format");
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}
}
