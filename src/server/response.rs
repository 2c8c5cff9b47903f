//! Mapping gateway errors onto HTTP responses.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Redirect, Response},
};
// self
use crate::{_prelude::*, error::ProviderCallError};

/// Error returned by route handlers.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// A gateway operation failed.
	#[error(transparent)]
	Gateway(#[from] Error),
	/// The request body is not the expected JSON.
	#[error("Request body is invalid: {0}.")]
	Body(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// The request body is not the expected form.
	#[error("Request form is invalid: {0}.")]
	Form(#[from] serde_urlencoded::de::Error),
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		match self {
			ApiError::Gateway(Error::StateMismatch) => Redirect::temporary("/").into_response(),
			ApiError::Gateway(Error::EmptyCode) =>
				(StatusCode::OK, format!("{}\n", Error::EmptyCode)).into_response(),
			ApiError::Gateway(Error::Unauthorized(reason)) =>
				(StatusCode::UNAUTHORIZED, reason.as_str()).into_response(),
			ApiError::Gateway(e) => {
				let status = status_for(&e);

				if status.is_server_error() {
					tracing::error!(error = %e, source = ?e.source(), "request failed");
				} else {
					tracing::warn!(error = %e, source = ?e.source(), "request failed");
				}

				json_error(status, &e)
			},
			ApiError::Body(e) => json_error(StatusCode::UNPROCESSABLE_ENTITY, &e),
			ApiError::Form(e) => json_error(StatusCode::UNPROCESSABLE_ENTITY, &e),
		}
	}
}

/// HTTP status used for `error`.
pub fn status_for(error: &Error) -> StatusCode {
	match error {
		Error::StateMismatch => StatusCode::TEMPORARY_REDIRECT,
		Error::EmptyCode => StatusCode::OK,
		Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
		Error::ProviderNotConfigured { .. } => StatusCode::NOT_FOUND,
		Error::Config(_) | Error::Io(_) | Error::Tracing(_) => StatusCode::INTERNAL_SERVER_ERROR,
		Error::Exchange { source, .. }
		| Error::Refresh { source, .. }
		| Error::Revocation { source, .. }
		| Error::Identity { source, .. } => status_for_call(source),
	}
}

fn status_for_call(error: &ProviderCallError) -> StatusCode {
	match error {
		e if e.is_rejection() => StatusCode::BAD_REQUEST,
		ProviderCallError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
		_ => StatusCode::BAD_GATEWAY,
	}
}

fn json_error(status: StatusCode, error: &dyn Display) -> Response {
	(status, Json(serde_json::json!({ "error": error.to_string() }))).into_response()
}
