//! Route handlers.
//!
//! Login routes answer with the authorization URL as a JSON string. Token routes take JSON
//! bodies. Callback routes also take `application/x-www-form-urlencoded` bodies carrying
//! `state` and `authCode`; a form `state` wins over the query string. A body that does not
//! parse answers 422.

// crates.io
use axum::{
	Extension, Json,
	body::Bytes,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
	response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	flows::{CallbackOutcome, IdentityClaim, ResponseMode, RevocationOutcome},
	provider::ProviderKind,
	server::{ApiError, AppState, VerifiedIdentity},
};

/// Query string accepted by the callback routes.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
	/// Anti-forgery value echoed back by the provider.
	#[serde(default)]
	pub state: String,
}

/// JSON body of the callback routes.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackBody {
	/// Authorization code returned by the provider.
	#[serde(rename = "authCode", default)]
	pub auth_code: String,
}

/// Form body of the callback routes.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackForm {
	/// Anti-forgery value; overrides the query string when present.
	#[serde(default)]
	pub state: Option<String>,
	/// Authorization code returned by the provider.
	#[serde(rename = "authCode", default)]
	pub auth_code: String,
}

/// JSON answer of the callback routes.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
	/// Access token issued by the provider.
	#[serde(rename = "accessToken")]
	pub access_token: String,
	/// Refresh token, only reported by providers that issue one.
	#[serde(rename = "refreshToken", skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
}

/// JSON body of `/get-new-token`.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshBody {
	/// Refresh token to redeem.
	#[serde(rename = "refreshToken", default)]
	pub refresh_token: String,
}

/// JSON body of `/revoke-token-google`.
#[derive(Debug, Default, Deserialize)]
pub struct RevokeBody {
	/// Access token to revoke.
	#[serde(rename = "accessToken", default)]
	pub access_token: String,
}

/// `GET /`: plain-text landing page naming the configured providers.
pub async fn landing(State(state): State<AppState>) -> String {
	let providers =
		state.gateway.registry.kinds().iter().map(ToString::to_string).collect::<Vec<_>>();

	format!("oauth2-gateway\nproviders: {}\n", providers.join(", "))
}

/// `GET /login-google`
pub async fn login_google(State(state): State<AppState>) -> Result<Json<String>, ApiError> {
	login(&state, ProviderKind::Google, ResponseMode::Code)
}

/// `GET /login-google-implicit`
pub async fn login_google_implicit(
	State(state): State<AppState>,
) -> Result<Json<String>, ApiError> {
	login(&state, ProviderKind::Google, ResponseMode::Token)
}

/// `GET /login-facebook`
pub async fn login_facebook(State(state): State<AppState>) -> Result<Json<String>, ApiError> {
	login(&state, ProviderKind::Facebook, ResponseMode::Code)
}

/// `GET /login-github`
pub async fn login_github(State(state): State<AppState>) -> Result<Json<String>, ApiError> {
	login(&state, ProviderKind::GitHub, ResponseMode::Code)
}

/// `POST /callback-google`: answers with both tokens; a missing refresh token is `""`.
pub async fn callback_google(
	State(state): State<AppState>,
	Query(query): Query<CallbackQuery>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<CallbackResponse>, ApiError> {
	let outcome = callback(&state, ProviderKind::Google, query, &headers, &body).await?;
	let refresh_token = outcome
		.tokens
		.refresh_token
		.as_ref()
		.map(|secret| secret.expose().to_owned())
		.unwrap_or_default();

	Ok(Json(CallbackResponse {
		access_token: outcome.tokens.access_token.expose().to_owned(),
		refresh_token: Some(refresh_token),
	}))
}

/// `POST /callback-github`: answers with the access token only.
pub async fn callback_github(
	State(state): State<AppState>,
	Query(query): Query<CallbackQuery>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<Json<CallbackResponse>, ApiError> {
	let outcome = callback(&state, ProviderKind::GitHub, query, &headers, &body).await?;

	Ok(Json(CallbackResponse {
		access_token: outcome.tokens.access_token.expose().to_owned(),
		refresh_token: None,
	}))
}

/// `POST /get-new-token`: redeems a Google refresh token.
///
/// Answers the new access token, or `""` when the refresh failed.
pub async fn get_new_token(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<String>, ApiError> {
	let body = parse_body::<RefreshBody>(&body)?;

	match state.gateway.refresh(ProviderKind::Google, &body.refresh_token).await {
		Ok(tokens) => Ok(Json(tokens.access_token.expose().to_owned())),
		Err(e) => {
			tracing::warn!(error = %e, source = ?e.source(), "refresh failed");

			Ok(Json(String::new()))
		},
	}
}

/// `POST /revoke-token-google`
///
/// 200 with an empty body once Google confirms, 400 with the outcome when it refuses.
pub async fn revoke_token_google(
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Response, ApiError> {
	let body = parse_body::<RevokeBody>(&body)?;
	let outcome = state.gateway.revoke(ProviderKind::Google, &body.access_token).await?;

	Ok(match outcome {
		RevocationOutcome::Revoked => StatusCode::OK.into_response(),
		rejected @ RevocationOutcome::Rejected { .. } =>
			(StatusCode::BAD_REQUEST, Json(rejected)).into_response(),
	})
}

/// `GET /me`: identity attached by the bearer middleware.
pub async fn me(Extension(identity): Extension<VerifiedIdentity>) -> Json<IdentityClaim> {
	Json(identity.0.as_ref().clone())
}

fn login(
	state: &AppState,
	provider: ProviderKind,
	mode: ResponseMode,
) -> Result<Json<String>, ApiError> {
	let request = state.gateway.begin_login(provider, mode)?;

	Ok(Json(request.url.to_string()))
}

async fn callback(
	state: &AppState,
	provider: ProviderKind,
	query: CallbackQuery,
	headers: &HeaderMap,
	body: &Bytes,
) -> Result<CallbackOutcome, ApiError> {
	let (returned_state, auth_code) = if is_form(headers) {
		let form = parse_form::<CallbackForm>(body)?;

		(form.state.unwrap_or(query.state), form.auth_code)
	} else {
		(query.state, parse_body::<CallbackBody>(body)?.auth_code)
	};

	Ok(state
		.gateway
		.complete_callback(provider, &returned_state, &auth_code, state.resolve_identity)
		.await?)
}

fn is_form(headers: &HeaderMap) -> bool {
	headers
		.get(CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.is_some_and(|v| v.trim_start().starts_with("application/x-www-form-urlencoded"))
}

fn parse_form<T>(body: &[u8]) -> Result<T, ApiError>
where
	T: DeserializeOwned,
{
	Ok(serde_urlencoded::from_bytes(body)?)
}

// An empty body reads as the default value.
fn parse_body<T>(body: &[u8]) -> Result<T, ApiError>
where
	T: Default + DeserializeOwned,
{
	if body.is_empty() {
		return Ok(T::default());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	Ok(serde_path_to_error::deserialize(&mut deserializer)?)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bodies_use_camel_case_fields() {
		let body = parse_body::<CallbackBody>(br#"{"authCode":"4/abc"}"#)
			.expect("Callback body should parse.");

		assert_eq!(body.auth_code, "4/abc");
		assert_eq!(
			parse_body::<RefreshBody>(b"").expect("Empty body should parse.").refresh_token,
			""
		);
		assert!(matches!(parse_body::<RevokeBody>(b"{not json"), Err(ApiError::Body(_))));
		assert!(matches!(
			parse_body::<RevokeBody>(br#"{"accessToken":42}"#),
			Err(ApiError::Body(_))
		));
	}

	#[test]
	fn callback_forms_carry_state_and_code() {
		let form = parse_form::<CallbackForm>(b"state=forged&authCode=4%2Fx")
			.expect("Callback form should parse.");

		assert_eq!(form.state.as_deref(), Some("forged"));
		assert_eq!(form.auth_code, "4/x");
		assert_eq!(
			parse_form::<CallbackForm>(b"").expect("Empty form should parse.").state,
			None
		);

		let mut headers = HeaderMap::new();

		assert!(!is_form(&headers));
		headers.insert(
			CONTENT_TYPE,
			"application/x-www-form-urlencoded; charset=utf-8"
				.parse()
				.expect("Content type should parse."),
		);
		assert!(is_form(&headers));
	}

	#[test]
	fn github_callback_omits_refresh_token() {
		let json = serde_json::to_value(CallbackResponse {
			access_token: "gho_x".into(),
			refresh_token: None,
		})
		.expect("Response should serialize.");

		assert_eq!(json, serde_json::json!({ "accessToken": "gho_x" }));
	}
}
