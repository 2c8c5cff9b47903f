//! Outbound HTTP transport used for every provider round trip.
//!
//! Token exchanges, userinfo lookups, and revocations all go through [`TokenHttpClient`].
//! Each call gets a fresh [`ResponseMetadataSlot`] that the transport fills with the HTTP
//! status, so error mapping sees the same facts no matter which endpoint failed.

// std
use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::redirect::Policy;
// self
use crate::{_prelude::*, error::ConfigError};

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = concat!("oauth2-gateway/", env!("CARGO_PKG_VERSION"));

/// HTTP transport shared by all flows.
///
/// Implementations hand out [`AsyncHttpClient`] handles bound to a metadata slot. Handles
/// must own their state so request futures stay `Send` while in flight.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle that records response metadata in `slot`.
	///
	/// Handles clear the slot before sending and store metadata as soon as a response
	/// status is known, including for error statuses.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Facts captured from the most recent HTTP response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response arrived.
	pub status: Option<u16>,
}

/// Shared slot passing [`ResponseMetadata`] from the transport to error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// reqwest-backed [`TokenHttpClient`].
///
/// Provider endpoints answer directly, so clients built here never follow redirects.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with a per-request timeout, no redirect following, and the gateway
	/// user agent.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(Policy::none())
			.user_agent(USER_AGENT)
			.build()?;

		Ok(Self(client))
	}

	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		self.instrumented(slot)
	}
}

struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient`] that records response metadata.
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let inner = Arc::clone(&self.0);

		Box::pin(async move {
			inner.slot.take();

			let response = inner
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			inner.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let body = response.bytes().await.map_err(Box::new)?;
			let mut converted = HttpResponse::new(body.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}
