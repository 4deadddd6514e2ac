//! Async Fakturoid API client: OAuth 2.0 credential lifecycle, single-flight re-authentication,
//! and a classified request dispatcher over a pluggable HTTP transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		descriptor::ApiDescriptor,
		dispatcher::Dispatcher,
		flows::AuthProvider,
		http::{HttpRequest, HttpResponse, HttpTransport, TransportFuture},
		oauth::http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
	};

	/// Client identifier used by test fixtures.
	pub const TEST_CLIENT_ID: &str = "test-client";
	/// Client secret used by test fixtures.
	pub const TEST_CLIENT_SECRET: &str = "test-secret";

	/// Failure raised by [`ScriptedTransport`] when a scripted step asks for it or the script
	/// runs dry.
	#[derive(Debug, ThisError)]
	#[error("Scripted transport failure: {0}.")]
	pub struct ScriptedTransportError(pub String);

	enum Step {
		Respond(HttpResponse),
		Fail(String),
	}

	/// In-memory [`HttpTransport`] that replays queued responses and records every request.
	#[derive(Default)]
	pub struct ScriptedTransport {
		steps: Mutex<VecDeque<Step>>,
		requests: Mutex<Vec<HttpRequest>>,
	}
	impl ScriptedTransport {
		/// Queues a response with the provided status, content type, and body.
		pub fn respond(&self, status: u16, content_type: Option<&str>, body: &str) -> &Self {
			let mut response = HttpResponse::new(body.as_bytes().to_vec());

			*response.status_mut() = StatusCode::from_u16(status)
				.expect("Scripted status code should be within the valid HTTP range.");

			if let Some(value) = content_type {
				response.headers_mut().insert(
					CONTENT_TYPE,
					HeaderValue::from_str(value)
						.expect("Scripted content type should be a valid header value."),
				);
			}

			self.steps.lock().push_back(Step::Respond(response));

			self
		}

		/// Queues a successful JSON response.
		pub fn respond_json(&self, status: u16, body: &str) -> &Self {
			self.respond(status, Some("application/json; charset=utf-8"), body)
		}

		/// Queues a token endpoint response for the provided access token and lifetime.
		pub fn respond_token(&self, access: &str, refresh: Option<&str>, expires_in: i64) -> &Self {
			let mut body = serde_json::json!({
				"access_token": access,
				"token_type": "Bearer",
				"expires_in": expires_in,
			});

			if let Some(refresh) = refresh {
				body["refresh_token"] = refresh.into();
			}

			self.respond_json(200, &body.to_string())
		}

		/// Queues a transport-level failure.
		pub fn fail(&self, message: &str) -> &Self {
			self.steps.lock().push_back(Step::Fail(message.to_owned()));

			self
		}

		/// Returns a copy of every request observed so far.
		pub fn requests(&self) -> Vec<HttpRequest> {
			self.requests.lock().clone()
		}

		/// Returns the number of requests observed so far.
		pub fn request_count(&self) -> usize {
			self.requests.lock().len()
		}
	}
	impl HttpTransport for ScriptedTransport {
		type TransportError = ScriptedTransportError;

		fn send(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
			self.requests.lock().push(request);

			let step = self.steps.lock().pop_front();

			Box::pin(async move {
				match step {
					Some(Step::Respond(response)) => Ok(response),
					Some(Step::Fail(message)) => Err(ScriptedTransportError(message)),
					None => Err(ScriptedTransportError("no scripted response left".into())),
				}
			})
		}
	}

	/// Builds a descriptor rooted at the provided base URL.
	pub fn test_descriptor(base: &str) -> ApiDescriptor {
		ApiDescriptor::builder()
			.base_url(Url::parse(base).expect("Test base URL should parse successfully."))
			.user_agent("fakturoid-tests (tests@example.com)")
			.build()
			.expect("Test descriptor should build successfully.")
	}

	/// Builds an [`AuthProvider`] over a fresh [`ScriptedTransport`].
	pub fn build_scripted_provider() -> (AuthProvider<ScriptedTransport>, Arc<ScriptedTransport>) {
		let transport = Arc::new(ScriptedTransport::default());
		let provider = AuthProvider::builder(
			test_descriptor("https://app.example.com/api/v3"),
			TEST_CLIENT_ID,
			TEST_CLIENT_SECRET,
		)
		.redirect_uri(
			Url::parse("https://client.example.com/callback")
				.expect("Test redirect URI should parse successfully."),
		)
		.build_with_transport(transport.clone());

		(provider, transport)
	}

	/// Builds a [`Dispatcher`] sharing a scripted provider and transport.
	pub fn build_scripted_dispatcher()
	-> (Dispatcher<ScriptedTransport>, Arc<AuthProvider<ScriptedTransport>>, Arc<ScriptedTransport>)
	{
		let (provider, transport) = build_scripted_provider();
		let provider = Arc::new(provider);
		let dispatcher = Dispatcher::new(provider.clone());

		(dispatcher, provider, transport)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
