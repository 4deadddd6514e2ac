//! Authorization Code flow: consent URL, one-shot code storage, and the code exchange.

// crates.io
use rand::{Rng, distr::Alphanumeric};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{AuthType, Credentials},
	flows::AuthProvider,
	http::HttpTransport,
	oauth::{GrantType, oauth2::AuthorizationCode},
	obs::{self, FlowKind},
};

const STATE_LEN: usize = 32;

/// Consent-screen handshake returned by [`AuthProvider::start_authorization`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Fully-formed consent URL the end user should be sent to.
	pub authorization_url: Url,
}
impl AuthorizationSession {
	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::authorization_failed("Authorization state mismatch"))
		}
	}
}

impl<T> AuthProvider<T>
where
	T: ?Sized + HttpTransport,
{
	/// Builds the consent redirect URL.
	///
	/// The query carries `client_id`, `redirect_uri` (when configured), `response_type=code`,
	/// and `state` when provided.
	pub fn authentication_url(&self, state: Option<&str>) -> Url {
		let mut url = self.descriptor.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", self.client.client_id());

		if let Some(redirect_uri) = &self.redirect_uri {
			pairs.append_pair("redirect_uri", redirect_uri.as_str());
		}

		pairs.append_pair("response_type", "code");

		if let Some(state) = state {
			pairs.append_pair("state", state);
		}

		drop(pairs);

		url
	}

	/// Generates a random `state` and the matching consent URL.
	pub fn start_authorization(&self) -> AuthorizationSession {
		let state = random_string(STATE_LEN);
		let authorization_url = self.authentication_url(Some(&state));

		AuthorizationSession { state, authorization_url }
	}

	/// Stores a one-shot authorization code for the next Authorization Code exchange.
	pub fn load_code(&self, code: impl Into<String>) {
		*self.pending_code.lock() = Some(AuthorizationCode::new(code.into()));
	}

	/// Loads `code` and immediately exchanges it for credentials.
	pub async fn request_credentials(&self, code: impl Into<String>) -> Result<Arc<Credentials>> {
		self.load_code(code);

		self.authenticate(AuthType::AuthorizationCode, None).await
	}

	pub(super) async fn exchange_authorization_code(&self) -> Result<Arc<Credentials>> {
		obs::observe(FlowKind::AuthorizationCode, "exchange_authorization_code", async move {
			let code = self
				.pending_code
				.lock()
				.take()
				.filter(|code| !code.secret().is_empty())
				.ok_or_else(|| Error::authorization_failed("Load authentication screen first"))?;
			let mut fields = vec![("code", Value::from(code.secret().as_str()))];

			if let Some(redirect_uri) = &self.redirect_uri {
				fields.push(("redirect_uri", redirect_uri.as_str().into()));
			}

			let issued = self.token_endpoint().exchange(GrantType::AuthorizationCode, fields).await?;
			// Authorization-code credentials are only renewable through their refresh token.
			let refresh_token =
				issued.refresh_token.clone().filter(|token| !token.is_empty()).ok_or_else(|| {
					Error::authorization_failed(
						"An error occurred while authorization_code flow. Message: invalid response",
					)
				})?;

			self.commit(issued, Some(refresh_token), AuthType::AuthorizationCode)
		})
		.await
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
