//! Token endpoint protocol shared by every grant exchange.
//!
//! All three exchanges POST a JSON body `{grant_type, ...}` to the token endpoint with
//! HTTP Basic client authentication and expect a JSON body carrying `access_token` and
//! `expires_in`. Every failure on this path surfaces as [`Error::AuthorizationFailed`]
//! with the lower-level cause attached as its source.

pub use oauth2;
pub use oauth2::http;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{ClientId, ClientSecret};
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::AuthType,
	descriptor::ApiDescriptor,
	dispatcher::Response,
	error::{ConfigError, RequestSnapshot, TransportError},
	http::{HttpRequest, HttpTransport},
	oauth::http::{
		Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
	},
};

const APPLICATION_JSON: &str = "application/json";

/// OAuth 2.0 grant types sent to the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant.
	AuthorizationCode,
	/// Refresh Token grant for authorization-code sessions.
	RefreshToken,
	/// Client Credentials grant for app-only tokens.
	ClientCredentials,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
			GrantType::ClientCredentials => "client_credentials",
		}
	}

	/// Flow whose credentials this grant produces.
	pub fn auth_type(self) -> AuthType {
		match self {
			GrantType::AuthorizationCode | GrantType::RefreshToken => AuthType::AuthorizationCode,
			GrantType::ClientCredentials => AuthType::ClientCredentials,
		}
	}

	fn failure_context(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "An error occurred while authorization code flow",
			GrantType::RefreshToken => "Error occurred while refreshing token",
			GrantType::ClientCredentials => "An error occurred while client credentials flow",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Confidential client credentials applied via HTTP Basic authentication.
#[derive(Clone, Debug)]
pub struct ClientAuth {
	client_id: ClientId,
	client_secret: ClientSecret,
}
impl ClientAuth {
	/// Creates a new client authentication pair.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: ClientId::new(client_id.into()),
			client_secret: ClientSecret::new(client_secret.into()),
		}
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> &str {
		self.client_id.as_str()
	}

	fn basic_header(&self) -> String {
		let pair = format!("{}:{}", self.client_id.as_str(), self.client_secret.secret());

		format!("Basic {}", STANDARD.encode(pair))
	}
}

/// Successful, validated token endpoint payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct IssuedToken {
	pub(crate) access_token: String,
	pub(crate) refresh_token: Option<String>,
	pub(crate) expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenResponse {
	access_token: Option<String>,
	refresh_token: Option<String>,
	expires_in: Option<i64>,
	error: Option<String>,
}
impl TokenResponse {
	fn validate(self, auth_type: AuthType) -> Result<IssuedToken> {
		if let Some(error) = self.error.filter(|value| !value.is_empty()) {
			return Err(Error::authorization_failed(format!(
				"An error occurred while {auth_type} flow. Message: {error}"
			)));
		}

		match (self.access_token, self.expires_in) {
			(Some(access_token), Some(expires_in)) if !access_token.is_empty() && expires_in > 0 =>
				Ok(IssuedToken { access_token, refresh_token: self.refresh_token, expires_in }),
			_ => Err(Error::authorization_failed(format!(
				"An error occurred while {auth_type} flow. Message: invalid response"
			))),
		}
	}
}

/// Borrowed view over everything a token endpoint call needs.
pub(crate) struct TokenEndpoint<'a, T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) descriptor: &'a ApiDescriptor,
	pub(crate) client: &'a ClientAuth,
	pub(crate) transport: &'a T,
}
impl<T> TokenEndpoint<'_, T>
where
	T: ?Sized + HttpTransport,
{
	/// Runs one grant exchange and validates the response.
	pub(crate) async fn exchange(
		&self,
		grant: GrantType,
		fields: Vec<(&'static str, Value)>,
	) -> Result<IssuedToken> {
		let mut body = Map::new();

		body.insert("grant_type".into(), grant.as_str().into());
		body.extend(fields.into_iter().map(|(key, value)| (key.to_owned(), value)));

		let request = self.json_request(&self.descriptor.endpoints.token, &Value::Object(body))?;
		let response = match self.send(request).await {
			Ok(response) => response,
			Err(err @ (Error::ClientError(_) | Error::ServerError(_))) => {
				let reason =
					err.request_failure().map(|failure| failure.reason_phrase()).unwrap_or_default();

				return Err(Error::authorization_failed_with(
					format!("Error occurred. Message: {reason}"),
					err,
				));
			},
			Err(err) => {
				return Err(Error::authorization_failed_with(
					format!("{}. Message: {err}", grant.failure_context()),
					err,
				));
			},
		};
		let decoded = serde_json::from_slice::<TokenResponse>(response.bytes()).map_err(|source| {
			let message = format!("{}. Message: {source}", grant.failure_context());

			Error::authorization_failed_with(message, Error::InvalidData { source })
		})?;

		decoded.validate(grant.auth_type())
	}

	/// Posts the refresh token to the revocation endpoint.
	///
	/// Returns `true` iff the endpoint answered exactly `200 OK`.
	pub(crate) async fn revoke(&self, refresh_token: &str) -> Result<bool> {
		let body = serde_json::json!({ "token": refresh_token });
		let request = self.json_request(&self.descriptor.endpoints.revocation, &body)?;
		let response = self.send(request).await?;

		Ok(response.status_code() == 200)
	}

	fn json_request(&self, endpoint: &Url, body: &Value) -> Result<HttpRequest> {
		let payload = serde_json::to_vec(body).map_err(|source| Error::InvalidData { source })?;
		let request = http::Request::builder()
			.method(Method::POST)
			.uri(endpoint.as_str())
			.header(ACCEPT, APPLICATION_JSON)
			.header(USER_AGENT, self.descriptor.user_agent.as_str())
			.header(CONTENT_TYPE, APPLICATION_JSON)
			.header(AUTHORIZATION, self.client.basic_header())
			.body(payload)
			.map_err(ConfigError::from)?;

		Ok(request)
	}

	async fn send(&self, request: HttpRequest) -> Result<Response> {
		let snapshot = RequestSnapshot::from(&request);
		let raw = self.transport.send(request).await.map_err(TransportError::network)?;

		Error::classify_status(snapshot, Response::from(raw))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn basic_header_encodes_client_pair() {
		let client = ClientAuth::new("client", "secret");

		assert_eq!(client.basic_header(), "Basic Y2xpZW50OnNlY3JldA==");
		assert!(!format!("{:?}", ClientAuth::new("client", "hunter2")).contains("hunter2"));
	}

	#[test]
	fn token_response_validation_reports_errors() {
		let err = TokenResponse { error: Some("invalid_grant".into()), ..Default::default() }
			.validate(AuthType::AuthorizationCode)
			.expect_err("Error payloads should fail validation.");

		assert_eq!(
			err.to_string(),
			"Authorization failed: An error occurred while authorization_code flow. Message: invalid_grant."
		);

		let err = TokenResponse { access_token: Some("abc".into()), ..Default::default() }
			.validate(AuthType::ClientCredentials)
			.expect_err("Missing expires_in should fail validation.");

		assert!(err.to_string().contains("client_credentials flow. Message: invalid response"));

		let err = TokenResponse {
			access_token: Some(String::new()),
			expires_in: Some(3600),
			..Default::default()
		}
		.validate(AuthType::ClientCredentials)
		.expect_err("Empty access tokens should fail validation.");

		assert!(matches!(err, Error::AuthorizationFailed { .. }));
	}

	#[test]
	fn token_response_validation_rejects_non_positive_lifetimes() {
		for expires_in in [0, -5] {
			let err = TokenResponse {
				access_token: Some("abc".into()),
				expires_in: Some(expires_in),
				..Default::default()
			}
			.validate(AuthType::ClientCredentials)
			.expect_err("Non-positive lifetimes should fail validation.");

			assert_eq!(
				err.to_string(),
				"Authorization failed: An error occurred while client_credentials flow. Message: invalid response."
			);
		}
	}

	#[test]
	fn token_response_validation_keeps_optional_refresh_token() {
		let issued = TokenResponse {
			access_token: Some("abc".into()),
			expires_in: Some(7200),
			..Default::default()
		}
		.validate(AuthType::ClientCredentials)
		.expect("Valid payloads should pass validation.");

		assert_eq!(
			issued,
			IssuedToken { access_token: "abc".into(), refresh_token: None, expires_in: 7200 }
		);
	}

	#[test]
	fn grant_types_map_to_credential_flows() {
		assert_eq!(GrantType::RefreshToken.auth_type(), AuthType::AuthorizationCode);
		assert_eq!(GrantType::ClientCredentials.to_string(), "client_credentials");
	}
}
