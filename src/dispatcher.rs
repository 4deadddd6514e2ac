//! Authenticated REST calls against the API base URL.
//!
//! Every call runs the same pipeline: account-slug check, [`AuthProvider::re_auth`], body
//! encoding, URL assembly, transport send, and 4xx/5xx classification. Successful responses
//! come back wrapped in [`Response`].

pub mod response;

pub use response::*;

// crates.io
use serde_json::Value;
use url::form_urlencoded::Serializer as QuerySerializer;
// self
use crate::{
	_prelude::*,
	descriptor::ACCOUNT_SLUG_PLACEHOLDER,
	error::{ConfigError, RequestSnapshot, TransportError},
	flows::AuthProvider,
	http::HttpTransport,
	oauth::http::{
		self, Method,
		header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
	},
	obs::{self, FlowKind},
};

const APPLICATION_JSON: &str = "application/json";

/// Issues authenticated requests on behalf of one [`AuthProvider`].
pub struct Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	auth: Arc<AuthProvider<T>>,
	account_slug: RwLock<Option<String>>,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a dispatcher sharing the provider's descriptor and transport.
	pub fn new(auth: Arc<AuthProvider<T>>) -> Self {
		Self { auth, account_slug: RwLock::new(None) }
	}

	/// Sets the account slug substituted into `{accountSlug}` paths.
	pub fn with_account_slug(self, account_slug: impl Into<String>) -> Self {
		self.set_account_slug(account_slug);

		self
	}

	/// Replaces the account slug.
	pub fn set_account_slug(&self, account_slug: impl Into<String>) {
		*self.account_slug.write() = Some(account_slug.into());
	}

	/// Clears the account slug; account-scoped paths fail until a new one is set.
	pub fn clear_account_slug(&self) {
		*self.account_slug.write() = None;
	}

	/// Currently configured account slug.
	pub fn account_slug(&self) -> Option<String> {
		self.account_slug.read().clone()
	}

	/// Provider consulted before every request.
	pub fn auth(&self) -> &Arc<AuthProvider<T>> {
		&self.auth
	}

	/// Sends a `GET` with the provided query parameters.
	pub async fn get<I, K, V>(&self, path: &str, params: I) -> Result<Response>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let mut query = QuerySerializer::new(String::new());

		for (key, value) in params {
			query.append_pair(key.as_ref(), value.as_ref());
		}

		self.dispatch(Method::GET, path, query.finish(), None).await
	}

	/// Sends a `POST` with `data` encoded as JSON.
	pub async fn post<P>(&self, path: &str, data: &P) -> Result<Response>
	where
		P: ?Sized + Serialize,
	{
		self.dispatch(Method::POST, path, String::new(), Some(serde_json::to_value(data))).await
	}

	/// Sends a `PATCH` with `data` encoded as JSON.
	pub async fn patch<P>(&self, path: &str, data: &P) -> Result<Response>
	where
		P: ?Sized + Serialize,
	{
		self.dispatch(Method::PATCH, path, String::new(), Some(serde_json::to_value(data))).await
	}

	/// Sends a `DELETE`.
	pub async fn delete(&self, path: &str) -> Result<Response> {
		self.dispatch(Method::DELETE, path, String::new(), None).await
	}

	async fn dispatch(
		&self,
		method: Method,
		path: &str,
		query: String,
		data: Option<serde_json::Result<Value>>,
	) -> Result<Response> {
		obs::observe(FlowKind::Dispatch, "dispatch", async move {
			let account_slug = self.account_slug();

			if path.contains(ACCOUNT_SLUG_PLACEHOLDER) && account_slug.is_none() {
				return Err(ConfigError::MissingAccountSlug.into());
			}

			let credentials = self.auth.re_auth().await?;
			let authorization = credentials
				.access_token()
				.ok_or_else(|| Error::authorization_failed("Credentials are null"))?
				.bearer_header()?;
			let body = match data {
				Some(data) => encode_body(data.map_err(|source| Error::InvalidData { source })?)?,
				None => Vec::new(),
			};
			let path =
				path.replace(ACCOUNT_SLUG_PLACEHOLDER, account_slug.as_deref().unwrap_or_default());
			let mut url = self.auth.descriptor().resource_url(&path);

			if !query.is_empty() {
				url.push('?');
				url.push_str(&query);
			}

			let url = Url::parse(&url).map_err(|source| ConfigError::InvalidUrl { source })?;
			let request = http::Request::builder()
				.method(method)
				.uri(url.as_str())
				.header(USER_AGENT, self.auth.descriptor().user_agent.as_str())
				.header(CONTENT_TYPE, APPLICATION_JSON)
				.header(AUTHORIZATION, authorization)
				.body(body)
				.map_err(ConfigError::from)?;
			let snapshot = RequestSnapshot::from(&request);
			let raw = self.auth.http_client().send(request).await.map_err(TransportError::network)?;

			let response = Response::from(raw);

			obs::record_response_status(response.status());

			Error::classify_status(snapshot, response)
		})
		.await
	}
}
impl<T> Debug for Dispatcher<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher")
			.field("auth", &self.auth)
			.field("account_slug", &self.account_slug.read())
			.finish()
	}
}

/// Empty payloads (`null`, `{}`, `[]`) are sent without a body.
fn encode_body(data: Value) -> Result<Vec<u8>> {
	let empty = match &data {
		Value::Null => true,
		Value::Object(map) => map.is_empty(),
		Value::Array(items) => items.is_empty(),
		_ => false,
	};

	if empty {
		return Ok(Vec::new());
	}

	serde_json::to_vec(&data).map_err(|source| Error::InvalidData { source })
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::BTreeMap;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::{AuthType, Credentials},
	};

	fn fresh_credentials() -> Credentials {
		Credentials::issued(
			Some("refresh".into()),
			"valid-token".into(),
			OffsetDateTime::now_utc(),
			3600,
			AuthType::AuthorizationCode,
		)
		.expect("Fixture credentials should be valid.")
	}

	#[tokio::test]
	async fn missing_account_slug_fails_before_any_request() {
		let (dispatcher, provider, transport) = build_scripted_dispatcher();

		provider.set_credentials(Some(fresh_credentials()));

		let err = dispatcher
			.get("/accounts/{accountSlug}/invoices.json", [("page", "2")])
			.await
			.expect_err("Account-scoped paths need a slug.");

		assert!(matches!(err, Error::Config(ConfigError::MissingAccountSlug)));
		assert_eq!(transport.request_count(), 0);
	}

	#[tokio::test]
	async fn patch_substitutes_slug_and_sends_bearer_json() {
		let (dispatcher, provider, transport) = build_scripted_dispatcher();
		let dispatcher = dispatcher.with_account_slug("test");

		provider.set_credentials(Some(fresh_credentials()));
		transport.respond_json(200, r#"{"name":"Test"}"#);

		let response = dispatcher
			.patch("/accounts/{accountSlug}/invoices/1.json", &serde_json::json!({ "name": "Test" }))
			.await
			.expect("PATCH should succeed.");

		assert_eq!(response.status_code(), 200);

		let request = &transport.requests()[0];

		assert_eq!(request.method(), Method::PATCH);
		assert_eq!(
			request.uri().to_string(),
			"https://app.example.com/api/v3/accounts/test/invoices/1.json"
		);
		assert_eq!(
			request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer valid-token")
		);
		assert_eq!(
			request.headers().get(USER_AGENT).and_then(|v| v.to_str().ok()),
			Some("fakturoid-tests (tests@example.com)")
		);
		assert_eq!(request.body().as_slice(), br#"{"name":"Test"}"#);
	}

	#[tokio::test]
	async fn get_appends_query_and_empty_payloads_send_no_body() {
		let (dispatcher, provider, transport) = build_scripted_dispatcher();

		provider.set_credentials(Some(fresh_credentials()));
		transport.respond(200, None, "").respond(201, None, "").respond(204, None, "");

		dispatcher
			.get("/user.json", [("since", "2024-01-01T00:00:00+01:00"), ("page", "2")])
			.await
			.expect("GET should succeed.");
		dispatcher
			.post("/accounts.json", &BTreeMap::<String, String>::new())
			.await
			.expect("POST should succeed.");
		dispatcher.delete("/user.json").await.expect("DELETE should succeed.");

		let requests = transport.requests();

		assert_eq!(
			requests[0].uri().to_string(),
			"https://app.example.com/api/v3/user.json?since=2024-01-01T00%3A00%3A00%2B01%3A00&page=2"
		);
		assert!(requests[1].body().is_empty());
		assert_eq!(requests[2].method(), Method::DELETE);
	}

	#[tokio::test]
	async fn error_statuses_are_classified_with_request_attached() {
		let (dispatcher, provider, transport) = build_scripted_dispatcher();

		provider.set_credentials(Some(fresh_credentials()));
		transport.respond_json(422, r#"{"errors":{"name":["is blank"]}}"#).respond(500, None, "");

		let err = dispatcher
			.post("/subjects.json", &serde_json::json!({ "name": "" }))
			.await
			.expect_err("422 should fail.");
		let failure = err.request_failure().expect("Client errors should carry the exchange.");

		assert!(matches!(err, Error::ClientError(_)));
		assert_eq!(failure.request.url, "https://app.example.com/api/v3/subjects.json");
		assert!(failure.response.text().contains("is blank"));
		assert!(matches!(dispatcher.delete("/x.json").await, Err(Error::ServerError(_))));
	}

	#[tokio::test]
	async fn transport_failures_and_missing_credentials_surface() {
		let (dispatcher, provider, transport) = build_scripted_dispatcher();

		assert!(matches!(
			dispatcher.get("/user.json", Vec::<(String, String)>::new()).await,
			Err(Error::AuthorizationFailed { .. })
		));

		provider.set_credentials(Some(fresh_credentials()));
		transport.fail("dns");

		assert!(matches!(
			dispatcher.delete("/user.json").await,
			Err(Error::ConnectionFailed(_))
		));
	}

	#[test]
	fn empty_payloads_encode_to_nothing() {
		assert!(encode_body(Value::Null).expect("Null should encode.").is_empty());
		assert!(encode_body(serde_json::json!([])).expect("Arrays should encode.").is_empty());
		assert_eq!(
			encode_body(serde_json::json!({ "a": 1 })).expect("Objects should encode."),
			br#"{"a":1}"#.to_vec()
		);
	}
}
