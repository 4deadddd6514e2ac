// self
use crate::{
	_prelude::*,
	descriptor::{ApiDescriptor, ApiEndpoints, DEFAULT_BASE_URL},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DescriptorError {
	/// The base URL cannot be parsed.
	#[error("Base URL is invalid: {url}.")]
	InvalidBaseUrl {
		/// Offending URL text.
		url: String,
	},
	/// The base URL cannot carry a path (e.g. `mailto:`).
	#[error("Base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// Offending URL text.
		url: String,
	},
	/// The base URL must not carry a query or fragment.
	#[error("Base URL must not contain a query or fragment: {url}.")]
	UnexpectedQueryOrFragment {
		/// Offending URL text.
		url: String,
	},
	/// Endpoints must use HTTP(S).
	#[error("The {endpoint} endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The API rejects requests without a `User-Agent`.
	#[error("User agent must not be empty.")]
	EmptyUserAgent,
}

/// Builder for [`ApiDescriptor`] values.
#[derive(Debug)]
pub struct ApiDescriptorBuilder {
	/// Base URL (defaults to the production API root).
	pub base_url: Option<Url>,
	/// Optional override for the consent screen URL.
	pub authorization_endpoint: Option<Url>,
	/// Optional override for the token endpoint.
	pub token_endpoint: Option<Url>,
	/// Optional override for the revocation endpoint.
	pub revocation_endpoint: Option<Url>,
	/// `User-Agent` header value.
	pub user_agent: String,
}
impl ApiDescriptorBuilder {
	/// Creates a builder with production defaults.
	pub fn new() -> Self {
		Self {
			base_url: None,
			authorization_endpoint: None,
			token_endpoint: None,
			revocation_endpoint: None,
			user_agent: concat!("fakturoid-rs/", env!("CARGO_PKG_VERSION")).into(),
		}
	}

	/// Sets the base URL every endpoint derives from.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the authorization (consent screen) endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the revocation endpoint.
	pub fn revocation_endpoint(mut self, url: Url) -> Self {
		self.revocation_endpoint = Some(url);

		self
	}

	/// Sets the `User-Agent`; the API asks for an app name plus a contact address.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ApiDescriptor, DescriptorError> {
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(DEFAULT_BASE_URL)
				.map_err(|_| DescriptorError::InvalidBaseUrl { url: DEFAULT_BASE_URL.into() })?,
		};

		validate_base(&base_url)?;

		let derive = |suffix: &str| {
			let raw = format!("{}{suffix}", base_url.as_str().trim_end_matches('/'));

			Url::parse(&raw).map_err(|_| DescriptorError::InvalidBaseUrl { url: raw })
		};
		let endpoints = ApiEndpoints {
			authorization: match self.authorization_endpoint {
				Some(url) => url,
				None => derive("/oauth")?,
			},
			token: match self.token_endpoint {
				Some(url) => url,
				None => derive("/oauth/token")?,
			},
			revocation: match self.revocation_endpoint {
				Some(url) => url,
				None => derive("/oauth/revoke")?,
			},
		};
		let descriptor = ApiDescriptor { base_url, endpoints, user_agent: self.user_agent };

		descriptor.validate()?;

		Ok(descriptor)
	}
}
impl Default for ApiDescriptorBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ApiDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), DescriptorError> {
		validate_endpoint("base", &self.base_url)?;
		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("revocation", &self.endpoints.revocation)?;

		if self.user_agent.trim().is_empty() {
			return Err(DescriptorError::EmptyUserAgent);
		}

		Ok(())
	}
}

fn validate_base(url: &Url) -> Result<(), DescriptorError> {
	if url.cannot_be_a_base() {
		return Err(DescriptorError::CannotBeABase { url: url.to_string() });
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(DescriptorError::UnexpectedQueryOrFragment { url: url.to_string() });
	}

	Ok(())
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), DescriptorError> {
	match url.scheme() {
		"https" | "http" => Ok(()),
		_ => Err(DescriptorError::UnsupportedScheme { endpoint: name, url: url.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor test URL.")
	}

	#[test]
	fn defaults_target_production_api() {
		let descriptor = ApiDescriptor::builder().build().expect("Default descriptor should build.");

		assert_eq!(descriptor.base_url.as_str(), DEFAULT_BASE_URL);
		assert_eq!(
			descriptor.endpoints.authorization.as_str(),
			"https://app.fakturoid.cz/api/v3/oauth"
		);
		assert_eq!(descriptor.endpoints.token.as_str(), "https://app.fakturoid.cz/api/v3/oauth/token");
		assert_eq!(
			descriptor.endpoints.revocation.as_str(),
			"https://app.fakturoid.cz/api/v3/oauth/revoke"
		);
		assert!(descriptor.user_agent.starts_with("fakturoid-rs/"));
	}

	#[test]
	fn endpoints_follow_custom_base_and_overrides() {
		let descriptor = ApiDescriptor::builder()
			.base_url(url("http://127.0.0.1:8080/api/v3/"))
			.revocation_endpoint(url("https://auth.example.com/revoke"))
			.build()
			.expect("Descriptor with overrides should build.");

		assert_eq!(descriptor.endpoints.token.as_str(), "http://127.0.0.1:8080/api/v3/oauth/token");
		assert_eq!(descriptor.endpoints.revocation.as_str(), "https://auth.example.com/revoke");
		assert_eq!(
			descriptor.resource_url("/accounts/test/invoices.json"),
			"http://127.0.0.1:8080/api/v3/accounts/test/invoices.json"
		);
	}

	#[test]
	fn validation_rejects_bad_inputs() {
		let err = ApiDescriptor::builder()
			.base_url(url("ftp://files.example.com/api"))
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, DescriptorError::UnsupportedScheme { endpoint: "base", .. }));

		let err = ApiDescriptor::builder()
			.base_url(url("https://app.example.com/api?x=1"))
			.build()
			.expect_err("Base URLs with a query should be rejected.");

		assert!(matches!(err, DescriptorError::UnexpectedQueryOrFragment { .. }));

		let err = ApiDescriptor::builder()
			.user_agent("  ")
			.build()
			.expect_err("Blank user agents should be rejected.");

		assert_eq!(err, DescriptorError::EmptyUserAgent);
	}

	#[test]
	fn descriptor_round_trips_through_serde() {
		let descriptor = ApiDescriptor::builder()
			.user_agent("Acme Billing (ops@acme.test)")
			.build()
			.expect("Descriptor should build.");
		let payload = serde_json::to_string(&descriptor).expect("Descriptor should serialize.");
		let restored: ApiDescriptor =
			serde_json::from_str(&payload).expect("Descriptor should deserialize.");

		assert_eq!(restored, descriptor);
	}
}
