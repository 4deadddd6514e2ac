//! API descriptor data structures shared by the auth provider and the dispatcher.
//!
//! A descriptor pins the API base URL, the OAuth endpoints derived from it, and the
//! `User-Agent` every request must carry. Build one with [`ApiDescriptor::builder`];
//! the builder validates URLs so flows never have to.

/// Builder API for assembling API descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://app.fakturoid.cz/api/v3";
/// Placeholder substituted with the configured account slug in resource paths.
pub const ACCOUNT_SLUG_PLACEHOLDER: &str = "{accountSlug}";

/// OAuth endpoints exposed by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
	/// Consent screen used by the Authorization Code flow.
	pub authorization: Url,
	/// Token endpoint used for every grant exchange.
	pub token: Url,
	/// Revocation endpoint for refresh tokens.
	pub revocation: Url,
}

/// Immutable API descriptor consumed by flows and the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDescriptor {
	/// Base URL resource paths are appended to (no trailing slash).
	pub base_url: Url,
	/// OAuth endpoint definitions.
	pub endpoints: ApiEndpoints,
	/// `User-Agent` header sent with every request.
	pub user_agent: String,
}
impl ApiDescriptor {
	/// Creates a new builder seeded with the production base URL.
	pub fn builder() -> ApiDescriptorBuilder {
		ApiDescriptorBuilder::new()
	}

	/// Joins a resource path onto the base URL without normalizing either side.
	pub fn resource_url(&self, path: &str) -> String {
		format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
	}
}
