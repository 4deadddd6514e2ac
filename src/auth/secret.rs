//! Access and refresh token strings that never reach logs in clear text.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	oauth::http::{self, HeaderValue},
};

const REDACTED: &str = "<redacted>";

/// Bearer or refresh token issued by the Fakturoid token endpoint.
///
/// `Debug` and `Display` print a placeholder. Serialization keeps the raw string so
/// [`Credentials::to_json`](crate::auth::Credentials::to_json) round-trips.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a raw token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token text.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether the token string is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Builds an `Authorization: Bearer <token>` value flagged as sensitive, so `http`
	/// formatters hide it too.
	pub fn bearer_header(&self) -> Result<HeaderValue> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", self.0))
			.map_err(|e| ConfigError::from(http::Error::from(e)))?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({REDACTED})")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
