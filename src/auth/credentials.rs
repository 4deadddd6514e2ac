//! Issued credentials, grant-type tags, and expiry bookkeeping.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// OAuth 2.0 flow that produced a set of [`Credentials`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
	/// Interactive, user-delegated Authorization Code flow.
	AuthorizationCode,
	/// Machine-to-machine Client Credentials flow.
	ClientCredentials,
}
impl AuthType {
	/// Returns the wire identifier for the flow.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthType::AuthorizationCode => "authorization_code",
			AuthType::ClientCredentials => "client_credentials",
		}
	}

	/// Returns `true` when credentials of this type must carry a refresh token.
	pub const fn requires_refresh_token(self) -> bool {
		matches!(self, AuthType::AuthorizationCode)
	}
}
impl Display for AuthType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for AuthType {
	type Err = AuthTypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"authorization_code" => Ok(AuthType::AuthorizationCode),
			"client_credentials" => Ok(AuthType::ClientCredentials),
			other => Err(AuthTypeError { value: other.to_owned() }),
		}
	}
}

/// Error returned when parsing an unknown [`AuthType`] tag.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Invalid auth type value: {value}.")]
pub struct AuthTypeError {
	/// Rejected input.
	pub value: String,
}

/// Access/refresh token pair issued by the token endpoint.
///
/// The expiry instant already includes [`Credentials::EXPIRY_MARGIN`], so
/// [`Credentials::is_expired`] flips shortly before the upstream token dies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
	refresh_token: Option<TokenSecret>,
	access_token: Option<TokenSecret>,
	#[serde(with = "expire_at_format")]
	expire_at: OffsetDateTime,
	auth_type: AuthType,
}
impl Credentials {
	/// Safety margin subtracted from the server-reported lifetime.
	pub const EXPIRY_MARGIN: Duration = Duration::seconds(10);

	/// Creates credentials from already-known values (e.g. restored from storage).
	pub fn new(
		refresh_token: Option<String>,
		access_token: Option<String>,
		expire_at: OffsetDateTime,
		auth_type: AuthType,
	) -> Self {
		Self {
			refresh_token: refresh_token.map(TokenSecret::new),
			access_token: access_token.map(TokenSecret::new),
			expire_at,
			auth_type,
		}
	}

	/// Creates credentials for a token issued at `issued_at` with a lifetime of `expires_in`
	/// seconds.
	///
	/// Lifetimes that are not positive or push the expiry past the representable range are
	/// rejected as an invalid token response.
	pub fn issued(
		refresh_token: Option<String>,
		access_token: String,
		issued_at: OffsetDateTime,
		expires_in: i64,
		auth_type: AuthType,
	) -> Result<Self> {
		let expire_at = Some(expires_in)
			.filter(|seconds| *seconds > 0)
			.and_then(|seconds| issued_at.checked_add(Duration::seconds(seconds)))
			.and_then(|instant| instant.checked_sub(Self::EXPIRY_MARGIN))
			.ok_or_else(|| {
				Error::authorization_failed(format!(
					"An error occurred while {auth_type} flow. Message: invalid response"
				))
			})?;

		Ok(Self::new(refresh_token, Some(access_token), expire_at, auth_type))
	}

	/// Refresh token, if the flow issued one.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref()
	}

	/// Access token used as the bearer credential.
	pub fn access_token(&self) -> Option<&TokenSecret> {
		self.access_token.as_ref()
	}

	/// Instant after which the credentials are considered expired.
	pub fn expire_at(&self) -> OffsetDateTime {
		self.expire_at
	}

	/// Flow that produced these credentials.
	pub fn auth_type(&self) -> AuthType {
		self.auth_type
	}

	/// Reassigns the flow tag, e.g. when resuming credentials whose origin is unknown.
	pub fn set_auth_type(&mut self, auth_type: AuthType) {
		self.auth_type = auth_type;
	}

	/// Returns `true` if the credentials are expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expire_at
	}

	/// Returns `true` if the credentials are expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` when the access token is present and non-empty.
	pub fn has_access_token(&self) -> bool {
		self.access_token.as_ref().is_some_and(|secret| !secret.is_empty())
	}

	/// Returns `true` when the refresh token is present and non-empty.
	pub fn has_refresh_token(&self) -> bool {
		self.refresh_token.as_ref().is_some_and(|secret| !secret.is_empty())
	}

	/// Serializes the credentials for external persistence.
	pub fn to_json(&self) -> Result<String> {
		serde_json::to_string(self).map_err(|source| Error::InvalidData { source })
	}

	/// Restores credentials previously produced by [`Credentials::to_json`].
	pub fn from_json(payload: &str) -> Result<Self> {
		serde_json::from_str(payload).map_err(|source| Error::InvalidData { source })
	}
}

mod expire_at_format {
	// crates.io
	use serde::{Deserializer, Serializer, de::Error as _, ser::Error as _};
	use time::{
		format_description::{BorrowedFormatItem, well_known::Rfc3339},
		macros::format_description,
	};
	// self
	use crate::_prelude::*;

	const FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
		"[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
	);

	pub(super) fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let text = value.format(FORMAT).map_err(S::Error::custom)?;

		serializer.serialize_str(&text)
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		let text = String::deserialize(deserializer)?;

		OffsetDateTime::parse(&text, FORMAT)
			.or_else(|_| OffsetDateTime::parse(&text, &Rfc3339))
			.map_err(D::Error::custom)
	}
}
