//! Refresh token revocation for Authorization Code sessions.

// self
use crate::{
	_prelude::*,
	auth::AuthType,
	flows::AuthProvider,
	http::HttpTransport,
	obs::{self, FlowKind},
};

impl<T> AuthProvider<T>
where
	T: ?Sized + HttpTransport,
{
	/// Revokes the stored refresh token.
	///
	/// Only Authorization Code credentials can be revoked; anything else fails locally with
	/// [`Error::AuthorizationFailed`]. 4xx/5xx responses surface as
	/// [`Error::ClientError`]/[`Error::ServerError`]. Returns `true` iff the endpoint answered
	/// `200 OK`, in which case the live credentials are cleared.
	pub async fn revoke(&self) -> Result<bool> {
		obs::observe(FlowKind::Revoke, "revoke", async move {
			let credentials = self
				.credentials()
				.ok_or_else(|| Error::authorization_failed("Load authentication screen first"))?;

			if credentials.auth_type() != AuthType::AuthorizationCode {
				return Err(Error::authorization_failed(
					"Revoke is only available for authorization code flow",
				));
			}

			let refresh_token = credentials.refresh_token().map(|secret| secret.expose()).unwrap_or_default();
			let revoked = self.token_endpoint().revoke(refresh_token).await?;

			if revoked {
				let mut slot = self.credentials.write();

				if slot.as_ref().is_some_and(|live| Arc::ptr_eq(live, &credentials)) {
					*slot = None;
				}
			}

			Ok(revoked)
		})
		.await
	}
}
