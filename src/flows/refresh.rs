//! Refresh and re-authentication with a single-flight guard.
//!
//! [`AuthProvider::re_auth`] is the "ensure valid" entry point the dispatcher calls before
//! every request. Fresh credentials are returned untouched. Expired ones are renewed while
//! holding the provider's guard, and callers that queued behind an in-flight renewal re-check
//! the slot and reuse its result instead of exchanging again.

mod metrics;

pub use metrics::{RefreshMetrics, RefreshStats};

// self
use crate::{
	_prelude::*,
	auth::{AuthType, Credentials},
	flows::AuthProvider,
	http::HttpTransport,
	oauth::GrantType,
	obs::{self, FlowKind, FlowOutcome},
};

impl<T> AuthProvider<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges the stored refresh token for a new access token.
	///
	/// Returns `Ok(None)` when no credentials are held. The current refresh token is kept
	/// when the server omits one from the response.
	pub async fn refresh(&self) -> Result<Option<Arc<Credentials>>> {
		let _singleflight = self.reauth_guard.lock().await;
		let Some(current) = self.credentials() else {
			return Ok(None);
		};

		self.tracked(self.refresh_from(&current)).await.map(Some)
	}

	/// Ensures the live credentials are usable, renewing them when expired.
	///
	/// Fails with [`Error::AuthorizationFailed`] when no credentials are held, the access token
	/// is empty, or Authorization Code credentials lack a refresh token. Non-expired credentials
	/// are returned as the same [`Arc`] without any network call.
	pub async fn re_auth(&self) -> Result<Arc<Credentials>> {
		let current = self.usable_credentials()?;

		if !current.is_expired() {
			return Ok(current);
		}

		let _singleflight = self.reauth_guard.lock().await;
		let current = self.usable_credentials()?;

		if !current.is_expired() {
			return Ok(current);
		}

		self.tracked(async {
			match current.auth_type() {
				AuthType::AuthorizationCode => self.refresh_from(&current).await,
				AuthType::ClientCredentials => self.exchange_client_credentials().await,
			}
		})
		.await
	}

	fn usable_credentials(&self) -> Result<Arc<Credentials>> {
		self.credentials()
			.filter(|credentials| {
				credentials.has_access_token()
					&& (credentials.has_refresh_token()
						|| !credentials.auth_type().requires_refresh_token())
			})
			.ok_or_else(|| Error::authorization_failed("Invalid credentials"))
	}

	async fn tracked<F>(&self, renewal: F) -> Result<Arc<Credentials>>
	where
		F: Future<Output = Result<Arc<Credentials>>>,
	{
		self.refresh_metrics.record(FlowOutcome::Attempt);

		let result = renewal.await;

		self.refresh_metrics.record(FlowOutcome::of(&result));

		result
	}

	async fn refresh_from(&self, current: &Credentials) -> Result<Arc<Credentials>> {
		obs::observe(FlowKind::Refresh, "refresh", async move {
			let refresh_token = current
				.refresh_token()
				.filter(|secret| !secret.is_empty())
				.map(|secret| secret.expose().to_owned())
				.ok_or_else(|| {
					Error::authorization_failed(
						"Error occurred while refreshing token. Message: refresh token is missing",
					)
				})?;
			let issued = self
				.token_endpoint()
				.exchange(GrantType::RefreshToken, vec![(
					"refresh_token",
					refresh_token.as_str().into(),
				)])
				.await?;
			let rotated = issued.refresh_token.clone().filter(|token| !token.is_empty());

			self.commit(issued, Some(rotated.unwrap_or(refresh_token)), AuthType::AuthorizationCode)
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::Value;
	// self
	use super::*;
	use crate::_preludet::*;

	fn expired(auth_type: AuthType, refresh: Option<&str>) -> Credentials {
		Credentials::new(
			refresh.map(Into::into),
			Some("stale-access".into()),
			OffsetDateTime::now_utc() - Duration::seconds(1),
			auth_type,
		)
	}

	#[tokio::test]
	async fn refresh_without_credentials_is_a_noop() {
		let (provider, transport) = build_scripted_provider();

		assert!(provider.refresh().await.expect("Refresh without credentials should succeed.").is_none());
		assert_eq!(transport.request_count(), 0);
	}

	#[tokio::test]
	async fn refresh_keeps_refresh_token_when_omitted() {
		let (provider, transport) = build_scripted_provider();

		provider.set_credentials(Some(expired(AuthType::AuthorizationCode, Some("keep-me"))));
		transport.respond_token("fresh-access", None, 3600);

		let refreshed = provider
			.re_auth()
			.await
			.expect("Expired authorization code credentials should refresh.");

		assert_eq!(refreshed.access_token().map(|t| t.expose()), Some("fresh-access"));
		assert_eq!(refreshed.refresh_token().map(|t| t.expose()), Some("keep-me"));
		assert_eq!(transport.request_count(), 1);

		let body = serde_json::from_slice::<Value>(transport.requests()[0].body())
			.expect("Refresh body should be JSON.");

		assert_eq!(body, serde_json::json!({ "grant_type": "refresh_token", "refresh_token": "keep-me" }));
		assert_eq!(provider.refresh_metrics().attempts(), 1);
		assert_eq!(provider.refresh_metrics().successes(), 1);
	}

	#[tokio::test]
	async fn refresh_adopts_rotated_refresh_token() {
		let (provider, transport) = build_scripted_provider();

		provider.set_credentials(Some(expired(AuthType::AuthorizationCode, Some("old"))));
		transport.respond_token("fresh-access", Some("new"), 3600);

		let refreshed = provider
			.refresh()
			.await
			.expect("Refresh should succeed.")
			.expect("Refresh should yield credentials.");

		assert_eq!(refreshed.refresh_token().map(|t| t.expose()), Some("new"));
	}

	#[tokio::test]
	async fn re_auth_returns_same_credentials_while_fresh() {
		let (provider, transport) = build_scripted_provider();

		provider.set_credentials(Some(Credentials::issued(
			Some("refresh".into()),
			"access".into(),
			OffsetDateTime::now_utc(),
			3600,
			AuthType::AuthorizationCode,
		)
		.expect("Fixture credentials should be valid.")));

		let before = provider.credentials().expect("Credentials should be set.");
		let after = provider.re_auth().await.expect("Fresh credentials should pass.");

		assert!(Arc::ptr_eq(&before, &after));
		assert_eq!(transport.request_count(), 0);
		assert_eq!(provider.refresh_metrics().attempts(), 0);
	}

	#[tokio::test]
	async fn re_auth_reruns_client_credentials_exchange() {
		let (provider, transport) = build_scripted_provider();

		provider.set_credentials(Some(expired(AuthType::ClientCredentials, None)));
		transport.respond_token("renewed", None, 3600);

		let renewed = provider.re_auth().await.expect("Client credentials should be re-issued.");

		assert_eq!(renewed.access_token().map(|t| t.expose()), Some("renewed"));

		let body = serde_json::from_slice::<Value>(transport.requests()[0].body())
			.expect("Token request body should be JSON.");

		assert_eq!(body["grant_type"], "client_credentials");
	}

	#[tokio::test]
	async fn re_auth_rejects_unusable_credentials() {
		let (provider, transport) = build_scripted_provider();

		for credentials in [
			None,
			Some(Credentials::new(
				Some("refresh".into()),
				None,
				OffsetDateTime::now_utc() + Duration::hours(1),
				AuthType::AuthorizationCode,
			)),
			Some(Credentials::new(
				None,
				Some("access".into()),
				OffsetDateTime::now_utc() + Duration::hours(1),
				AuthType::AuthorizationCode,
			)),
		] {
			provider.set_credentials(credentials);

			let err = provider.re_auth().await.expect_err("Unusable credentials should fail.");

			assert_eq!(err.to_string(), "Authorization failed: Invalid credentials.");
		}

		assert_eq!(transport.request_count(), 0);
	}

	#[tokio::test]
	async fn failed_refresh_is_counted_and_keeps_old_credentials() {
		let (provider, transport) = build_scripted_provider();

		provider.set_credentials(Some(expired(AuthType::AuthorizationCode, Some("refresh"))));
		transport.respond_json(401, r#"{"error":"invalid_grant"}"#);

		let err = provider.re_auth().await.expect_err("Rejected refresh should fail.");

		assert_eq!(err.to_string(), "Authorization failed: Error occurred. Message: Unauthorized.");
		assert_eq!(provider.refresh_metrics().failures(), 1);
		assert_eq!(
			provider.credentials().and_then(|c| c.access_token().map(|t| t.expose().to_owned())),
			Some("stale-access".into())
		);
	}
}
