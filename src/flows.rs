//! OAuth 2.0 credential lifecycle owned by [`AuthProvider`].
//!
//! The provider runs the Authorization Code and Client Credentials grants, keeps the live
//! [`Credentials`] in memory, and renews them on demand through [`AuthProvider::re_auth`].
//! Every issued or refreshed token is pushed to the optional [`CredentialsCallback`] so
//! callers can persist it.

pub mod authorization_code;
pub mod refresh;

mod client_credentials;
mod revoke;

pub use authorization_code::*;
pub use refresh::*;

// std
use std::marker::PhantomData;
// self
use crate::{
	_prelude::*,
	auth::{AuthType, Credentials},
	descriptor::ApiDescriptor,
	http::HttpTransport,
	oauth::{ClientAuth, IssuedToken, TokenEndpoint, oauth2::AuthorizationCode},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Auth provider specialized for the crate's default reqwest transport.
pub type ReqwestAuthProvider = AuthProvider<ReqwestTransport>;

/// Hook invoked with the new [`Credentials`] every time a token is issued or refreshed.
pub trait CredentialsCallback
where
	Self: Send + Sync,
{
	/// Receives the freshly stored credentials.
	fn on_credentials(&self, credentials: &Credentials);
}
impl<F> CredentialsCallback for F
where
	F: Send + Sync + Fn(&Credentials),
{
	fn on_credentials(&self, credentials: &Credentials) {
		self(credentials)
	}
}

/// Builder returned by [`AuthProvider::builder`].
pub struct AuthProviderBuilder<T>
where
	T: ?Sized + HttpTransport,
{
	descriptor: ApiDescriptor,
	client: ClientAuth,
	redirect_uri: Option<Url>,
	callback: Option<Arc<dyn CredentialsCallback>>,
	credentials: Option<Credentials>,
	_transport: PhantomData<fn() -> Arc<T>>,
}
impl<T> AuthProviderBuilder<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sets the redirect URI registered for the Authorization Code flow.
	pub fn redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Installs the hook notified after every token issuance.
	pub fn credentials_callback(mut self, callback: impl 'static + CredentialsCallback) -> Self {
		self.callback = Some(Arc::new(callback));

		self
	}

	/// Seeds the provider with previously persisted credentials.
	pub fn credentials(mut self, credentials: Credentials) -> Self {
		self.credentials = Some(credentials);

		self
	}

	/// Finalizes the provider over a caller-supplied transport.
	pub fn build_with_transport(self, http_client: Arc<T>) -> AuthProvider<T> {
		AuthProvider {
			descriptor: self.descriptor,
			client: self.client,
			redirect_uri: self.redirect_uri,
			http_client,
			credentials: RwLock::new(self.credentials.map(Arc::new)),
			pending_code: Mutex::new(None),
			callback: RwLock::new(self.callback),
			refresh_metrics: Default::default(),
			reauth_guard: AsyncMutex::new(()),
		}
	}
}
#[cfg(feature = "reqwest")]
impl AuthProviderBuilder<ReqwestTransport> {
	/// Finalizes the provider over a fresh [`ReqwestTransport`].
	pub fn build(self) -> Result<ReqwestAuthProvider> {
		let transport = ReqwestTransport::new()?;

		Ok(self.build_with_transport(Arc::new(transport)))
	}
}
impl<T> Debug for AuthProviderBuilder<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthProviderBuilder")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client.client_id())
			.field("redirect_uri", &self.redirect_uri)
			.field("callback_set", &self.callback.is_some())
			.finish()
	}
}

/// Owns the OAuth 2.0 flows and the live [`Credentials`] for one API client.
///
/// Share it behind an [`Arc`] with a [`Dispatcher`](crate::dispatcher::Dispatcher); the
/// credentials slot is only ever replaced wholesale, so readers always observe a complete
/// token set.
pub struct AuthProvider<T>
where
	T: ?Sized + HttpTransport,
{
	descriptor: ApiDescriptor,
	client: ClientAuth,
	redirect_uri: Option<Url>,
	http_client: Arc<T>,
	credentials: RwLock<Option<Arc<Credentials>>>,
	pending_code: Mutex<Option<AuthorizationCode>>,
	callback: RwLock<Option<Arc<dyn CredentialsCallback>>>,
	refresh_metrics: Arc<RefreshMetrics>,
	reauth_guard: AsyncMutex<()>,
}
impl<T> AuthProvider<T>
where
	T: ?Sized + HttpTransport,
{
	/// Starts configuring a provider for the given API and confidential client.
	///
	/// The transport type is fixed by the final build call, so
	/// `ReqwestAuthProvider::builder(..).build()` and
	/// `AuthProvider::builder(..).build_with_transport(transport)` both infer it.
	pub fn builder(
		descriptor: ApiDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> AuthProviderBuilder<T> {
		AuthProviderBuilder {
			descriptor,
			client: ClientAuth::new(client_id, client_secret),
			redirect_uri: None,
			callback: None,
			credentials: None,
			_transport: PhantomData,
		}
	}

	/// API descriptor shared with the dispatcher.
	pub fn descriptor(&self) -> &ApiDescriptor {
		&self.descriptor
	}

	/// Transport used for every outbound request.
	pub fn http_client(&self) -> &Arc<T> {
		&self.http_client
	}

	/// OAuth client identifier.
	pub fn client_id(&self) -> &str {
		self.client.client_id()
	}

	/// Redirect URI sent with Authorization Code requests, if configured.
	pub fn redirect_uri(&self) -> Option<&Url> {
		self.redirect_uri.as_ref()
	}

	/// Counters for renewals performed by [`AuthProvider::refresh`] and [`AuthProvider::re_auth`].
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Current credentials, if any have been issued or loaded.
	pub fn credentials(&self) -> Option<Arc<Credentials>> {
		self.credentials.read().clone()
	}

	/// Replaces (or clears) the live credentials without notifying the callback.
	pub fn set_credentials(&self, credentials: Option<Credentials>) {
		*self.credentials.write() = credentials.map(Arc::new);
	}

	/// Installs or replaces the credential-change hook.
	pub fn set_credentials_callback(&self, callback: impl 'static + CredentialsCallback) {
		*self.callback.write() = Some(Arc::new(callback));
	}

	/// Removes the credential-change hook.
	pub fn clear_credentials_callback(&self) {
		*self.callback.write() = None;
	}

	/// Obtains credentials for `flow`.
	///
	/// Supplied `existing` credentials are adopted as-is without contacting the token endpoint.
	/// Otherwise the Authorization Code flow exchanges the code stored by
	/// [`AuthProvider::load_code`] and the Client Credentials flow exchanges the client pair.
	pub async fn authenticate(
		&self,
		flow: AuthType,
		existing: Option<Credentials>,
	) -> Result<Arc<Credentials>> {
		if let Some(credentials) = existing {
			let credentials = Arc::new(credentials);

			*self.credentials.write() = Some(credentials.clone());

			return Ok(credentials);
		}

		match flow {
			AuthType::AuthorizationCode => self.exchange_authorization_code().await,
			AuthType::ClientCredentials => self.exchange_client_credentials().await,
		}
	}

	fn token_endpoint(&self) -> TokenEndpoint<'_, T> {
		TokenEndpoint {
			descriptor: &self.descriptor,
			client: &self.client,
			transport: self.http_client.as_ref(),
		}
	}

	/// Stores freshly issued credentials and notifies the callback.
	fn commit(
		&self,
		issued: IssuedToken,
		refresh_token: Option<String>,
		auth_type: AuthType,
	) -> Result<Arc<Credentials>> {
		let credentials = Arc::new(Credentials::issued(
			refresh_token,
			issued.access_token,
			OffsetDateTime::now_utc(),
			issued.expires_in,
			auth_type,
		)?);

		*self.credentials.write() = Some(credentials.clone());

		let callback = self.callback.read().clone();

		if let Some(callback) = callback {
			callback.on_credentials(&credentials);
		}

		Ok(credentials)
	}
}
impl<T> Debug for AuthProvider<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthProvider")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client.client_id())
			.field("redirect_uri", &self.redirect_uri)
			.field("credentials", &self.credentials.read())
			.field("code_loaded", &self.pending_code.lock().is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::_preludet::*;

	#[tokio::test]
	async fn authenticate_adopts_existing_credentials_without_network() {
		let (provider, transport) = build_scripted_provider();
		let existing = Credentials::new(
			Some("refresh".into()),
			Some("access".into()),
			macros::datetime!(2099-01-01 00:00 UTC),
			AuthType::AuthorizationCode,
		);
		let adopted = provider
			.authenticate(AuthType::ClientCredentials, Some(existing.clone()))
			.await
			.expect("Existing credentials should be adopted.");

		assert_eq!(*adopted, existing);
		assert_eq!(provider.credentials().as_deref(), Some(&existing));
		assert_eq!(transport.request_count(), 0);
	}

	#[tokio::test]
	async fn callback_receives_every_issued_token() {
		let (provider, transport) = build_scripted_provider();
		let calls = Arc::new(AtomicUsize::new(0));
		let seen = calls.clone();

		provider.set_credentials_callback(move |credentials: &Credentials| {
			assert!(credentials.has_access_token());

			seen.fetch_add(1, Ordering::SeqCst);
		});
		transport.respond_token("first", None, 3600).respond_token("second", None, 3600);

		provider
			.authenticate(AuthType::ClientCredentials, None)
			.await
			.expect("First exchange should succeed.");
		provider
			.authenticate(AuthType::ClientCredentials, None)
			.await
			.expect("Second exchange should succeed.");

		assert_eq!(calls.load(Ordering::SeqCst), 2);

		provider.clear_credentials_callback();
		provider.set_credentials(None);

		assert!(provider.credentials().is_none());
	}

	#[test]
	fn debug_output_hides_secrets() {
		let (provider, _) = build_scripted_provider();

		provider.load_code("code-secret");

		let rendered = format!("{provider:?}");

		assert!(rendered.contains("code_loaded: true"));
		assert!(!rendered.contains("code-secret"));
		assert!(!rendered.contains(TEST_CLIENT_SECRET));
	}
}
