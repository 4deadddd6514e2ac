//! Client Credentials flow: a stateless exchange of the client pair for an app-only token.

// self
use crate::{
	_prelude::*,
	auth::{AuthType, Credentials},
	flows::AuthProvider,
	http::HttpTransport,
	oauth::GrantType,
	obs::{self, FlowKind},
};

impl<T> AuthProvider<T>
where
	T: ?Sized + HttpTransport,
{
	pub(super) async fn exchange_client_credentials(&self) -> Result<Arc<Credentials>> {
		obs::observe(FlowKind::ClientCredentials, "exchange_client_credentials", async move {
			let issued =
				self.token_endpoint().exchange(GrantType::ClientCredentials, Vec::new()).await?;
			let refresh_token = issued.refresh_token.clone();

			self.commit(issued, refresh_token, AuthType::ClientCredentials)
		})
		.await
	}
}
