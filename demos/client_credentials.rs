//! Demonstrates the client-credentials flow and an account-scoped request with the default
//! reqwest transport against a local mock of the API.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use fakturoid::{
	auth::AuthType, descriptor::ApiDescriptor, dispatcher::Dispatcher,
	flows::ReqwestAuthProvider, url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v3/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":7200}",
			);
		})
		.await;
	let invoices_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v3/accounts/demo/invoices.json")
				.header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"number\":\"2024-0001\",\"total\":\"1210.0\"}]");
		})
		.await;
	let descriptor = ApiDescriptor::builder()
		.base_url(Url::parse(&server.url("/api/v3"))?)
		.user_agent("fakturoid-demo (demo@example.com)")
		.build()?;
	let provider = Arc::new(
		ReqwestAuthProvider::builder(descriptor, "demo-client", "demo-secret")
			.credentials_callback(|credentials: &fakturoid::auth::Credentials| {
				println!("Issued token expiring at {}.", credentials.expire_at());
			})
			.build()?,
	);

	provider.authenticate(AuthType::ClientCredentials, None).await?;

	let dispatcher = Dispatcher::new(provider).with_account_slug("demo");
	let response = dispatcher.get("/accounts/{accountSlug}/invoices.json", [("page", "1")]).await?;

	println!("Invoices ({}): {:?}.", response.status_code(), response.body()?);

	token_mock.assert_async().await;
	invoices_mock.assert_async().await;

	Ok(())
}
