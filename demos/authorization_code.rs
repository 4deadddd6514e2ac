//! Walks through the authorization-code flow: consent URL, code exchange, persisting the
//! issued credentials as JSON, and revoking the session.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use fakturoid::{auth::Credentials, descriptor::ApiDescriptor, flows::ReqwestAuthProvider, url::Url};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v3/oauth/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"user-access\",\"refresh_token\":\"user-refresh\",\"expires_in\":7200}",
			);
		})
		.await;
	let revoke_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v3/oauth/revoke");
			then.status(200);
		})
		.await;
	let descriptor = ApiDescriptor::builder()
		.base_url(Url::parse(&server.url("/api/v3"))?)
		.user_agent("fakturoid-demo (demo@example.com)")
		.build()?;
	let provider = ReqwestAuthProvider::builder(descriptor, "demo-client", "demo-secret")
		.redirect_uri(Url::parse("https://demo.example.com/callback")?)
		.build()?;
	let session = provider.start_authorization();

	println!("Send the user to {}.", session.authorization_url);

	// The redirect handler receives `code` and `state` query parameters.
	session.validate_state(&session.state)?;

	let credentials = provider.request_credentials("code-from-redirect").await?;
	let stored = credentials.to_json()?;

	println!("Persist this JSON: {stored}.");

	provider.set_credentials(Some(Credentials::from_json(&stored)?));

	println!("Revoked: {}.", provider.revoke().await?);

	token_mock.assert_async().await;
	revoke_mock.assert_async().await;

	Ok(())
}
