//! Shared fixtures for end-to-end tests against an `httpmock` server.

#![allow(dead_code)]

// crates.io
use httpmock::MockServer;
// self
use fakturoid::{
	auth::{AuthType, Credentials},
	descriptor::ApiDescriptor,
	dispatcher::Dispatcher,
	flows::ReqwestAuthProvider,
	http::ReqwestTransport,
	url::Url,
};

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
// base64("client-id:client-secret")
pub const BASIC_AUTH: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";
pub const USER_AGENT: &str = "fakturoid-it (it@example.com)";

pub fn descriptor(server: &MockServer) -> ApiDescriptor {
	ApiDescriptor::builder()
		.base_url(Url::parse(&server.url("/api/v3")).expect("Mock base URL should parse successfully."))
		.user_agent(USER_AGENT)
		.build()
		.expect("Mock descriptor should build successfully.")
}

pub fn provider(server: &MockServer) -> ReqwestAuthProvider {
	ReqwestAuthProvider::builder(descriptor(server), CLIENT_ID, CLIENT_SECRET)
		.redirect_uri(
			Url::parse("https://client.example.com/callback")
				.expect("Redirect URI fixture should parse successfully."),
		)
		.build()
		.expect("Reqwest auth provider should build successfully.")
}

pub fn dispatcher(server: &MockServer, credentials: Credentials) -> Dispatcher<ReqwestTransport> {
	let provider = provider(server);

	provider.set_credentials(Some(credentials));

	Dispatcher::new(provider.into())
}

pub fn valid_credentials(auth_type: AuthType) -> Credentials {
	Credentials::issued(
		Some("refresh-token".into()),
		"access-token".into(),
		time::OffsetDateTime::now_utc(),
		3600,
		auth_type,
	)
	.expect("Fixture credentials should be valid.")
}

pub fn expired_credentials(auth_type: AuthType) -> Credentials {
	Credentials::new(
		Some("refresh-token".into()),
		Some("expired-access".into()),
		time::OffsetDateTime::now_utc() - time::Duration::seconds(5),
		auth_type,
	)
}
