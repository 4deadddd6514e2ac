//! Credential models: grant-type tags, issued credentials, and redacted secrets.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
