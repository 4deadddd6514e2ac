//! Client-level error types shared across flows, the dispatcher, and transports.

// self
use crate::{
	_prelude::*,
	descriptor::DescriptorError,
	dispatcher::Response,
	http::HttpRequest,
	oauth::http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION},
};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem detected before any network I/O.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credentials are missing or invalid, or an OAuth exchange failed.
	#[error("Authorization failed: {reason}.")]
	AuthorizationFailed {
		/// Human-readable reason, including the underlying message when wrapped.
		reason: String,
		/// Lower-level failure that caused the authorization error, if any.
		#[source]
		source: Option<BoxError>,
	},
	/// The transport could not deliver the request.
	#[error("Connection failed: {0}")]
	ConnectionFailed(#[source] TransportError),
	/// A payload could not be encoded to or decoded from JSON.
	#[error("Invalid data: {source}.")]
	InvalidData {
		/// Underlying serde failure.
		#[source]
		source: serde_json::Error,
	},
	/// A response advertised JSON but its body could not be parsed.
	#[error("Invalid JSON response at `{}`: {}.", .source.path(), .source.inner())]
	InvalidResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The API answered with a 4xx status.
	#[error("Client error {}: {}.", .0.status().as_u16(), .0.reason_phrase())]
	ClientError(Box<RequestFailure>),
	/// The API answered with a 5xx status.
	#[error("Server error {}: {}.", .0.status().as_u16(), .0.reason_phrase())]
	ServerError(Box<RequestFailure>),
}
impl Error {
	/// Builds an [`Error::AuthorizationFailed`] without an underlying cause.
	pub fn authorization_failed(reason: impl Into<String>) -> Self {
		Self::AuthorizationFailed { reason: reason.into(), source: None }
	}

	/// Builds an [`Error::AuthorizationFailed`] wrapping the provided cause.
	pub fn authorization_failed_with(
		reason: impl Into<String>,
		source: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::AuthorizationFailed { reason: reason.into(), source: Some(Box::new(source)) }
	}

	/// Returns the HTTP status for classified request failures.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::ClientError(failure) | Self::ServerError(failure) => Some(failure.status()),
			_ => None,
		}
	}

	/// Returns the request/response pair for classified request failures.
	pub fn request_failure(&self) -> Option<&RequestFailure> {
		match self {
			Self::ClientError(failure) | Self::ServerError(failure) => Some(failure),
			_ => None,
		}
	}

	/// Classifies a 4xx/5xx response into [`Error::ClientError`]/[`Error::ServerError`].
	///
	/// Returns the response untouched when the status is neither.
	pub(crate) fn classify_status(
		request: RequestSnapshot,
		response: Response,
	) -> Result<Response> {
		let status = response.status();

		if status.is_client_error() {
			Err(Self::ClientError(Box::new(RequestFailure { request, response })))
		} else if status.is_server_error() {
			Err(Self::ServerError(Box::new(RequestFailure { request, response })))
		} else {
			Ok(response)
		}
	}
}
impl From<TransportError> for Error {
	fn from(e: TransportError) -> Self {
		Self::ConnectionFailed(e)
	}
}

/// Configuration and validation failures raised before any request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A path required the account slug but none was configured.
	#[error("Account slug is not set. You must set it before calling this method.")]
	MissingAccountSlug,
	/// API descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] DescriptorError),
	/// A request URL could not be assembled.
	#[error("Request URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request: {source}")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request: {0}")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Request/response pair carried by [`Error::ClientError`] and [`Error::ServerError`].
pub struct RequestFailure {
	/// Request that produced the failing response.
	pub request: RequestSnapshot,
	/// Wrapped failing response.
	pub response: Response,
}
impl RequestFailure {
	/// HTTP status of the failing response.
	pub fn status(&self) -> StatusCode {
		self.response.status()
	}

	/// Canonical reason phrase for the status, or an empty string for unknown codes.
	pub fn reason_phrase(&self) -> &'static str {
		self.status().canonical_reason().unwrap_or_default()
	}
}
impl Debug for RequestFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestFailure")
			.field("request", &self.request)
			.field("status", &self.response.status())
			.finish()
	}
}

/// Owned copy of the request that was sent, kept for inspection after a failure.
#[derive(Clone)]
pub struct RequestSnapshot {
	/// HTTP method.
	pub method: Method,
	/// Fully-resolved request URL.
	pub url: String,
	/// Request headers, including `Authorization`.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Vec<u8>,
}
impl From<&HttpRequest> for RequestSnapshot {
	fn from(request: &HttpRequest) -> Self {
		Self {
			method: request.method().clone(),
			url: request.uri().to_string(),
			headers: request.headers().clone(),
			body: request.body().clone(),
		}
	}
}
impl Debug for RequestSnapshot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let value = if name == AUTHORIZATION {
					"<redacted>"
				} else {
					value.to_str().unwrap_or("<binary>")
				};

				(name.as_str(), value)
			})
			.collect::<Vec<_>>();

		f.debug_struct("RequestSnapshot")
			.field("method", &self.method)
			.field("url", &self.url)
			.field("headers", &headers)
			.field("body_len", &self.body.len())
			.finish()
	}
}
