//! Wrapper normalizing raw transport responses.

// std
use std::borrow::Cow;
// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	http::HttpResponse,
	oauth::http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
};

/// Interpreted response body returned by [`Response::body`].
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	/// Raw text for non-JSON content types.
	Text(String),
	/// Parsed JSON document.
	Json(Value),
}

/// Status, headers, and raw body of a completed request.
#[derive(Clone, Debug)]
pub struct Response {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl Response {
	/// HTTP status.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Numeric HTTP status code.
	pub fn status_code(&self) -> u16 {
		self.status.as_u16()
	}

	/// Case-insensitive header lookup; repeated headers are joined with `", "`.
	pub fn header(&self, name: &str) -> Option<String> {
		let values = self
			.headers
			.get_all(name)
			.iter()
			.map(|value| String::from_utf8_lossy(value.as_bytes()))
			.collect::<Vec<_>>();

		if values.is_empty() { None } else { Some(values.join(", ")) }
	}

	/// All response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.body
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Returns `true` when `Content-Type` advertises `application/json`.
	pub fn is_json(&self) -> bool {
		self.header(CONTENT_TYPE.as_str()).is_some_and(|value| value.contains("application/json"))
	}

	/// Interprets the body.
	///
	/// Empty bodies (e.g. `304 Not Modified`) yield `None` whatever the declared content type.
	/// JSON content types are parsed, anything else is returned as text.
	pub fn body(&self) -> Result<Option<ResponseBody>> {
		if self.body.is_empty() {
			return Ok(None);
		}
		if !self.is_json() {
			return Ok(Some(ResponseBody::Text(self.text().into_owned())));
		}

		self.decode().map(|value| Some(ResponseBody::Json(value)))
	}

	/// Decodes the body into `D`, reporting the failing JSON path on error.
	pub fn json<D>(&self) -> Result<D>
	where
		D: DeserializeOwned,
	{
		self.decode()
	}

	/// Decodes the body as a JSON object.
	///
	/// Empty bodies and bodies without a JSON content type yield `None`, mirroring [`Self::body`].
	pub fn body_map(&self) -> Result<Option<Map<String, Value>>> {
		if self.body.is_empty() || !self.is_json() {
			return Ok(None);
		}

		self.decode().map(Some)
	}

	fn decode<D>(&self) -> Result<D>
	where
		D: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::InvalidResponse { source })
	}
}
impl From<HttpResponse> for Response {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}
}
