//! Conversion from a settled [`HandlerResponse`] to `http` types.
//!
//! Lets a host hand the adapter's result straight to hyper or any other
//! `http`-based server.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};

use crate::response::HandlerResponse;

/// Convert a status code from u16, falling back to 500 when out of range.
pub fn status_from_u16(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl HandlerResponse {
    /// Build an `http::Response` from this result.
    ///
    /// Headers with names or values that are not valid on the wire are
    /// skipped. Structured bodies are serialized as compact JSON.
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(Bytes::from(self.body.to_string()));
        *response.status_mut() = status_from_u16(self.status);

        let headers = response.headers_mut();
        for header in self.headers.into_vec() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(header.name.as_bytes()),
                HeaderValue::from_str(&header.value),
            ) {
                headers.insert(name, value);
            }
        }
        response
    }
}

impl From<HandlerResponse> for http::Response<Bytes> {
    fn from(response: HandlerResponse) -> Self {
        response.into_http()
    }
}
