//! HTTP Transport Utilities
//!
//! Response builders used by the dispatcher. Every builder produces a
//! `Response<Full<Bytes>>`, so handlers never touch streaming bodies.
//!
//! # Example
//!
//! ```
//! use dwr_common::transport::http::{mime, HttpTransport};
//! use hyper::StatusCode;
//!
//! let response = HttpTransport::text(StatusCode::OK, mime::PLAIN, "hello");
//! assert_eq!(response.status(), StatusCode::OK);
//! ```

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Request, Response, StatusCode};

/// Type alias for Hyper incoming requests
pub type HyperRequest = Request<Incoming>;

/// Type alias for Hyper responses with full body
pub type HyperResponse = Response<Full<Bytes>>;

/// Content types the bridge answers with.
pub mod mime {
    pub const PLAIN: &str = "text/plain";
    pub const HTML: &str = "text/html";
    pub const JS: &str = "text/javascript";
}

/// HTTP response helpers
pub struct HttpTransport;

impl HttpTransport {
    /// Build a response with the given status, content type and body.
    pub fn text(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> HyperResponse {
        let mut response = Response::new(Full::new(body.into()));
        *response.status_mut() = status;
        Self::set_header(&mut response, CONTENT_TYPE, content_type);
        response
    }

    /// A `302 Found` pointing the browser at `location`.
    pub fn redirect(location: &str) -> HyperResponse {
        let mut response = Self::empty(StatusCode::FOUND);
        Self::set_header(&mut response, LOCATION, location);
        response
    }

    /// A bodiless `304 Not Modified`.
    pub fn not_modified() -> HyperResponse {
        Self::empty(StatusCode::NOT_MODIFIED)
    }

    pub fn not_found() -> HyperResponse {
        Self::empty(StatusCode::NOT_FOUND)
    }

    pub fn empty(status: StatusCode) -> HyperResponse {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }

    /// Set a header from a runtime string.
    ///
    /// Values that are not valid header text are dropped with a warning
    /// rather than failing the whole response.
    pub fn set_header(response: &mut HyperResponse, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                response.headers_mut().insert(name, value);
            }
            Err(e) => {
                tracing::warn!("Dropping invalid {} header value {:?}: {}", name, value, e);
            }
        }
    }

    /// Append a header without replacing existing values of the same name.
    pub fn append_header(response: &mut HyperResponse, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                response.headers_mut().append(name, value);
            }
            Err(e) => {
                tracing::warn!("Dropping invalid {} header value {:?}: {}", name, value, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(response: HyperResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_text_response() {
        let response = HttpTransport::text(StatusCode::OK, mime::JS, "var a=1;");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/javascript");
        assert_eq!(body_string(response).await, "var a=1;");
    }

    #[test]
    fn test_redirect() {
        let response = HttpTransport::redirect("/dwr/index.html");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/dwr/index.html");
    }

    #[tokio::test]
    async fn test_not_modified_has_no_body() {
        let response = HttpTransport::not_modified();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(body_string(response).await.is_empty());
    }

    #[test]
    fn test_invalid_header_value_is_dropped() {
        let mut response = HttpTransport::empty(StatusCode::OK);
        HttpTransport::set_header(&mut response, LOCATION, "bad\nvalue");
        assert!(response.headers().get(LOCATION).is_none());
    }
}
