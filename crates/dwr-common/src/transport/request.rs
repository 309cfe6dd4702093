//! Collected inbound requests
//!
//! hyper hands us a streaming body. The dispatcher and the marshallers are
//! synchronous, so the server loop collects each request into an
//! [`InboundRequest`] before handing it over.

use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use hyper::Method;

use super::http::HyperRequest;
use crate::protocol::error::{DwrError, Result};

#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Mount path of the bridge, e.g. `/dwr`
    pub root: String,
    /// Path below the mount, e.g. `/engine.js`
    pub path_info: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: Method, root: impl Into<String>, path_info: impl Into<String>) -> Self {
        InboundRequest {
            method,
            root: root.into(),
            path_info: path_info.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Adds a header. `name` must be a lowercase literal; invalid values are
    /// ignored.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        let name = HeaderName::from_static(name);
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Collects a hyper request mounted at `root`.
    ///
    /// Returns `None` when the request path lies outside the mount.
    pub async fn from_hyper(req: HyperRequest, root: &str) -> Result<Option<Self>> {
        let (parts, body) = req.into_parts();

        let path_info = match strip_mount(parts.uri.path(), root) {
            Some(path_info) => path_info.to_string(),
            None => return Ok(None),
        };

        let body = body
            .collect()
            .await
            .map_err(|e| DwrError::Transport(format!("Failed to read request body: {}", e)))?
            .to_bytes();

        Ok(Some(InboundRequest {
            method: parts.method,
            root: root.to_string(),
            path_info,
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        }))
    }

    /// First value of a header, if present and valid text.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|value| value.to_str().ok())
    }

    /// Value of a cookie sent with the request.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    pub fn body_text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| DwrError::marshal(format!("Request body is not UTF-8: {}", e)))
    }

    /// Form pairs from the query string followed by a form-encoded body.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let query = self.query.as_deref().unwrap_or_default().as_bytes();
        url::form_urlencoded::parse(query)
            .chain(url::form_urlencoded::parse(&self.body))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

/// Returns the part of `path` below `root`, or `None` if `path` is outside it.
fn strip_mount<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return Some(path);
    }

    let rest = path.strip_prefix(root)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
