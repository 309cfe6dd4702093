//! Static script cache and conditional GET
//!
//! Static scripts never change while the process runs, so they share one
//! validator pair fixed when the cache is created:
//!
//! - `Last-Modified`: the creation time, truncated to whole seconds
//! - `ETag`: that time in milliseconds, quoted
//!
//! Rendered bodies are cached by path. Lookup and population happen under a
//! single lock, so concurrent first requests for a path render it once.

use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};
use dwr_common::Result;
use hyper::body::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// How an `If-None-Match` without `If-Modified-Since` is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EtagMode {
    /// `304` when the ETag differs. Matches what deployed engines expect.
    #[default]
    Legacy,
    /// `304` when the ETag matches.
    Standard,
}

#[derive(Debug)]
pub struct ScriptCache {
    origin: DateTime<Utc>,
    etag: String,
    scripts: Mutex<HashMap<String, Bytes>>,
}

impl Default for ScriptCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::with_origin(Utc::now())
    }

    /// Cache whose validators are derived from `origin`.
    pub fn with_origin(origin: DateTime<Utc>) -> Self {
        let origin = origin.with_nanosecond(0).unwrap_or(origin);
        ScriptCache {
            etag: format!("\"{}\"", origin.timestamp_millis()),
            origin,
            scripts: Mutex::new(HashMap::new()),
        }
    }

    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// `Last-Modified` value for every static script.
    pub fn last_modified(&self) -> String {
        format_http_date(self.origin)
    }

    /// Whether the client's copy is current and a `304` may be sent.
    ///
    /// # Arguments
    ///
    /// * `if_modified_since` - Raw `If-Modified-Since` header; unparseable values count as absent
    /// * `if_none_match` - Raw `If-None-Match` header
    /// * `mode` - Rule for a lone `If-None-Match`
    pub fn is_up_to_date(
        &self,
        if_modified_since: Option<&str>,
        if_none_match: Option<&str>,
        mode: EtagMode,
    ) -> bool {
        let modified_since = if_modified_since.and_then(parse_http_date);

        match (if_none_match, modified_since) {
            (None, None) => false,
            (None, Some(since)) => {
                let fresh = since > self.origin;
                if fresh {
                    tracing::debug!(
                        "Sending 304: If-Modified-Since={}, Last-Modified={}",
                        since,
                        self.origin
                    );
                }
                fresh
            }
            (Some(given), None) => {
                let matches = given == self.etag;
                let fresh = match mode {
                    EtagMode::Legacy => !matches,
                    EtagMode::Standard => matches,
                };
                if fresh {
                    tracing::debug!("Sending 304: If-None-Match={}, ETag={}", given, self.etag);
                }
                fresh
            }
            (Some(given), Some(since)) => given == self.etag && since <= self.origin,
        }
    }

    /// Cached body for `path`, rendering and storing it on first use.
    ///
    /// The lock is held while `render` runs. A failed render stores nothing.
    pub fn get_or_render<F>(&self, path: &str, render: F) -> Result<Bytes>
    where
        F: FnOnce() -> Result<String>,
    {
        let mut scripts = self.scripts.lock();
        if let Some(body) = scripts.get(path) {
            return Ok(body.clone());
        }

        let body = Bytes::from(render()?);
        scripts.insert(path.to_string(), body.clone());
        Ok(body)
    }

    /// Number of cached scripts.
    pub fn len(&self) -> usize {
        self.scripts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parses an HTTP date, truncated to whole seconds.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|time| time.with_timezone(&Utc))
        .and_then(|time| time.with_nanosecond(0))
}
