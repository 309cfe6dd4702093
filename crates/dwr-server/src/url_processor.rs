//! Protocol dispatcher
//!
//! [`UrlProcessor`] is the single entry point for every request below the
//! bridge's mount path. It looks only at the path suffix (`path_info`) and
//! picks exactly one behaviour:
//!
//! | path_info | response |
//! |---|---|
//! | empty, `/` or the mount path | redirect to `<root>/index.html` |
//! | `/index.html...` | index page |
//! | `/test/<name>` | test page for one interface |
//! | `/interface/<name>.js` | interface stub script |
//! | `/plainjs...` | batch call over the plain-script transport |
//! | `/htmljs...` | batch call over the iframe transport |
//! | `/engine.js` | engine script, session ids filled in per request |
//! | `/util.js` | cached utility script |
//!
//! Anything else is a 404. Failures while parsing or dispatching become a
//! 500 whose body is script that the browser can always evaluate.
//!
//! # Example
//!
//! ```
//! use dwr_common::InboundRequest;
//! use dwr_server::registry::MethodRegistry;
//! use dwr_server::UrlProcessor;
//! use hyper::{Method, StatusCode};
//!
//! let processor = UrlProcessor::from_registry(MethodRegistry::new());
//! let response = processor.handle(InboundRequest::new(Method::GET, "/dwr", "/"));
//! assert_eq!(response.status(), StatusCode::FOUND);
//! ```

use std::sync::Arc;

use dwr_common::transport::http::mime;
use dwr_common::{DwrError, HttpTransport, HyperResponse, InboundRequest, Result};
use hyper::body::Bytes;
use hyper::header::{
    CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, SET_COOKIE, USER_AGENT,
};
use hyper::StatusCode;

use crate::compress::compress_script;
use crate::config::ProcessorConfig;
use crate::id_generator::generate_id;
use crate::marshal::{HtmlJsMarshaller, Marshaller, PlainJsMarshaller};
use crate::outbound::{Converter, JsonConverter};
use crate::registry::MethodRegistry;
use crate::remoter::{DebugPageGenerator, Remoter};
use crate::resources::{BundledResources, ScriptResources, ENGINE_JS, UTIL_JS};
use crate::script_cache::ScriptCache;

pub const FILE_INDEX: &str = "/index.html";
pub const PATH_TEST: &str = "/test/";
pub const PATH_INTERFACE: &str = "/interface/";
pub const PATH_PLAINJS: &str = "/plainjs";
pub const PATH_HTMLJS: &str = "/htmljs";
pub const EXTENSION_JS: &str = ".js";

/// Cookie that carries the HTTP session id.
pub const SESSION_COOKIE: &str = "DWRSESSIONID";

const PARAM_HTTP_SESSIONID: &str = "${httpSessionId}";
const PARAM_SCRIPT_SESSIONID: &str = "${scriptSessionId}";

const HTTP_SESSION_ID_LENGTH: usize = 32;

/// Body of every 500 response.
pub const ERROR_SCRIPT: &str = "//<script type='text/javascript'>\n\
alert('Error. This may be due to an unsupported browser.\\nSee the server logs for more information.');\n\
//</script>\n";

pub struct UrlProcessor {
    config: ProcessorConfig,
    remoter: Arc<dyn Remoter>,
    pages: Arc<dyn DebugPageGenerator>,
    plain_marshaller: Arc<dyn Marshaller>,
    html_marshaller: Arc<dyn Marshaller>,
    resources: Arc<dyn ScriptResources>,
    cache: Arc<ScriptCache>,
}

impl UrlProcessor {
    /// Creates a dispatcher with the default converter, bundled scripts and
    /// a fresh script cache.
    ///
    /// # Arguments
    ///
    /// * `remoter` - Executes parsed batches
    /// * `pages` - Generates the index/test pages and interface scripts
    pub fn new(remoter: Arc<dyn Remoter>, pages: Arc<dyn DebugPageGenerator>) -> Self {
        let converter: Arc<dyn Converter> = Arc::new(JsonConverter::new());
        Self {
            config: ProcessorConfig::default(),
            remoter,
            pages,
            plain_marshaller: Arc::new(PlainJsMarshaller::new(converter.clone())),
            html_marshaller: Arc::new(HtmlJsMarshaller::new(converter)),
            resources: Arc::new(BundledResources),
            cache: Arc::new(ScriptCache::new()),
        }
    }

    /// Uses one registry as both executor and page generator.
    pub fn from_registry(registry: MethodRegistry) -> Self {
        let registry = Arc::new(registry);
        Self::new(registry.clone(), registry)
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the converter used by both built-in marshallers.
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.plain_marshaller = Arc::new(PlainJsMarshaller::new(converter.clone()));
        self.html_marshaller = Arc::new(HtmlJsMarshaller::new(converter));
        self
    }

    pub fn with_plain_marshaller(mut self, marshaller: Arc<dyn Marshaller>) -> Self {
        self.plain_marshaller = marshaller;
        self
    }

    pub fn with_html_marshaller(mut self, marshaller: Arc<dyn Marshaller>) -> Self {
        self.html_marshaller = marshaller;
        self
    }

    pub fn with_resources(mut self, resources: Arc<dyn ScriptResources>) -> Self {
        self.resources = resources;
        self
    }

    /// Shares a script cache, e.g. between several mounts.
    pub fn with_cache(mut self, cache: Arc<ScriptCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ScriptCache> {
        &self.cache
    }

    /// Handles one request. Never fails: errors are turned into responses.
    pub fn handle(&self, request: InboundRequest) -> HyperResponse {
        match self.dispatch(&request) {
            Ok(response) => response,
            Err(e) if e.status_code() == StatusCode::NOT_FOUND => {
                tracing::warn!(
                    "{}. In debug/test mode try viewing {}{}",
                    e,
                    request.root,
                    FILE_INDEX
                );
                HttpTransport::not_found()
            }
            Err(e) => {
                tracing::warn!("Error: {}", e);
                tracing::debug!("- User Agent: {}", request.header(USER_AGENT).unwrap_or("-"));
                tracing::debug!("- Request:    {} {}{}", request.method, request.root, request.path_info);
                tracing::debug!("- Query:      {}", request.query.as_deref().unwrap_or("-"));
                error_response()
            }
        }
    }

    fn dispatch(&self, request: &InboundRequest) -> Result<HyperResponse> {
        let path_info = request.path_info.as_str();
        let root = request.root.as_str();

        if path_info.is_empty() || path_info == "/" || path_info == root {
            let location = format!("{}{}", root, FILE_INDEX);
            tracing::debug!("Redirecting {:?} to {}", path_info, location);
            return Ok(HttpTransport::redirect(&location));
        }

        if path_info.starts_with(FILE_INDEX) {
            let page = self.pages.index_page(root)?;
            Ok(HttpTransport::text(StatusCode::OK, mime::PLAIN, page))
        } else if let Some(rest) = path_info.strip_prefix(PATH_TEST) {
            let script_name = rest.replace('/', "");
            let page = self.pages.test_page(root, &script_name)?;
            Ok(HttpTransport::text(StatusCode::OK, mime::PLAIN, page))
        } else if let Some(rest) = path_info.strip_prefix(PATH_INTERFACE) {
            let script_name = rest.replace(EXTENSION_JS, "");
            let script = self.pages.interface_script(&script_name, root)?;
            // Plain text so it reads well in a browser window; it still runs
            Ok(HttpTransport::text(StatusCode::OK, mime::PLAIN, script))
        } else if path_info.starts_with(PATH_PLAINJS) {
            self.execute(self.plain_marshaller.as_ref(), request)
        } else if path_info.starts_with(PATH_HTMLJS) {
            self.execute(self.html_marshaller.as_ref(), request)
        } else if path_info.eq_ignore_ascii_case(ENGINE_JS) {
            self.do_file(request, ENGINE_JS, true)
        } else if path_info.eq_ignore_ascii_case(UTIL_JS) {
            self.do_file(request, UTIL_JS, false)
        } else {
            Err(DwrError::RoutingMiss(format!("Page not found ({})", path_info)))
        }
    }

    fn execute(&self, marshaller: &dyn Marshaller, request: &InboundRequest) -> Result<HyperResponse> {
        let calls = marshaller.marshall_inbound(request)?;
        tracing::debug!("Executing batch of {} calls", calls.len());
        let replies = self.remoter.execute(calls)?;
        marshaller.marshall_outbound(&replies)
    }

    /// Serves a static script.
    ///
    /// Dynamic scripts have their session placeholders filled in and are
    /// rendered on every request; the others go through the conditional GET
    /// check and the script cache.
    fn do_file(&self, request: &InboundRequest, path: &str, dynamic: bool) -> Result<HyperResponse> {
        if !dynamic
            && !self.config.ignore_last_modified
            && self.cache.is_up_to_date(
                request.header(IF_MODIFIED_SINCE),
                request.header(IF_NONE_MATCH),
                self.config.etag_mode,
            )
        {
            tracing::debug!("Sending 304 for {}", path);
            return Ok(HttpTransport::not_modified());
        }

        let mut new_session = None;
        let body = if dynamic {
            let http_session_id = match request
                .cookie(SESSION_COOKIE)
                .filter(|id| is_session_id(id))
            {
                Some(id) => id.to_string(),
                None => {
                    let id = generate_id(HTTP_SESSION_ID_LENGTH);
                    new_session = Some(id.clone());
                    id
                }
            };
            let script_session_id = generate_id(self.config.page_id_length);
            Bytes::from(self.render(path, |line| {
                line.replace(PARAM_HTTP_SESSIONID, &http_session_id)
                    .replace(PARAM_SCRIPT_SESSIONID, &script_session_id)
            })?)
        } else {
            self.cache
                .get_or_render(path, || self.render(path, |line| line.to_string()))?
        };

        let mut response = HttpTransport::text(StatusCode::OK, mime::JS, body);
        HttpTransport::set_header(&mut response, LAST_MODIFIED, &self.cache.last_modified());
        HttpTransport::set_header(&mut response, ETAG, self.cache.etag());

        if dynamic {
            HttpTransport::set_header(&mut response, CACHE_CONTROL, "no-cache");
        }
        if let Some(id) = new_session {
            let cookie_path = if request.root.is_empty() { "/" } else { request.root.as_str() };
            HttpTransport::append_header(
                &mut response,
                SET_COOKIE,
                &format!("{}={}; Path={}", SESSION_COOKIE, id, cookie_path),
            );
        }

        Ok(response)
    }

    /// Loads a resource, rewrites it line by line and compresses it.
    fn render<F>(&self, path: &str, rewrite: F) -> Result<String>
    where
        F: Fn(&str) -> String,
    {
        let raw = self
            .resources
            .load(path)
            .ok_or_else(|| DwrError::ResourceNotFound(format!("Failed to find resource: {}", path)))?;

        let mut output = String::with_capacity(raw.len());
        for line in raw.lines() {
            output.push_str(&rewrite(line));
            output.push('\n');
        }

        Ok(compress_script(&output, self.config.effective_compression()))
    }
}

/// Session ids are spliced into a quoted script literal, so only ids that
/// could have come from [`generate_id`] are accepted from the client.
fn is_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= HTTP_SESSION_ID_LENGTH
        && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// The 500 response sent for any parse or dispatch failure.
pub fn error_response() -> HyperResponse {
    HttpTransport::text(StatusCode::INTERNAL_SERVER_ERROR, mime::HTML, ERROR_SCRIPT)
}
