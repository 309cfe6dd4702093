//! HTTP Server for the DWR bridge
//!
//! This module serves a [`UrlProcessor`] over HTTP/1.1 using hyper.
//!
//! # Architecture
//!
//! The HTTP server:
//! - Listens on a TCP socket for incoming HTTP connections
//! - Spawns a tokio task for each connection
//! - Collects each request below the mount path into an [`InboundRequest`]
//! - Runs the dispatcher on the blocking pool, so a slow batch only ties up
//!   its own worker
//!
//! Requests outside the mount path get a bare 404.
//!
//! # Example
//!
//! ```no_run
//! use dwr_server::http_server::HttpServer;
//! use dwr_server::registry::MethodRegistry;
//! use dwr_server::UrlProcessor;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let processor = Arc::new(UrlProcessor::from_registry(MethodRegistry::new()));
//!     let server = HttpServer::new(processor, "/dwr");
//!     server.run("127.0.0.1:8080".parse().unwrap()).await.unwrap();
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use dwr_common::{DwrError, HttpTransport, HyperRequest, HyperResponse, InboundRequest, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::url_processor::{error_response, UrlProcessor};

pub struct HttpServer {
    processor: Arc<UrlProcessor>,
    /// Mount path without a trailing slash, e.g. `/dwr`
    mount: Arc<str>,
}

impl HttpServer {
    /// Creates a server that answers requests below `mount`.
    ///
    /// # Arguments
    ///
    /// * `processor` - The dispatcher for requests below the mount
    /// * `mount` - Mount path such as `/dwr`; `/` or empty mounts at the root
    pub fn new(processor: Arc<UrlProcessor>, mount: &str) -> Self {
        Self {
            processor,
            mount: normalize_mount(mount).into(),
        }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Binds `addr` and serves until the listener fails.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DwrError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| DwrError::Transport(format!("Failed to get local address: {}", e)))?;
        tracing::info!("HTTP server listening on {}{}", local_addr, self.mount);

        loop {
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| DwrError::Transport(format!("Failed to accept connection: {}", e)))?;

            let io = TokioIo::new(stream);
            let processor = self.processor.clone();
            let mount = self.mount.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let processor = processor.clone();
                    let mount = mount.clone();
                    async move { Self::handle_request(processor, mount, req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!("Error serving connection: {}", err);
                }
            });
        }
    }

    async fn handle_request(
        processor: Arc<UrlProcessor>,
        mount: Arc<str>,
        req: HyperRequest,
    ) -> std::result::Result<HyperResponse, DwrError> {
        let request = match InboundRequest::from_hyper(req, &mount).await {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(HttpTransport::not_found()),
            Err(e) => {
                tracing::error!("Failed to read request: {}", e);
                return Ok(error_response());
            }
        };

        match tokio::task::spawn_blocking(move || processor.handle(request)).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::error!("Request handler failed: {}", e);
                Ok(error_response())
            }
        }
    }
}

fn normalize_mount(mount: &str) -> String {
    let trimmed = mount.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MethodRegistry;

    #[test]
    fn test_normalize_mount() {
        assert_eq!(normalize_mount("/dwr"), "/dwr");
        assert_eq!(normalize_mount("/dwr/"), "/dwr");
        assert_eq!(normalize_mount("dwr"), "/dwr");
        assert_eq!(normalize_mount("/"), "");
        assert_eq!(normalize_mount(""), "");
    }

    #[test]
    fn test_server_creation() {
        let processor = Arc::new(UrlProcessor::from_registry(MethodRegistry::new()));
        let server = HttpServer::new(processor, "app/dwr/");
        assert_eq!(server.mount(), "/app/dwr");
    }
}
