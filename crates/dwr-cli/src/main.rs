// Copyright 2025 DWR-RS Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use dwr_cli::system_registry;
use dwr_server::http_server::HttpServer;
use dwr_server::resources::DirectoryResources;
use dwr_server::{CompressionLevel, EtagMode, ProcessorConfig, UrlProcessor};

#[derive(FromArgs)]
/// DWR - call server-side methods from browser JavaScript
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// start a DWR server
struct ServeArgs {
    /// address to bind to
    ///
    /// Defaults to `127.0.0.1:8080`.
    #[argh(option, short = 'b', default = "\"127.0.0.1:8080\".into()")]
    bind: String,

    /// path the bridge is mounted under
    ///
    /// Defaults to `/dwr`. Requests outside it get a 404.
    #[argh(option, short = 'm', default = "\"/dwr\".into()")]
    mount: String,

    /// always serve static scripts in full, ignoring conditional GET headers
    #[argh(switch)]
    ignore_last_modified: bool,

    /// serve static scripts exactly as loaded
    #[argh(switch)]
    no_compression: bool,

    /// script compression level: 0 none, 1 debuggable, 2 normal, 3 ultra
    #[argh(option, default = "1")]
    compression_level: u8,

    /// length of generated script session ids
    #[argh(option, default = "16")]
    page_id_length: usize,

    /// answer `If-None-Match` alone by comparing it with the current ETag
    #[argh(switch)]
    standard_etag: bool,

    /// directory to load `engine.js` and `util.js` from instead of the
    /// bundled copies
    #[argh(option)]
    resource_dir: Option<String>,
}

impl ServeArgs {
    fn processor_config(&self) -> ProcessorConfig {
        let etag_mode = if self.standard_etag {
            EtagMode::Standard
        } else {
            EtagMode::Legacy
        };

        ProcessorConfig::new()
            .with_ignore_last_modified(self.ignore_last_modified)
            .with_script_compressed(!self.no_compression)
            .with_compression_level(CompressionLevel::from_level(self.compression_level))
            .with_page_id_length(self.page_id_length)
            .with_etag_mode(etag_mode)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Set default log level to INFO, but allow RUST_LOG env var to override
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Serve(args) => {
            let addr: SocketAddr = args
                .bind
                .parse()
                .with_context(|| format!("Invalid bind address: {}", args.bind))?;

            let config = args.processor_config();
            tracing::info!(
                "Script compression: {:?}, conditional GET: {}, ETag mode: {:?}",
                config.effective_compression(),
                !config.ignore_last_modified,
                config.etag_mode
            );

            let mut processor = UrlProcessor::from_registry(system_registry()).with_config(config);
            if let Some(dir) = &args.resource_dir {
                tracing::info!("Loading scripts from {}", dir);
                processor = processor.with_resources(Arc::new(DirectoryResources::new(dir)));
            }

            let server = HttpServer::new(Arc::new(processor), &args.mount);
            tracing::info!("Starting DWR server on {}{}", addr, server.mount());
            server.run(addr).await?;
        }
    }

    Ok(())
}

/// CLI argument parsing tests.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve_defaults() {
        let args: Cli = Cli::from_args(&["dwr"], &["serve"]).unwrap();
        match args.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind, "127.0.0.1:8080");
                assert_eq!(args.mount, "/dwr");
                assert!(!args.ignore_last_modified);
                assert!(!args.no_compression);
                assert_eq!(args.compression_level, 1);
                assert_eq!(args.page_id_length, 16);
                assert!(!args.standard_etag);
                assert!(args.resource_dir.is_none());
                assert_eq!(args.processor_config(), ProcessorConfig::default());
            }
        }
    }

    #[test]
    fn test_cli_parse_serve_with_options() {
        let args: Cli = Cli::from_args(&["dwr"], &[
            "serve",
            "-b", "0.0.0.0:9000",
            "-m", "/app/dwr",
            "--ignore-last-modified",
            "--compression-level", "3",
            "--page-id-length", "24",
            "--standard-etag",
            "--resource-dir", "./scripts",
        ]).unwrap();
        match args.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind, "0.0.0.0:9000");
                assert_eq!(args.mount, "/app/dwr");
                assert_eq!(args.resource_dir.as_deref(), Some("./scripts"));

                let config = args.processor_config();
                assert!(config.ignore_last_modified);
                assert_eq!(config.compression_level, CompressionLevel::Ultra);
                assert_eq!(config.page_id_length, 24);
                assert_eq!(config.etag_mode, EtagMode::Standard);
            }
        }
    }

    #[test]
    fn test_cli_parse_no_compression() {
        let args: Cli = Cli::from_args(&["dwr"], &["serve", "--no-compression"]).unwrap();
        let Commands::Serve(args) = args.command;
        assert_eq!(args.processor_config().effective_compression(), CompressionLevel::None);
    }

    #[test]
    fn test_cli_parse_out_of_range_level_clamps() {
        let args: Cli = Cli::from_args(&["dwr"], &["serve", "--compression-level", "9"]).unwrap();
        let Commands::Serve(args) = args.command;
        assert_eq!(args.processor_config().compression_level, CompressionLevel::Ultra);
    }

    #[test]
    fn test_cli_parse_invalid_page_id_length() {
        let result = Cli::from_args(&["dwr"], &["serve", "--page-id-length", "many"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Cli::from_args(&["dwr"], &[]);
        assert!(result.is_err());
    }
}
