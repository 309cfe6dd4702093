//! DWR Server
//!
//! This crate provides the server half of the DWR remote-call bridge:
//!
//! - [`ScriptBuffer`]: builds script from literal code and converted data,
//!   hoisting every declaration ahead of the code that uses it
//! - [`UrlProcessor`]: routes requests by path, runs batched calls through a
//!   [`Remoter`] and serves the engine scripts with conditional GET support
//! - [`HttpServer`](http_server::HttpServer): serves a processor with hyper
//! - [`ScriptProxy`](session::ScriptProxy): pushes `DWRUtil` calls to script
//!   sessions

pub mod compress;
pub mod config;
pub mod http_server;
pub mod id_generator;
pub mod marshal;
pub mod outbound;
pub mod registry;
pub mod remoter;
pub mod resources;
pub mod script_buffer;
pub mod script_cache;
pub mod session;
pub mod url_processor;

pub use compress::{compress_script, CompressionLevel};
pub use config::ProcessorConfig;
pub use outbound::{Converter, JsonConverter, OutboundContext, OutboundVariable, ScriptData};
pub use registry::MethodRegistry;
pub use remoter::{DebugPageGenerator, Remoter};
pub use script_buffer::{ScriptBuffer, ScriptPart};
pub use script_cache::{EtagMode, ScriptCache};
pub use url_processor::UrlProcessor;
