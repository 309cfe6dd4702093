//! Dispatcher configuration.
//!
//! # Example
//!
//! ```
//! use dwr_server::{CompressionLevel, EtagMode, ProcessorConfig};
//!
//! let config = ProcessorConfig::new()
//!     .with_compression_level(CompressionLevel::Ultra)
//!     .with_etag_mode(EtagMode::Standard);
//! assert!(config.script_compressed);
//! assert_eq!(config.page_id_length, 16);
//! ```

use serde::{Deserialize, Serialize};

use crate::compress::CompressionLevel;
use crate::script_cache::EtagMode;

/// Settings for [`UrlProcessor`](crate::UrlProcessor).
///
/// # Fields
///
/// - `ignore_last_modified` - Always send full bodies for static scripts (default: false)
/// - `script_compressed` - Compress static scripts before caching them (default: true)
/// - `compression_level` - How hard to compress (default: `Debuggable`)
/// - `page_id_length` - Length of generated script session ids (default: 16)
/// - `etag_mode` - How an `If-None-Match` without `If-Modified-Since` is answered (default: `Legacy`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub ignore_last_modified: bool,
    pub script_compressed: bool,
    pub compression_level: CompressionLevel,
    pub page_id_length: usize,
    pub etag_mode: EtagMode,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            ignore_last_modified: false,
            script_compressed: true,
            compression_level: CompressionLevel::Debuggable,
            page_id_length: 16,
            etag_mode: EtagMode::Legacy,
        }
    }
}

impl ProcessorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables conditional GET handling for static scripts.
    pub fn with_ignore_last_modified(mut self, ignore: bool) -> Self {
        self.ignore_last_modified = ignore;
        self
    }

    pub fn with_script_compressed(mut self, compressed: bool) -> Self {
        self.script_compressed = compressed;
        self
    }

    pub fn with_compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the length of generated script session ids.
    ///
    /// # Parameters
    ///
    /// * `length` - Number of alphanumeric characters; 0 is raised to 1
    pub fn with_page_id_length(mut self, length: usize) -> Self {
        self.page_id_length = length.max(1);
        self
    }

    pub fn with_etag_mode(mut self, mode: EtagMode) -> Self {
        self.etag_mode = mode;
        self
    }

    /// The level actually applied to static scripts.
    pub fn effective_compression(&self) -> CompressionLevel {
        if self.script_compressed {
            self.compression_level
        } else {
            CompressionLevel::None
        }
    }
}
