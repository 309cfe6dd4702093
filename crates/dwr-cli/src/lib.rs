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

//! # DWR CLI
//!
//! Command-line entry point for the DWR remote-call bridge.
//!
//! The `dwr serve` command starts an HTTP server with a built-in `System`
//! interface, so a browser can load `engine.js` and make calls without any
//! application code:
//!
//! ```bash
//! dwr serve -b 127.0.0.1:8080 -m /dwr
//! ```
//!
//! Then open `http://127.0.0.1:8080/dwr/index.html` for the debug pages.

use dwr_server::registry::MethodRegistry;
use serde_json::Value;

/// Name of the interface every server started from the CLI exposes.
pub const SYSTEM_INTERFACE: &str = "System";

/// Builds the registry served by `dwr serve`.
///
/// `System.echo(value)` returns its argument unchanged and `System.time()`
/// returns the server clock as an RFC 3339 string.
pub fn system_registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry
        .register(SYSTEM_INTERFACE, "echo", 1, |params| {
            Ok(params.first().cloned().unwrap_or(Value::Null))
        })
        .register(SYSTEM_INTERFACE, "time", 0, |_| {
            Ok(Value::String(chrono::Utc::now().to_rfc3339()))
        });
    registry
}
