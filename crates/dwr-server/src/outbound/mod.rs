//! Outbound conversion: server-side values to script
//!
//! Every value handed to a [`ScriptBuffer`](crate::ScriptBuffer) as data is
//! turned into an [`OutboundVariable`] by a [`Converter`]. The variable is a
//! pair of code fragments:
//!
//! - **declaration**: statements that must run before the value is used
//!   (empty for primitives, `var s0=...;` for composites)
//! - **reference**: the expression to place wherever the value appears
//!
//! All conversions within one export share an [`OutboundContext`]. The
//! context remembers which objects were already converted, keyed by pointer
//! identity, so a shared object is declared once and a cyclic graph resolves
//! back to its own temporary.
//!
//! # Example
//!
//! ```
//! use dwr_server::outbound::{Converter, JsonConverter, OutboundContext, ScriptData};
//!
//! let converter = JsonConverter::new();
//! let mut ctx = OutboundContext::new();
//! let ov = converter.convert(&ScriptData::from(42), &mut ctx).unwrap();
//! assert_eq!(ov.declaration, "");
//! assert_eq!(ov.reference, "42");
//! ```

mod context;
mod data;
mod json;

pub use context::{OutboundContext, OutboundVariable};
pub use data::ScriptData;
pub use json::{escape_string, JsonConverter};

use dwr_common::Result;

/// Turns one server-side value into script.
///
/// Implementations that build composite values should allocate a name with
/// [`OutboundContext::next_variable_name`] and [`OutboundContext::put`] a
/// placeholder before converting children, so that references back to the
/// parent resolve to that name.
pub trait Converter: Send + Sync {
    /// Fails with [`DwrError::Marshal`](dwr_common::DwrError::Marshal) when
    /// the value's shape is unsupported.
    fn convert(&self, data: &ScriptData, ctx: &mut OutboundContext) -> Result<OutboundVariable>;
}
