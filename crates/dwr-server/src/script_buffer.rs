//! Script Buffer
//!
//! A [`ScriptBuffer`] is like a `String` builder for script, except that it
//! distinguishes between two kinds of fragment:
//!
//! - **literal** script, appended with [`ScriptBuffer::append_script`], which
//!   is inserted verbatim
//! - **data**, appended with [`ScriptBuffer::append_data`], which is converted,
//!   escaped and quoted by a [`Converter`] on export
//!
//! # Two-phase export
//!
//! Literal fragments are opaque caller code that may refer to temporaries
//! declared by data conversion. Export therefore runs two passes over the
//! fragments:
//!
//! 1. every data fragment is converted in append order and its declaration
//!    is written out; literals are skipped
//! 2. every fragment is written again in append order: literals verbatim,
//!    data as the reference computed in pass 1
//!
//! so all declarations precede any literal code.
//!
//! # Lifecycle
//!
//! A buffer is single use. [`ScriptBuffer::export`] closes it and releases its
//! fragments; any later append or export fails with
//! [`DwrError::InvalidState`].
//!
//! # Example
//!
//! ```
//! use dwr_server::{JsonConverter, ScriptBuffer};
//! use std::sync::Arc;
//!
//! let mut buffer = ScriptBuffer::new(Arc::new(JsonConverter::new()));
//! buffer.append_script("x=")?.append_data(42)?.append_script(";")?;
//! assert_eq!(buffer.export()?, "x=42;");
//! # Ok::<(), dwr_common::DwrError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use dwr_common::{DwrError, Result};

use crate::outbound::{Converter, OutboundContext, ScriptData};

/// One fragment of a script buffer.
#[derive(Debug, Clone)]
pub enum ScriptPart {
    /// Inserted verbatim, never converted
    Literal(String),
    /// Converted on export
    Data(ScriptData),
}

/// An ordered, single-use list of script fragments.
///
/// Appends take `&mut self`; share a buffer between threads only behind a
/// lock.
pub struct ScriptBuffer {
    converter: Arc<dyn Converter>,
    /// `None` once exported
    parts: Option<Vec<ScriptPart>>,
}

impl ScriptBuffer {
    /// Creates an empty, open buffer.
    ///
    /// # Arguments
    ///
    /// * `converter` - Turns each data fragment into script on export
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        ScriptBuffer {
            converter,
            parts: Some(Vec::new()),
        }
    }

    /// Creates a buffer that starts with a literal fragment.
    pub fn with_script(converter: Arc<dyn Converter>, script: &str) -> Self {
        ScriptBuffer {
            converter,
            parts: Some(vec![ScriptPart::Literal(script.to_string())]),
        }
    }

    /// Appends literal script, inserted verbatim on export.
    ///
    /// # Returns
    ///
    /// The buffer, for chaining, or [`DwrError::InvalidState`] if it has
    /// already been exported.
    pub fn append_script(&mut self, script: &str) -> Result<&mut Self> {
        self.open_parts()?.push(ScriptPart::Literal(script.to_string()));
        Ok(self)
    }

    /// Appends a single literal character, such as a separating `,`.
    pub fn append_script_char(&mut self, c: char) -> Result<&mut Self> {
        self.open_parts()?.push(ScriptPart::Literal(c.to_string()));
        Ok(self)
    }

    /// Appends a value to be converted on export.
    ///
    /// Appending the same shared object twice yields one declaration and two
    /// identical references.
    ///
    /// # Arguments
    ///
    /// * `data` - Anything convertible to [`ScriptData`]: primitives, strings,
    ///   `serde_json::Value`s or a [`ScriptData::shared`] object
    ///
    /// # Returns
    ///
    /// The buffer, for chaining, or [`DwrError::InvalidState`] if it has
    /// already been exported.
    ///
    /// # Example
    ///
    /// ```
    /// use dwr_server::{JsonConverter, ScriptBuffer};
    /// use serde_json::json;
    /// use std::sync::Arc;
    ///
    /// let mut buffer = ScriptBuffer::new(Arc::new(JsonConverter::new()));
    /// buffer.append_script("show(")?.append_data(json!([1, 2]))?.append_script(");")?;
    /// assert_eq!(buffer.export()?, "var s0=[1,2];show(s0);");
    /// # Ok::<(), dwr_common::DwrError>(())
    /// ```
    pub fn append_data(&mut self, data: impl Into<ScriptData>) -> Result<&mut Self> {
        self.open_parts()?.push(ScriptPart::Data(data.into()));
        Ok(self)
    }

    /// Closes the buffer and returns the finished script.
    ///
    /// Declarations for every data fragment come first, followed by the
    /// fragments in append order.
    ///
    /// # Errors
    ///
    /// * [`DwrError::InvalidState`] - The buffer was already exported
    /// * [`DwrError::Marshal`] - A fragment could not be converted; the
    ///   message names its 0-based position
    ///
    /// The buffer is closed even when conversion fails; the partial output
    /// is discarded.
    pub fn export(&mut self) -> Result<String> {
        let parts = self.parts.take().ok_or_else(closed_error)?;
        render(self.converter.as_ref(), &parts)
    }

    /// Renders the current content without closing the buffer.
    pub fn preview(&self) -> Result<String> {
        let parts = self.parts.as_ref().ok_or_else(closed_error)?;
        render(self.converter.as_ref(), parts)
    }

    /// Whether [`export`](Self::export) has been called.
    pub fn is_closed(&self) -> bool {
        self.parts.is_none()
    }

    /// Number of fragments appended so far, or 0 once closed.
    pub fn len(&self) -> usize {
        self.parts.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn open_parts(&mut self) -> Result<&mut Vec<ScriptPart>> {
        self.parts.as_mut().ok_or_else(closed_error)
    }
}

impl fmt::Debug for ScriptBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptBuffer")
            .field("parts", &self.parts)
            .finish_non_exhaustive()
    }
}

fn closed_error() -> DwrError {
    DwrError::InvalidState("Can't use ScriptBuffer: it has been exported already".into())
}

fn render(converter: &dyn Converter, parts: &[ScriptPart]) -> Result<String> {
    let mut ctx = OutboundContext::new();
    let mut output = String::new();
    let mut references = Vec::new();

    // Declarations first, in fragment order
    for (position, part) in parts.iter().enumerate() {
        let ScriptPart::Data(data) = part else {
            continue;
        };

        let reference = match ctx.get(data) {
            Some(existing) => existing.reference.clone(),
            None => {
                let variable = converter
                    .convert(data, &mut ctx)
                    .map_err(|e| conversion_error(position, e))?;
                output.push_str(&variable.declaration);
                variable.reference
            }
        };
        references.push(reference);
    }

    // Then the body
    let mut references = references.into_iter();
    for part in parts {
        match part {
            ScriptPart::Literal(script) => output.push_str(script),
            ScriptPart::Data(_) => {
                if let Some(reference) = references.next() {
                    output.push_str(&reference);
                }
            }
        }
    }

    Ok(output)
}

fn conversion_error(position: usize, error: DwrError) -> DwrError {
    match error {
        DwrError::Marshal(msg) => {
            DwrError::Marshal(format!("Failed to convert fragment {}: {}", position, msg))
        }
        other => other,
    }
}
