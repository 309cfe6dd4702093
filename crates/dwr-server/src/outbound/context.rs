use std::collections::HashMap;

use super::data::ScriptData;

/// The code produced by converting one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundVariable {
    /// Statements to run before the value is referenced; may be empty
    pub declaration: String,
    /// Expression used wherever the value appears inline
    pub reference: String,
}

impl OutboundVariable {
    /// # Arguments
    ///
    /// * `declaration` - Code such as `var s0={};`, emitted before the body
    /// * `reference` - Expression such as `s0` that stands for the value
    pub fn new(declaration: impl Into<String>, reference: impl Into<String>) -> Self {
        OutboundVariable {
            declaration: declaration.into(),
            reference: reference.into(),
        }
    }

    /// A variable that needs no declaration.
    pub fn inline(reference: impl Into<String>) -> Self {
        Self::new(String::new(), reference)
    }
}

/// Per-export scratch space threaded through every conversion.
///
/// Created fresh for each export and dropped afterwards; nothing survives
/// between exports.
#[derive(Debug, Default)]
pub struct OutboundContext {
    variables: HashMap<usize, OutboundVariable>,
    next_id: usize,
}

impl OutboundContext {
    /// An empty context with no recorded variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Variable previously recorded for this object, by identity.
    pub fn get(&self, data: &ScriptData) -> Option<&OutboundVariable> {
        data.identity().and_then(|id| self.variables.get(&id))
    }

    /// Record (or replace) the variable for an object. Ignored for
    /// primitives, which are never shared.
    ///
    /// Converters call this with a placeholder before converting an
    /// object's children, so a child that points back at its parent
    /// resolves to the parent's temporary.
    pub fn put(&mut self, data: &ScriptData, variable: OutboundVariable) {
        if let Some(id) = data.identity() {
            self.variables.insert(id, variable);
        }
    }

    /// A temporary name unique within this export: `s0`, `s1`, ...
    pub fn next_variable_name(&mut self) -> String {
        let name = format!("s{}", self.next_id);
        self.next_id += 1;
        name
    }

    /// Number of objects recorded so far.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
