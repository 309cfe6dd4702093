use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier the browser engine uses to match a reply to its pending call.
pub type CallId = String;

/// One remote call parsed out of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Call {
    pub id: CallId,
    /// Name of the remoted interface, e.g. `Demo`
    pub script_name: String,
    /// Name of the method on that interface, e.g. `sayHello`
    pub method_name: String,
    pub params: Vec<Value>,
}

impl Call {
    pub fn new(
        id: impl Into<CallId>,
        script_name: impl Into<String>,
        method_name: impl Into<String>,
        params: Vec<Value>,
    ) -> Self {
        Call {
            id: id.into(),
            script_name: script_name.into(),
            method_name: method_name.into(),
            params,
        }
    }
}

/// A batch of calls sent in a single request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Calls {
    pub calls: Vec<Call>,
}

impl Calls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, call: Call) {
        self.calls.push(call);
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Call> {
        self.calls.iter()
    }
}

impl IntoIterator for Calls {
    type Item = Call;
    type IntoIter = std::vec::IntoIter<Call>;

    fn into_iter(self) -> Self::IntoIter {
        self.calls.into_iter()
    }
}

impl FromIterator<Call> for Calls {
    fn from_iter<I: IntoIterator<Item = Call>>(iter: I) -> Self {
        Calls {
            calls: iter.into_iter().collect(),
        }
    }
}
