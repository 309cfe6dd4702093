use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A value appended to a script buffer as data.
///
/// Primitives are carried inline. Anything else is an opaque
/// [`ScriptData::Object`]; its identity is the address of the shared
/// allocation, so cloning the `ScriptData` keeps the identity while building
/// a second `Arc` from an equal value does not.
#[derive(Clone)]
pub enum ScriptData {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Object(Arc<dyn Any + Send + Sync>),
}

impl ScriptData {
    /// Wrap an arbitrary value as a fresh object.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        ScriptData::Object(Arc::new(value))
    }

    /// Wrap an already shared value, keeping its identity.
    pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        ScriptData::Object(value)
    }

    /// Pointer identity of an object. Primitives have none.
    pub fn identity(&self) -> Option<usize> {
        match self {
            ScriptData::Object(obj) => Some(Arc::as_ptr(obj) as *const () as usize),
            _ => None,
        }
    }

    /// Borrow the object as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            ScriptData::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, ScriptData::Object(_))
    }
}

impl fmt::Debug for ScriptData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptData::Null => write!(f, "Null"),
            ScriptData::Bool(b) => write!(f, "Bool({})", b),
            ScriptData::Int(i) => write!(f, "Int({})", i),
            ScriptData::Float(n) => write!(f, "Float({})", n),
            ScriptData::Char(c) => write!(f, "Char({:?})", c),
            ScriptData::Str(s) => write!(f, "Str({:?})", s),
            ScriptData::Object(_) => write!(f, "Object({:#x})", self.identity().unwrap_or_default()),
        }
    }
}

impl From<bool> for ScriptData {
    fn from(b: bool) -> Self {
        ScriptData::Bool(b)
    }
}

impl From<i32> for ScriptData {
    fn from(i: i32) -> Self {
        ScriptData::Int(i.into())
    }
}

impl From<i64> for ScriptData {
    fn from(i: i64) -> Self {
        ScriptData::Int(i)
    }
}

impl From<u32> for ScriptData {
    fn from(i: u32) -> Self {
        ScriptData::Int(i.into())
    }
}

impl From<f32> for ScriptData {
    fn from(n: f32) -> Self {
        ScriptData::Float(n.into())
    }
}

impl From<f64> for ScriptData {
    fn from(n: f64) -> Self {
        ScriptData::Float(n)
    }
}

impl From<char> for ScriptData {
    fn from(c: char) -> Self {
        ScriptData::Char(c)
    }
}

impl From<&str> for ScriptData {
    fn from(s: &str) -> Self {
        ScriptData::Str(s.to_string())
    }
}

impl From<String> for ScriptData {
    fn from(s: String) -> Self {
        ScriptData::Str(s)
    }
}

impl<T: Into<ScriptData>> From<Option<T>> for ScriptData {
    fn from(value: Option<T>) -> Self {
        value.map_or(ScriptData::Null, Into::into)
    }
}

/// JSON primitives map onto the inline variants; arrays and objects become
/// a fresh [`ScriptData::Object`] holding the `Value`.
impl From<Value> for ScriptData {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ScriptData::Null,
            Value::Bool(b) => ScriptData::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ScriptData::Int(i),
                None => ScriptData::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ScriptData::Str(s),
            composite => ScriptData::object(composite),
        }
    }
}
