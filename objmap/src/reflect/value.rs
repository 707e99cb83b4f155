//! Dynamic member values

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Mappable, Reflect, TypeInfo};
use crate::error::ConversionError;

/// A member value in transit between two objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Null/absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Any integer kind, widened
    Int(i64),
    /// Any floating point kind, widened
    Float(f64),
    /// Text (also carries `u64` values above `i64::MAX`)
    String(String),
    /// Date and time
    DateTime(DateTime<Utc>),
    /// Unique identifier
    Guid(Uuid),
    /// Nested object (not serializable)
    #[serde(skip)]
    Object(ObjectValue),
    /// Ordered elements of one member type
    List(Vec<Value>),
}

impl Value {
    /// Wrap a mappable object
    pub fn object<T: Mappable>(object: T) -> Self {
        Value::Object(ObjectValue::new(object))
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Guid(_) => "guid",
            Value::Object(_) => "object",
            Value::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Take the nested object out as a concrete type
    pub fn into_object<T: Mappable>(self) -> Result<T, ConversionError> {
        match self {
            Value::Object(obj) => {
                let found = obj.type_info().qualified_name();
                obj.into_inner::<T>().ok_or(ConversionError::WrongObject {
                    expected: std::any::type_name::<T>(),
                    found,
                })
            }
            other => Err(ConversionError::Unsupported {
                from: other.kind(),
                to: super::ValueType::object::<T>(),
            }),
        }
    }

    /// Render as JSON, expanding nested objects member by member
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Guid(g) => serde_json::Value::String(g.to_string()),
            Value::Object(obj) => obj.to_json(),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "(null)"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Guid(g) => write!(f, "{}", g),
            Value::Object(obj) => write!(f, "{}", obj.type_info().name()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// A boxed reflected object carried inside a [`Value`]
pub struct ObjectValue(Box<dyn Reflect>);

impl ObjectValue {
    pub fn new<T: Mappable>(object: T) -> Self {
        ObjectValue(Box::new(object))
    }

    pub fn from_boxed(object: Box<dyn Reflect>) -> Self {
        ObjectValue(object)
    }

    pub fn type_info(&self) -> &'static TypeInfo {
        self.0.type_info()
    }

    pub fn as_reflect(&self) -> &dyn Reflect {
        self.0.as_ref()
    }

    pub fn as_reflect_mut(&mut self) -> &mut dyn Reflect {
        self.0.as_mut()
    }

    pub fn downcast_ref<T: Mappable>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn into_inner<T: Mappable>(self) -> Option<T> {
        self.0.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn into_boxed(self) -> Box<dyn Reflect> {
        self.0
    }

    fn readable_values(&self) -> impl Iterator<Item = (&'static str, Value)> + '_ {
        self.type_info()
            .members()
            .iter()
            .filter(|m| m.is_readable())
            .map(move |m| (m.name(), m.get(self.as_reflect()).unwrap_or(Value::Null)))
    }

    fn to_json(&self) -> serde_json::Value {
        let map = self
            .readable_values()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl Clone for ObjectValue {
    fn clone(&self) -> Self {
        ObjectValue(self.0.clone_reflect())
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_info().type_id() == other.type_info().type_id()
            && self
                .readable_values()
                .zip(other.readable_values())
                .all(|((_, a), (_, b))| a == b)
    }
}

impl std::fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct(self.type_info().name());
        for (name, value) in self.readable_values() {
            debug.field(name, &value);
        }
        debug.finish()
    }
}
