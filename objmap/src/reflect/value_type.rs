//! Declared member types and the conversions between Rust values and [`Value`]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Mappable, TypeInfo, Value};
use crate::convert::convert;
use crate::error::ConversionError;

/// Lazily resolved handle to another type's [`TypeInfo`]
///
/// Handles compare by type identity. Resolution is deferred so that types
/// may reference each other (or themselves) in their metadata.
#[derive(Clone, Copy)]
pub struct TypeHandle(fn() -> &'static TypeInfo);

impl TypeHandle {
    pub fn of<T: Mappable>() -> Self {
        TypeHandle(T::describe)
    }

    pub fn get(&self) -> &'static TypeInfo {
        (self.0)()
    }

    pub fn name(&self) -> &'static str {
        self.get().name()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.get().type_id() == other.get().type_id()
    }
}

impl Eq for TypeHandle {}

impl std::hash::Hash for TypeHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.get().type_id().hash(state);
    }
}

impl std::fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeHandle({})", self.name())
    }
}

/// Declared type of a member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    DateTime,
    Guid,
    /// A nested mappable object
    Object(TypeHandle),
    /// A sequence of elements
    List(Box<ValueType>),
    /// The only nullable type
    Optional(Box<ValueType>),
}

impl ValueType {
    pub fn object<T: Mappable>() -> Self {
        ValueType::Object(TypeHandle::of::<T>())
    }

    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn optional(inner: ValueType) -> Self {
        ValueType::Optional(Box::new(inner))
    }

    pub fn is_integer(&self) -> bool {
        self.integer_bounds().is_some()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Bool or numeric
    pub fn is_primitive(&self) -> bool {
        matches!(self, ValueType::Bool) || self.is_numeric()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ValueType::String)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ValueType::List(_))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, ValueType::Optional(_))
    }

    /// The type with any `Optional` wrapper removed
    pub fn non_null(&self) -> &ValueType {
        match self {
            ValueType::Optional(inner) => inner.non_null(),
            other => other,
        }
    }

    /// Object type behind this member, looking through `Optional`
    pub fn object_type(&self) -> Option<&'static TypeInfo> {
        match self.non_null() {
            ValueType::Object(handle) => Some(handle.get()),
            _ => None,
        }
    }

    /// Object type of a member that holds an object, an optional object, or
    /// a list of objects
    pub fn associated_object(&self) -> Option<TypeHandle> {
        match self.non_null() {
            ValueType::Object(handle) => Some(*handle),
            ValueType::List(element) => match element.non_null() {
                ValueType::Object(handle) => Some(*handle),
                _ => None,
            },
            _ => None,
        }
    }

    /// Inclusive range of an integer kind
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        let bounds = match self {
            ValueType::I8 => (i8::MIN as i128, i8::MAX as i128),
            ValueType::I16 => (i16::MIN as i128, i16::MAX as i128),
            ValueType::I32 => (i32::MIN as i128, i32::MAX as i128),
            ValueType::I64 => (i64::MIN as i128, i64::MAX as i128),
            ValueType::U8 => (0, u8::MAX as i128),
            ValueType::U16 => (0, u16::MAX as i128),
            ValueType::U32 => (0, u32::MAX as i128),
            ValueType::U64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Bool => write!(f, "bool"),
            ValueType::I8 => write!(f, "i8"),
            ValueType::I16 => write!(f, "i16"),
            ValueType::I32 => write!(f, "i32"),
            ValueType::I64 => write!(f, "i64"),
            ValueType::U8 => write!(f, "u8"),
            ValueType::U16 => write!(f, "u16"),
            ValueType::U32 => write!(f, "u32"),
            ValueType::U64 => write!(f, "u64"),
            ValueType::F32 => write!(f, "f32"),
            ValueType::F64 => write!(f, "f64"),
            ValueType::String => write!(f, "String"),
            ValueType::DateTime => write!(f, "DateTime"),
            ValueType::Guid => write!(f, "Guid"),
            ValueType::Object(handle) => write!(f, "{}", handle.name()),
            ValueType::List(element) => write!(f, "Vec<{}>", element),
            ValueType::Optional(inner) => write!(f, "Option<{}>", inner),
        }
    }
}

/// A Rust type that can live in a mappable member
pub trait MemberValue: Sized + Send + Sync + 'static {
    /// Declared type used by the conversion decider
    fn value_type() -> ValueType;

    fn to_value(&self) -> Value;

    /// Build the Rust value, converting `value` to [`Self::value_type`] first
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

macro_rules! integer_member_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl MemberValue for $ty {
            fn value_type() -> ValueType {
                ValueType::$kind
            }

            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }

            fn from_value(value: Value) -> Result<Self, ConversionError> {
                match convert(value, &ValueType::$kind)? {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| ConversionError::Overflow {
                        value: i.to_string(),
                        target: ValueType::$kind,
                    }),
                    other => Err(ConversionError::unsupported(&other, &ValueType::$kind)),
                }
            }
        }
    )*};
}

integer_member_value!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
);

// u64 values above i64::MAX travel as decimal text
impl MemberValue for u64 {
    fn value_type() -> ValueType {
        ValueType::U64
    }

    fn to_value(&self) -> Value {
        i64::try_from(*self)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::String(self.to_string()))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match convert(value, &ValueType::U64)? {
            Value::Int(i) => u64::try_from(i).map_err(|_| ConversionError::Overflow {
                value: i.to_string(),
                target: ValueType::U64,
            }),
            Value::String(s) => s.parse::<u64>().map_err(|_| ConversionError::Parse {
                value: s,
                target: ValueType::U64,
            }),
            other => Err(ConversionError::unsupported(&other, &ValueType::U64)),
        }
    }
}

impl MemberValue for f64 {
    fn value_type() -> ValueType {
        ValueType::F64
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match convert(value, &ValueType::F64)? {
            Value::Float(f) => Ok(f),
            other => Err(ConversionError::unsupported(&other, &ValueType::F64)),
        }
    }
}

impl MemberValue for f32 {
    fn value_type() -> ValueType {
        ValueType::F32
    }

    fn to_value(&self) -> Value {
        Value::Float(*self as f64)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match convert(value, &ValueType::F32)? {
            Value::Float(f) => Ok(f as f32),
            other => Err(ConversionError::unsupported(&other, &ValueType::F32)),
        }
    }
}

impl MemberValue for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match convert(value, &ValueType::Bool)? {
            Value::Bool(b) => Ok(b),
            other => Err(ConversionError::unsupported(&other, &ValueType::Bool)),
        }
    }
}

impl MemberValue for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match convert(value, &ValueType::String)? {
            Value::String(s) => Ok(s),
            other => Err(ConversionError::unsupported(&other, &ValueType::String)),
        }
    }
}

impl MemberValue for DateTime<Utc> {
    fn value_type() -> ValueType {
        ValueType::DateTime
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match convert(value, &ValueType::DateTime)? {
            Value::DateTime(dt) => Ok(dt),
            other => Err(ConversionError::unsupported(&other, &ValueType::DateTime)),
        }
    }
}

impl MemberValue for Uuid {
    fn value_type() -> ValueType {
        ValueType::Guid
    }

    fn to_value(&self) -> Value {
        Value::Guid(*self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match convert(value, &ValueType::Guid)? {
            Value::Guid(g) => Ok(g),
            other => Err(ConversionError::unsupported(&other, &ValueType::Guid)),
        }
    }
}

impl<T: MemberValue> MemberValue for Option<T> {
    fn value_type() -> ValueType {
        ValueType::optional(T::value_type())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: MemberValue> MemberValue for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::list(T::value_type())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(MemberValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            Value::Null => Err(ConversionError::NullToNonNullable {
                target: Self::value_type(),
            }),
            other => Err(ConversionError::unsupported(&other, &Self::value_type())),
        }
    }
}
