//! Member metadata and accessors

use std::any::type_name;

use super::{Mappable, MemberValue, Reflect, TypeHandle, Value, ValueType};
use crate::error::ConversionError;

type Getter = Box<dyn Fn(&dyn Reflect) -> Result<Value, ConversionError> + Send + Sync>;
type Setter = Box<dyn Fn(&mut dyn Reflect, Value) -> Result<(), ConversionError> + Send + Sync>;

/// Which way a declarative tag links two members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The tagged member is populated from the other type's member
    From,
    /// The tagged member populates the other type's member
    To,
    /// Both of the above
    Both,
}

impl Direction {
    /// Tagged member acts as a source
    pub fn is_outgoing(&self) -> bool {
        matches!(self, Direction::To | Direction::Both)
    }

    /// Tagged member acts as a target
    pub fn is_incoming(&self) -> bool {
        matches!(self, Direction::From | Direction::Both)
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "from" => Ok(Direction::From),
            "to" => Ok(Direction::To),
            "both" => Ok(Direction::Both),
            other => Err(format!("unknown mapping direction '{}'", other)),
        }
    }
}

/// A declarative link from one member to a member of another type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingTag {
    pub direction: Direction,
    pub other_type: TypeHandle,
    pub other_member: &'static str,
}

impl MappingTag {
    pub fn new(direction: Direction, other_type: TypeHandle, other_member: &'static str) -> Self {
        MappingTag {
            direction,
            other_type,
            other_member,
        }
    }
}

/// One member of a mappable type
pub struct MemberInfo {
    name: &'static str,
    value_type: ValueType,
    getter: Option<Getter>,
    setter: Option<Setter>,
    tags: Vec<MappingTag>,
}

impl MemberInfo {
    pub(super) fn new(
        name: &'static str,
        value_type: ValueType,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Self {
        MemberInfo {
            name,
            value_type,
            getter,
            setter,
            tags: Vec::new(),
        }
    }

    pub(super) fn push_tag(&mut self, tag: MappingTag) {
        self.tags.push(tag);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type of the member
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub fn tags(&self) -> &[MappingTag] {
        &self.tags
    }

    /// Read the member from `object`
    ///
    /// Write-only members read as `Null`.
    pub fn get(&self, object: &dyn Reflect) -> Result<Value, ConversionError> {
        match &self.getter {
            Some(getter) => getter(object),
            None => Ok(Value::Null),
        }
    }

    /// Write `value` into the member of `object`, converting it to the member type
    pub fn set(&self, object: &mut dyn Reflect, value: Value) -> Result<(), ConversionError> {
        match &self.setter {
            Some(setter) => setter(object, value),
            None => Err(ConversionError::Unsupported {
                from: value.kind(),
                to: self.value_type.clone(),
            }),
        }
    }
}

impl std::fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("type", &self.value_type.to_string())
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .field("tags", &self.tags)
            .finish()
    }
}

fn wrong_object<T: Mappable>(object: &dyn Reflect) -> ConversionError {
    ConversionError::WrongObject {
        expected: type_name::<T>(),
        found: object.type_info().qualified_name(),
    }
}

pub(super) fn field_getter<T: Mappable, V: MemberValue>(get: fn(&T) -> &V) -> Getter {
    Box::new(move |object: &dyn Reflect| {
        let typed = object
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| wrong_object::<T>(object))?;
        Ok(get(typed).to_value())
    })
}

pub(super) fn property_getter<T: Mappable, V: MemberValue>(get: fn(&T) -> V) -> Getter {
    Box::new(move |object: &dyn Reflect| {
        let typed = object
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| wrong_object::<T>(object))?;
        Ok(get(typed).to_value())
    })
}

pub(super) fn field_setter<T: Mappable, V: MemberValue>(get_mut: fn(&mut T) -> &mut V) -> Setter {
    Box::new(move |object: &mut dyn Reflect, value: Value| {
        let converted = V::from_value(value)?;
        let found = object.type_info().qualified_name();
        let typed = object
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(ConversionError::WrongObject {
                expected: type_name::<T>(),
                found,
            })?;
        *get_mut(typed) = converted;
        Ok(())
    })
}

pub(super) fn property_setter<T: Mappable, V: MemberValue>(set: fn(&mut T, V)) -> Setter {
    Box::new(move |object: &mut dyn Reflect, value: Value| {
        let converted = V::from_value(value)?;
        let found = object.type_info().qualified_name();
        let typed = object
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(ConversionError::WrongObject {
                expected: type_name::<T>(),
                found,
            })?;
        set(typed, converted);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("From".parse::<Direction>(), Ok(Direction::From));
        assert_eq!("both".parse::<Direction>(), Ok(Direction::Both));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_flags() {
        assert!(Direction::To.is_outgoing());
        assert!(!Direction::To.is_incoming());
        assert!(Direction::From.is_incoming());
        assert!(Direction::Both.is_incoming() && Direction::Both.is_outgoing());
    }
}
