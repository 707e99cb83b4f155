//! Member compatibility decisions
//!
//! [`can_convert`] is the single naming heuristic of the engine. The
//! convention strategy uses it to discover rules; non-strict reflective rules
//! re-run it when they apply.

mod coerce;

pub use coerce::convert;

use crate::error::ConversionError;
use crate::reflect::{MemberInfo, Reflect, Value, ValueType};

/// Outcome of matching a source member against a target member
#[derive(Debug, Clone, Copy)]
pub enum Compatibility {
    Incompatible,
    /// Names match and the types convert
    Direct,
    /// The target reads a member of the source member's own object
    Flattened(&'static MemberInfo),
}

impl Compatibility {
    pub fn is_compatible(&self) -> bool {
        !matches!(self, Compatibility::Incompatible)
    }
}

impl PartialEq for Compatibility {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Compatibility::Incompatible, Compatibility::Incompatible) => true,
            (Compatibility::Direct, Compatibility::Direct) => true,
            (Compatibility::Flattened(a), Compatibility::Flattened(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// Decide whether `source` can populate `target`, and how
pub fn can_convert(source: &MemberInfo, target: &MemberInfo) -> Compatibility {
    if source.name() == target.name() {
        return if is_convertible(source.value_type(), target.value_type()) {
            Compatibility::Direct
        } else {
            Compatibility::Incompatible
        };
    }

    match flattened_member(source, target.name()) {
        Some(nested) if is_convertible(nested.value_type(), target.value_type()) => {
            Compatibility::Flattened(nested)
        }
        _ => Compatibility::Incompatible,
    }
}

/// `inner` + `name` -> `inner_name` (or `innerName`, `InnerName`)
fn flattened_member(source: &MemberInfo, target_name: &str) -> Option<&'static MemberInfo> {
    let prefix = source.name();
    let head = target_name.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let remainder = &target_name[prefix.len()..];
    let remainder = remainder.strip_prefix('_').unwrap_or(remainder);
    if remainder.is_empty() {
        return None;
    }

    let nested_type = source.value_type().object_type()?;
    nested_type
        .members()
        .iter()
        .find(|m| m.is_readable() && m.name().eq_ignore_ascii_case(remainder))
}

/// Whether values declared as `source` can be stored in a `target` member
///
/// Holds for assignable types (including `T` into `Option<T>`), any pair of
/// primitives, any type into text, and lists whose elements convert.
/// `Option<A>` into `B` is accepted when `A` converts; a null then fails at
/// runtime.
pub fn is_convertible(source: &ValueType, target: &ValueType) -> bool {
    let (source, target) = (source.non_null(), target.non_null());
    if source == target || target.is_text() {
        return true;
    }
    if source.is_primitive() && target.is_primitive() {
        return true;
    }
    match (source, target) {
        (ValueType::List(a), ValueType::List(b)) => is_convertible(a, b),
        _ => false,
    }
}

/// How a planned copy reads its source value
#[derive(Debug, Clone, Copy)]
pub enum SourceAccessor {
    Direct(&'static MemberInfo),
    Flattened {
        outer: &'static MemberInfo,
        inner: &'static MemberInfo,
    },
}

impl SourceAccessor {
    /// Pick the accessor matching a compatibility decision
    pub fn for_compatibility(source: &'static MemberInfo, compat: Compatibility) -> Option<Self> {
        match compat {
            Compatibility::Incompatible => None,
            Compatibility::Direct => Some(SourceAccessor::Direct(source)),
            Compatibility::Flattened(inner) => Some(SourceAccessor::Flattened { outer: source, inner }),
        }
    }

    /// Declared type of the value this accessor produces
    pub fn value_type(&self) -> &ValueType {
        match self {
            SourceAccessor::Direct(member) => member.value_type(),
            SourceAccessor::Flattened { inner, .. } => inner.value_type(),
        }
    }

    /// Read the source value
    ///
    /// Returns `None` when a flattened read finds the outer object absent; the
    /// target member is then left untouched.
    pub fn read(&self, source: &dyn Reflect) -> Result<Option<Value>, ConversionError> {
        match self {
            SourceAccessor::Direct(member) => member.get(source).map(Some),
            SourceAccessor::Flattened { outer, inner } => match outer.get(source)? {
                Value::Null => Ok(None),
                Value::Object(obj) => inner.get(obj.as_reflect()).map(Some),
                other => Err(ConversionError::unsupported(&other, outer.value_type())),
            },
        }
    }
}
