//! Mapping rules: one source-to-target member binding each

pub mod compile;
mod set;

pub use set::{OverwritePolicy, RuleSet};

use std::sync::Arc;

use anyhow::anyhow;

use crate::convert::{can_convert, convert, Compatibility, SourceAccessor};
use crate::mapper::ObjectMapper;
use crate::reflect::{MemberInfo, ObjectValue, Reflect, TypeInfo, Value};

/// Arbitrary user code run as a rule
pub type MappingAction =
    Arc<dyn Fn(&dyn Reflect, &mut dyn Reflect) -> anyhow::Result<()> + Send + Sync>;

/// How a rule moves its value
#[derive(Clone)]
pub enum RuleKind {
    /// Copy through member accessors
    ///
    /// Non-strict rules re-run [`can_convert`] on every apply, which lets them
    /// flatten nested members. Strict rules convert the source member straight
    /// into the target member type.
    Reflective {
        source: &'static MemberInfo,
        target: &'static MemberInfo,
        strict: bool,
    },
    /// Run a user action
    Delegate(MappingAction),
    /// Route an object, optional object or list member through another mapper
    Mapper {
        mapper: Arc<dyn ObjectMapper>,
        source: &'static MemberInfo,
        target: &'static MemberInfo,
    },
}

/// One target member binding plus its apply operation
///
/// Member names are display and lookup keys. Delegate rules may use
/// descriptive names that are not real members.
#[derive(Clone)]
pub struct MappingRule {
    source_member: String,
    target_member: String,
    kind: RuleKind,
}

impl MappingRule {
    pub fn reflective(source: &'static MemberInfo, target: &'static MemberInfo, strict: bool) -> Self {
        MappingRule {
            source_member: source.name().to_string(),
            target_member: target.name().to_string(),
            kind: RuleKind::Reflective { source, target, strict },
        }
    }

    pub fn delegate(
        source_member: impl Into<String>,
        target_member: impl Into<String>,
        action: MappingAction,
    ) -> Self {
        MappingRule {
            source_member: source_member.into(),
            target_member: target_member.into(),
            kind: RuleKind::Delegate(action),
        }
    }

    pub fn mapper(
        mapper: Arc<dyn ObjectMapper>,
        source: &'static MemberInfo,
        target: &'static MemberInfo,
    ) -> Self {
        MappingRule {
            source_member: source.name().to_string(),
            target_member: target.name().to_string(),
            kind: RuleKind::Mapper { mapper, source, target },
        }
    }

    pub fn source_member(&self) -> &str {
        &self.source_member
    }

    pub fn target_member(&self) -> &str {
        &self.target_member
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn is_reflective(&self) -> bool {
        matches!(self.kind, RuleKind::Reflective { .. })
    }

    /// Apply the rule to one source/target pair
    pub fn apply(&self, source: &dyn Reflect, target: &mut dyn Reflect) -> anyhow::Result<()> {
        log::trace!("applying rule {} -> {}", self.source_member, self.target_member);
        match &self.kind {
            RuleKind::Reflective { source: from, target: to, strict } => {
                apply_reflective(from, to, *strict, source, target)
            }
            RuleKind::Delegate(action) => action(source, target),
            RuleKind::Mapper { mapper, source: from, target: to } => {
                apply_mapper(mapper.as_ref(), from, to, source, target)
            }
        }
    }
}

impl std::fmt::Debug for MappingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            RuleKind::Reflective { strict: true, .. } => "reflective(strict)",
            RuleKind::Reflective { .. } => "reflective",
            RuleKind::Delegate(_) => "delegate",
            RuleKind::Mapper { .. } => "mapper",
        };
        f.debug_struct("MappingRule")
            .field("source_member", &self.source_member)
            .field("target_member", &self.target_member)
            .field("kind", &kind)
            .finish()
    }
}

fn apply_reflective(
    from: &'static MemberInfo,
    to: &'static MemberInfo,
    strict: bool,
    source: &dyn Reflect,
    target: &mut dyn Reflect,
) -> anyhow::Result<()> {
    let accessor = if strict {
        SourceAccessor::Direct(from)
    } else {
        match can_convert(from, to) {
            Compatibility::Incompatible => {
                return Err(anyhow!(
                    "{} ({}) cannot populate {} ({})",
                    from.name(),
                    from.value_type(),
                    to.name(),
                    to.value_type()
                ));
            }
            compat => SourceAccessor::for_compatibility(from, compat)
                .ok_or_else(|| anyhow!("no accessor for {}", from.name()))?,
        }
    };

    let Some(value) = accessor.read(source)? else {
        return Ok(());
    };
    let value = convert(value, to.value_type())?;
    to.set(target, value)?;
    Ok(())
}

fn apply_mapper(
    mapper: &dyn ObjectMapper,
    from: &'static MemberInfo,
    to: &'static MemberInfo,
    source: &dyn Reflect,
    target: &mut dyn Reflect,
) -> anyhow::Result<()> {
    let value = from.get(source)?;
    let existing = if to.is_readable() && !to.value_type().non_null().is_list() {
        to.get(target)?.as_object().cloned()
    } else {
        None
    };
    let mapped = map_value(mapper, value, existing)?;
    to.set(target, mapped)?;
    Ok(())
}

/// Map a nested object or a list of objects through `mapper`
fn map_value(mapper: &dyn ObjectMapper, value: Value, existing: Option<ObjectValue>) -> anyhow::Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Object(obj) => {
            let mut into = match existing {
                Some(current) if current.type_info().type_id() == mapper.target_type().type_id() => current,
                _ => construct(mapper.target_type())?,
            };
            mapper.map_object(obj.as_reflect(), into.as_reflect_mut())?;
            Ok(Value::Object(into))
        }
        Value::List(items) => items
            .into_iter()
            .map(|item| map_value(mapper, item, None))
            .collect::<anyhow::Result<Vec<_>>>()
            .map(Value::List),
        other => Err(anyhow!(
            "expected a {} object or a list of them, got {}",
            mapper.source_type().name(),
            other.kind()
        )),
    }
}

fn construct(info: &'static TypeInfo) -> anyhow::Result<ObjectValue> {
    info.construct()
        .map(ObjectValue::from_boxed)
        .ok_or_else(|| anyhow!("{} has no default constructor", info.name()))
}
