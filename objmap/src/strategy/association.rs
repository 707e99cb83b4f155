use super::StrategyContext;
use crate::error::{MapperError, Result};
use crate::introspect::{source_members, target_members};
use crate::reflect::{MemberInfo, TypeInfo};
use crate::repository::Inclusion;
use crate::rules::{MappingRule, OverwritePolicy, RuleSet};

/// Nested objects routed through other mappers
///
/// A like-named member pair whose object types match an inclusion is mapped
/// by the repository's mapper for that inclusion. Members may hold the object
/// itself, an optional object or a list of objects, as long as both sides
/// agree on being a list.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociationStrategy;

impl AssociationStrategy {
    pub fn produce_rules(&self, context: &StrategyContext) -> Result<RuleSet> {
        let mut rules = RuleSet::new(context.source, context.target, OverwritePolicy::Skip);
        if context.inclusions.is_empty() {
            return Ok(rules);
        }

        for source in source_members(context.source) {
            for target in target_members(context.target) {
                if source.name() != target.name() {
                    continue;
                }
                let Some(inclusion) = matching_inclusion(&context.inclusions, source, target) else {
                    continue;
                };

                let repository = context.repository.upgrade().ok_or_else(|| {
                    MapperError::invalid_operation("the repository that owns this mapper was dropped")
                })?;
                let inner = repository.resolve_dyn(inclusion.source, inclusion.target, &context.inclusions)?;
                rules.add(MappingRule::mapper(inner, source, target))?;
            }
        }

        Ok(rules)
    }
}

fn matching_inclusion<'a>(
    inclusions: &'a [Inclusion],
    source: &MemberInfo,
    target: &MemberInfo,
) -> Option<&'a Inclusion> {
    if source.value_type().non_null().is_list() != target.value_type().non_null().is_list() {
        return None;
    }
    let source_object = source.value_type().associated_object()?.get();
    let target_object = target.value_type().associated_object()?.get();
    inclusions
        .iter()
        .find(|inclusion| same_type(inclusion.source, source_object) && same_type(inclusion.target, target_object))
}

fn same_type(a: &TypeInfo, b: &TypeInfo) -> bool {
    a.type_id() == b.type_id()
}
