use super::StrategyContext;
use crate::error::Result;
use crate::introspect::{source_members, target_members};
use crate::reflect::{MappingTag, TypeInfo};
use crate::rules::{MappingRule, OverwritePolicy, RuleSet};

/// Rules declared with member tags
///
/// A source member tagged `to`/`both` for the target type, or a target
/// member tagged `from`/`both` for the source type, yields a strict rule
/// between the two tagged members.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeStrategy;

impl AttributeStrategy {
    pub fn produce_rules(&self, context: &StrategyContext) -> Result<RuleSet> {
        let mut rules = RuleSet::new(context.source, context.target, OverwritePolicy::Skip);

        for source in source_members(context.source) {
            for tag in tags_for(source.tags(), context.target) {
                if !tag.direction.is_outgoing() {
                    continue;
                }
                match context.target.writable_member(tag.other_member) {
                    Some(target) => {
                        rules.add(MappingRule::reflective(source, target, true))?;
                    }
                    None => log::warn!(
                        "skipping tag on {}.{}: {} has no writable member '{}'",
                        context.source.name(),
                        source.name(),
                        context.target.name(),
                        tag.other_member
                    ),
                }
            }
        }

        for target in target_members(context.target) {
            for tag in tags_for(target.tags(), context.source) {
                if !tag.direction.is_incoming() {
                    continue;
                }
                match context.source.readable_member(tag.other_member) {
                    Some(source) => {
                        rules.add(MappingRule::reflective(source, target, true))?;
                    }
                    None => log::warn!(
                        "skipping tag on {}.{}: {} has no readable member '{}'",
                        context.target.name(),
                        target.name(),
                        context.source.name(),
                        tag.other_member
                    ),
                }
            }
        }

        Ok(rules)
    }
}

fn tags_for<'a>(tags: &'a [MappingTag], other: &'static TypeInfo) -> impl Iterator<Item = &'a MappingTag> {
    tags.iter()
        .filter(move |tag| tag.other_type.get().type_id() == other.type_id())
}
