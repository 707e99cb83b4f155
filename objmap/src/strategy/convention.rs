use super::StrategyContext;
use crate::convert::{can_convert, Compatibility};
use crate::error::Result;
use crate::introspect::{source_members, target_members};
use crate::rules::{MappingRule, OverwritePolicy, RuleSet};

/// Like-named members, plus one level of flattening
///
/// Every source/target pair accepted by [`can_convert`] becomes a non-strict
/// reflective rule. Like-named pairs are discovered first, so a direct match
/// always beats a flattened one for the same target. Within each pass source
/// members are the outer loop and the first source that fits a target wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionStrategy;

impl ConventionStrategy {
    pub fn produce_rules(&self, context: &StrategyContext) -> Result<RuleSet> {
        let mut rules = RuleSet::new(context.source, context.target, OverwritePolicy::Skip);
        for flattened in [false, true] {
            for source in source_members(context.source) {
                for target in target_members(context.target) {
                    let matched = match can_convert(source, target) {
                        Compatibility::Direct => !flattened,
                        Compatibility::Flattened(_) => flattened,
                        Compatibility::Incompatible => false,
                    };
                    if matched {
                        rules.add(MappingRule::reflective(source, target, false))?;
                    }
                }
            }
        }
        Ok(rules)
    }
}
