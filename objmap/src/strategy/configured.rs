use super::StrategyContext;
use crate::error::{MapperError, Result};
use crate::rules::{MappingRule, OverwritePolicy, RuleSet};

/// Member pairs listed in the external mapping configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfiguredStrategy;

impl ConfiguredStrategy {
    pub fn produce_rules(&self, context: &StrategyContext) -> Result<RuleSet> {
        let mut rules = RuleSet::new(context.source, context.target, OverwritePolicy::Skip);
        let Some(mapping) = context.configuration.find(context.source, context.target) else {
            return Ok(rules);
        };

        for pair in &mapping.members {
            let source = context.source.readable_member(&pair.source).ok_or_else(|| {
                MapperError::configuration(format!(
                    "{} has no readable member '{}' (mapping to {})",
                    context.source.name(),
                    pair.source,
                    context.target.name()
                ))
            })?;
            let target = context.target.writable_member(&pair.target).ok_or_else(|| {
                MapperError::configuration(format!(
                    "{} has no writable member '{}' (mapping from {})",
                    context.target.name(),
                    pair.target,
                    context.source.name()
                ))
            })?;
            rules.add(MappingRule::reflective(source, target, true))?;
        }

        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MappingConfiguration, MemberPair, TypeMapping};
    use crate::reflect::Mappable;
    use crate::repository::WeakRepository;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default, crate::Mappable)]
    struct Contact {
        first_name: String,
        email: String,
    }

    #[derive(Debug, Clone, Default, crate::Mappable)]
    struct Lead {
        given_name: String,
        mail: String,
    }

    fn context(configuration: MappingConfiguration) -> StrategyContext {
        StrategyContext::new(
            Contact::describe(),
            Lead::describe(),
            &[],
            WeakRepository::default(),
            Arc::new(configuration),
        )
    }

    fn mapping(source: &str, members: &[(&str, &str)]) -> MappingConfiguration {
        MappingConfiguration {
            mappings: vec![TypeMapping {
                source: source.to_string(),
                target: "Lead".to_string(),
                members: members
                    .iter()
                    .map(|(s, t)| MemberPair::new(*s, *t))
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_listed_pairs_become_rules() {
        let ctx = context(mapping("Contact", &[("first_name", "given_name"), ("email", "mail")]));
        let rules = ConfiguredStrategy.produce_rules(&ctx).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("mail").unwrap().source_member(), "email");
    }

    #[test]
    fn test_qualified_type_names_match() {
        let qualified = Contact::describe().qualified_name();
        let ctx = context(mapping(qualified, &[("email", "mail")]));
        assert_eq!(ConfiguredStrategy.produce_rules(&ctx).unwrap().len(), 1);
    }

    #[test]
    fn test_no_entry_produces_nothing() {
        let ctx = context(mapping("Account", &[("email", "mail")]));
        assert!(ConfiguredStrategy.produce_rules(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_member_is_configuration_error() {
        let ctx = context(mapping("Contact", &[("phone", "mail")]));
        let err = ConfiguredStrategy.produce_rules(&ctx).unwrap_err();
        assert!(matches!(err, MapperError::Configuration(_)));
    }
}
