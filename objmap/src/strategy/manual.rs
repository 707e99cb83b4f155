use super::StrategyContext;
use crate::error::Result;
use crate::rules::{MappingRule, OverwritePolicy, RuleSet};

/// Rules registered at runtime
///
/// Starts empty. Registering a second rule for the same target replaces the
/// first.
#[derive(Debug, Clone)]
pub struct ManualStrategy {
    rules: RuleSet,
}

impl ManualStrategy {
    pub fn new(context: &StrategyContext) -> Self {
        ManualStrategy {
            rules: RuleSet::new(context.source, context.target, OverwritePolicy::Allow),
        }
    }

    pub fn add_rule(&mut self, rule: MappingRule) -> Result<()> {
        log::debug!(
            "registering manual rule {} -> {}",
            rule.source_member(),
            rule.target_member()
        );
        self.rules.add(rule).map(|_| ())
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn produce_rules(&self, _context: &StrategyContext) -> Result<RuleSet> {
        Ok(self.rules.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingConfiguration;
    use crate::reflect::Mappable;
    use crate::repository::WeakRepository;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default, crate::Mappable)]
    struct Order {
        total: f64,
    }

    #[derive(Debug, Clone, Default, crate::Mappable)]
    struct OrderView {
        total: String,
    }

    fn context() -> StrategyContext {
        StrategyContext::new(
            Order::describe(),
            OrderView::describe(),
            &[],
            WeakRepository::default(),
            Arc::new(MappingConfiguration::default()),
        )
    }

    #[test]
    fn test_starts_empty() {
        let ctx = context();
        let manual = ManualStrategy::new(&ctx);
        assert!(manual.produce_rules(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_later_registration_replaces_earlier() {
        let ctx = context();
        let mut manual = ManualStrategy::new(&ctx);
        manual
            .add_rule(MappingRule::delegate("first", "total", Arc::new(|_, _| Ok(()))))
            .unwrap();
        manual
            .add_rule(MappingRule::delegate("second", "total", Arc::new(|_, _| Ok(()))))
            .unwrap();

        let rules = manual.produce_rules(&ctx).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get("total").unwrap().source_member(), "second");
    }
}
