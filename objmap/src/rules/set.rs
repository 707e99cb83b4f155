use std::collections::HashMap;

use super::MappingRule;
use crate::error::{MapperError, Result};
use crate::reflect::TypeInfo;

/// What happens when a rule targets a member that already has one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Replace the existing rule, keeping its position
    Allow,
    /// Keep the first rule
    #[default]
    Skip,
    /// Fail with an invalid-operation error
    Reject,
}

/// Ordered rules for one type pair, at most one per target member
#[derive(Clone)]
pub struct RuleSet {
    source_type: &'static TypeInfo,
    target_type: &'static TypeInfo,
    policy: OverwritePolicy,
    rules: Vec<MappingRule>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    pub fn new(
        source_type: &'static TypeInfo,
        target_type: &'static TypeInfo,
        policy: OverwritePolicy,
    ) -> Self {
        RuleSet {
            source_type,
            target_type,
            policy,
            rules: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn source_type(&self) -> &'static TypeInfo {
        self.source_type
    }

    pub fn target_type(&self) -> &'static TypeInfo {
        self.target_type
    }

    pub fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    /// Add a rule, resolving a duplicate target with the set's policy
    ///
    /// Returns whether the rule is now part of the set.
    pub fn add(&mut self, rule: MappingRule) -> Result<bool> {
        match self.index.get(rule.target_member()).copied() {
            None => {
                self.index.insert(rule.target_member().to_string(), self.rules.len());
                self.rules.push(rule);
                Ok(true)
            }
            Some(position) => match self.policy {
                OverwritePolicy::Allow => {
                    self.rules[position] = rule;
                    Ok(true)
                }
                OverwritePolicy::Skip => {
                    log::trace!(
                        "skipping rule {} -> {}: target already mapped",
                        rule.source_member(),
                        rule.target_member()
                    );
                    Ok(false)
                }
                OverwritePolicy::Reject => Err(MapperError::invalid_operation(format!(
                    "{}.{} already has a mapping rule",
                    self.target_type.name(),
                    rule.target_member()
                ))),
            },
        }
    }

    /// Add rules in order, stopping at the first rejection
    pub fn add_range(&mut self, rules: impl IntoIterator<Item = MappingRule>) -> Result<()> {
        for rule in rules {
            self.add(rule)?;
        }
        Ok(())
    }

    /// Rule for a target member
    pub fn get(&self, target_member: &str) -> Option<&MappingRule> {
        self.index.get(target_member).map(|&i| &self.rules[i])
    }

    pub fn contains(&self, target_member: &str) -> bool {
        self.index.contains_key(target_member)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MappingRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rebuild from already-ordered rules; `unindexed` rules are kept out of
    /// target lookup
    pub(crate) fn from_ordered(
        source_type: &'static TypeInfo,
        target_type: &'static TypeInfo,
        policy: OverwritePolicy,
        rules: Vec<(MappingRule, bool)>,
    ) -> Self {
        let mut set = RuleSet::new(source_type, target_type, policy);
        for (rule, indexed) in rules {
            if indexed {
                set.index.insert(rule.target_member().to_string(), set.rules.len());
            }
            set.rules.push(rule);
        }
        set
    }
}

impl IntoIterator for RuleSet {
    type Item = MappingRule;
    type IntoIter = std::vec::IntoIter<MappingRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a MappingRule;
    type IntoIter = std::slice::Iter<'a, MappingRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("source_type", &self.source_type.name())
            .field("target_type", &self.target_type.name())
            .field("policy", &self.policy)
            .field("rules", &self.rules)
            .finish()
    }
}
