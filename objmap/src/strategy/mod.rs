//! Strategies that produce mapping rules for a type pair
//!
//! Each strategy looks at the two types from a different angle (member
//! names, declarative tags, runtime registrations, external configuration,
//! nested mappers) and contributes a [`RuleSet`]. The composite mapper merges
//! them in precedence order.

mod association;
mod attribute;
mod configured;
mod convention;
mod manual;

pub use association::AssociationStrategy;
pub use attribute::AttributeStrategy;
pub use configured::ConfiguredStrategy;
pub use convention::ConventionStrategy;
pub use manual::ManualStrategy;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::MappingConfiguration;
use crate::error::{MapperError, Result};
use crate::reflect::TypeInfo;
use crate::repository::{Inclusion, WeakRepository};
use crate::rules::RuleSet;

/// Kind of strategy, as listed in mapping options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Convention,
    Attribute,
    Manual,
    Configuration,
    Association,
}

impl StrategyKind {
    pub fn all_variants() -> &'static [StrategyKind] {
        &[
            StrategyKind::Convention,
            StrategyKind::Attribute,
            StrategyKind::Manual,
            StrategyKind::Configuration,
            StrategyKind::Association,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Convention => "convention",
            StrategyKind::Attribute => "attribute",
            StrategyKind::Manual => "manual",
            StrategyKind::Configuration => "configuration",
            StrategyKind::Association => "association",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        StrategyKind::all_variants()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| MapperError::configuration(format!("unknown mapping strategy '{}'", name)))
    }
}

/// Everything a strategy may consult when producing rules
#[derive(Clone)]
pub struct StrategyContext {
    pub source: &'static TypeInfo,
    pub target: &'static TypeInfo,
    pub inclusions: Vec<Inclusion>,
    pub repository: WeakRepository,
    pub configuration: Arc<MappingConfiguration>,
}

impl StrategyContext {
    pub fn new(
        source: &'static TypeInfo,
        target: &'static TypeInfo,
        inclusions: &[Inclusion],
        repository: WeakRepository,
        configuration: Arc<MappingConfiguration>,
    ) -> Self {
        StrategyContext {
            source,
            target,
            inclusions: inclusions.to_vec(),
            repository,
            configuration,
        }
    }
}

/// One configured strategy instance
pub enum MappingStrategy {
    Convention(ConventionStrategy),
    Attribute(AttributeStrategy),
    Manual(ManualStrategy),
    Configuration(ConfiguredStrategy),
    Association(AssociationStrategy),
}

impl MappingStrategy {
    pub fn new(kind: StrategyKind, context: &StrategyContext) -> Self {
        match kind {
            StrategyKind::Convention => MappingStrategy::Convention(ConventionStrategy),
            StrategyKind::Attribute => MappingStrategy::Attribute(AttributeStrategy),
            StrategyKind::Manual => MappingStrategy::Manual(ManualStrategy::new(context)),
            StrategyKind::Configuration => MappingStrategy::Configuration(ConfiguredStrategy),
            StrategyKind::Association => MappingStrategy::Association(AssociationStrategy),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            MappingStrategy::Convention(_) => StrategyKind::Convention,
            MappingStrategy::Attribute(_) => StrategyKind::Attribute,
            MappingStrategy::Manual(_) => StrategyKind::Manual,
            MappingStrategy::Configuration(_) => StrategyKind::Configuration,
            MappingStrategy::Association(_) => StrategyKind::Association,
        }
    }

    /// Produce this strategy's rules for the context's type pair
    pub fn produce_rules(&self, context: &StrategyContext) -> Result<RuleSet> {
        let rules = match self {
            MappingStrategy::Convention(s) => s.produce_rules(context),
            MappingStrategy::Attribute(s) => s.produce_rules(context),
            MappingStrategy::Manual(s) => s.produce_rules(context),
            MappingStrategy::Configuration(s) => s.produce_rules(context),
            MappingStrategy::Association(s) => s.produce_rules(context),
        }?;
        log::debug!(
            "{} strategy produced {} rules for {} -> {}",
            self.kind(),
            rules.len(),
            context.source.name(),
            context.target.name()
        );
        Ok(rules)
    }

    /// The strategy that accepts runtime registrations
    pub fn as_manual_mut(&mut self) -> Option<&mut ManualStrategy> {
        match self {
            MappingStrategy::Manual(manual) => Some(manual),
            _ => None,
        }
    }
}

impl std::fmt::Debug for MappingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MappingStrategy({})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("convention".parse::<StrategyKind>().unwrap(), StrategyKind::Convention);
        assert_eq!(" Manual ".parse::<StrategyKind>().unwrap(), StrategyKind::Manual);
        let err = "reflection".parse::<StrategyKind>().unwrap_err();
        assert!(matches!(err, MapperError::Configuration(_)));
    }

    #[test]
    fn test_kind_display_round_trips() {
        for kind in StrategyKind::all_variants() {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_kind_serde_is_lowercase() {
        let json = serde_json::to_string(&StrategyKind::Association).unwrap();
        assert_eq!(json, "\"association\"");
    }
}
