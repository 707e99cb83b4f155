//! The executable mapper for one type pair

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;

use super::ObjectMapper;
use crate::error::{MapperError, MappingFailure, MemberFailure, Result};
use crate::reflect::{Reflect, TypeInfo};
use crate::rules::{compile, MappingRule, OverwritePolicy, RuleSet};
use crate::strategy::{MappingStrategy, StrategyContext};

/// Lifecycle of a composite mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperPhase {
    /// No rules registered or merged yet
    New,
    /// Runtime rules registered, nothing merged yet
    Initialized,
    /// Rules merged and compiled; no further registrations
    Active,
}

struct Pending {
    phase: MapperPhase,
    strategies: Vec<MappingStrategy>,
}

/// Runs the merged rules of its strategies for one type pair
///
/// Strategies are kept in precedence order. On the first map call their rule
/// sets are merged (earlier strategies win), compiled and frozen.
pub struct CompositeMapper {
    context: StrategyContext,
    pending: Mutex<Pending>,
    plan: ArcSwapOption<RuleSet>,
}

impl CompositeMapper {
    pub fn new(context: StrategyContext, strategies: Vec<MappingStrategy>) -> Self {
        CompositeMapper {
            context,
            pending: Mutex::new(Pending {
                phase: MapperPhase::New,
                strategies,
            }),
            plan: ArcSwapOption::empty(),
        }
    }

    pub fn context(&self) -> &StrategyContext {
        &self.context
    }

    pub fn phase(&self) -> MapperPhase {
        if self.plan.load().is_some() {
            return MapperPhase::Active;
        }
        self.lock().phase
    }

    /// The compiled rule set, once active
    pub fn rules(&self) -> Option<Arc<RuleSet>> {
        self.plan.load_full()
    }

    /// Register a rule with the manual strategy
    pub fn add_rule(&self, rule: MappingRule) -> Result<()> {
        let mut pending = self.lock();
        if pending.phase == MapperPhase::Active {
            return Err(MapperError::invalid_operation(format!(
                "cannot add rule {} -> {}: mapper for {} -> {} is already active",
                rule.source_member(),
                rule.target_member(),
                self.context.source.name(),
                self.context.target.name()
            )));
        }

        let manual = pending
            .strategies
            .iter_mut()
            .find_map(MappingStrategy::as_manual_mut)
            .ok_or_else(|| {
                MapperError::invalid_operation(format!(
                    "mapper for {} -> {} has no manual strategy",
                    self.context.source.name(),
                    self.context.target.name()
                ))
            })?;
        manual.add_rule(rule)?;
        pending.phase = MapperPhase::Initialized;
        Ok(())
    }

    /// Merge and compile the strategies' rules, if not done yet
    pub fn activate(&self) -> Result<Arc<RuleSet>> {
        if let Some(plan) = self.plan.load_full() {
            return Ok(plan);
        }

        let mut pending = self.lock();
        if let Some(plan) = self.plan.load_full() {
            return Ok(plan);
        }

        let mut merged = RuleSet::new(self.context.source, self.context.target, OverwritePolicy::Skip);
        for strategy in &pending.strategies {
            merged.add_range(strategy.produce_rules(&self.context)?)?;
        }
        log::debug!(
            "activating mapper {} -> {} with {} merged rules",
            self.context.source.name(),
            self.context.target.name(),
            merged.len()
        );

        let plan = Arc::new(compile::compile(merged));
        self.plan.store(Some(Arc::clone(&plan)));
        pending.phase = MapperPhase::Active;
        Ok(plan)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failure(&self, rule: &MappingRule, cause: anyhow::Error) -> MapperError {
        let (source_member, target_member, cause) = match cause.downcast::<MemberFailure>() {
            Ok(member) => (member.source_member, member.target_member, member.cause),
            Err(cause) => (
                rule.source_member().to_string(),
                rule.target_member().to_string(),
                cause,
            ),
        };
        MapperError::Mapping(MappingFailure {
            source_type: self.context.source.name(),
            target_type: self.context.target.name(),
            source_member,
            target_member,
            cause,
        })
    }

    fn check_types(&self, source: &dyn Reflect, target: &dyn Reflect) -> Result<()> {
        let (expected_source, expected_target) = (self.context.source, self.context.target);
        let (found_source, found_target) = (source.type_info(), target.type_info());
        if found_source.type_id() != expected_source.type_id() {
            return Err(MapperError::argument(format!(
                "expected a {} source, got {}",
                expected_source.name(),
                found_source.name()
            )));
        }
        if found_target.type_id() != expected_target.type_id() {
            return Err(MapperError::argument(format!(
                "expected a {} target, got {}",
                expected_target.name(),
                found_target.name()
            )));
        }
        Ok(())
    }
}

impl ObjectMapper for CompositeMapper {
    fn source_type(&self) -> &'static TypeInfo {
        self.context.source
    }

    fn target_type(&self) -> &'static TypeInfo {
        self.context.target
    }

    fn map_object(&self, source: &dyn Reflect, target: &mut dyn Reflect) -> Result<()> {
        self.check_types(source, target)?;
        let plan = self.activate()?;
        for rule in plan.iter() {
            rule.apply(source, target).map_err(|cause| self.failure(rule, cause))?;
        }
        Ok(())
    }

    fn as_composite(&self) -> Option<&CompositeMapper> {
        Some(self)
    }
}

impl std::fmt::Debug for CompositeMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMapper")
            .field("source", &self.context.source.name())
            .field("target", &self.context.target.name())
            .field("phase", &self.phase())
            .finish()
    }
}
