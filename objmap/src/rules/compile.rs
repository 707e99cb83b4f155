//! Fusing reflective rules into one copy unit
//!
//! Compilation runs in two phases. [`plan`] decides once, per reflective
//! rule, how the value is read and whether it needs converting. [`bake`]
//! turns the plan into a single delegate rule. Delegate and mapper rules are
//! never touched and keep their relative order.

use std::sync::Arc;

use anyhow::anyhow;

use super::{MappingAction, MappingRule, RuleKind, RuleSet};
use crate::convert::{can_convert, convert, is_convertible, SourceAccessor};
use crate::error::MemberFailure;
use crate::reflect::{MemberInfo, Reflect, ValueType};

/// Name of the fused rule
pub const COMPILED_RULE: &str = "compiled";

/// Whether a copy converts its value before writing
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Identity,
    Convert(ValueType),
}

/// One planned member copy
#[derive(Debug, Clone)]
pub struct CopyOp {
    pub source: SourceAccessor,
    pub target: &'static MemberInfo,
    pub conversion: Conversion,
    source_name: String,
}

impl CopyOp {
    fn new(source_name: &str, source: SourceAccessor, target: &'static MemberInfo) -> Self {
        let conversion = if source.value_type() == target.value_type() {
            Conversion::Identity
        } else {
            Conversion::Convert(target.value_type().clone())
        };
        CopyOp {
            source,
            target,
            conversion,
            source_name: source_name.to_string(),
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    fn execute(&self, source: &dyn Reflect, target: &mut dyn Reflect) -> anyhow::Result<()> {
        let Some(value) = self.source.read(source)? else {
            return Ok(());
        };
        let value = match &self.conversion {
            Conversion::Identity => value,
            Conversion::Convert(ty) => convert(value, ty)?,
        };
        self.target.set(target, value)?;
        Ok(())
    }
}

/// Ordered plan for a rule set
pub struct Plan {
    /// Rules in order, with reflective rules replaced by a marker at the
    /// position of the first one
    entries: Vec<PlanEntry>,
    pub ops: Vec<CopyOp>,
    pub dropped: usize,
}

enum PlanEntry {
    Kept(MappingRule),
    Compiled,
}

/// Decide each reflective rule's copy operation
pub fn plan(rules: RuleSet) -> (Plan, RuleSet) {
    let shell = RuleSet::new(rules.source_type(), rules.target_type(), rules.policy());
    let mut entries = Vec::with_capacity(rules.len());
    let mut ops = Vec::new();
    let mut dropped = 0;
    let mut marked = false;

    for rule in rules {
        let RuleKind::Reflective { source, target, strict } = *rule.kind() else {
            entries.push(PlanEntry::Kept(rule));
            continue;
        };
        if !marked {
            entries.push(PlanEntry::Compiled);
            marked = true;
        }

        let accessor = if strict {
            is_convertible(source.value_type(), target.value_type())
                .then_some(SourceAccessor::Direct(source))
        } else {
            SourceAccessor::for_compatibility(source, can_convert(source, target))
        };

        match accessor {
            Some(accessor) => ops.push(CopyOp::new(rule.source_member(), accessor, target)),
            None => {
                log::debug!(
                    "dropping rule {} -> {} from compilation: {} does not convert to {}",
                    rule.source_member(),
                    rule.target_member(),
                    source.value_type(),
                    target.value_type()
                );
                dropped += 1;
            }
        }
    }

    (Plan { entries, ops, dropped }, shell)
}

/// Produce the executable rule set from a plan
pub fn bake(plan: Plan, shell: RuleSet) -> RuleSet {
    let Plan { entries, ops, .. } = plan;
    let ops = Arc::new(ops);
    let mut ordered = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry {
            PlanEntry::Kept(rule) => ordered.push((rule, true)),
            PlanEntry::Compiled if ops.is_empty() => {}
            PlanEntry::Compiled => ordered.push((compiled_rule(Arc::clone(&ops)), false)),
        }
    }

    RuleSet::from_ordered(shell.source_type(), shell.target_type(), shell.policy(), ordered)
}

fn compiled_rule(ops: Arc<Vec<CopyOp>>) -> MappingRule {
    let action: MappingAction = Arc::new(move |source: &dyn Reflect, target: &mut dyn Reflect| {
        for op in ops.iter() {
            op.execute(source, target).map_err(|cause| {
                anyhow!(MemberFailure {
                    source_member: op.source_name.clone(),
                    target_member: op.target.name().to_string(),
                    cause,
                })
            })?;
        }
        Ok(())
    });
    MappingRule::delegate(COMPILED_RULE, COMPILED_RULE, action)
}

/// Plan and bake in one step
pub fn compile(rules: RuleSet) -> RuleSet {
    let before = rules.len();
    let (plan, shell) = plan(rules);
    log::debug!(
        "compiled {} -> {}: {} rules, {} copy ops, {} dropped",
        shell.source_type().name(),
        shell.target_type().name(),
        before,
        plan.ops.len(),
        plan.dropped
    );
    bake(plan, shell)
}
