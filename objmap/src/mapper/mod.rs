//! Mappers: the untyped [`ObjectMapper`] seam and the typed [`Mapper`] handle

mod composite;
mod delegate;
mod fluent;

pub use composite::{CompositeMapper, MapperPhase};
pub use delegate::FnMapper;
pub use fluent::{FromClause, MappingBuilder};

use std::borrow::Borrow;
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::anyhow;

use crate::error::{ConversionError, MapperError, Result};
use crate::reflect::{Mappable, Reflect, TypeInfo};
use crate::rules::{MappingAction, MappingRule};

/// Anything that can populate a target object from a source object
pub trait ObjectMapper: Send + Sync {
    fn source_type(&self) -> &'static TypeInfo;

    fn target_type(&self) -> &'static TypeInfo;

    /// Populate `target` from `source`
    ///
    /// Not transactional: on failure, members written before the failing rule
    /// keep their new values.
    fn map_object(&self, source: &dyn Reflect, target: &mut dyn Reflect) -> Result<()>;

    /// The composite behind this mapper, if it accepts runtime rules
    fn as_composite(&self) -> Option<&CompositeMapper> {
        None
    }
}

/// Typed handle to a resolved mapper from `S` to `T`
pub struct Mapper<S, T> {
    inner: Arc<dyn ObjectMapper>,
    _marker: PhantomData<fn(&S) -> T>,
}

impl<S, T> Clone for Mapper<S, T> {
    fn clone(&self) -> Self {
        Mapper {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<S: Mappable, T: Mappable> Mapper<S, T> {
    /// Wrap an untyped mapper, checking that it maps `S` to `T`
    pub fn from_dyn(inner: Arc<dyn ObjectMapper>) -> Result<Self> {
        if !inner.source_type().is::<S>() || !inner.target_type().is::<T>() {
            return Err(MapperError::argument(format!(
                "mapper maps {} -> {}, not {} -> {}",
                inner.source_type().name(),
                inner.target_type().name(),
                S::describe().name(),
                T::describe().name()
            )));
        }
        Ok(Mapper {
            inner,
            _marker: PhantomData,
        })
    }

    pub fn as_dyn(&self) -> &Arc<dyn ObjectMapper> {
        &self.inner
    }

    pub fn into_dyn(self) -> Arc<dyn ObjectMapper> {
        self.inner
    }

    /// Whether both handles point at the same mapper instance
    pub fn ptr_eq(&self, other: &Mapper<S, T>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    /// Lifecycle phase; injected mappers count as active
    pub fn phase(&self) -> MapperPhase {
        self.inner
            .as_composite()
            .map(CompositeMapper::phase)
            .unwrap_or(MapperPhase::Active)
    }

    /// Populate an existing target
    pub fn map_into(&self, source: &S, target: &mut T) -> Result<()> {
        self.inner.map_object(source, target)
    }

    /// Populate `target` and hand it back
    pub fn map_to(&self, source: &S, mut target: T) -> Result<T> {
        self.map_into(source, &mut target)?;
        Ok(target)
    }

    /// Populate a default-constructed target
    pub fn map(&self, source: &S) -> Result<T>
    where
        T: Default,
    {
        self.map_to(source, T::default())
    }

    /// Populate a target built by `factory`
    pub fn map_with(&self, source: &S, factory: impl FnOnce() -> T) -> Result<T> {
        self.map_to(source, factory())
    }

    /// Lazily map every element, in order
    pub fn map_multiple<I>(&self, sources: I) -> impl Iterator<Item = Result<T>>
    where
        I: IntoIterator,
        I::Item: Borrow<S>,
        T: Default,
    {
        sources.into_iter().map(move |source| self.map(source.borrow()))
    }

    /// Lazily map every element into targets built by `factory`, in order
    pub fn map_multiple_with<I, F>(&self, sources: I, mut factory: F) -> impl Iterator<Item = Result<T>>
    where
        I: IntoIterator,
        I::Item: Borrow<S>,
        F: FnMut() -> T,
    {
        sources
            .into_iter()
            .map(move |source| self.map_to(source.borrow(), factory()))
    }

    /// Map on a blocking worker thread
    #[cfg(feature = "async")]
    pub async fn map_async(&self, source: S) -> Result<T>
    where
        T: Default,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || -> Result<T> {
            let mut target = T::default();
            inner.map_object(&source, &mut target)?;
            Ok(target)
        })
        .await
        .map_err(|e| MapperError::invalid_operation(format!("mapping task failed: {}", e)))?
    }

    fn composite(&self) -> Result<&CompositeMapper> {
        self.inner.as_composite().ok_or_else(|| {
            MapperError::invalid_operation(format!(
                "mapper for {} -> {} does not accept rules",
                S::describe().name(),
                T::describe().name()
            ))
        })
    }

    /// Register a custom action as a rule
    ///
    /// The names identify the rule in failures and decide which target
    /// member it overrides.
    pub fn add_mapping_action<F>(&self, source_name: &str, target_name: &str, action: F) -> Result<()>
    where
        F: Fn(&S, &mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if source_name.trim().is_empty() {
            return Err(MapperError::argument("source member name is empty"));
        }
        if target_name.trim().is_empty() {
            return Err(MapperError::argument("target member name is empty"));
        }

        let action: MappingAction = Arc::new(move |source: &dyn Reflect, target: &mut dyn Reflect| {
            let source = source.as_any().downcast_ref::<S>().ok_or_else(|| {
                anyhow!(ConversionError::WrongObject {
                    expected: std::any::type_name::<S>(),
                    found: source.type_info().qualified_name(),
                })
            })?;
            let found = target.type_info().qualified_name();
            let target = target.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
                anyhow!(ConversionError::WrongObject {
                    expected: std::any::type_name::<T>(),
                    found,
                })
            })?;
            action(source, target)
        });
        self.composite()?
            .add_rule(MappingRule::delegate(source_name, target_name, action))
    }

    /// Route a nested member through the repository's `IS -> IT` mapper
    pub fn add_inner_mapper<IS: Mappable, IT: Mappable>(
        &self,
        source_member: &str,
        target_member: &str,
    ) -> Result<()> {
        let composite = self.composite()?;
        let source = S::describe().readable_member(source_member).ok_or_else(|| {
            MapperError::argument(format!(
                "{} has no readable member '{}'",
                S::describe().name(),
                source_member
            ))
        })?;
        let target = T::describe().writable_member(target_member).ok_or_else(|| {
            MapperError::argument(format!(
                "{} has no writable member '{}'",
                T::describe().name(),
                target_member
            ))
        })?;

        let holds = |member: &crate::reflect::MemberInfo, info: &'static TypeInfo| {
            member
                .value_type()
                .associated_object()
                .is_some_and(|handle| handle.get().type_id() == info.type_id())
        };
        if !holds(source, IS::describe()) || !holds(target, IT::describe()) {
            return Err(MapperError::argument(format!(
                "{}.{} -> {}.{} does not hold {} -> {}",
                S::describe().name(),
                source_member,
                T::describe().name(),
                target_member,
                IS::describe().name(),
                IT::describe().name()
            )));
        }

        if composite.phase() == MapperPhase::Active {
            return Err(MapperError::invalid_operation(format!(
                "cannot add inner mapper {} -> {}: mapper for {} -> {} is already active",
                source_member,
                target_member,
                S::describe().name(),
                T::describe().name()
            )));
        }

        let context = composite.context();
        let repository = context.repository.upgrade().ok_or_else(|| {
            MapperError::invalid_operation("the repository that owns this mapper was dropped")
        })?;
        let inner = repository.resolve_dyn(IS::describe(), IT::describe(), &context.inclusions)?;
        composite.add_rule(MappingRule::mapper(inner, source, target))
    }

    /// Start a fluent `from(..).to(..)` registration
    pub fn add_mapping(&self) -> MappingBuilder<'_, S, T> {
        MappingBuilder::new(self)
    }
}

impl<S, T> std::fmt::Debug for Mapper<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mapper({} -> {})",
            self.inner.source_type().name(),
            self.inner.target_type().name()
        )
    }
}
