//! Resolution and caching of mappers
//!
//! A [`Repository`] builds one composite mapper per (source, target,
//! inclusions) key on first use and hands out the cached instance afterwards.
//! [`Repository::global`] is a process-wide instance with default options;
//! callers that register rules on it are responsible for [`Repository::clear`].

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use once_cell::sync::Lazy;

use crate::config::MappingOptions;
use crate::error::{MapperError, Result};
use crate::mapper::{CompositeMapper, Mapper, ObjectMapper};
use crate::reflect::{Mappable, TypeInfo};
use crate::strategy::{MappingStrategy, StrategyContext};

static GLOBAL: Lazy<Repository> = Lazy::new(Repository::default);

/// An extra type pair the association strategy may map through a nested mapper
#[derive(Debug, Clone, Copy)]
pub struct Inclusion {
    pub source: &'static TypeInfo,
    pub target: &'static TypeInfo,
}

impl Inclusion {
    pub fn of<IS: Mappable, IT: Mappable>() -> Self {
        Inclusion {
            source: IS::describe(),
            target: IT::describe(),
        }
    }

    pub fn new(source: &'static TypeInfo, target: &'static TypeInfo) -> Self {
        Inclusion { source, target }
    }
}

impl PartialEq for Inclusion {
    fn eq(&self, other: &Self) -> bool {
        self.source.type_id() == other.source.type_id() && self.target.type_id() == other.target.type_id()
    }
}

impl Eq for Inclusion {}

/// Cache key: source type, target type and the inclusions in caller order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapperKey {
    source: TypeId,
    target: TypeId,
    inclusions: Vec<(TypeId, TypeId)>,
}

impl MapperKey {
    pub fn new(source: &TypeInfo, target: &TypeInfo, inclusions: &[Inclusion]) -> Self {
        MapperKey {
            source: source.type_id(),
            target: target.type_id(),
            inclusions: inclusions
                .iter()
                .map(|i| (i.source.type_id(), i.target.type_id()))
                .collect(),
        }
    }
}

struct Shared {
    options: RwLock<Arc<MappingOptions>>,
    cache: RwLock<HashMap<MapperKey, Arc<dyn ObjectMapper>>>,
}

/// Resolves and caches mappers
///
/// Cloning is cheap; clones share the same cache.
#[derive(Clone)]
pub struct Repository {
    shared: Arc<Shared>,
}

/// Non-owning handle held by mappers back to their repository
#[derive(Clone, Default)]
pub struct WeakRepository(Weak<Shared>);

impl WeakRepository {
    pub fn upgrade(&self) -> Option<Repository> {
        self.0.upgrade().map(|shared| Repository { shared })
    }
}

impl Default for Repository {
    fn default() -> Self {
        Repository::new(MappingOptions::default())
    }
}

impl Repository {
    pub fn new(options: MappingOptions) -> Self {
        Repository {
            shared: Arc::new(Shared {
                options: RwLock::new(Arc::new(options)),
                cache: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Repository with options from [`MappingOptions::load_default`]
    pub fn from_default_config() -> anyhow::Result<Self> {
        Ok(Repository::new(MappingOptions::load_default()?))
    }

    /// The process-wide repository
    pub fn global() -> &'static Repository {
        &GLOBAL
    }

    pub fn downgrade(&self) -> WeakRepository {
        WeakRepository(Arc::downgrade(&self.shared))
    }

    pub fn options(&self) -> Arc<MappingOptions> {
        Arc::clone(&self.shared.options.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the options used for mappers built from now on
    ///
    /// Mappers already in the cache keep the strategies they were built
    /// with; call [`Repository::clear`] to rebuild them.
    pub fn set_options(&self, options: MappingOptions) {
        let mut guard = self.shared.options.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(options);
    }

    /// Resolve the typed mapper from `S` to `T`
    pub fn resolve<S: Mappable, T: Mappable>(&self, inclusions: &[Inclusion]) -> Result<Mapper<S, T>> {
        let mapper = self.resolve_dyn(S::describe(), T::describe(), inclusions)?;
        Mapper::from_dyn(mapper)
    }

    /// Resolve a mapper by type metadata
    pub fn resolve_dyn(
        &self,
        source: &'static TypeInfo,
        target: &'static TypeInfo,
        inclusions: &[Inclusion],
    ) -> Result<Arc<dyn ObjectMapper>> {
        let key = MapperKey::new(source, target, inclusions);
        if let Some(mapper) = self.lookup(&key) {
            log::trace!("cache hit for {} -> {}", source.name(), target.name());
            return Ok(mapper);
        }

        log::debug!(
            "building mapper {} -> {} ({} inclusions)",
            source.name(),
            target.name(),
            inclusions.len()
        );
        let built: Arc<dyn ObjectMapper> = Arc::new(self.build(source, target, inclusions)?);

        let mut cache = self.shared.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key).or_insert(built)))
    }

    /// Cached mapper for the key, without building one
    pub fn try_get_mapper(
        &self,
        source: &TypeInfo,
        target: &TypeInfo,
        inclusions: &[Inclusion],
    ) -> Option<Arc<dyn ObjectMapper>> {
        self.lookup(&MapperKey::new(source, target, inclusions))
    }

    /// Insert or replace the mapper for `S -> T` with no inclusions
    pub fn add_mapper<S: Mappable, T: Mappable>(&self, mapper: Arc<dyn ObjectMapper>) -> Result<()> {
        if !mapper.source_type().is::<S>() || !mapper.target_type().is::<T>() {
            return Err(MapperError::argument(format!(
                "cannot register a {} -> {} mapper for {} -> {}",
                mapper.source_type().name(),
                mapper.target_type().name(),
                S::describe().name(),
                T::describe().name()
            )));
        }
        let key = MapperKey::new(S::describe(), T::describe(), &[]);
        self.shared
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, mapper);
        Ok(())
    }

    /// Drop every cached mapper
    pub fn clear(&self) {
        let mut cache = self.shared.cache.write().unwrap_or_else(PoisonError::into_inner);
        log::debug!("clearing {} cached mappers", cache.len());
        cache.clear();
    }

    pub fn len(&self) -> usize {
        self.shared.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &MapperKey) -> Option<Arc<dyn ObjectMapper>> {
        self.shared
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    // Strategies for a pair are built under the options read lock so a
    // concurrent set_options is serialized against construction
    fn build(
        &self,
        source: &'static TypeInfo,
        target: &'static TypeInfo,
        inclusions: &[Inclusion],
    ) -> Result<CompositeMapper> {
        let options = self.shared.options.read().unwrap_or_else(PoisonError::into_inner);
        let context = StrategyContext::new(
            source,
            target,
            inclusions,
            self.downgrade(),
            options.configuration(),
        );
        let strategies = options
            .strategies()
            .iter()
            .map(|kind| MappingStrategy::new(*kind, &context))
            .collect();
        Ok(CompositeMapper::new(context, strategies))
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("cached", &self.len())
            .field("strategies", &self.options().strategies())
            .finish()
    }
}
