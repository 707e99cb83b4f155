//! Fluent `from(..).to(..)` registrations
//!
//! Rust closures carry no member names, so each side names its member
//! explicitly. Every finished chain registers one mapping action.

use std::marker::PhantomData;

use super::Mapper;
use crate::error::{MapperError, Result};
use crate::reflect::{Mappable, MemberValue};

/// Entry point returned by [`Mapper::add_mapping`]
pub struct MappingBuilder<'a, S, T> {
    mapper: &'a Mapper<S, T>,
}

impl<'a, S: Mappable, T: Mappable> MappingBuilder<'a, S, T> {
    pub(super) fn new(mapper: &'a Mapper<S, T>) -> Self {
        MappingBuilder { mapper }
    }

    /// Read a value from the source; `name` describes the expression
    pub fn from<V, G>(self, name: &str, get: G) -> FromClause<'a, S, T, V, G>
    where
        G: Fn(&S) -> V + Send + Sync + 'static,
    {
        FromClause {
            mapper: self.mapper,
            source_name: name.to_string(),
            get,
            _value: PhantomData,
        }
    }
}

/// A source expression waiting for its target
pub struct FromClause<'a, S, T, V, G> {
    mapper: &'a Mapper<S, T>,
    source_name: String,
    get: G,
    _value: PhantomData<fn() -> V>,
}

impl<S, T, V, G> FromClause<'_, S, T, V, G>
where
    S: Mappable,
    T: Mappable,
    V: 'static,
    G: Fn(&S) -> V + Send + Sync + 'static,
{
    /// Store the value with a setter closure
    pub fn to<F>(self, name: &str, set: F) -> Result<()>
    where
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let get = self.get;
        self.mapper
            .add_mapping_action(&self.source_name, name, move |source, target| {
                set(target, get(source));
                Ok(())
            })
    }

    /// Store the value with a fallible setter closure
    pub fn try_to<F>(self, name: &str, set: F) -> Result<()>
    where
        F: Fn(&mut T, V) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let get = self.get;
        self.mapper
            .add_mapping_action(&self.source_name, name, move |source, target| set(target, get(source)))
    }

    /// Store the value in a named target member, converting it to the member type
    pub fn to_member(self, name: &str) -> Result<()>
    where
        V: MemberValue,
    {
        let member = T::describe().writable_member(name).ok_or_else(|| {
            MapperError::argument(format!(
                "{} has no writable member '{}'",
                T::describe().name(),
                name
            ))
        })?;
        let get = self.get;
        self.mapper
            .add_mapping_action(&self.source_name, name, move |source, target| {
                member.set(target, get(source).to_value())?;
                Ok(())
            })
    }
}
