use std::marker::PhantomData;
use std::sync::Arc;

use super::ObjectMapper;
use crate::error::{MapperError, MappingFailure, Result};
use crate::reflect::{Mappable, Reflect, TypeInfo};

type MapFn<S, T> = Box<dyn Fn(&S, &mut T) -> anyhow::Result<()> + Send + Sync>;

/// A closure used as a mapper
///
/// Useful for injecting hand-written or mock mappers into a repository with
/// [`Repository::add_mapper`](crate::Repository::add_mapper).
pub struct FnMapper<S, T> {
    map: MapFn<S, T>,
    _marker: PhantomData<fn(&S) -> T>,
}

impl<S: Mappable, T: Mappable> FnMapper<S, T> {
    pub fn new<F>(map: F) -> Self
    where
        F: Fn(&S, &mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        FnMapper {
            map: Box::new(map),
            _marker: PhantomData,
        }
    }

    /// Wrap into the shared form the repository stores
    pub fn shared<F>(map: F) -> Arc<dyn ObjectMapper>
    where
        F: Fn(&S, &mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Arc::new(FnMapper::new(map))
    }
}

impl<S: Mappable, T: Mappable> ObjectMapper for FnMapper<S, T> {
    fn source_type(&self) -> &'static TypeInfo {
        S::describe()
    }

    fn target_type(&self) -> &'static TypeInfo {
        T::describe()
    }

    fn map_object(&self, source: &dyn Reflect, target: &mut dyn Reflect) -> Result<()> {
        let found = target.type_info().name();
        let source = source.as_any().downcast_ref::<S>().ok_or_else(|| {
            MapperError::argument(format!(
                "expected a {} source, got {}",
                S::describe().name(),
                source.type_info().name()
            ))
        })?;
        let target = target.as_any_mut().downcast_mut::<T>().ok_or_else(|| {
            MapperError::argument(format!("expected a {} target, got {}", T::describe().name(), found))
        })?;

        (self.map)(source, target).map_err(|cause| {
            MapperError::Mapping(MappingFailure {
                source_type: S::describe().name(),
                target_type: T::describe().name(),
                source_member: "*".to_string(),
                target_member: "*".to_string(),
                cause,
            })
        })
    }
}
