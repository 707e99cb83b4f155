//! Object-to-object mapping without hand-written copy code
//!
//! `objmap` populates a target object from a source object using a set of
//! pluggable strategies:
//!
//! - **Convention**: like-named, convertible members, including one level of
//!   flattening (`inner.name` -> `inner_name`)
//! - **Attribute**: members tagged with `#[mapping(counterpart = .., member = ..)]`
//! - **Manual**: actions registered at runtime (directly or via the fluent builder)
//! - **Configuration**: member pairs listed in an external TOML/JSON file
//! - **Association**: nested objects and lists routed through other mappers
//!
//! Strategies are merged into one rule set per type pair (earlier strategies
//! win), compiled into a single copy unit, and cached in a [`Repository`].
//!
//! # Example
//!
//! ```
//! use objmap::{Mappable, Repository};
//!
//! #[derive(Debug, Clone, Default, Mappable)]
//! struct Person {
//!     id: i32,
//!     first_name: String,
//!     last_name: String,
//! }
//!
//! #[derive(Debug, Clone, Default, Mappable)]
//! struct PersonEditModel {
//!     id: i32,
//!     name: String,
//! }
//!
//! let repository = Repository::default();
//! let mapper = repository.resolve::<Person, PersonEditModel>(&[]).unwrap();
//! mapper
//!     .add_mapping()
//!     .from("first_name + last_name", |p: &Person| format!("{}{}", p.first_name, p.last_name))
//!     .to("name", |m: &mut PersonEditModel, name| m.name = name)
//!     .unwrap();
//!
//! let person = Person { id: 1234, first_name: "John".into(), last_name: "Doe".into() };
//! let model = mapper.map(&person).unwrap();
//! assert_eq!(model.id, 1234);
//! assert_eq!(model.name, "JohnDoe");
//! ```

// Lets the derive macro's `::objmap::` paths resolve inside this crate's own tests
extern crate self as objmap;

pub mod config;
pub mod convert;
pub mod error;
pub mod introspect;
pub mod mapper;
pub mod reflect;
pub mod repository;
pub mod rules;
pub mod strategy;

pub use config::{MappingConfiguration, MappingOptions, MemberPair, TypeMapping};
pub use convert::{can_convert, convert, is_convertible, Compatibility};
pub use error::{ConversionError, MapperError, MappingFailure, Result};
pub use mapper::{CompositeMapper, FnMapper, Mapper, MapperPhase, MappingBuilder, ObjectMapper};
pub use reflect::{
    Direction, Mappable, MappingTag, MemberInfo, MemberValue, ObjectValue, Reflect, TypeHandle,
    TypeInfo, TypeInfoBuilder, Value, ValueType,
};
pub use repository::{Inclusion, MapperKey, Repository};
pub use rules::{MappingAction, MappingRule, OverwritePolicy, RuleKind, RuleSet};
pub use strategy::{MappingStrategy, StrategyKind};

pub use objmap_macros::Mappable;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::OnceCell;
}
