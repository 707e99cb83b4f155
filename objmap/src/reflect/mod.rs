//! Runtime type metadata for mappable objects
//!
//! Rust has no runtime reflection, so every mappable type publishes a static
//! [`TypeInfo`] describing its members. `#[derive(Mappable)]` generates it;
//! [`TypeInfo::builder`] is the hand-written equivalent.

mod member;
mod value;
mod value_type;

pub use member::*;
pub use value::*;
pub use value_type::*;

use std::any::{Any, TypeId};

/// A type whose members can be read and written by the mapping engine
pub trait Mappable: Any + Clone + Send + Sync {
    /// Static metadata describing this type's members
    fn describe() -> &'static TypeInfo;
}

/// Object-safe view of a [`Mappable`] value
pub trait Reflect: Any + Send + Sync {
    fn type_info(&self) -> &'static TypeInfo;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_reflect(&self) -> Box<dyn Reflect>;
}

impl<T: Mappable> Reflect for T {
    fn type_info(&self) -> &'static TypeInfo {
        T::describe()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_reflect(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }
}

/// Metadata for one mappable type
pub struct TypeInfo {
    name: &'static str,
    qualified_name: &'static str,
    type_id: TypeId,
    members: Vec<MemberInfo>,
    constructor: Option<fn() -> Box<dyn Reflect>>,
}

impl TypeInfo {
    /// Start describing type `T` under the given short name
    pub fn builder<T: Mappable>(name: &'static str) -> TypeInfoBuilder<T> {
        TypeInfoBuilder::new(name)
    }

    /// Short display name (e.g. `Person`)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fully qualified name (e.g. `my_app::models::Person`)
    pub fn qualified_name(&self) -> &'static str {
        self.qualified_name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Check whether this describes type `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Check whether a configured type name refers to this type
    ///
    /// Accepts the short name, the qualified name, or any `::`-suffix of the
    /// qualified name.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim();
        name == self.name
            || name == self.qualified_name
            || self
                .qualified_name
                .strip_suffix(name)
                .is_some_and(|prefix| prefix.ends_with("::"))
    }

    /// All members in declaration order
    pub fn members(&'static self) -> &'static [MemberInfo] {
        &self.members
    }

    /// Find a member by name
    pub fn member(&'static self, name: &str) -> Option<&'static MemberInfo> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Find a readable member by name
    pub fn readable_member(&'static self, name: &str) -> Option<&'static MemberInfo> {
        self.member(name).filter(|m| m.is_readable())
    }

    /// Find a writable member by name
    pub fn writable_member(&'static self, name: &str) -> Option<&'static MemberInfo> {
        self.member(name).filter(|m| m.is_writable())
    }

    /// Whether instances can be default-constructed
    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    /// Create a default instance, if the type registered a constructor
    pub fn construct(&self) -> Option<Box<dyn Reflect>> {
        self.constructor.map(|ctor| ctor())
    }
}

impl std::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("qualified_name", &self.qualified_name)
            .field("members", &self.members)
            .field("constructible", &self.constructor.is_some())
            .finish()
    }
}

impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder for [`TypeInfo`]
///
/// Accessors are plain function pointers so non-capturing closures work:
///
/// ```
/// use objmap::{Mappable, TypeInfo};
/// use std::sync::OnceLock;
///
/// #[derive(Clone, Default)]
/// struct Point { x: i32, y: i32 }
///
/// impl Mappable for Point {
///     fn describe() -> &'static TypeInfo {
///         static INFO: OnceLock<TypeInfo> = OnceLock::new();
///         INFO.get_or_init(|| {
///             TypeInfo::builder::<Point>("Point")
///                 .field("x", |p| &p.x, |p| &mut p.x)
///                 .field("y", |p| &p.y, |p| &mut p.y)
///                 .constructor()
///                 .build()
///         })
///     }
/// }
///
/// assert_eq!(Point::describe().members().len(), 2);
/// ```
pub struct TypeInfoBuilder<T> {
    name: &'static str,
    members: Vec<MemberInfo>,
    constructor: Option<fn() -> Box<dyn Reflect>>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Mappable> TypeInfoBuilder<T> {
    fn new(name: &'static str) -> Self {
        TypeInfoBuilder {
            name,
            members: Vec::new(),
            constructor: None,
            _marker: std::marker::PhantomData,
        }
    }

    /// Add a readable and writable field
    pub fn field<V: MemberValue>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.members.push(MemberInfo::new(
            name,
            V::value_type(),
            Some(member::field_getter::<T, V>(get)),
            Some(member::field_setter::<T, V>(get_mut)),
        ));
        self
    }

    /// Add a field that can be read but never written
    pub fn readonly_field<V: MemberValue>(mut self, name: &'static str, get: fn(&T) -> &V) -> Self {
        self.members.push(MemberInfo::new(
            name,
            V::value_type(),
            Some(member::field_getter::<T, V>(get)),
            None,
        ));
        self
    }

    /// Add a computed, read-only member
    pub fn property<V: MemberValue>(mut self, name: &'static str, get: fn(&T) -> V) -> Self {
        self.members.push(MemberInfo::new(
            name,
            V::value_type(),
            Some(member::property_getter::<T, V>(get)),
            None,
        ));
        self
    }

    /// Add a write-only member
    pub fn setter<V: MemberValue>(mut self, name: &'static str, set: fn(&mut T, V)) -> Self {
        self.members.push(MemberInfo::new(
            name,
            V::value_type(),
            None,
            Some(member::property_setter::<T, V>(set)),
        ));
        self
    }

    /// Attach a declarative tag to the most recently added member
    pub fn tag(mut self, tag: MappingTag) -> Self {
        if let Some(member) = self.members.last_mut() {
            member.push_tag(tag);
        }
        self
    }

    /// Register `T::default` as the type's constructor
    pub fn constructor(mut self) -> Self
    where
        T: Default,
    {
        self.constructor = Some(construct_default::<T>);
        self
    }

    pub fn build(self) -> TypeInfo {
        TypeInfo {
            name: self.name,
            qualified_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            members: self.members,
            constructor: self.constructor,
        }
    }
}

fn construct_default<T: Mappable + Default>() -> Box<dyn Reflect> {
    Box::new(T::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::OnceCell;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Account {
        id: i64,
        name: String,
        balance: f64,
    }

    impl Account {
        fn display_name(&self) -> String {
            format!("#{} {}", self.id, self.name)
        }
    }

    impl Mappable for Account {
        fn describe() -> &'static TypeInfo {
            static INFO: OnceCell<TypeInfo> = OnceCell::new();
            INFO.get_or_init(|| {
                TypeInfo::builder::<Account>("Account")
                    .field("id", |a| &a.id, |a| &mut a.id)
                    .field("name", |a| &a.name, |a| &mut a.name)
                    .readonly_field("balance", |a| &a.balance)
                    .property("display_name", Account::display_name)
                    .setter("rename", |a, name: String| a.name = name)
                    .constructor()
                    .build()
            })
        }
    }

    #[test]
    fn test_builder_records_members_in_order() {
        let info = Account::describe();
        let names: Vec<_> = info.members().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["id", "name", "balance", "display_name", "rename"]);
        assert_eq!(info.name(), "Account");
        assert!(info.is::<Account>());
        assert!(info.qualified_name().ends_with("Account"));
    }

    #[test]
    fn test_readable_and_writable_lookup() {
        let info = Account::describe();
        assert!(info.readable_member("balance").is_some());
        assert!(info.writable_member("balance").is_none());
        assert!(info.readable_member("rename").is_none());
        assert!(info.writable_member("rename").is_some());
        assert!(info.member("missing").is_none());
    }

    #[test]
    fn test_getters_and_setters() {
        let info = Account::describe();
        let mut account = Account { id: 7, name: "Contoso".into(), balance: 12.5 };

        let display = info.member("display_name").unwrap();
        assert_eq!(display.get(&account).unwrap(), Value::String("#7 Contoso".into()));

        info.member("rename")
            .unwrap()
            .set(&mut account, Value::String("Fabrikam".into()))
            .unwrap();
        assert_eq!(account.name, "Fabrikam");

        // setters convert compatible values
        info.member("id").unwrap().set(&mut account, Value::String("42".into())).unwrap();
        assert_eq!(account.id, 42);
    }

    #[test]
    fn test_construct_and_matches_name() {
        let info = Account::describe();
        let created = info.construct().unwrap();
        assert!(created.as_any().is::<Account>());
        assert!(info.matches_name("Account"));
        assert!(info.matches_name(info.qualified_name()));
        assert!(!info.matches_name("Acc"));
        assert!(!info.matches_name("ount"));
    }

    #[test]
    fn test_reflect_clone() {
        let account = Account { id: 1, name: "A".into(), balance: 0.0 };
        let boxed: Box<dyn Reflect> = account.clone_reflect();
        let back = boxed.into_any().downcast::<Account>().unwrap();
        assert_eq!(*back, account);
    }
}
