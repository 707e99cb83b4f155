//! Derive macro for objmap
//!
//! `#[derive(Mappable)]` generates the static `TypeInfo` of a struct with
//! named fields, plus a `MemberValue` impl so the struct can be nested inside
//! other mappable types.
//!
//! ## Attributes
//!
//! Container:
//! - `#[mapping(name = "Alias")]` - short type name used in configuration files
//! - `#[mapping(no_default)]` - do not register `Default::default` as constructor
//!
//! Field:
//! - `#[mapping(skip)]` - leave the field out of the metadata
//! - `#[mapping(rename = "other")]` - publish the member under another name
//! - `#[mapping(readonly)]` - readable source only, never written
//! - `#[mapping(counterpart = Type, member = "name", direction = "to")]` -
//!   declarative link to a member of another type; `direction` is `to`,
//!   `from` or `both` (default). Repeat the attribute for several links.
//!
//! ```rust,ignore
//! #[derive(Clone, Default, Mappable)]
//! struct Employee {
//!     #[mapping(counterpart = Badge, member = "holder", direction = "to")]
//!     full_name: String,
//!     #[mapping(skip)]
//!     cache: Vec<u8>,
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input, spanned::Spanned};

#[derive(Default)]
struct ContainerAttrs {
    name: Option<String>,
    no_default: bool,
}

struct Tag {
    counterpart: syn::Type,
    member: String,
    direction: proc_macro2::TokenStream,
}

#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    rename: Option<String>,
    readonly: bool,
    tags: Vec<Tag>,
}

fn parse_container(attrs: &[syn::Attribute]) -> syn::Result<ContainerAttrs> {
    let mut parsed = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("mapping")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                parsed.name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else if meta.path.is_ident("no_default") {
                parsed.no_default = true;
                Ok(())
            } else {
                Err(meta.error("unknown container attribute, expected `name` or `no_default`"))
            }
        })?;
    }
    Ok(parsed)
}

fn parse_direction(lit: &LitStr) -> syn::Result<proc_macro2::TokenStream> {
    match lit.value().to_ascii_lowercase().as_str() {
        "to" => Ok(quote!(::objmap::Direction::To)),
        "from" => Ok(quote!(::objmap::Direction::From)),
        "both" => Ok(quote!(::objmap::Direction::Both)),
        _ => Err(syn::Error::new(lit.span(), "direction must be `to`, `from` or `both`")),
    }
}

fn parse_field(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("mapping")) {
        let mut counterpart = None;
        let mut member = None;
        let mut direction = None;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                parsed.skip = true;
            } else if meta.path.is_ident("readonly") {
                parsed.readonly = true;
            } else if meta.path.is_ident("rename") {
                parsed.rename = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("counterpart") {
                counterpart = Some(meta.value()?.parse::<syn::Type>()?);
            } else if meta.path.is_ident("member") {
                member = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("direction") {
                direction = Some(parse_direction(&meta.value()?.parse::<LitStr>()?)?);
            } else {
                return Err(meta.error(
                    "unknown field attribute, expected `skip`, `rename`, `readonly`, `counterpart`, `member` or `direction`",
                ));
            }
            Ok(())
        })?;

        match (counterpart, member) {
            (Some(counterpart), Some(member)) => parsed.tags.push(Tag {
                counterpart,
                member,
                direction: direction.unwrap_or_else(|| quote!(::objmap::Direction::Both)),
            }),
            (None, None) if direction.is_none() => {}
            _ => {
                return Err(syn::Error::new(
                    attr.span(),
                    "a mapping tag needs both `counterpart` and `member`",
                ));
            }
        }
    }
    Ok(parsed)
}

/// Derive `Mappable` and `MemberValue` for a struct with named fields
#[proc_macro_derive(Mappable, attributes(mapping))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[derive(Mappable)] does not support generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    ident.span(),
                    "#[derive(Mappable)] requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                ident.span(),
                "#[derive(Mappable)] can only be used on structs",
            ));
        }
    };

    let container = parse_container(&input.attrs)?;
    let type_name = container.name.unwrap_or_else(|| ident.to_string());

    let mut members = Vec::new();
    for field in fields {
        let attrs = parse_field(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let raw = field_ident.to_string();
        let member_name = attrs
            .rename
            .unwrap_or_else(|| raw.strip_prefix("r#").unwrap_or(&raw).to_string());

        let accessor = if attrs.readonly {
            quote! { .readonly_field(#member_name, |o| &o.#field_ident) }
        } else {
            quote! { .field(#member_name, |o| &o.#field_ident, |o| &mut o.#field_ident) }
        };

        let tags = attrs.tags.iter().map(|tag| {
            let Tag { counterpart, member, direction } = tag;
            quote! {
                .tag(::objmap::MappingTag::new(
                    #direction,
                    ::objmap::TypeHandle::of::<#counterpart>(),
                    #member,
                ))
            }
        });

        members.push(quote! { #accessor #(#tags)* });
    }

    let constructor = if container.no_default {
        quote! {}
    } else {
        quote! { .constructor() }
    };

    Ok(quote! {
        impl ::objmap::Mappable for #ident {
            fn describe() -> &'static ::objmap::TypeInfo {
                static INFO: ::objmap::__private::OnceCell<::objmap::TypeInfo> =
                    ::objmap::__private::OnceCell::new();
                INFO.get_or_init(|| {
                    ::objmap::TypeInfo::builder::<#ident>(#type_name)
                        #(#members)*
                        #constructor
                        .build()
                })
            }
        }

        impl ::objmap::MemberValue for #ident {
            fn value_type() -> ::objmap::ValueType {
                ::objmap::ValueType::object::<#ident>()
            }

            fn to_value(&self) -> ::objmap::Value {
                ::objmap::Value::object(::core::clone::Clone::clone(self))
            }

            fn from_value(
                value: ::objmap::Value,
            ) -> ::core::result::Result<Self, ::objmap::ConversionError> {
                ::objmap::convert(value, &<Self as ::objmap::MemberValue>::value_type())?
                    .into_object::<#ident>()
            }
        }
    })
}
