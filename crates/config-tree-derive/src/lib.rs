//! `#[derive(AutoSerialize)]` for `config-tree`.
//!
//! Generates a `ConfigType` implementation whose descriptor lists every field
//! marked `#[serialize_as("Tag")]`, in declaration order. Construction is
//! configured on the container:
//!
//! - `#[auto_serialize(constructor = new)]`: an associated function taking the
//!   tagged fields, in order, as arguments.
//! - `#[auto_serialize(default)]`: `Default::default()` followed by injection
//!   of the tagged fields present in the serialized mapping.
//!
//! Both may be given; the constructor is preferred. With neither, the type
//! serializes but fails to deserialize with a construction error.
//!
//! The generated `FromValue` impl rebuilds nested mappings with the service
//! driving deserialization, so a nested type may use a serializer registered
//! only in an isolated `Serializations`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type, parse_macro_input};

#[proc_macro_derive(AutoSerialize, attributes(serialize_as, auto_serialize))]
pub fn derive_auto_serialize(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct TaggedFieldInput<'a> {
    tag: LitStr,
    ident: &'a Ident,
    ty: &'a Type,
}

#[derive(Default)]
struct ContainerOptions {
    constructor: Option<Ident>,
    default: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "AutoSerialize does not support generic types",
        ));
    }

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "AutoSerialize requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "AutoSerialize can only be derived for structs",
            ));
        }
    };

    let options = container_options(input)?;
    let mut tagged = Vec::new();
    for field in &named.named {
        for attr in &field.attrs {
            if attr.path().is_ident("serialize_as") {
                let tag: LitStr = attr.parse_args()?;
                if let Some(ident) = &field.ident {
                    tagged.push(TaggedFieldInput {
                        tag,
                        ident,
                        ty: &field.ty,
                    });
                }
            }
        }
    }

    let name = &input.ident;
    let fields = tagged.iter().map(|TaggedFieldInput { tag, ident, ty }| {
        let field_name = ident.to_string();
        quote! {
            .field(::config_tree::TaggedField::<Self>::new::<#ty>(
                #tag,
                #field_name,
                |object: &Self| ::config_tree::Value::from(::core::clone::Clone::clone(&object.#ident)),
                |object: &mut Self,
                 value: ::core::option::Option<::config_tree::Value>,
                 serializations: &::config_tree::Serializations|
                 -> ::config_tree::Result<()> {
                    object.#ident = ::config_tree::convert_field_in(
                        value,
                        ::core::any::type_name::<Self>(),
                        #tag,
                        serializations,
                    )?;
                    ::core::result::Result::Ok(())
                },
            ))
        }
    });

    let constructor = options.constructor.as_ref().map(|ctor| {
        let types: Vec<&Type> = tagged.iter().map(|field| field.ty).collect();
        quote! {
            .constructor(
                ::std::vec![#(::core::any::TypeId::of::<#types>()),*],
                |args: &mut ::config_tree::Arguments| -> ::config_tree::Result<Self> {
                    ::core::result::Result::Ok(Self::#ctor(#(args.next::<#types>()?),*))
                },
            )
        }
    });

    let empty = options.default.then(|| {
        quote! {
            .empty_constructor(<Self as ::core::default::Default>::default)
        }
    });

    Ok(quote! {
        impl ::config_tree::ConfigType for #name {
            fn descriptor() -> ::core::option::Option<::config_tree::Descriptor<Self>> {
                ::core::option::Option::Some(
                    ::config_tree::Descriptor::new()
                        #(#fields)*
                        #constructor
                        #empty
                )
            }
        }

        impl ::core::convert::From<#name> for ::config_tree::Value {
            fn from(value: #name) -> Self {
                ::config_tree::Value::object(value)
            }
        }

        impl ::config_tree::FromValue for #name {
            fn from_value(value: &::config_tree::Value) -> ::core::option::Option<Self> {
                match value {
                    ::config_tree::Value::Object(object) => {
                        object.downcast_ref::<Self>().cloned()
                    }
                    ::config_tree::Value::Section(section) => section
                        .options()
                        .serializations()
                        .deserialize::<Self>(&section.cached_values())
                        .ok(),
                    ::config_tree::Value::Map(map) => ::config_tree::Serializations::global()
                        .deserialize::<Self>(map)
                        .ok(),
                    _ => ::core::option::Option::None,
                }
            }

            fn from_value_in(
                value: &::config_tree::Value,
                serializations: &::config_tree::Serializations,
            ) -> ::core::option::Option<Self> {
                match value {
                    ::config_tree::Value::Map(map) => serializations.deserialize::<Self>(map).ok(),
                    other => <Self as ::config_tree::FromValue>::from_value(other),
                }
            }
        }
    })
}

fn container_options(input: &DeriveInput) -> syn::Result<ContainerOptions> {
    let mut options = ContainerOptions::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("auto_serialize") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("constructor") {
                options.constructor = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("default") {
                options.default = true;
                Ok(())
            } else {
                Err(meta.error("expected `constructor = <fn>` or `default`"))
            }
        })?;
    }
    Ok(options)
}
