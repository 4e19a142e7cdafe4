//! Procedural macros for Sanduq.
//!
//! Use them through the `sanduq` crate, which re-exports
//! `#[derive(Injectable)]` next to the trait of the same name.

use darling::ast::{Data, Style};
use darling::util::Flag;
use darling::{FromDeriveInput, FromField, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, GenericArgument, Path, PathArguments, Type, parse_macro_input, parse_quote};

/// Derives `Injectable` for a unit struct or a struct with named fields.
///
/// Every field must be an `Arc<X>` (resolved as a dependency on `X`) or
/// carry `#[inject(default)]`.
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// #[injectable(singleton, implements = "dyn Repository")]
/// struct PostgresRepository {
///     pool: Arc<Pool>,
///     #[inject(default)]
///     queries: AtomicU64,
/// }
/// ```
///
/// Container attributes:
/// - `singleton` or `singleton = "first_resolve" | "registration" | "initialization"`
/// - `disposable`, for types implementing `Dispose`
/// - `implements = "dyn Trait"`, repeatable
/// - `crate = "path"` when `sanduq` is not a direct dependency
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match InjectableInput::from_derive_input(&input).and_then(|parsed| expand(&parsed)) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<(), InjectableField>,
    #[darling(default)]
    singleton: Option<SingletonAttr>,
    disposable: Flag,
    #[darling(multiple)]
    implements: Vec<Type>,
    #[darling(rename = "crate", default)]
    krate: Option<Path>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectableField {
    ident: Option<syn::Ident>,
    ty: Type,
    default: Flag,
}

#[derive(Clone, Copy)]
enum SingletonAttr {
    FirstResolve,
    Registration,
    Initialization,
}

impl FromMeta for SingletonAttr {
    fn from_word() -> darling::Result<Self> {
        Ok(SingletonAttr::FirstResolve)
    }

    fn from_string(value: &str) -> darling::Result<Self> {
        match value {
            "first_resolve" => Ok(SingletonAttr::FirstResolve),
            "registration" => Ok(SingletonAttr::Registration),
            "initialization" => Ok(SingletonAttr::Initialization),
            other => Err(darling::Error::unknown_value(other)),
        }
    }
}

fn expand(input: &InjectableInput) -> darling::Result<TokenStream2> {
    let krate: Path = input.krate.clone().unwrap_or_else(|| parse_quote!(::sanduq));
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(fields) => fields,
        Data::Enum(_) => return Err(darling::Error::unsupported_shape("enum")),
    };

    let constructor = if fields.style == Style::Unit {
        quote! {
            .constructor(::std::vec::Vec::new(), |_| ::std::result::Result::Ok(Self))
        }
    } else {
        let mut errors = darling::Error::accumulator();
        let mut parameters = Vec::new();
        let mut initializers = Vec::new();

        for field in fields.iter() {
            let Some(name) = &field.ident else { continue };
            if field.default.is_present() {
                initializers.push(quote! { #name: ::core::default::Default::default() });
                continue;
            }
            match arc_inner(&field.ty) {
                Some(inner) => {
                    parameters.push(quote! { #krate::Dependency::of::<#inner>() });
                    initializers.push(quote! { #name: arguments.take::<#inner>()? });
                }
                None => errors.push(
                    darling::Error::custom(
                        "Injected fields must be `Arc<T>`; use #[inject(default)] for anything else",
                    )
                    .with_span(&field.ty),
                ),
            }
        }
        errors.finish()?;

        let arguments = if parameters.is_empty() {
            quote!(_)
        } else {
            quote!(arguments)
        };
        quote! {
            .constructor(
                ::std::vec![#(#parameters),*],
                |#arguments| ::std::result::Result::Ok(Self { #(#initializers),* }),
            )
        }
    };

    let singleton = input.singleton.map(|policy| {
        let variant = match policy {
            SingletonAttr::FirstResolve => quote!(FirstResolve),
            SingletonAttr::Registration => quote!(Registration),
            SingletonAttr::Initialization => quote!(Initialization),
        };
        quote! { .singleton(#krate::SingletonPolicy::#variant) }
    });

    let disposable = input.disposable.is_present().then(|| quote! { .disposable() });
    let contracts = &input.implements;

    Ok(quote! {
        impl #impl_generics #krate::Injectable for #ident #ty_generics #where_clause {
            fn descriptor() -> #krate::TypeDescriptor {
                #krate::TypeDescriptor::builder::<Self>()
                    #constructor
                    #singleton
                    #disposable
                    #(.implements::<#contracts>(|it| it))*
                    .build()
            }
        }
    })
}

/// `X` for a type written `Arc<X>` (with or without a leading path).
fn arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else { return None };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first() {
        Some(GenericArgument::Type(inner)) if arguments.args.len() == 1 => Some(inner),
        _ => None,
    }
}
