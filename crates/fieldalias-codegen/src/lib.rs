// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::ext::IdentExt;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, GenericParam, Index};

/// `#[derive(Reflect)]` macro: generates the `fieldalias::Reflect` impl
///
/// Supports:
/// - Structs with named fields, tuple structs and unit structs; every field
///   type must implement `Reflect`
/// - Generic type parameters (each gets a `Reflect` bound)
/// - `#[reflect(opaque)]` on a struct or enum: expose the type as a leaf
///   without fields
///
/// Enums and unions need `#[reflect(opaque)]`. Lifetime parameters and
/// `#[repr(packed)]` are rejected.
///
/// Example:
/// ```ignore
/// use fieldalias::Reflect;
///
/// #[derive(Reflect)]
/// struct Order {
///     id: u64,
///     lines: Vec<OrderLine>,
///     customer: Box<Customer>,
/// }
///
/// #[derive(Reflect)]
/// #[reflect(opaque)]
/// enum Status {
///     Open,
///     Closed,
/// }
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Reflect types must be 'static; lifetime parameters are not supported",
        ));
    }

    let opaque = is_opaque(&input)?;
    let body = if opaque {
        quote! { ::fieldalias::Shape::opaque::<Self>() }
    } else {
        let fields = match &input.data {
            Data::Struct(data) => &data.fields,
            Data::Enum(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Enums have no stable field layout; add #[reflect(opaque)]",
                ))
            }
            Data::Union(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Unions have no stable field layout; add #[reflect(opaque)]",
                ))
            }
        };
        reject_packed(&input)?;
        let members = field_shapes(fields);
        quote! {
            ::fieldalias::Shape::structure::<Self>(::std::vec![#(#members),*])
        }
    };

    for param in &mut input.generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::fieldalias::Reflect));
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        // SAFETY: offsets and sizes are taken from the type definition itself.
        unsafe impl #impl_generics ::fieldalias::Reflect for #name #ty_generics #where_clause {
            fn shape() -> ::fieldalias::Shape {
                #body
            }
        }
    })
}

/// One `FieldShape::of` per declared field, in declaration order.
fn field_shapes(fields: &Fields) -> Vec<TokenStream2> {
    fields
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let ty = &field.ty;
            let (label, member) = match &field.ident {
                Some(ident) => (ident.unraw().to_string(), ident.to_token_stream()),
                None => (idx.to_string(), Index::from(idx).to_token_stream()),
            };
            quote! {
                ::fieldalias::FieldShape::of::<#ty>(
                    #label,
                    ::core::mem::offset_of!(Self, #member),
                )
            }
        })
        .collect()
}

fn is_opaque(input: &DeriveInput) -> syn::Result<bool> {
    let mut opaque = false;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("opaque") {
                opaque = true;
                Ok(())
            } else {
                Err(meta.error("unknown reflect attribute, expected `opaque`"))
            }
        })?;
    }
    Ok(opaque)
}

// Projections hand out aligned views of fields; packed fields are not.
fn reject_packed(input: &DeriveInput) -> syn::Result<()> {
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("repr")) {
        if attr.meta.to_token_stream().to_string().contains("packed") {
            return Err(syn::Error::new_spanned(
                attr,
                "#[repr(packed)] fields cannot be projected; use #[reflect(opaque)]",
            ));
        }
    }
    Ok(())
}
