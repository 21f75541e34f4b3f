//! `#[derive(WalkModel)]`: generates `crate::walk::Walk` for type-model nodes.
//!
//! Structs walk every field in declaration order; enums walk the payload of the active
//! variant. Fields marked `#[walk(skip)]` are not visited, which lets leaf data such as
//! names and tags stay out of the trait.

use proc_macro::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::{Attribute, Data, DeriveInput, Fields, Index, parse_macro_input, spanned::Spanned};

#[proc_macro_derive(WalkModel, attributes(walk))]
pub fn derive_walk_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let span = input.span();

    let walk_body = match generate_walk_body(&input.data) {
        Ok(body) => body,
        Err(err) => return err.into_compile_error().into(),
    };

    let expanded = quote_spanned! {span =>
        impl<'m> crate::walk::Walk<'m> for #name {
            #[inline]
            #[allow(unused_variables)]
            fn walk<V: crate::walk::Visitor<'m> + ?Sized>(&'m self, v: &mut V) {
                #walk_body
            }
        }
    };

    expanded.into()
}

/// Whether the field carries `#[walk(skip)]`.
fn is_skipped(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut skip = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("walk")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}

fn generate_walk_body(data: &Data) -> syn::Result<proc_macro2::TokenStream> {
    match data {
        Data::Struct(data_struct) => generate_fields_walk(&data_struct.fields),
        Data::Enum(data_enum) => {
            let arms = data_enum
                .variants
                .iter()
                .map(|variant| generate_variant_arm(&variant.ident, &variant.fields))
                .collect::<syn::Result<Vec<_>>>()?;

            Ok(quote! {
                match self {
                    #(#arms)*
                }
            })
        }
        Data::Union(u) => Err(syn::Error::new_spanned(
            u.union_token,
            "WalkModel cannot be derived for unions",
        )),
    }
}

fn generate_fields_walk(fields: &Fields) -> syn::Result<proc_macro2::TokenStream> {
    let mut walk_calls = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        if is_skipped(&field.attrs)? {
            continue;
        }
        let field_access = match &field.ident {
            Some(ident) => quote! { &self.#ident },
            None => {
                let index = Index::from(i);
                quote! { &self.#index }
            }
        };
        walk_calls.push(quote! { crate::walk::Walk::walk(#field_access, v); });
    }

    Ok(quote! { #(#walk_calls)* })
}

fn generate_variant_arm(
    variant_name: &syn::Ident,
    fields: &Fields,
) -> syn::Result<proc_macro2::TokenStream> {
    let arm = match fields {
        Fields::Unit => quote! { Self::#variant_name => {} },
        Fields::Named(fields_named) => {
            let mut bindings = Vec::new();
            let mut walk_calls = Vec::new();
            for field in &fields_named.named {
                let Some(name) = field.ident.as_ref() else {
                    continue;
                };
                bindings.push(name);
                if !is_skipped(&field.attrs)? {
                    walk_calls.push(quote! { crate::walk::Walk::walk(#name, v); });
                }
            }

            quote! {
                Self::#variant_name { #(#bindings),* } => {
                    #(#walk_calls)*
                }
            }
        }
        Fields::Unnamed(fields_unnamed) => {
            let mut bindings = Vec::new();
            let mut walk_calls = Vec::new();
            for (i, field) in fields_unnamed.unnamed.iter().enumerate() {
                let var = format_ident!("f{}", i);
                if !is_skipped(&field.attrs)? {
                    walk_calls.push(quote! { crate::walk::Walk::walk(#var, v); });
                }
                bindings.push(var);
            }

            quote! {
                Self::#variant_name(#(#bindings),*) => {
                    #(#walk_calls)*
                }
            }
        }
    };
    Ok(arm)
}
