//! `EnvOverride` derive implementation.
//!
//! This module contains the code generation for `#[derive(EnvOverride)]`.

use proc_macro2::{TokenStream, TokenTree};
use quote::{quote, ToTokens};
use syn::{parse_quote, DeriveInput, Generics, Ident, Type};

use crate::parse::{EnvField, EnvStruct};

/// Expands `#[derive(EnvOverride)]`.
///
/// Generates:
/// 1. An `EnvOverride` impl visiting the annotated fields in declaration
///    order, recursing into nested fields before checking their own key
/// 2. An empty `EnvValue` impl, so a key on a field of this type is ignored
///
/// Fields whose type mentions a type parameter get a where-clause bound:
/// `EnvOverride` for nested fields, `EnvValue` for keyed ones.
pub fn expand_env_override(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let parsed = EnvStruct::parse(input)?;

    Ok(generate_impls(&parsed))
}

fn generate_impls(parsed: &EnvStruct) -> TokenStream {
    let ident = &parsed.ident;
    let bounded = bounded_generics(parsed);
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();
    let (value_impl_generics, _, value_where_clause) = parsed.generics.split_for_impl();
    let steps = parsed.fields.iter().map(generate_field_step);

    quote! {
        #[automatically_derived]
        impl #impl_generics ::konfig::EnvOverride for #ident #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn apply_env_overrides(
                &mut self,
                env: &dyn ::konfig::EnvSource,
            ) -> ::core::result::Result<(), ::konfig::ConfigError> {
                #(#steps)*
                ::core::result::Result::Ok(())
            }
        }

        #[automatically_derived]
        impl #value_impl_generics ::konfig::EnvValue for #ident #ty_generics #value_where_clause {}
    }
}

fn bounded_generics(parsed: &EnvStruct) -> Generics {
    let params: Vec<&Ident> = parsed.generics.type_params().map(|p| &p.ident).collect();
    let mut generics = parsed.generics.clone();
    if params.is_empty() {
        return generics;
    }

    let where_clause = generics.make_where_clause();
    for field in &parsed.fields {
        if !mentions_any(&field.ty, &params) {
            continue;
        }
        let ty = &field.ty;
        if field.attrs.nested {
            where_clause
                .predicates
                .push(parse_quote!(#ty: ::konfig::EnvOverride));
        }
        if field.attrs.key.is_some() {
            where_clause.predicates.push(parse_quote!(#ty: ::konfig::EnvValue));
        }
    }
    generics
}

fn mentions_any(ty: &Type, params: &[&Ident]) -> bool {
    fn walk(tokens: TokenStream, params: &[&Ident]) -> bool {
        tokens.into_iter().any(|token| match token {
            TokenTree::Ident(ident) => params.iter().any(|p| **p == ident),
            TokenTree::Group(group) => walk(group.stream(), params),
            _ => false,
        })
    }
    walk(ty.to_token_stream(), params)
}

fn generate_field_step(field: &EnvField) -> TokenStream {
    let member = &field.member;

    let nested = field.attrs.nested.then(|| {
        quote! {
            ::konfig::EnvOverride::apply_env_overrides(&mut self.#member, env)?;
        }
    });

    let key = field.attrs.key.as_ref().map(|key| {
        let label = &field.label;
        quote! {
            ::konfig::override_field(&mut self.#member, #label, #key, env)?;
        }
    });

    quote! { #nested #key }
}
