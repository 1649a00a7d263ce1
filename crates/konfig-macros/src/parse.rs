//! Parsing utilities for the `EnvOverride` derive.
//!
//! This module turns a struct definition and its `#[env ...]` field
//! attributes into the declarative field list the expansion works from.

use syn::{
    ext::IdentExt, spanned::Spanned, Attribute, Data, DeriveInput, Expr, ExprLit, Fields,
    Generics, Ident, Index, Lit, LitStr, Member, Meta, Type,
};

/// Parsed `#[env ...]` attributes of one field.
#[derive(Debug, Default)]
pub struct EnvAttrs {
    /// The environment variable overriding this field.
    pub key: Option<LitStr>,
    /// Whether to walk into the field's own overrides.
    pub nested: bool,
}

impl EnvAttrs {
    /// Collects every `#[env ...]` attribute of a field.
    ///
    /// Accepted forms are `#[env = "KEY"]`, `#[env(key = "KEY")]`,
    /// `#[env(nested)]` and `#[env(nested, key = "KEY")]`.
    pub fn from_attributes(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("env")) {
            match &attr.meta {
                Meta::NameValue(nv) => {
                    let key = match &nv.value {
                        Expr::Lit(ExprLit {
                            lit: Lit::Str(s), ..
                        }) => s.clone(),
                        _ => {
                            return Err(syn::Error::new(
                                nv.value.span(),
                                "expected string literal",
                            ))
                        }
                    };
                    parsed.set_key(key)?;
                }
                Meta::List(_) => {
                    attr.parse_nested_meta(|meta| {
                        if meta.path.is_ident("nested") {
                            if parsed.nested {
                                return Err(meta.error("duplicate `nested`"));
                            }
                            parsed.nested = true;
                            Ok(())
                        } else if meta.path.is_ident("key") {
                            let key: LitStr = meta.value()?.parse()?;
                            parsed.set_key(key)
                        } else {
                            let name = meta
                                .path
                                .get_ident()
                                .map_or_else(|| "?".to_string(), ToString::to_string);
                            Err(meta.error(format!("unknown env attribute: {name}")))
                        }
                    })?;
                }
                Meta::Path(path) => {
                    return Err(syn::Error::new(
                        path.span(),
                        "expected `#[env = \"KEY\"]` or `#[env(...)]`",
                    ))
                }
            }
        }

        Ok(parsed)
    }

    fn set_key(&mut self, key: LitStr) -> syn::Result<()> {
        if self.key.is_some() {
            return Err(syn::Error::new(key.span(), "duplicate environment key"));
        }
        if key.value().is_empty() {
            return Err(syn::Error::new(key.span(), "environment key cannot be empty"));
        }
        self.key = Some(key);
        Ok(())
    }

    /// Whether the field takes part in the override pass at all.
    pub const fn is_active(&self) -> bool {
        self.nested || self.key.is_some()
    }
}

/// A struct field with its env attributes.
#[derive(Debug)]
pub struct EnvField {
    /// How to reach the field from `self`.
    pub member: Member,
    /// Name reported in override errors, e.g. `ServerConfig.port`.
    pub label: String,
    /// The field's type.
    pub ty: Type,
    /// The field's env attributes.
    pub attrs: EnvAttrs,
}

/// A struct deriving `EnvOverride`.
#[derive(Debug)]
pub struct EnvStruct {
    /// The struct name.
    pub ident: Ident,
    /// The struct generics, re-emitted on the impls.
    pub generics: Generics,
    /// Fields carrying an `#[env ...]` attribute, in declaration order.
    pub fields: Vec<EnvField>,
}

impl EnvStruct {
    /// Parses a `DeriveInput`, rejecting enums and unions.
    pub fn parse(input: DeriveInput) -> syn::Result<Self> {
        let data = match input.data {
            Data::Struct(data) => data,
            Data::Enum(e) => {
                return Err(syn::Error::new(
                    e.enum_token.span,
                    "EnvOverride can only be derived for structs",
                ))
            }
            Data::Union(u) => {
                return Err(syn::Error::new(
                    u.union_token.span,
                    "EnvOverride can only be derived for structs",
                ))
            }
        };

        let struct_name = input.ident.unraw().to_string();
        let fields = match data.fields {
            Fields::Named(named) => named.named.into_iter().collect::<Vec<_>>(),
            Fields::Unnamed(unnamed) => unnamed.unnamed.into_iter().collect(),
            Fields::Unit => Vec::new(),
        };

        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(i, field)| {
                let attrs = EnvAttrs::from_attributes(&field.attrs)?;
                if !attrs.is_active() {
                    return Ok(None);
                }
                let (member, name) = match field.ident {
                    Some(ident) => {
                        let name = ident.unraw().to_string();
                        (Member::Named(ident), name)
                    }
                    None => (
                        Member::Unnamed(Index {
                            index: u32::try_from(i).map_err(|_| {
                                syn::Error::new(field.ty.span(), "too many fields")
                            })?,
                            span: field.ty.span(),
                        }),
                        i.to_string(),
                    ),
                };

                Ok(Some(EnvField {
                    member,
                    label: format!("{struct_name}.{name}"),
                    ty: field.ty,
                    attrs,
                }))
            })
            .filter_map(Result::transpose)
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self {
            ident: input.ident,
            generics: input.generics,
            fields,
        })
    }
}
