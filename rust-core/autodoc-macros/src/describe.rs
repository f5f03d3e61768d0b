//! Expansion of `#[derive(Describe)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    ext::IdentExt, meta::ParseNestedMeta, spanned::Spanned, Attribute, Data, DeriveInput, Expr,
    ExprLit, Field, Fields, Lit, LitStr, Meta, Token,
};

/// Parsed field annotations
#[derive(Debug, Default)]
struct FieldAttrs {
    description: Option<String>,
    rename: Option<String>,
    required: bool,
    skip: bool,
}

pub fn derive_describe_impl(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "Describe cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    ident.span(),
                    "Describe requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new(
                ident.span(),
                "Describe can only be derived for structs",
            ))
        }
    };

    let name_expr = match struct_name_override(&input.attrs)? {
        Some(name) => quote! { ::std::string::String::from(#name) },
        None => {
            let ident_str = ident.unraw().to_string();
            quote! { ::std::format!("{}::{}", ::std::module_path!(), #ident_str) }
        }
    };

    let mut specs = Vec::new();
    for field in fields {
        if let Some(spec) = field_spec(field)? {
            specs.push(spec);
        }
    }

    Ok(quote! {
        impl ::autodoc_core::FieldType for #ident {
            fn type_name() -> ::std::string::String {
                #name_expr
            }

            fn shape_ref() -> ::std::option::Option<::std::string::String> {
                ::std::option::Option::Some(<Self as ::autodoc_core::FieldType>::type_name())
            }
        }

        impl ::autodoc_core::Describe for #ident {
            fn shape() -> ::autodoc_core::Result<::autodoc_core::ShapeDescriptor> {
                ::autodoc_core::ShapeBuilder::new(<Self as ::autodoc_core::FieldType>::type_name())
                    #(.field(#specs))*
                    .build()
            }
        }
    })
}

fn struct_name_override(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("describe")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unknown describe attribute, expected `name`"))
            }
        })?;
    }
    Ok(name)
}

/// `FieldSpec` construction for one field, `None` if it is skipped
fn field_spec(field: &Field) -> syn::Result<Option<TokenStream>> {
    let attrs = parse_field_attrs(&field.attrs)?;
    if attrs.skip {
        return Ok(None);
    }

    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
    let raw_name = ident.unraw().to_string();
    let ty = &field.ty;

    let mut spec = quote! { ::autodoc_core::FieldSpec::of::<#ty>(#raw_name) };
    if let Some(rename) = &attrs.rename {
        spec = quote! { #spec.external_name(#rename) };
    }
    if let Some(description) = &attrs.description {
        spec = quote! { #spec.description(#description) };
    }
    if attrs.required {
        spec = quote! { #spec.required(true) };
    }
    Ok(Some(spec))
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    let mut serde_rename = None;
    let mut doc_lines = Vec::new();

    for attr in attrs {
        if attr.path().is_ident("describe") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("description") {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.description = Some(value.value());
                } else if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.rename = Some(value.value());
                } else if meta.path.is_ident("required") {
                    parsed.required = true;
                } else if meta.path.is_ident("skip") {
                    parsed.skip = true;
                } else {
                    return Err(meta.error(
                        "unknown describe attribute, expected `description`, `rename`, `required` or `skip`",
                    ));
                }
                Ok(())
            })?;
        } else if attr.path().is_ident("serde") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                    let value: LitStr = meta.value()?.parse()?;
                    serde_rename = Some(value.value());
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("serialize") {
                            let value: LitStr = inner.value()?.parse()?;
                            serde_rename = Some(value.value());
                            Ok(())
                        } else {
                            skip_meta(&inner)
                        }
                    })
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    parsed.skip = true;
                    Ok(())
                } else {
                    skip_meta(&meta)
                }
            })?;
        } else if attr.path().is_ident("doc") {
            if let Meta::NameValue(nv) = &attr.meta {
                if let Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) = &nv.value
                {
                    let line = s.value().trim().to_string();
                    if !line.is_empty() {
                        doc_lines.push(line);
                    }
                }
            }
        }
    }

    if parsed.rename.is_none() {
        parsed.rename = serde_rename;
    }
    if parsed.description.is_none() && !doc_lines.is_empty() {
        parsed.description = Some(doc_lines.join(" "));
    }
    Ok(parsed)
}

/// Consume a serde option this macro does not care about
fn skip_meta(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<TokenStream>()?;
    }
    Ok(())
}
