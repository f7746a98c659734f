use heck::{ToShoutySnakeCase, ToSnakeCase};
use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::{ext::IdentExt, Data, DeriveInput, Fields, LitInt, LitStr, Type};

/// Declarative markers read from one field's `#[schema(...)]` attributes.
#[derive(Default)]
struct FieldMarkers {
    primary_key: bool,
    unique: bool,
    max_length: Option<u32>,
    row_version: bool,
    column: Option<String>,
}

/// Expands the `#[derive(Entity)]` macro.
///
/// Generates:
/// 1. `impl tablewright::Entity` with one `FieldMeta` per field.
/// 2. A `<snake_name>_fields` module holding a typed `Field` selector per field.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;
    let vis = &ast.vis;

    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&ast.generics, "Entity cannot be derived for generic structs"));
    }

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new_spanned(struct_name, "Entity must have named fields")),
        },
        _ => return Err(syn::Error::new_spanned(struct_name, "Entity must be a struct")),
    };

    let mut table_name = None;
    for attr in &ast.attrs {
        if attr.path().is_ident("schema") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let value: LitStr = meta.value()?.parse()?;
                    table_name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown struct attribute, expected `table = \"...\"`"))
                }
            })?;
        }
    }

    let mut metas = Vec::with_capacity(fields.len());
    let mut selectors = Vec::with_capacity(fields.len());

    for field in fields {
        let ident = field.ident.as_ref().expect("named field");
        let member = ident.unraw().to_string();
        let field_type = &field.ty;
        let type_name = type_name(field_type);
        let markers = parse_markers(field)?;

        let column_name = option_tokens(markers.column.as_deref());
        let max_length = match markers.max_length {
            Some(length) => quote! { Some(#length) },
            None => quote! { None },
        };
        let FieldMarkers { primary_key, unique, row_version, .. } = markers;

        metas.push(quote! {
            tablewright::FieldMeta {
                field: #member,
                type_name: #type_name,
                column_name: #column_name,
                primary_key: #primary_key,
                unique: #unique,
                max_length: #max_length,
                row_version: #row_version,
            }
        });

        let const_name = format_ident!("{}", member.to_shouty_snake_case());
        selectors.push(quote! {
            pub const #const_name: tablewright::Field<#struct_name, #field_type> = tablewright::Field::new(#member);
        });
    }

    let type_name_str = struct_name.to_string();
    let table_name = option_tokens(table_name.as_deref());
    let module = format_ident!("{}_fields", type_name_str.to_snake_case());

    Ok(quote! {
        impl tablewright::Entity for #struct_name {
            fn type_name() -> &'static str {
                #type_name_str
            }

            fn table_name() -> Option<&'static str> {
                #table_name
            }

            fn fields() -> Vec<tablewright::FieldMeta> {
                vec![#(#metas),*]
            }
        }

        #[allow(dead_code, unused_imports)]
        #vis mod #module {
            use super::*;

            #(#selectors)*
        }
    })
}

fn parse_markers(field: &syn::Field) -> syn::Result<FieldMarkers> {
    let mut markers = FieldMarkers::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("schema") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") || meta.path.is_ident("primary_key") {
                markers.primary_key = true;
            } else if meta.path.is_ident("unique") {
                markers.unique = true;
            } else if meta.path.is_ident("row_version") {
                markers.row_version = true;
            } else if meta.path.is_ident("max_length") || meta.path.is_ident("size") {
                let value: LitInt = meta.value()?.parse()?;
                markers.max_length = Some(value.base10_parse::<u32>()?);
            } else if meta.path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                markers.column = Some(value.value());
            } else {
                return Err(meta.error(
                    "unknown schema attribute, expected one of `key`, `unique`, `row_version`, `max_length`, `column`",
                ));
            }
            Ok(())
        })?;
    }

    Ok(markers)
}

/// The field type as written, with token spacing collapsed (`Option<Vec<u8>>`).
fn type_name(ty: &Type) -> String {
    ty.to_token_stream()
        .to_string()
        .replace(" :: ", "::")
        .replace(":: ", "::")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
        .replace("& ", "&")
}

fn option_tokens(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote! { Some(#value) },
        None => quote! { None },
    }
}
