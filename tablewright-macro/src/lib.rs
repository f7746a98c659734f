//! Procedural macros for tablewright.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod derive_entity;

/// Derives `tablewright::Entity` from a struct with named fields.
///
/// Struct attribute: `#[schema(table = "name")]`.
///
/// Field attributes, combinable as `#[schema(key, max_length = 64)]`:
/// - `key` (alias `primary_key`)
/// - `unique`
/// - `max_length = n` (alias `size`)
/// - `row_version`
/// - `column = "name"`
///
/// Also emits a `<snake_name>_fields` module with one typed selector constant
/// per field, e.g. `user_fields::EMAIL`.
#[proc_macro_derive(Entity, attributes(schema))]
pub fn entity_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_entity::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
