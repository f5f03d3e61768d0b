//! # autodoc Macros
//!
//! Procedural macros for the autodoc route documentation.
//!
//! `#[derive(Describe)]` implements `autodoc_core::Describe` and
//! `autodoc_core::FieldType` for a struct with named fields, so the struct
//! can be listed as a request or response shape of a route and can be
//! nested inside other shapes.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod describe;

/// Derives `Describe` and `FieldType` for a struct with named fields.
///
/// # Attributes
///
/// ## Struct-level
///
/// - `#[describe(name = "...")]` - canonical shape name, defaults to
///   `module_path!()::TypeName`
///
/// ## Field-level
///
/// - `#[describe(description = "...")]` - field description; `"-"` hides
///   the field. Doc comments are used when absent.
/// - `#[describe(rename = "...")]` - displayed name; `"-"` hides the field
/// - `#[describe(required)]` - mark the field as required
/// - `#[describe(skip)]` - leave the field out
///
/// `#[serde(rename = "...")]` and `#[serde(skip)]` /
/// `#[serde(skip_serializing)]` are honoured the same way.
///
/// # Example
///
/// ```ignore
/// use autodoc_core::Describe;
///
/// #[derive(Describe)]
/// pub struct User {
///     #[describe(description = "unique id", required)]
///     pub id: i64,
///     #[serde(rename = "display_name")]
///     pub name: String,
///     #[describe(skip)]
///     pub password_hash: String,
/// }
/// ```
#[proc_macro_derive(Describe, attributes(describe))]
pub fn derive_describe(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    describe::derive_describe_impl(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
