//! Procedural macros for mapping structs to tables
//!
//! This crate provides the `#[model]` attribute and the `Entity` derive. For
//! each entity the derive generates its static table schema, the typed
//! `Q<Entity>` query path and the row decoding used by `query_core`.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod generation;
mod model_macro;
mod parsing;

use generation::{generate_entity_impl, generate_path_struct};
use model_macro::model_attribute;
use parsing::{parse_fields, parse_table_attributes};

/// Derive macro for the `query_core::Entity` trait
///
/// Note: It's recommended to use the `#[model]` attribute macro instead,
/// which automatically includes this derive along with other necessary derives.
///
/// ```ignore
/// #[derive(Debug, Clone, Entity)]
/// #[table(name = "member")]
/// pub struct Member {
///     #[primary_key]
///     #[column(name = "member_id")]
///     pub id: Uuid,
///     pub name: Option<String>,
///     pub age: i32,
///     #[many_to_one(join_column = "team_id")]
///     pub team: Option<Lazy<Team>>,
/// }
/// ```
///
/// This generates `QMember` with `name: Expr<String>`, `age: Expr<i32>` and
/// `team: RelationPath<Team>`.
#[proc_macro_derive(
    Entity,
    attributes(table, primary_key, column, many_to_one, one_to_many)
)]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "Entity cannot be derived for generic structs")
            .to_compile_error()
            .into();
    }

    // Parse table attributes - handle errors properly
    let table_info = match parse_table_attributes(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    // Parse field attributes - handle errors properly
    let entity_info = match parse_fields(&input.data) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let entity_impl = generate_entity_impl(name, &table_info, &entity_info);
    let path_struct = generate_path_struct(name, &entity_info);

    let expanded = quote::quote! {
        #entity_impl
        #path_struct
    };

    TokenStream::from(expanded)
}

/// Convenience attribute macro that adds all necessary derives for an entity
///
/// ```ignore
/// use entity_derive::model;
///
/// #[model]
/// #[table(name = "team")]
/// pub struct Team {
///     #[primary_key]
///     #[column(name = "team_id")]
///     pub id: Uuid,
///     pub name: String,
///     #[one_to_many(target = Member, mapped_by = "team")]
///     pub members: Vec<Uuid>,
/// }
/// ```
#[proc_macro_attribute]
pub fn model(attr: TokenStream, item: TokenStream) -> TokenStream {
    model_attribute(attr, item)
}
