//! Code generation for `#[derive(Entity)]`
//!
//! Emits the static `TableSchema`, the `Q<Entity>` path struct and the
//! `Entity`, `EntityPath` and `Projection` implementations.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;
use type_mapping::ValueType;

use crate::parsing::{generic_argument, EntityInfo, FieldKind, TableInfo};

fn value_type_tokens(value_type: ValueType) -> TokenStream {
    let variant = match value_type {
        ValueType::Boolean => quote!(Boolean),
        ValueType::Integer => quote!(Integer),
        ValueType::BigInt => quote!(BigInt),
        ValueType::Double => quote!(Double),
        ValueType::Text => quote!(Text),
        ValueType::Uuid => quote!(Uuid),
    };
    quote!(::query_core::type_mapping::ValueType::#variant)
}

pub fn generate_schema(name: &Ident, table: &TableInfo, entity: &EntityInfo) -> TokenStream {
    let table_name = &table.name;
    let entity_name = name.to_string();
    let primary_key = &entity.primary_key_column;

    let columns = entity.fields.iter().filter_map(|field| match &field.kind {
        FieldKind::Column {
            column,
            value_type,
            nullable,
            primary_key,
        } => {
            let value_type = value_type_tokens(*value_type);
            Some(quote! {
                ::query_core::ColumnSchema {
                    name: #column,
                    value_type: #value_type,
                    nullable: #nullable,
                    primary_key: #primary_key,
                }
            })
        }
        FieldKind::ManyToOne { join_column, .. } => {
            let value_type = value_type_tokens(ValueType::Uuid);
            Some(quote! {
                ::query_core::ColumnSchema {
                    name: #join_column,
                    value_type: #value_type,
                    nullable: true,
                    primary_key: false,
                }
            })
        }
        FieldKind::OneToMany { .. } => None,
    });

    let relations = entity.fields.iter().filter_map(|field| {
        let relation_name = field.ident.to_string();
        match &field.kind {
            FieldKind::ManyToOne { join_column, target } => Some(quote! {
                ::query_core::RelationSchema {
                    name: #relation_name,
                    kind: ::query_core::RelationKind::ManyToOne { join_column: #join_column },
                    target: <#target as ::query_core::Entity>::schema,
                }
            }),
            FieldKind::OneToMany { mapped_by, target } => Some(quote! {
                ::query_core::RelationSchema {
                    name: #relation_name,
                    kind: ::query_core::RelationKind::OneToMany { mapped_by: #mapped_by },
                    target: <#target as ::query_core::Entity>::schema,
                }
            }),
            FieldKind::Column { .. } => None,
        }
    });

    quote! {
        static SCHEMA: ::query_core::TableSchema = ::query_core::TableSchema {
            name: #table_name,
            entity: #entity_name,
            primary_key: #primary_key,
            columns: &[#(#columns),*],
            relations: &[#(#relations),*],
        };
        &SCHEMA
    }
}

pub fn generate_entity_impl(name: &Ident, table: &TableInfo, entity: &EntityInfo) -> TokenStream {
    let path_name = format_ident!("Q{}", name);
    let schema_body = generate_schema(name, table, entity);
    let primary_key_field = &entity.primary_key_field;

    let to_values = entity.fields.iter().filter_map(|field| {
        let ident = &field.ident;
        match &field.kind {
            FieldKind::Column { .. } => Some(quote! {
                ::query_core::type_mapping::SqlType::into_sql_value(::core::clone::Clone::clone(&self.#ident))
            }),
            FieldKind::ManyToOne { .. } => Some(quote! {
                ::query_core::type_mapping::SqlType::into_sql_value(
                    self.#ident.as_ref().map(::query_core::Lazy::id)
                )
            }),
            FieldKind::OneToMany { .. } => None,
        }
    });

    // Columns come first in schema order, associations after them
    let read_columns = entity.fields.iter().filter_map(|field| {
        let local = format_ident!("__field_{}", field.ident);
        let ty = &field.ty;
        match &field.kind {
            FieldKind::Column { .. } => Some(quote! {
                let #local: #ty = row.read()?;
            }),
            FieldKind::ManyToOne { .. } => Some(quote! {
                let #local: ::core::option::Option<::query_core::uuid::Uuid> = row.read()?;
            }),
            FieldKind::OneToMany { .. } => None,
        }
    });
    let read_associations = entity.fields.iter().filter_map(|field| {
        let local = format_ident!("__field_{}", field.ident);
        let relation_name = field.ident.to_string();
        match &field.kind {
            FieldKind::ManyToOne { target, .. } => Some(quote! {
                let #local = loader.association::<#target>(row, #relation_name, #local)?;
            }),
            _ => None,
        }
    });
    let assignments = entity.fields.iter().map(|field| {
        let ident = &field.ident;
        let local = format_ident!("__field_{}", field.ident);
        match &field.kind {
            // the inverse collection is not loaded from the store
            FieldKind::OneToMany { .. } => quote!(#ident: ::std::vec::Vec::new()),
            _ => quote!(#ident: #local),
        }
    });

    quote! {
        impl ::query_core::Entity for #name {
            type Path = #path_name;

            fn schema() -> &'static ::query_core::TableSchema {
                #schema_body
            }

            fn id(&self) -> ::query_core::uuid::Uuid {
                self.#primary_key_field
            }

            fn to_values(&self) -> ::std::vec::Vec<::query_core::type_mapping::SqlValue> {
                ::std::vec![#(#to_values),*]
            }

            fn from_row(
                row: &mut ::query_core::RowCursor,
                loader: &::query_core::EntityLoader<'_>,
            ) -> ::core::result::Result<Self, ::query_core::QueryError> {
                #(#read_columns)*
                #(#read_associations)*
                ::core::result::Result::Ok(Self {
                    #(#assignments),*
                })
            }
        }
    }
}

pub fn generate_path_struct(name: &Ident, entity: &EntityInfo) -> TokenStream {
    let path_name = format_ident!("Q{}", name);
    let doc = format!("Query path of [`{}`], bound to one alias", name);

    let mut declarations = Vec::new();
    let mut initializers = Vec::new();
    let mut relation_index = 0usize;

    for field in &entity.fields {
        let ident = &field.ident;
        match &field.kind {
            FieldKind::Column { column, .. } => {
                // nullable columns are typed by their inner type
                let ty = generic_argument(&field.ty, "Option").unwrap_or(&field.ty);
                declarations.push(quote! {
                    pub #ident: ::query_core::Expr<#ty>
                });
                initializers.push(quote! {
                    #ident: ::query_core::Expr::column(alias, #column)
                });
            }
            FieldKind::ManyToOne { target, .. } | FieldKind::OneToMany { target, .. } => {
                let index = relation_index;
                relation_index += 1;
                declarations.push(quote! {
                    pub #ident: ::query_core::query_builder::RelationPath<#target>
                });
                initializers.push(quote! {
                    #ident: ::query_core::query_builder::RelationPath::new(
                        alias,
                        <#name as ::query_core::Entity>::schema(),
                        &<#name as ::query_core::Entity>::schema().relations[#index],
                    )
                });
            }
        }
    }

    quote! {
        #[doc = #doc]
        #[derive(Debug, Clone)]
        pub struct #path_name {
            __alias: ::std::string::String,
            #(#declarations,)*
        }

        impl #path_name {
            pub fn new(alias: &str) -> Self {
                Self {
                    __alias: alias.to_string(),
                    #(#initializers,)*
                }
            }
        }

        impl ::core::default::Default for #path_name {
            fn default() -> Self {
                Self::new(<#name as ::query_core::Entity>::schema().name)
            }
        }

        impl ::query_core::EntityPath for #path_name {
            type Entity = #name;

            fn new(alias: &str) -> Self {
                #path_name::new(alias)
            }

            fn alias(&self) -> &str {
                &self.__alias
            }
        }

        impl ::query_core::Projection for #path_name {
            type Output = #name;

            fn select_items(
                &self,
                fetches: &[::query_core::query_builder::FetchJoin],
            ) -> ::std::vec::Vec<::query_core::query_builder::ExprNode> {
                ::query_core::projection::entity_select_items::<#name>(&self.__alias, fetches)
            }

            fn decode(
                &self,
                row: &mut ::query_core::RowCursor,
                ctx: &::query_core::LoadContext,
            ) -> ::core::result::Result<#name, ::query_core::QueryError> {
                ::query_core::projection::decode_entity::<#name>(&self.__alias, row, ctx)
            }
        }
    }
}
