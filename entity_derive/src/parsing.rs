//! Parsing utilities for table and field attributes
//!
//! This module handles the parsing of `#[table]`, `#[column]`,
//! `#[many_to_one]` and `#[one_to_many]` attributes and validation of table
//! and column names.

use proc_macro2::Span;
use query_core::validation::validate_identifier;
use quote::quote;
use syn::{Attribute, Data, Error, Fields, GenericArgument, Ident, LitStr, PathArguments, Result, Type};
use type_mapping::{is_optional_type, rust_type_to_value_type, ValueType};

/// Validate a table or column name and return syn::Error for better proc macro error handling
pub fn validate_name_syn(kind: &str, name: &str, span: Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid {} name '{}': {}", kind, name, e)))
}

#[derive(Debug)]
pub struct TableInfo {
    pub name: String,
}

pub enum FieldKind {
    Column {
        column: String,
        value_type: ValueType,
        nullable: bool,
        primary_key: bool,
    },
    /// `Option<Lazy<Target>>` stored as a nullable foreign key column
    ManyToOne { join_column: String, target: Type },
    /// `Vec<Uuid>` of the members on the other side; not a column
    OneToMany { mapped_by: String, target: Type },
}

pub struct FieldInfo {
    pub ident: Ident,
    pub ty: Type,
    pub kind: FieldKind,
}

impl FieldInfo {
    /// Column stored for this field, if any
    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Column { column, .. } => Some(column),
            FieldKind::ManyToOne { join_column, .. } => Some(join_column),
            FieldKind::OneToMany { .. } => None,
        }
    }
}

pub struct EntityInfo {
    pub fields: Vec<FieldInfo>,
    pub primary_key_field: Ident,
    pub primary_key_column: String,
}

pub fn parse_table_attributes(attrs: &[Attribute]) -> Result<TableInfo> {
    let mut table_name: Option<LitStr> = None;

    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    table_name = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute, expected `name`"))
                }
            })?;
        }
    }

    let table_name = table_name.ok_or_else(|| {
        Error::new(
            Span::call_site(),
            "table attribute is required: add #[table(name = \"table_name\")] to your struct",
        )
    })?;

    // Validate table name at compile time with proper error handling
    validate_name_syn("table", &table_name.value(), table_name.span())?;

    Ok(TableInfo {
        name: table_name.value(),
    })
}

pub fn parse_fields(data: &Data) -> Result<EntityInfo> {
    let Data::Struct(data_struct) = data else {
        return Err(Error::new(
            Span::call_site(),
            "Entity can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields_named) = &data_struct.fields else {
        return Err(Error::new(
            Span::call_site(),
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut fields = Vec::new();
    let mut primary_key: Option<(Ident, String)> = None;

    for field in &fields_named.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;
        let ty = field.ty.clone();

        let kind = if let Some(attr) = find_attribute(&field.attrs, "many_to_one") {
            parse_many_to_one(attr, &ty)?
        } else if let Some(attr) = find_attribute(&field.attrs, "one_to_many") {
            parse_one_to_many(attr, &ty)?
        } else {
            let column = column_name(&field.attrs)?.unwrap_or_else(|| ident.to_string());
            validate_name_syn("column", &column, ident.span())?;

            // Normalize type string by removing all whitespace for consistent matching
            let type_string = quote!(#ty).to_string().replace(' ', "");
            let value_type = rust_type_to_value_type(&type_string).ok_or_else(|| {
                Error::new_spanned(&ty, format!("unsupported column type '{}'", type_string))
            })?;
            let is_primary_key = has_attribute(&field.attrs, "primary_key");

            if is_primary_key {
                if value_type != ValueType::Uuid || is_optional_type(&type_string) {
                    return Err(Error::new_spanned(&ty, "primary key must be a Uuid"));
                }
                if primary_key.is_some() {
                    return Err(Error::new_spanned(field, "only one #[primary_key] field is supported"));
                }
                primary_key = Some((ident.clone(), column.clone()));
            }

            FieldKind::Column {
                column,
                value_type,
                nullable: is_optional_type(&type_string),
                primary_key: is_primary_key,
            }
        };

        fields.push(FieldInfo { ident, ty, kind });
    }

    let mut seen: Vec<&str> = Vec::new();
    for field in &fields {
        if let Some(column) = field.column() {
            if seen.contains(&column) {
                return Err(Error::new(
                    field.ident.span(),
                    format!("column '{}' is mapped more than once", column),
                ));
            }
            seen.push(column);
        }
    }

    let (primary_key_field, primary_key_column) = primary_key.ok_or_else(|| {
        Error::new(
            Span::call_site(),
            "an entity needs a #[primary_key] field of type Uuid",
        )
    })?;

    Ok(EntityInfo {
        fields,
        primary_key_field,
        primary_key_column,
    })
}

fn parse_many_to_one(attr: &Attribute, ty: &Type) -> Result<FieldKind> {
    let mut join_column: Option<LitStr> = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("join_column") {
            join_column = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported many_to_one attribute, expected `join_column`"))
        }
    })?;

    let join_column = join_column
        .ok_or_else(|| Error::new_spanned(attr, "many_to_one requires join_column = \"...\""))?;
    validate_name_syn("column", &join_column.value(), join_column.span())?;

    let target = generic_argument(ty, "Option")
        .and_then(|inner| generic_argument(inner, "Lazy"))
        .ok_or_else(|| Error::new_spanned(ty, "many_to_one field must be of type Option<Lazy<Target>>"))?;

    Ok(FieldKind::ManyToOne {
        join_column: join_column.value(),
        target: target.clone(),
    })
}

fn parse_one_to_many(attr: &Attribute, ty: &Type) -> Result<FieldKind> {
    let mut mapped_by: Option<LitStr> = None;
    let mut target: Option<Type> = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("mapped_by") {
            mapped_by = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("target") {
            target = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported one_to_many attribute, expected `target` or `mapped_by`"))
        }
    })?;

    let is_id_list = generic_argument(ty, "Vec").is_some_and(|inner| {
        let inner = quote!(#inner).to_string().replace(' ', "");
        rust_type_to_value_type(&inner) == Some(ValueType::Uuid)
    });
    if !is_id_list {
        return Err(Error::new_spanned(ty, "one_to_many field must be of type Vec<Uuid>"));
    }

    Ok(FieldKind::OneToMany {
        mapped_by: mapped_by
            .ok_or_else(|| Error::new_spanned(attr, "one_to_many requires mapped_by = \"...\""))?
            .value(),
        target: target.ok_or_else(|| Error::new_spanned(attr, "one_to_many requires target = Type"))?,
    })
}

/// `#[column(name = "...")]`
fn column_name(attrs: &[Attribute]) -> Result<Option<String>> {
    let Some(attr) = find_attribute(attrs, "column") else {
        return Ok(None);
    };
    let mut name: Option<LitStr> = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            name = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unsupported column attribute, expected `name`"))
        }
    })?;
    Ok(name.map(|n| n.value()))
}

/// `T` out of `Wrapper<T>`, matching on the last path segment
pub fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn find_attribute<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}

#[cfg(test)]
mod validation_tests {
    use super::*;
    use syn::{parse_quote, DeriveInput};

    #[test]
    fn test_valid_table_names() {
        for name in ["member", "team_members", "_private", "table123"] {
            assert!(validate_name_syn("table", name, Span::call_site()).is_ok());
        }
    }

    #[test]
    fn test_invalid_table_names() {
        for name in ["", "SELECT", "order", "123table", "member-table", "users; DROP TABLE users; --"] {
            assert!(
                validate_name_syn("table", name, Span::call_site()).is_err(),
                "should reject '{}'",
                name
            );
        }
    }

    #[test]
    fn test_parse_member() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "member")]
            struct Member {
                #[primary_key]
                #[column(name = "member_id")]
                id: Uuid,
                name: Option<String>,
                age: i32,
                #[many_to_one(join_column = "team_id")]
                team: Option<Lazy<Team>>,
            }
        };

        let table = parse_table_attributes(&input.attrs).unwrap();
        assert_eq!(table.name, "member");

        let info = parse_fields(&input.data).unwrap();
        assert_eq!(info.primary_key_column, "member_id");
        assert_eq!(info.primary_key_field, "id");
        let columns: Vec<_> = info.fields.iter().filter_map(FieldInfo::column).collect();
        assert_eq!(columns, vec!["member_id", "name", "age", "team_id"]);
        assert!(matches!(
            info.fields[1].kind,
            FieldKind::Column { nullable: true, value_type: ValueType::Text, .. }
        ));
    }

    #[test]
    fn test_parse_inverse_collection() {
        let input: DeriveInput = parse_quote! {
            struct Team {
                #[primary_key]
                id: Uuid,
                #[one_to_many(target = Member, mapped_by = "team")]
                members: Vec<Uuid>,
            }
        };

        let info = parse_fields(&input.data).unwrap();
        assert!(info.fields[1].column().is_none());
        assert!(matches!(&info.fields[1].kind, FieldKind::OneToMany { mapped_by, .. } if mapped_by == "team"));
    }

    #[test]
    fn test_missing_table_attribute() {
        let input: DeriveInput = parse_quote! {
            struct Member {
                #[primary_key]
                id: Uuid,
            }
        };
        assert!(parse_table_attributes(&input.attrs).is_err());
    }

    #[test]
    fn test_rejects_bad_fields() {
        let no_key: DeriveInput = parse_quote! {
            struct Member { name: String }
        };
        assert!(parse_fields(&no_key.data).is_err());

        let bad_relation: DeriveInput = parse_quote! {
            struct Member {
                #[primary_key]
                id: Uuid,
                #[many_to_one(join_column = "team_id")]
                team: Team,
            }
        };
        assert!(parse_fields(&bad_relation.data).is_err());

        let unsupported: DeriveInput = parse_quote! {
            struct Member {
                #[primary_key]
                id: Uuid,
                tags: Vec<String>,
            }
        };
        assert!(parse_fields(&unsupported.data).is_err());
    }
}
