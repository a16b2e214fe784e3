//! SQL type conversion utilities
//!
//! This module maps Rust type names to column types. It is used at macro
//! expansion time, where only the tokens of a field type are known.

use crate::types::ValueType;

/// Map a Rust type name (optionally wrapped in `Option`) to a column type
pub fn rust_type_to_value_type(rust_type: &str) -> Option<ValueType> {
    // Normalize type string by removing all whitespace for consistent matching
    let normalized = rust_type.replace(' ', "");
    match inner_type_name(&normalized) {
        "Uuid" | "uuid::Uuid" => Some(ValueType::Uuid),
        "String" | "std::string::String" => Some(ValueType::Text),
        "i8" | "i16" | "i32" => Some(ValueType::Integer),
        "i64" => Some(ValueType::BigInt),
        "f32" | "f64" => Some(ValueType::Double),
        "bool" => Some(ValueType::Boolean),
        _ => None,
    }
}

/// Check if a Rust type is Optional (nullable in SQL)
pub fn is_optional_type(rust_type: &str) -> bool {
    let normalized = rust_type.replace(' ', "");
    normalized.starts_with("Option<") || normalized.starts_with("std::option::Option<")
}

/// Strip one `Option<...>` layer from a type name
pub fn inner_type_name(rust_type: &str) -> &str {
    let trimmed = rust_type.trim();
    for prefix in ["Option<", "std::option::Option<"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            if let Some(inner) = rest.strip_suffix('>') {
                return inner.trim();
            }
        }
    }
    trimmed
}
