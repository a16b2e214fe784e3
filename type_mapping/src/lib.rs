//! Unified type mapping between Rust types, runtime values and PostgreSQL
//! This crate provides consistent mapping logic used across the querykit workspace

pub mod compare;
pub mod convert;
pub mod sql;
pub mod types;

// Re-export commonly used items
pub use compare::{compare_values, same_group_value, sort_values, values_equal};
pub use convert::{ConversionError, SqlType};
pub use sql::{inner_type_name, is_optional_type, rust_type_to_value_type};
pub use types::{SqlValue, ValueType};
