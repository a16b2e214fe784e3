//! Type mapping definitions
//!
//! This module provides the runtime value representation shared by query
//! parameters, fetched rows and the in-memory engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Column data types understood by the query layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Integer,
    BigInt,
    Double,
    Text,
    Uuid,
}

impl ValueType {
    /// PostgreSQL type used for DDL and typed NULL binding
    pub fn pg_type(&self) -> &'static str {
        match self {
            ValueType::Boolean => "BOOLEAN",
            ValueType::Integer => "INTEGER",
            ValueType::BigInt => "BIGINT",
            ValueType::Double => "DOUBLE PRECISION",
            ValueType::Text => "VARCHAR",
            ValueType::Uuid => "UUID",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::BigInt)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::Integer | ValueType::BigInt | ValueType::Double
        )
    }
}

/// A single runtime value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i32),
    BigInt(i64),
    Double(f64),
    Text(String),
    Uuid(Uuid),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Type of a non-null value
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            SqlValue::Null => None,
            SqlValue::Boolean(_) => Some(ValueType::Boolean),
            SqlValue::Integer(_) => Some(ValueType::Integer),
            SqlValue::BigInt(_) => Some(ValueType::BigInt),
            SqlValue::Double(_) => Some(ValueType::Double),
            SqlValue::Text(_) => Some(ValueType::Text),
            SqlValue::Uuid(_) => Some(ValueType::Uuid),
        }
    }

    /// Integer view of the value, if it is an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(i64::from(*v)),
            SqlValue::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Floating point view of any numeric value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(v) => Some(f64::from(*v)),
            SqlValue::BigInt(v) => Some(*v as f64),
            SqlValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Boolean(v) => write!(f, "{}", v),
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::BigInt(v) => write!(f, "{}", v),
            SqlValue::Double(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "'{}'", v),
            SqlValue::Uuid(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for SqlValue {
    fn from(val: String) -> Self {
        SqlValue::Text(val)
    }
}

impl From<&str> for SqlValue {
    fn from(val: &str) -> Self {
        SqlValue::Text(val.to_string())
    }
}

impl From<i32> for SqlValue {
    fn from(val: i32) -> Self {
        SqlValue::Integer(val)
    }
}

impl From<i64> for SqlValue {
    fn from(val: i64) -> Self {
        SqlValue::BigInt(val)
    }
}

impl From<f64> for SqlValue {
    fn from(val: f64) -> Self {
        SqlValue::Double(val)
    }
}

impl From<bool> for SqlValue {
    fn from(val: bool) -> Self {
        SqlValue::Boolean(val)
    }
}

impl From<Uuid> for SqlValue {
    fn from(val: Uuid) -> Self {
        SqlValue::Uuid(val)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}
