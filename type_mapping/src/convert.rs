//! Conversion between Rust types and runtime values

use crate::types::{SqlValue, ValueType};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("unexpected NULL for non-nullable {expected:?} value")]
    UnexpectedNull { expected: ValueType },

    #[error("type mismatch: expected {expected:?}, found {found}")]
    Mismatch { expected: ValueType, found: String },

    #[error("value {value} is out of range for {expected:?}")]
    OutOfRange { expected: ValueType, value: i64 },
}

impl ConversionError {
    fn mismatch(expected: ValueType, found: &SqlValue) -> Self {
        ConversionError::Mismatch {
            expected,
            found: format!("{:?}", found),
        }
    }
}

/// Rust types that map onto a column type
pub trait SqlType: Sized + Send + Sync + 'static {
    /// Column type used for decoding and DDL
    const VALUE_TYPE: ValueType;

    fn into_sql_value(self) -> SqlValue;

    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError>;
}

impl SqlType for bool {
    const VALUE_TYPE: ValueType = ValueType::Boolean;

    fn into_sql_value(self) -> SqlValue {
        SqlValue::Boolean(self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Boolean(v) => Ok(v),
            SqlValue::Null => Err(ConversionError::UnexpectedNull {
                expected: Self::VALUE_TYPE,
            }),
            other => Err(ConversionError::mismatch(Self::VALUE_TYPE, &other)),
        }
    }
}

impl SqlType for i32 {
    const VALUE_TYPE: ValueType = ValueType::Integer;

    fn into_sql_value(self) -> SqlValue {
        SqlValue::Integer(self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Integer(v) => Ok(v),
            SqlValue::BigInt(v) => i32::try_from(v).map_err(|_| ConversionError::OutOfRange {
                expected: Self::VALUE_TYPE,
                value: v,
            }),
            SqlValue::Null => Err(ConversionError::UnexpectedNull {
                expected: Self::VALUE_TYPE,
            }),
            other => Err(ConversionError::mismatch(Self::VALUE_TYPE, &other)),
        }
    }
}

impl SqlType for i64 {
    const VALUE_TYPE: ValueType = ValueType::BigInt;

    fn into_sql_value(self) -> SqlValue {
        SqlValue::BigInt(self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Integer(v) => Ok(i64::from(v)),
            SqlValue::BigInt(v) => Ok(v),
            SqlValue::Null => Err(ConversionError::UnexpectedNull {
                expected: Self::VALUE_TYPE,
            }),
            other => Err(ConversionError::mismatch(Self::VALUE_TYPE, &other)),
        }
    }
}

impl SqlType for f64 {
    const VALUE_TYPE: ValueType = ValueType::Double;

    fn into_sql_value(self) -> SqlValue {
        SqlValue::Double(self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Null => Err(ConversionError::UnexpectedNull {
                expected: Self::VALUE_TYPE,
            }),
            other => other
                .as_f64()
                .ok_or_else(|| ConversionError::mismatch(Self::VALUE_TYPE, &other)),
        }
    }
}

impl SqlType for String {
    const VALUE_TYPE: ValueType = ValueType::Text;

    fn into_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Text(v) => Ok(v),
            SqlValue::Null => Err(ConversionError::UnexpectedNull {
                expected: Self::VALUE_TYPE,
            }),
            other => Err(ConversionError::mismatch(Self::VALUE_TYPE, &other)),
        }
    }
}

impl SqlType for Uuid {
    const VALUE_TYPE: ValueType = ValueType::Uuid;

    fn into_sql_value(self) -> SqlValue {
        SqlValue::Uuid(self)
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Uuid(v) => Ok(v),
            SqlValue::Null => Err(ConversionError::UnexpectedNull {
                expected: Self::VALUE_TYPE,
            }),
            other => Err(ConversionError::mismatch(Self::VALUE_TYPE, &other)),
        }
    }
}

impl<T: SqlType> SqlType for Option<T> {
    const VALUE_TYPE: ValueType = T::VALUE_TYPE;

    fn into_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.into_sql_value(),
            None => SqlValue::Null,
        }
    }

    fn from_sql_value(value: SqlValue) -> Result<Self, ConversionError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}
