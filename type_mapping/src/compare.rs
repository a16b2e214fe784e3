//! Value comparison semantics
//!
//! Comparisons follow SQL rules: any comparison involving NULL is unknown
//! (`None`), integers and doubles compare numerically across widths.

use crate::types::SqlValue;
use std::cmp::Ordering;

/// Compare two values, returning `None` when the result is unknown
pub fn compare_values(left: &SqlValue, right: &SqlValue) -> Option<Ordering> {
    match (left, right) {
        (SqlValue::Null, _) | (_, SqlValue::Null) => None,
        (SqlValue::Text(a), SqlValue::Text(b)) => Some(a.cmp(b)),
        (SqlValue::Boolean(a), SqlValue::Boolean(b)) => Some(a.cmp(b)),
        (SqlValue::Uuid(a), SqlValue::Uuid(b)) => Some(a.cmp(b)),
        (a, b) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        },
    }
}

/// SQL equality, `None` when unknown
pub fn values_equal(left: &SqlValue, right: &SqlValue) -> Option<bool> {
    compare_values(left, right).map(|ordering| ordering == Ordering::Equal)
}

/// Equality used for grouping, where NULLs fall into the same group
pub fn same_group_value(left: &SqlValue, right: &SqlValue) -> bool {
    match (left, right) {
        (SqlValue::Null, SqlValue::Null) => true,
        _ => values_equal(left, right).unwrap_or(false),
    }
}

/// Ordering of two non-null values for sorting
///
/// Values that cannot be compared are treated as equal so that sorting stays
/// stable. NULL placement is decided by the caller.
pub fn sort_values(left: &SqlValue, right: &SqlValue) -> Ordering {
    compare_values(left, right).unwrap_or(Ordering::Equal)
}
