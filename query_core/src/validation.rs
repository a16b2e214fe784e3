//! Identifier validation
//!
//! Aliases chosen at runtime end up quoted inside generated SQL, so they are
//! checked against PostgreSQL identifier rules before translation.

use thiserror::Error;

/// PostgreSQL identifier length limit
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

const RESERVED_KEYWORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "CROSS", "DESC", "DISTINCT",
    "ELSE", "END", "EXISTS", "FALSE", "FETCH", "FROM", "FULL", "GROUP", "HAVING", "IN", "INNER",
    "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "NULLS", "OFFSET", "ON", "OR", "ORDER",
    "OUTER", "RIGHT", "SELECT", "TABLE", "THEN", "TRUE", "UNION", "USER", "WHEN", "WHERE",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Identifier '{name}' is too long: {length} characters (max {MAX_IDENTIFIER_LENGTH})")]
    TooLong { name: String, length: usize },

    #[error("Identifier '{0}' must start with a letter or underscore")]
    InvalidStartCharacter(String),

    #[error("Identifier '{0}' may only contain alphanumeric characters and underscores")]
    InvalidCharacters(String),

    #[error("Identifier '{0}' is a reserved SQL keyword")]
    ReservedKeyword(String),
}

/// Check a table, column or alias name
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let first = name.chars().next().ok_or(ValidationError::Empty)?;

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length: name.len(),
        });
    }
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(ValidationError::InvalidStartCharacter(name.to_string()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }
    if is_reserved_keyword(name) {
        return Err(ValidationError::ReservedKeyword(name.to_string()));
    }
    Ok(())
}

pub fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}

/// Quote an identifier for PostgreSQL, preserving case
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
