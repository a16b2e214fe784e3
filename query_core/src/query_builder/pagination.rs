use crate::errors::QueryError;

/// Pagination configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if let Some(limit) = self.limit.filter(|l| *l < 0) {
            return Err(QueryError::translation(format!("LIMIT must not be negative, got {}", limit)));
        }
        if let Some(offset) = self.offset.filter(|o| *o < 0) {
            return Err(QueryError::translation(format!("OFFSET must not be negative, got {}", offset)));
        }
        Ok(())
    }

    /// Apply offset then limit to already sorted rows
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let rows = rows.into_iter().skip(offset);
        match self.limit {
            Some(limit) => rows.take(limit.max(0) as usize).collect(),
            None => rows.collect(),
        }
    }

    pub fn to_sql(&self) -> String {
        let mut clauses = Vec::new();

        if let Some(limit) = self.limit {
            clauses.push(format!("LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            clauses.push(format!("OFFSET {}", offset));
        }

        clauses.join(" ")
    }
}
