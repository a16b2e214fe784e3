//! Convenience re-exports for writing queries

// Core traits
pub use crate::traits::{Backend, Entity, EntityPath, UnitOfWork};

// Query building
pub use crate::query_builder::expressions::{self, constant, count_all, select};
pub use crate::query_builder::{CaseBuilder, Expr, QueryFactory, QueryFilter, SelectBuilder, SubQuery};

// Sessions and results
pub use crate::backend::{MemoryBackend, PostgresBackend};
pub use crate::lazy::Lazy;
pub use crate::projection::Nullable;
pub use crate::results::QueryResults;
pub use crate::session::Session;

// Error types
pub use crate::errors::QueryError;

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use uuid::Uuid;
