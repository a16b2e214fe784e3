//! Query Core - typed query layer for querykit
//!
//! This crate provides entity metadata, typed expressions, the fluent query
//! builder, sessions with lazily loaded associations, and the backends that
//! execute queries.

pub mod backend;
pub mod errors;
pub mod lazy;
pub mod prelude;
pub mod projection;
pub mod query_builder;
pub mod results;
pub mod schema;
pub mod session;
pub mod traits;
pub mod validation;

pub use backend::{MemoryBackend, PostgresBackend};
pub use errors::QueryError;
pub use lazy::Lazy;
pub use projection::{EntityLoader, LoadContext, Nullable, Projection, RowCursor};
pub use query_builder::{
    expressions, CaseBuilder, Expr, Query, QueryFactory, QueryFilter, SelectBuilder, SortOrder,
    SubQuery,
};
pub use results::QueryResults;
pub use schema::{ColumnSchema, RelationKind, RelationSchema, TableSchema};
pub use session::Session;
pub use traits::*;
pub use validation::ValidationError;

// Used by code generated with `#[derive(Entity)]`
#[doc(hidden)]
pub use type_mapping;
#[doc(hidden)]
pub use uuid;
