//! Storage backends
//!
//! [`MemoryBackend`] evaluates queries itself; [`PostgresBackend`] renders
//! them to SQL and runs them through sqlx.

pub mod memory;
pub mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;
