//! Error types for the querykit crate
//!
//! This module contains the errors returned by the `QueryKit` coordinator.
//! Query failures keep their `QueryError` so callers can match on
//! `NoResult`, `LazyInitialization` and the rest.

use config::ConfigError;
use query_core::QueryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryKitError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("The {0} backend requires a [database] configuration")]
    MissingDatabaseConfig(&'static str),
}
