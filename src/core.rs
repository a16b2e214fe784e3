//! Core querykit functionality
//!
//! This module contains the main `QueryKit` struct. It builds the configured
//! backend, runs the table migrations and opens sessions on it.

use query_core::{Backend, MemoryBackend, PostgresBackend, QueryError, Session};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::debug_log;
use crate::errors::QueryKitError;
use config::{AppConfig, BackendKind, DatabaseConfig};

/// Main querykit coordinator that owns the backend sessions are opened on
#[derive(Clone)]
pub struct QueryKit {
    backend: Arc<dyn Backend>,
}

impl std::fmt::Debug for QueryKit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryKit")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl QueryKit {
    /// Create the configured backend and migrate the model tables when
    /// `auto_migrate` is set
    pub async fn new(config: AppConfig) -> Result<Self, QueryKitError> {
        config.validate()?;
        let log_sql = config.query.log_sql;

        let querykit = match config.query.backend {
            BackendKind::Memory => {
                Self::with_backend(MemoryBackend::new().with_sql_logging(log_sql))
            }
            BackendKind::Postgres => {
                let database = config
                    .database
                    .as_ref()
                    .ok_or(QueryKitError::MissingDatabaseConfig("postgres"))?;
                let pool = Self::connect(database).await?;
                Self::with_backend(PostgresBackend::new(pool).with_sql_logging(log_sql))
            }
        };
        info!(backend = querykit.backend_name(), "querykit initialized");

        if config.query.auto_migrate {
            querykit.migrate_model().await?;
        }
        Ok(querykit)
    }

    /// Wrap an already constructed backend; no migrations are run
    pub fn with_backend<B: Backend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Open a PostgreSQL pool with the configured pool settings
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, QueryKitError> {
        let connection_string = config.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }

        debug_log!(host = %config.host, database = %config.database, "connecting to postgres");
        Ok(pool_options.connect(&connection_string).await?)
    }

    /// Get the backend reference
    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Open a session with a fresh unit of work
    pub async fn session(&self) -> Result<Session, QueryKitError> {
        Ok(Session::begin(self.backend()).await?)
    }

    /// Run `work` in a session that commits on success and rolls back on error
    pub async fn transaction<T, F, Fut>(&self, work: F) -> Result<T, QueryKitError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: std::future::Future<Output = Result<T, QueryError>>,
    {
        let session = self.session().await?;
        match work(session.clone()).await {
            Ok(value) => {
                session.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if session.is_open() {
                    session.rollback().await?;
                }
                Err(e.into())
            }
        }
    }

    /// Check backend health by opening and discarding a unit of work
    pub async fn health_check(&self) -> Result<(), QueryKitError> {
        let session = self.session().await?;
        session.rollback().await?;
        Ok(())
    }
}
