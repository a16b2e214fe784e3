//! Table creation for querykit entities
//!
//! Only `CREATE TABLE IF NOT EXISTS` is supported. Tables are created in a
//! session of their own that commits right away.

use query_core::Entity;
use tracing::info;

use crate::core::QueryKit;
use crate::errors::QueryKitError;
use crate::model::{Member, Team};

impl QueryKit {
    /// Create the table of an entity if it does not exist yet
    ///
    /// Tables referenced by the entity's foreign keys must be migrated first.
    pub async fn auto_migrate<E: Entity>(&self) -> Result<(), QueryKitError> {
        let schema = E::schema();
        info!(table = schema.name, backend = self.backend_name(), "creating table");
        crate::trace_log!(sql = %schema.create_table_sql(), "create table statement");

        let session = self.session().await?;
        session.create_table(schema).await?;
        session.commit().await?;
        Ok(())
    }

    /// Create the tables of the bundled model, teams before members
    pub async fn migrate_model(&self) -> Result<(), QueryKitError> {
        self.auto_migrate::<Team>().await?;
        self.auto_migrate::<Member>().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_core::MemoryBackend;

    #[tokio::test]
    async fn test_migrate_model_creates_both_tables() {
        let backend = MemoryBackend::new();
        let querykit = QueryKit::with_backend(backend.clone());
        querykit.migrate_model().await.unwrap();

        assert_eq!(backend.row_count("team").await, Some(0));
        assert_eq!(backend.row_count("member").await, Some(0));
    }

    #[tokio::test]
    async fn test_migration_is_idempotent() {
        let backend = MemoryBackend::new();
        let querykit = QueryKit::with_backend(backend.clone());
        querykit.migrate_model().await.unwrap();
        querykit.migrate_model().await.unwrap();
        assert_eq!(backend.row_count("member").await, Some(0));
    }
}
