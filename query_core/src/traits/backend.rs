use crate::errors::QueryError;
use crate::query_builder::select::SelectSpec;
use crate::schema::TableSchema;
use async_trait::async_trait;
use type_mapping::SqlValue;

/// Storage able to open units of work
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, QueryError>;
}

/// One transaction against a backend
///
/// Dropping a unit without committing discards its changes.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Create the table if it does not exist yet
    async fn create_table(&mut self, schema: &'static TableSchema) -> Result<(), QueryError>;

    async fn insert(
        &mut self,
        schema: &'static TableSchema,
        values: Vec<SqlValue>,
    ) -> Result<(), QueryError>;

    /// Rows of a validated query, one value per select item
    async fn select(&mut self, spec: &SelectSpec) -> Result<Vec<Vec<SqlValue>>, QueryError>;

    /// Row count of a validated query
    async fn count(&mut self, spec: &SelectSpec) -> Result<i64, QueryError>;

    async fn commit(self: Box<Self>) -> Result<(), QueryError>;

    async fn rollback(self: Box<Self>) -> Result<(), QueryError>;
}
