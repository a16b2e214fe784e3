use crate::errors::QueryError;
use crate::projection::{EntityLoader, Nullable, Projection, RowCursor};
use crate::query_builder::expr::Expr;
use crate::schema::TableSchema;
use std::fmt::Debug;
use type_mapping::SqlValue;
use uuid::Uuid;

/// A persistent type mapped to one table
///
/// Implemented by `#[derive(Entity)]`, normally through the `#[model]`
/// attribute:
///
/// ```ignore
/// #[model]
/// #[table(name = "team")]
/// pub struct Team {
///     #[primary_key]
///     #[column(name = "team_id")]
///     pub id: Uuid,
///     pub name: String,
///     #[one_to_many(target = Member, mapped_by = "team")]
///     pub members: Vec<Uuid>,
/// }
/// ```
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Generated query path, e.g. `QTeam`
    type Path: EntityPath<Entity = Self> + Projection<Output = Self>;

    fn schema() -> &'static TableSchema;

    fn id(&self) -> Uuid;

    /// Column values in schema order
    fn to_values(&self) -> Vec<SqlValue>;

    /// Decode the entity from the columns produced by
    /// [`TableSchema::select_items`]
    fn from_row(row: &mut RowCursor, loader: &EntityLoader<'_>) -> Result<Self, QueryError>;
}

/// Aliased handle to an entity inside a query, e.g. `QMember::new("m")`
pub trait EntityPath: Clone + Send + Sync + 'static {
    type Entity: Entity<Path = Self>;

    fn new(alias: &str) -> Self;

    fn alias(&self) -> &str;

    fn schema(&self) -> &'static TableSchema {
        Self::Entity::schema()
    }

    /// Primary key of the aliased entity
    fn id_path(&self) -> Expr<Uuid> {
        Expr::column(self.alias(), self.schema().primary_key)
    }

    /// `COUNT` of the aliased entity's primary key
    fn count(&self) -> Expr<i64> {
        self.id_path().count()
    }

    /// Project the entity as `None` when its columns are all NULL, as on
    /// the outer side of a left join
    fn optional(&self) -> Nullable<Self>
    where
        Self: Projection,
    {
        Nullable::new(self.clone())
    }
}
