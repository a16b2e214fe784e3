//! PostgreSQL backend on top of a sqlx pool
//!
//! Each unit of work is one database transaction. Values are bound as typed
//! parameters, so NULLs take the type of the column or expression they
//! stand for.

use crate::errors::QueryError;
use crate::query_builder::select::SelectSpec;
use crate::query_builder::sql_generation::SqlGenerator;
use crate::schema::TableSchema;
use crate::traits::{Backend, UnitOfWork};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};
use type_mapping::{SqlValue, ValueType};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
    log_sql: bool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, log_sql: false }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, QueryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| QueryError::database("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Log every statement at info level instead of debug
    pub fn with_sql_logging(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Backend for PostgresBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, QueryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| QueryError::database("begin transaction", e))?;
        Ok(Box::new(PostgresUnitOfWork {
            tx,
            log_sql: self.log_sql,
        }))
    }
}

pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
    log_sql: bool,
}

impl PostgresUnitOfWork {
    fn log_statement(&self, sql: &str, params: usize) {
        if self.log_sql {
            info!(sql = %sql, params, "executing statement");
        } else {
            debug!(sql = %sql, params, "executing statement");
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn create_table(&mut self, schema: &'static TableSchema) -> Result<(), QueryError> {
        let sql = schema.create_table_sql();
        self.log_statement(&sql, 0);
        sqlx::query(&sql)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| QueryError::database(format!("create table {}", schema.name), e))?;
        Ok(())
    }

    async fn insert(&mut self, schema: &'static TableSchema, values: Vec<SqlValue>) -> Result<(), QueryError> {
        let sql = schema.insert_sql();
        self.log_statement(&sql, values.len());

        let mut query = sqlx::query(&sql);
        for (column, value) in schema.columns.iter().zip(&values) {
            query = bind_value(query, value, Some(column.value_type));
        }
        query
            .execute(&mut *self.tx)
            .await
            .map_err(|e| QueryError::database(format!("insert into {}", schema.name), e))?;
        Ok(())
    }

    async fn select(&mut self, spec: &SelectSpec) -> Result<Vec<Vec<SqlValue>>, QueryError> {
        let (sql, params) = SqlGenerator::build_select(spec);
        self.log_statement(&sql, params.len());

        let mut query = sqlx::query(&sql);
        for value in &params {
            query = bind_value(query, value, None);
        }
        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| QueryError::database("select", e))?;

        let types: Vec<Option<ValueType>> = spec.select.iter().map(|expr| expr.value_type()).collect();
        rows.iter().map(|row| decode_row(row, &types)).collect()
    }

    async fn count(&mut self, spec: &SelectSpec) -> Result<i64, QueryError> {
        let (sql, params) = SqlGenerator::build_count(spec);
        self.log_statement(&sql, params.len());

        let mut query = sqlx::query(&sql);
        for value in &params {
            query = bind_value(query, value, None);
        }
        let row = query
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| QueryError::database("count", e))?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn commit(self: Box<Self>) -> Result<(), QueryError> {
        self.tx
            .commit()
            .await
            .map_err(|e| QueryError::database("commit", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), QueryError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| QueryError::database("rollback", e))
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
    null_type: Option<ValueType>,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => match null_type {
            Some(ValueType::Boolean) => query.bind(None::<bool>),
            Some(ValueType::Integer) => query.bind(None::<i32>),
            Some(ValueType::BigInt) => query.bind(None::<i64>),
            Some(ValueType::Double) => query.bind(None::<f64>),
            Some(ValueType::Uuid) => query.bind(None::<Uuid>),
            Some(ValueType::Text) | None => query.bind(None::<String>),
        },
        SqlValue::Boolean(v) => query.bind(*v),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::BigInt(v) => query.bind(*v),
        SqlValue::Double(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Uuid(v) => query.bind(*v),
    }
}

fn decode_row(row: &PgRow, types: &[Option<ValueType>]) -> Result<Vec<SqlValue>, QueryError> {
    types
        .iter()
        .enumerate()
        .map(|(index, value_type)| decode_column(row, index, *value_type))
        .collect()
}

fn decode_column(row: &PgRow, index: usize, value_type: Option<ValueType>) -> Result<SqlValue, QueryError> {
    let value = match value_type {
        Some(ValueType::Boolean) => row.try_get::<Option<bool>, _>(index)?.map(SqlValue::Boolean),
        Some(ValueType::Integer) => row.try_get::<Option<i32>, _>(index)?.map(SqlValue::Integer),
        Some(ValueType::BigInt) => row.try_get::<Option<i64>, _>(index)?.map(SqlValue::BigInt),
        Some(ValueType::Double) => row.try_get::<Option<f64>, _>(index)?.map(SqlValue::Double),
        Some(ValueType::Uuid) => row.try_get::<Option<Uuid>, _>(index)?.map(SqlValue::Uuid),
        Some(ValueType::Text) | None => row.try_get::<Option<String>, _>(index)?.map(SqlValue::Text),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}
