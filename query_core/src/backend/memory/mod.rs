//! In-memory backend
//!
//! Tables live in a shared map. A unit of work reads a snapshot of that map
//! and records its own writes in a log, so uncommitted inserts are invisible
//! to other sessions and vanish on rollback. Commit replays the log onto the
//! current shared tables under the write lock, re-checking constraints, and
//! publishes nothing if any logged write is rejected.

mod evaluator;

use crate::errors::QueryError;
use crate::query_builder::select::SelectSpec;
use crate::query_builder::sql_generation::SqlGenerator;
use crate::schema::{RelationKind, TableSchema};
use crate::traits::{Backend, UnitOfWork};
use async_trait::async_trait;
use evaluator::Evaluator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use type_mapping::{values_equal, SqlValue};

#[derive(Debug, Clone)]
pub(crate) struct MemTable {
    schema: &'static TableSchema,
    rows: Vec<Vec<SqlValue>>,
}

type Tables = HashMap<String, MemTable>;

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    tables: Arc<RwLock<Tables>>,
    log_sql: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the PostgreSQL equivalent of every query at info level
    pub fn with_sql_logging(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    /// Committed row count of a table, `None` if it does not exist
    pub async fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.read().await.get(table).map(|t| t.rows.len())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, QueryError> {
        let snapshot = self.tables.read().await.clone();
        Ok(Box::new(MemoryUnitOfWork {
            shared: Arc::clone(&self.tables),
            tables: snapshot,
            writes: Vec::new(),
            log_sql: self.log_sql,
        }))
    }
}

#[derive(Debug)]
enum Write {
    CreateTable(&'static TableSchema),
    Insert(&'static TableSchema, Vec<SqlValue>),
}

pub struct MemoryUnitOfWork {
    shared: Arc<RwLock<Tables>>,
    tables: Tables,
    writes: Vec<Write>,
    log_sql: bool,
}

impl MemoryUnitOfWork {
    fn log_query(&self, spec: &SelectSpec) {
        let (sql, params) = SqlGenerator::build_select(spec);
        if self.log_sql {
            info!(sql = %sql, params = params.len(), "memory query");
        } else {
            debug!(sql = %sql, params = params.len(), "memory query");
        }
    }
}

fn check_constraints(tables: &Tables, schema: &'static TableSchema, values: &[SqlValue]) -> Result<(), QueryError> {
    let table = tables.get(schema.name).ok_or_else(|| missing_table(schema.name))?;

    if values.len() != schema.columns.len() {
        return Err(QueryError::database(
            "insert",
            format!(
                "table \"{}\" has {} columns, got {} values",
                schema.name,
                schema.columns.len(),
                values.len()
            ),
        ));
    }

    for (column, value) in schema.columns.iter().zip(values) {
        if value.is_null() {
            if !column.nullable || column.primary_key {
                return Err(QueryError::database(
                    "insert",
                    format!("null value in column \"{}\" violates not-null constraint", column.name),
                ));
            }
            continue;
        }
        let compatible = value.value_type().is_some_and(|found| {
            found == column.value_type || (found.is_integer() && column.value_type.is_integer())
        });
        if !compatible {
            return Err(QueryError::database(
                "insert",
                format!(
                    "column \"{}\" is of type {} but value is {:?}",
                    column.name,
                    column.value_type.pg_type(),
                    value
                ),
            ));
        }
    }

    if let Some(pk) = schema.column_index(schema.primary_key) {
        if table.rows.iter().any(|row| values_equal(&row[pk], &values[pk]) == Some(true)) {
            return Err(QueryError::database(
                "insert",
                format!("duplicate key value violates unique constraint \"{}_pkey\"", schema.name),
            ));
        }
    }

    for relation in schema.relations {
        let RelationKind::ManyToOne { join_column } = relation.kind else {
            continue;
        };
        let Some(index) = schema.column_index(join_column) else {
            continue;
        };
        if values[index].is_null() {
            continue;
        }
        let target = relation.target_schema();
        let exists = tables.get(target.name).is_some_and(|t| {
            target.column_index(target.primary_key).is_some_and(|pk| {
                t.rows.iter().any(|row| values_equal(&row[pk], &values[index]) == Some(true))
            })
        });
        if !exists {
            return Err(QueryError::database(
                "insert",
                format!(
                    "insert or update on table \"{}\" violates foreign key constraint on \"{}\"",
                    schema.name, join_column
                ),
            ));
        }
    }
    Ok(())
}

fn missing_table(name: &str) -> QueryError {
    QueryError::database("insert", format!("relation \"{}\" does not exist", name))
}

fn create_table(tables: &mut Tables, schema: &'static TableSchema) {
    tables.entry(schema.name.to_string()).or_insert_with(|| MemTable {
        schema,
        rows: Vec::new(),
    });
}

fn insert(tables: &mut Tables, schema: &'static TableSchema, values: Vec<SqlValue>) -> Result<(), QueryError> {
    check_constraints(tables, schema, &values)?;
    let table = tables.get_mut(schema.name).ok_or_else(|| missing_table(schema.name))?;
    table.rows.push(values);
    Ok(())
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn create_table(&mut self, schema: &'static TableSchema) -> Result<(), QueryError> {
        create_table(&mut self.tables, schema);
        self.writes.push(Write::CreateTable(schema));
        Ok(())
    }

    async fn insert(&mut self, schema: &'static TableSchema, values: Vec<SqlValue>) -> Result<(), QueryError> {
        insert(&mut self.tables, schema, values.clone())?;
        self.writes.push(Write::Insert(schema, values));
        Ok(())
    }

    async fn select(&mut self, spec: &SelectSpec) -> Result<Vec<Vec<SqlValue>>, QueryError> {
        self.log_query(spec);
        Evaluator::new(&self.tables).select(spec)
    }

    async fn count(&mut self, spec: &SelectSpec) -> Result<i64, QueryError> {
        self.log_query(spec);
        Evaluator::new(&self.tables).count(spec)
    }

    async fn commit(self: Box<Self>) -> Result<(), QueryError> {
        let this = *self;
        if this.writes.is_empty() {
            return Ok(());
        }

        let mut shared = this.shared.write().await;
        let mut merged = shared.clone();
        let count = this.writes.len();
        for write in this.writes {
            match write {
                Write::CreateTable(schema) => create_table(&mut merged, schema),
                Write::Insert(schema, values) => insert(&mut merged, schema, values)?,
            }
        }
        *shared = merged;
        debug!(writes = count, "memory unit committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), QueryError> {
        Ok(())
    }
}
