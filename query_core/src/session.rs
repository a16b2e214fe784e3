//! Sessions
//!
//! A session owns one unit of work on a backend. Queries, `persist` and lazy
//! loading all go through it. Clones share the same unit; once any handle
//! commits or rolls back, every handle sees the session as closed.
//!
//! ```ignore
//! let session = Session::begin(&backend).await?;
//! session.persist(&team).await?;
//! let found = session.query().select_from(&member).fetch().await?;
//! session.commit().await?;
//! ```

use crate::errors::QueryError;
use crate::query_builder::builder::{QueryFactory, SelectBuilder};
use crate::query_builder::select::SelectSpec;
use crate::schema::TableSchema;
use crate::traits::{Backend, Entity, EntityPath, UnitOfWork};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::debug;
use type_mapping::SqlValue;
use uuid::Uuid;

pub struct SessionInner {
    id: Uuid,
    backend: &'static str,
    unit: Mutex<Option<Box<dyn UnitOfWork>>>,
    open: AtomicBool,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("backend", &self.inner.backend)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Session {
    /// Open a session with a fresh unit of work
    pub async fn begin(backend: &dyn Backend) -> Result<Self, QueryError> {
        let unit = backend.begin().await?;
        let id = Uuid::new_v4();
        debug!(session = %id, backend = backend.name(), "session opened");

        Ok(Self {
            inner: Arc::new(SessionInner {
                id,
                backend: backend.name(),
                unit: Mutex::new(Some(unit)),
                open: AtomicBool::new(true),
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// Query factory bound to this session
    pub fn query(&self) -> QueryFactory {
        QueryFactory::new(self)
    }

    pub(crate) fn downgrade(&self) -> Weak<SessionInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<SessionInner>) -> Option<Session> {
        weak.upgrade().map(|inner| Session { inner })
    }

    pub async fn create_table(&self, schema: &'static TableSchema) -> Result<(), QueryError> {
        let mut guard = self.inner.unit.lock().await;
        let unit = guard.as_mut().ok_or(QueryError::SessionClosed)?;
        unit.create_table(schema).await
    }

    /// Insert a new entity
    pub async fn persist<E: Entity>(&self, entity: &E) -> Result<(), QueryError> {
        let schema = E::schema();
        let mut guard = self.inner.unit.lock().await;
        let unit = guard.as_mut().ok_or(QueryError::SessionClosed)?;
        unit.insert(schema, entity.to_values()).await?;
        debug!(session = %self.inner.id, table = schema.name, id = %entity.id(), "entity persisted");
        Ok(())
    }

    /// Load an entity by primary key
    pub async fn find<E: Entity>(&self, id: Uuid) -> Result<Option<E>, QueryError> {
        let path = E::Path::new(E::schema().name);
        self.query()
            .select_from(&path)
            .filter(path.id_path().eq(id))
            .fetch_first()
            .await
    }

    /// Rows of a validated query
    pub async fn select(&self, spec: &SelectSpec) -> Result<Vec<Vec<SqlValue>>, QueryError> {
        let mut guard = self.inner.unit.lock().await;
        let unit = guard.as_mut().ok_or(QueryError::SessionClosed)?;
        unit.select(spec).await
    }

    pub async fn count(&self, spec: &SelectSpec) -> Result<i64, QueryError> {
        let mut guard = self.inner.unit.lock().await;
        let unit = guard.as_mut().ok_or(QueryError::SessionClosed)?;
        unit.count(spec).await
    }

    /// Make the session's changes durable and close it
    pub async fn commit(&self) -> Result<(), QueryError> {
        let unit = self.close().await?;
        unit.commit().await?;
        debug!(session = %self.inner.id, "session committed");
        Ok(())
    }

    /// Discard the session's changes and close it
    pub async fn rollback(&self) -> Result<(), QueryError> {
        let unit = self.close().await?;
        unit.rollback().await?;
        debug!(session = %self.inner.id, "session rolled back");
        Ok(())
    }

    async fn close(&self) -> Result<Box<dyn UnitOfWork>, QueryError> {
        let unit = self
            .inner
            .unit
            .lock()
            .await
            .take()
            .ok_or(QueryError::SessionClosed)?;
        self.inner.open.store(false, Ordering::Release);
        Ok(unit)
    }
}
