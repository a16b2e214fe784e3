//! Lazily loaded associations
//!
//! A `Lazy<T>` always knows the id of its target. Unless the association
//! was fetch-joined, the value itself is loaded on first access through the
//! session that produced the owner. Once that session has been committed,
//! rolled back or dropped, loading fails with
//! [`QueryError::LazyInitialization`].

use crate::errors::QueryError;
use crate::session::{Session, SessionInner};
use crate::traits::Entity;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Weak;
use uuid::Uuid;

pub struct Lazy<T> {
    id: Uuid,
    state: LazyState<T>,
}

enum LazyState<T> {
    Unloaded(Weak<SessionInner>),
    Loaded(Box<T>),
}

impl<T: Entity> Lazy<T> {
    pub fn loaded(value: T) -> Self {
        Self {
            id: value.id(),
            state: LazyState::Loaded(Box::new(value)),
        }
    }

    pub fn unloaded(id: Uuid, session: Weak<SessionInner>) -> Self {
        Self {
            id,
            state: LazyState::Unloaded(session),
        }
    }

    /// A reference that can never be initialized
    pub fn detached(id: Uuid) -> Self {
        Self::unloaded(id, Weak::new())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, LazyState::Loaded(_))
    }

    /// The target if it is already loaded
    pub fn get(&self) -> Option<&T> {
        match &self.state {
            LazyState::Loaded(value) => Some(value),
            LazyState::Unloaded(_) => None,
        }
    }

    /// The target, loading it through the originating session if needed
    pub async fn load(&mut self) -> Result<&T, QueryError> {
        if let LazyState::Unloaded(weak) = &self.state {
            let session = Session::upgrade(weak)
                .filter(Session::is_open)
                .ok_or_else(|| self.initialization_error())?;
            let value = session
                .find::<T>(self.id)
                .await?
                .ok_or_else(|| self.initialization_error())?;
            self.state = LazyState::Loaded(Box::new(value));
        }

        match &self.state {
            LazyState::Loaded(value) => Ok(value),
            LazyState::Unloaded(_) => Err(self.initialization_error()),
        }
    }

    fn initialization_error(&self) -> QueryError {
        QueryError::LazyInitialization {
            entity: T::schema().entity,
            id: self.id,
        }
    }
}

impl<T: Clone> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        let state = match &self.state {
            LazyState::Unloaded(weak) => LazyState::Unloaded(weak.clone()),
            LazyState::Loaded(value) => LazyState::Loaded(value.clone()),
        };
        Self { id: self.id, state }
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("id", &self.id)
            .field("loaded", &matches!(self.state, LazyState::Loaded(_)))
            .finish()
    }
}

/// Two references are equal when they point at the same row
impl<T> PartialEq for Lazy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Serialize for Lazy<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Lazy<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = Uuid::deserialize(deserializer)?;
        Ok(Self {
            id,
            state: LazyState::Unloaded(Weak::new()),
        })
    }
}
