//! Projections
//!
//! A projection says which expressions a query selects and how a row of
//! values turns back into Rust values. Expressions, entity paths,
//! [`Nullable`] wrappers and tuples of up to six projections are supported.

use crate::errors::QueryError;
use crate::lazy::Lazy;
use crate::query_builder::expr::{Comparable, Expr, ExprNode};
use crate::query_builder::join::FetchJoin;
use crate::session::SessionInner;
use crate::traits::Entity;
use std::sync::Weak;
use type_mapping::{SqlType, SqlValue};
use uuid::Uuid;

/// Sequential reader over one result row
#[derive(Debug)]
pub struct RowCursor {
    values: Vec<SqlValue>,
    position: usize,
}

impl RowCursor {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    /// Decode the next value
    pub fn read<T: SqlType>(&mut self) -> Result<T, QueryError> {
        let found = self.values.len();
        let value = match self.values.get_mut(self.position) {
            Some(slot) => std::mem::replace(slot, SqlValue::Null),
            None => {
                return Err(QueryError::MalformedRow {
                    expected: self.position + 1,
                    found,
                })
            }
        };
        self.position += 1;
        Ok(T::from_sql_value(value)?)
    }

    pub fn skip(&mut self, count: usize) {
        self.position = (self.position + count).min(self.values.len());
    }

    /// Whether the next `width` values are all NULL
    pub fn next_are_null(&self, width: usize) -> bool {
        self.values
            .iter()
            .skip(self.position)
            .take(width)
            .all(SqlValue::is_null)
    }

    pub fn remaining(&self) -> usize {
        self.values.len() - self.position
    }
}

/// What decoding needs beyond the row itself
#[derive(Debug, Clone)]
pub struct LoadContext {
    session: Weak<SessionInner>,
    fetches: Vec<FetchJoin>,
}

impl LoadContext {
    pub fn new(session: Weak<SessionInner>, fetches: Vec<FetchJoin>) -> Self {
        Self { session, fetches }
    }

    /// Context with no session, so lazy associations cannot be initialized
    pub fn detached() -> Self {
        Self::new(Weak::new(), Vec::new())
    }

    pub fn fetches(&self) -> &[FetchJoin] {
        &self.fetches
    }

    pub fn loader<'a>(&'a self, alias: &'a str) -> EntityLoader<'a> {
        EntityLoader { ctx: self, alias }
    }
}

/// Decoding state for one aliased entity
pub struct EntityLoader<'a> {
    ctx: &'a LoadContext,
    alias: &'a str,
}

impl<'a> EntityLoader<'a> {
    pub fn alias(&self) -> &str {
        self.alias
    }

    /// Resolve a many-to-one association. When it was fetch-joined the
    /// target is decoded from the row, otherwise an uninitialized [`Lazy`]
    /// bound to the session is returned.
    pub fn association<T: Entity>(
        &self,
        row: &mut RowCursor,
        relation: &str,
        foreign_key: Option<Uuid>,
    ) -> Result<Option<Lazy<T>>, QueryError> {
        let Some(target_alias) = FetchJoin::target_alias(&self.ctx.fetches, self.alias, relation) else {
            return Ok(foreign_key.map(|id| Lazy::unloaded(id, self.ctx.session.clone())));
        };

        // a left join whose ON clause rejected the target leaves it NULL
        let width = T::schema().projection_width(target_alias, &self.ctx.fetches);
        if foreign_key.is_none() || row.next_are_null(width) {
            row.skip(width);
            return Ok(foreign_key.map(|id| Lazy::unloaded(id, self.ctx.session.clone())));
        }
        let target = T::from_row(row, &self.ctx.loader(target_alias))?;
        Ok(Some(Lazy::loaded(target)))
    }
}

/// Something a query can select
pub trait Projection: Send + Sync {
    type Output: Send;

    fn select_items(&self, fetches: &[FetchJoin]) -> Vec<ExprNode>;

    fn decode(&self, row: &mut RowCursor, ctx: &LoadContext) -> Result<Self::Output, QueryError>;
}

impl<T: Comparable> Projection for Expr<T> {
    type Output = T;

    fn select_items(&self, _fetches: &[FetchJoin]) -> Vec<ExprNode> {
        vec![self.node().clone()]
    }

    fn decode(&self, row: &mut RowCursor, _ctx: &LoadContext) -> Result<T, QueryError> {
        row.read()
    }
}

impl<P: Projection + ?Sized> Projection for &P {
    type Output = P::Output;

    fn select_items(&self, fetches: &[FetchJoin]) -> Vec<ExprNode> {
        (**self).select_items(fetches)
    }

    fn decode(&self, row: &mut RowCursor, ctx: &LoadContext) -> Result<Self::Output, QueryError> {
        (**self).decode(row, ctx)
    }
}

/// Select items of an entity projected under `alias`
pub fn entity_select_items<E: Entity>(alias: &str, fetches: &[FetchJoin]) -> Vec<ExprNode> {
    E::schema().select_items(alias, fetches)
}

pub fn decode_entity<E: Entity>(alias: &str, row: &mut RowCursor, ctx: &LoadContext) -> Result<E, QueryError> {
    E::from_row(row, &ctx.loader(alias))
}

/// A projection that decodes to `None` when all of its columns are NULL
#[derive(Debug, Clone)]
pub struct Nullable<P> {
    inner: P,
}

impl<P: Projection> Nullable<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Projection> Projection for Nullable<P> {
    type Output = Option<P::Output>;

    fn select_items(&self, fetches: &[FetchJoin]) -> Vec<ExprNode> {
        self.inner.select_items(fetches)
    }

    fn decode(&self, row: &mut RowCursor, ctx: &LoadContext) -> Result<Self::Output, QueryError> {
        let width = self.inner.select_items(ctx.fetches()).len();
        if row.next_are_null(width) {
            row.skip(width);
            return Ok(None);
        }
        self.inner.decode(row, ctx).map(Some)
    }
}

macro_rules! tuple_projection {
    ($($name:ident),+) => {
        impl<$($name: Projection),+> Projection for ($($name,)+) {
            type Output = ($($name::Output,)+);

            fn select_items(&self, fetches: &[FetchJoin]) -> Vec<ExprNode> {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                let mut items = Vec::new();
                $(items.extend($name.select_items(fetches));)+
                items
            }

            fn decode(&self, row: &mut RowCursor, ctx: &LoadContext) -> Result<Self::Output, QueryError> {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                Ok(($($name.decode(row, ctx)?,)+))
            }
        }
    };
}

tuple_projection!(A, B);
tuple_projection!(A, B, C);
tuple_projection!(A, B, C, D);
tuple_projection!(A, B, C, D, E);
tuple_projection!(A, B, C, D, E, F);
