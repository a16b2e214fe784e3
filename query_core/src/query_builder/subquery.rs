//! Subqueries
//!
//! Built with [`expressions::select`](crate::query_builder::expr::expressions::select)
//! and used as a comparison operand, an `IN` source or a projected scalar.
//! Columns of enclosing queries may be referenced, which makes the subquery
//! correlated.

use crate::query_builder::builder::SelectBuilder;
use crate::query_builder::expr::{Comparable, Expr, ExprNode};
use crate::query_builder::select::SelectSpec;
use std::fmt;
use std::marker::PhantomData;

pub struct SubQuery<T> {
    spec: SelectSpec,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for SubQuery<T> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SubQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubQuery").field(&self.spec).finish()
    }
}

impl<T: Comparable> SubQuery<T> {
    pub(crate) fn new(expr: Expr<T>) -> Self {
        Self {
            spec: SelectSpec {
                select: vec![expr.into_node()],
                ..SelectSpec::default()
            },
            _type: PhantomData,
        }
    }

    /// Use the subquery as a scalar value; no rows yield NULL, more than one
    /// row is an error at execution time
    pub fn as_expr(self) -> Expr<T> {
        Expr::from_node(ExprNode::SubQuery(Box::new(self.spec)))
    }

    pub fn spec(&self) -> &SelectSpec {
        &self.spec
    }

    pub(crate) fn into_spec(self) -> SelectSpec {
        self.spec
    }
}

impl<T: Comparable> SelectBuilder for SubQuery<T> {
    fn spec_mut(&mut self) -> &mut SelectSpec {
        &mut self.spec
    }
}
