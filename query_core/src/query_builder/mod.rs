//! Query builder
//!
//! Typed expressions, predicates and clauses that assemble into a
//! [`SelectSpec`], plus the PostgreSQL rendering of that model.

pub mod aggregation;
pub mod builder;
pub mod case;
pub mod expr;
pub mod filter;
pub mod grouping;
pub mod join;
pub mod ordering;
pub mod pagination;
pub mod select;
pub mod sql_generation;
pub mod subquery;

#[cfg(test)]
mod tests;

pub use aggregation::AggregateFunction;
pub use builder::{Query, QueryFactory, SelectBuilder};
pub use case::CaseBuilder;
pub use expr::{expressions, Comparable, Expr, ExprNode, IntoExpr, IntoLiteral, IntoOperand, Numeric};
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use grouping::GroupBy;
pub use join::{FetchJoin, JoinType, RelationPath};
pub use ordering::{NullHandling, OrderSpecifier, SortOrder};
pub use pagination::Pagination;
pub use select::SelectSpec;
pub use sql_generation::SqlGenerator;
pub use subquery::SubQuery;
