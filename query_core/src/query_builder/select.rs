//! The untyped query model
//!
//! `SelectSpec` is what both the SQL writer and the memory engine consume.
//! Builders record misuse (such as `on()` without a join) as problems that
//! surface when the query is validated, so that building stays infallible.

use crate::errors::QueryError;
use crate::query_builder::expr::ExprNode;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::join::{FetchJoin, JoinClause, JoinCondition};
use crate::query_builder::ordering::OrderSpecifier;
use crate::query_builder::pagination::Pagination;
use crate::schema::TableSchema;
use crate::validation::validate_identifier;

/// An aliased FROM source
#[derive(Debug, Clone)]
pub struct TableRef {
    pub table: &'static TableSchema,
    pub alias: String,
}

#[derive(Debug, Clone, Default)]
pub struct SelectSpec {
    pub select: Vec<ExprNode>,
    pub sources: Vec<TableRef>,
    pub joins: Vec<JoinClause>,
    pub conditions: Vec<QueryFilter>,
    pub group_by: Option<GroupBy>,
    pub order_by: Vec<OrderSpecifier>,
    pub pagination: Pagination,
    pub(crate) problems: Vec<String>,
}

impl SelectSpec {
    pub fn add_source(&mut self, table: &'static TableSchema, alias: &str) {
        self.sources.push(TableRef {
            table,
            alias: alias.to_string(),
        });
    }

    pub(crate) fn record_problem(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }

    /// Aliases declared by FROM and JOIN, in declaration order
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .map(|s| s.alias.as_str())
            .chain(self.joins.iter().map(|j| j.alias.as_str()))
    }

    pub fn fetches(&self) -> Vec<FetchJoin> {
        self.joins.iter().filter_map(JoinClause::fetch_join).collect()
    }

    /// Whether rows collapse into groups, explicitly or through an aggregate
    pub fn is_aggregate(&self) -> bool {
        self.group_by.is_some()
            || self.select.iter().any(ExprNode::contains_aggregate)
            || self.order_by.iter().any(|o| o.target.contains_aggregate())
    }

    /// Same query without ordering and paging, as used for total counts
    pub fn for_count(&self) -> SelectSpec {
        SelectSpec {
            order_by: Vec::new(),
            pagination: Pagination::default(),
            ..self.clone()
        }
    }

    /// Visit every top-level expression of every clause
    pub fn for_each_expr(&self, visit: &mut dyn FnMut(&ExprNode)) {
        self.select.iter().for_each(|e| visit(e));
        for join in &self.joins {
            if let JoinCondition::Relation {
                source_key,
                target_key,
                ..
            } = &join.condition
            {
                visit(source_key);
                visit(target_key);
            }
            if let Some(on) = &join.on {
                on.for_each_expr(visit);
            }
        }
        self.conditions.iter().for_each(|c| c.for_each_expr(visit));
        if let Some(group_by) = &self.group_by {
            group_by.fields.iter().for_each(|e| visit(e));
            group_by
                .having_conditions()
                .iter()
                .for_each(|c| c.for_each_expr(visit));
        }
        self.order_by.iter().for_each(|o| visit(&o.target));
    }

    /// Check the query before translation. `outer_scope` lists the aliases
    /// of enclosing queries a correlated subquery may reference.
    pub fn validate(&self, outer_scope: &[String]) -> Result<(), QueryError> {
        if let Some(problem) = self.problems.first() {
            return Err(QueryError::translation(problem.clone()));
        }
        if self.sources.is_empty() {
            return Err(QueryError::translation("query has no FROM source"));
        }
        if self.select.is_empty() {
            return Err(QueryError::translation("query selects nothing"));
        }
        self.pagination.validate()?;

        let scope = self.declared_scope()?;
        let visible: Vec<String> = scope.iter().chain(outer_scope).cloned().collect();

        let mut problems = Vec::new();
        let mut subqueries = Vec::new();
        self.for_each_expr(&mut |expr| {
            expr.walk(&mut |node| match node {
                ExprNode::Column { alias, column, .. } if !visible.contains(alias) => {
                    problems.push(format!("unknown alias '{}' in reference to {}.{}", alias, alias, column));
                }
                ExprNode::SubQuery(spec) => subqueries.push(spec.as_ref().clone()),
                _ => {}
            })
        });
        for condition in &self.conditions {
            condition.for_each_subquery(&mut |spec| subqueries.push(spec.clone()));
            condition.for_each_expr(&mut |expr| {
                if expr.contains_aggregate() {
                    problems.push("aggregate functions are not allowed in WHERE".to_string());
                }
            });
        }
        if let Some(group_by) = &self.group_by {
            for condition in group_by.having_conditions() {
                condition.for_each_subquery(&mut |spec| subqueries.push(spec.clone()));
            }
        }
        if let Some(problem) = problems.into_iter().next() {
            return Err(QueryError::translation(problem));
        }

        if self.is_aggregate() {
            for expr in self.select.iter().chain(self.order_by.iter().map(|o| &o.target)) {
                if let Some(column) = self.ungrouped_column(expr) {
                    return Err(QueryError::translation(format!(
                        "{} must appear in GROUP BY or be used in an aggregate",
                        column
                    )));
                }
            }
        }

        for subquery in subqueries {
            subquery.validate_scalar(&visible)?;
        }
        Ok(())
    }

    /// Validate a subquery, which must produce a single column
    pub fn validate_scalar(&self, outer_scope: &[String]) -> Result<(), QueryError> {
        if self.select.len() != 1 {
            return Err(QueryError::translation(format!(
                "scalar subquery must select exactly one column, selects {}",
                self.select.len()
            )));
        }
        self.validate(outer_scope)
    }

    fn declared_scope(&self) -> Result<Vec<String>, QueryError> {
        let mut scope: Vec<String> = Vec::new();
        let declare = |scope: &mut Vec<String>, alias: &str| -> Result<(), QueryError> {
            validate_identifier(alias).map_err(|e| QueryError::translation(e.to_string()))?;
            if scope.iter().any(|a| a == alias) {
                return Err(QueryError::translation(format!(
                    "alias '{}' is declared more than once",
                    alias
                )));
            }
            scope.push(alias.to_string());
            Ok(())
        };

        for source in &self.sources {
            declare(&mut scope, &source.alias)?;
        }
        for join in &self.joins {
            match &join.condition {
                JoinCondition::Relation { source_alias, .. } if !scope.contains(source_alias) => {
                    return Err(QueryError::translation(format!(
                        "join on an association of '{}' before it is declared",
                        source_alias
                    )));
                }
                JoinCondition::Entity if join.on.is_none() => {
                    return Err(QueryError::translation(format!(
                        "join of '{}' without an association requires on()",
                        join.alias
                    )));
                }
                _ => {}
            }
            declare(&mut scope, &join.alias)?;
        }
        Ok(scope)
    }

    // First column referenced outside an aggregate that is not grouped on
    fn ungrouped_column(&self, expr: &ExprNode) -> Option<String> {
        if let Some(group_by) = &self.group_by {
            if group_by.groups_on(expr) {
                return None;
            }
        }
        match expr {
            ExprNode::Column { alias, column, .. } => Some(format!("{}.{}", alias, column)),
            ExprNode::Literal(_) | ExprNode::Aggregate { .. } | ExprNode::SubQuery(_) => None,
            ExprNode::Case(case) => {
                let mut found = None;
                case.for_each_expr(&mut |e| {
                    if found.is_none() {
                        found = self.ungrouped_column(e);
                    }
                });
                found
            }
        }
    }
}
