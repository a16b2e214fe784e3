//! Fluent query construction
//!
//! [`SelectBuilder`] carries the clause methods shared by top-level queries
//! and subqueries. [`Query`] adds the projection and the fetch operations.

use crate::errors::QueryError;
use crate::projection::{LoadContext, Projection, RowCursor};
use crate::query_builder::expr::IntoExpr;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::join::{JoinClause, JoinCondition, JoinType, RelationPath};
use crate::query_builder::ordering::OrderSpecifier;
use crate::query_builder::select::SelectSpec;
use crate::query_builder::sql_generation::SqlGenerator;
use crate::results::QueryResults;
use crate::schema::RelationKind;
use crate::session::Session;
use crate::traits::{Entity, EntityPath};
use type_mapping::SqlValue;

/// Clause methods shared by [`Query`] and
/// [`SubQuery`](crate::query_builder::subquery::SubQuery)
pub trait SelectBuilder: Sized {
    fn spec_mut(&mut self) -> &mut SelectSpec;

    /// Add a FROM source; several sources form a cross join
    fn from<E: EntityPath>(mut self, path: &E) -> Self {
        self.spec_mut().add_source(E::Entity::schema(), path.alias());
        self
    }

    /// Inner join along an association
    fn join<T: Entity>(mut self, relation: &RelationPath<T>, target: &T::Path) -> Self {
        relation_join(self.spec_mut(), JoinType::Inner, relation, target.alias());
        self
    }

    /// Left outer join along an association
    fn left_join<T: Entity>(mut self, relation: &RelationPath<T>, target: &T::Path) -> Self {
        relation_join(self.spec_mut(), JoinType::Left, relation, target.alias());
        self
    }

    /// Inner join of an unrelated entity, matched by a following `on`
    fn join_entity<E: EntityPath>(mut self, target: &E) -> Self {
        self.spec_mut()
            .joins
            .push(JoinClause::entity(JoinType::Inner, E::Entity::schema(), target.alias()));
        self
    }

    /// Left outer join of an unrelated entity, matched by a following `on`
    fn left_join_entity<E: EntityPath>(mut self, target: &E) -> Self {
        self.spec_mut()
            .joins
            .push(JoinClause::entity(JoinType::Left, E::Entity::schema(), target.alias()));
        self
    }

    /// Extra condition for the most recent join
    fn on(mut self, condition: QueryFilter) -> Self {
        let spec = self.spec_mut();
        match spec.joins.last_mut() {
            Some(join) => join.add_on(condition),
            None => spec.record_problem("on() requires a preceding join"),
        }
        self
    }

    /// Load the association of the most recent join with its owner
    fn fetch_join(mut self) -> Self {
        let spec = self.spec_mut();
        let problem = match spec.joins.last_mut() {
            None => Some("fetch_join() requires a preceding join"),
            Some(JoinClause {
                condition: JoinCondition::Entity,
                ..
            }) => Some("fetch_join() requires a join along an association"),
            Some(JoinClause {
                condition:
                    JoinCondition::Relation {
                        kind: RelationKind::OneToMany { .. },
                        ..
                    },
                ..
            }) => Some("fetch_join() of a collection association is not supported"),
            Some(join) => {
                join.fetch = true;
                None
            }
        };
        if let Some(problem) = problem {
            spec.record_problem(problem);
        }
        self
    }

    /// Add a filter condition
    fn filter(mut self, condition: QueryFilter) -> Self {
        self.spec_mut().conditions.push(condition);
        self
    }

    /// Add multiple filters (combined with AND)
    fn filters(mut self, conditions: impl IntoIterator<Item = QueryFilter>) -> Self {
        self.spec_mut().conditions.extend(conditions);
        self
    }

    fn group_by<T>(mut self, expr: impl IntoExpr<T>) -> Self {
        let node = expr.into_expr().into_node();
        let spec = self.spec_mut();
        spec.group_by = Some(match spec.group_by.take() {
            Some(group_by) => group_by.then_by(node),
            None => GroupBy::single(node),
        });
        self
    }

    fn having(mut self, condition: QueryFilter) -> Self {
        let spec = self.spec_mut();
        match spec.group_by.take() {
            Some(group_by) => spec.group_by = Some(group_by.having(condition)),
            None => spec.record_problem("having() requires group_by()"),
        }
        self
    }

    /// Add ordering
    fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.spec_mut().order_by.push(order);
        self
    }

    fn offset(mut self, offset: i64) -> Self {
        let spec = self.spec_mut();
        spec.pagination = spec.pagination.clone().with_offset(offset);
        self
    }

    fn limit(mut self, limit: i64) -> Self {
        let spec = self.spec_mut();
        spec.pagination = spec.pagination.clone().with_limit(limit);
        self
    }
}

fn relation_join<T: Entity>(
    spec: &mut SelectSpec,
    join_type: JoinType,
    relation: &RelationPath<T>,
    alias: &str,
) {
    match JoinClause::relation(
        join_type,
        relation.source_alias(),
        relation.source(),
        relation.relation(),
        alias,
    ) {
        Ok(join) => spec.joins.push(join),
        Err(problem) => spec.record_problem(problem),
    }
}

/// Entry point for building queries inside a session
#[derive(Clone)]
pub struct QueryFactory {
    session: Session,
}

impl QueryFactory {
    pub fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
        }
    }

    /// Start a query projecting `projection`; add sources with `from`
    pub fn select<P: Projection>(&self, projection: P) -> Query<P> {
        Query {
            session: self.session.clone(),
            projection,
            spec: SelectSpec::default(),
        }
    }

    /// Select an entity from its own table
    pub fn select_from<P>(&self, path: &P) -> Query<P>
    where
        P: EntityPath + Projection,
    {
        self.select(path.clone()).from(path)
    }
}

/// A query bound to a session and a projection
pub struct Query<P> {
    session: Session,
    projection: P,
    spec: SelectSpec,
}

impl<P> SelectBuilder for Query<P> {
    fn spec_mut(&mut self) -> &mut SelectSpec {
        &mut self.spec
    }
}

impl<P: Projection> Query<P> {
    /// Validated model with the projection expanded into select items
    pub fn plan(&self) -> Result<SelectSpec, QueryError> {
        let mut spec = self.spec.clone();
        spec.select = self.projection.select_items(&spec.fetches());
        spec.validate(&[])?;
        Ok(spec)
    }

    /// The PostgreSQL statement and its bound parameters
    pub fn to_sql(&self) -> Result<(String, Vec<SqlValue>), QueryError> {
        Ok(SqlGenerator::build_select(&self.plan()?))
    }

    pub async fn fetch(&self) -> Result<Vec<P::Output>, QueryError> {
        let plan = self.plan()?;
        self.run(&plan).await
    }

    /// Exactly one row, or `NoResult` / `NonUniqueResult`
    pub async fn fetch_one(&self) -> Result<P::Output, QueryError> {
        let mut rows = self.fetch().await?;
        match rows.len() {
            0 => Err(QueryError::NoResult),
            1 => rows.pop().ok_or(QueryError::NoResult),
            count => Err(QueryError::NonUniqueResult { count }),
        }
    }

    /// First row after ordering, if any
    pub async fn fetch_first(&self) -> Result<Option<P::Output>, QueryError> {
        let mut plan = self.plan()?;
        let limit = plan.pagination.limit.map_or(1, |limit| limit.min(1));
        plan.pagination = plan.pagination.clone().with_limit(limit);
        Ok(self.run(&plan).await?.into_iter().next())
    }

    /// Number of rows the query yields, ignoring ordering and paging
    pub async fn fetch_count(&self) -> Result<i64, QueryError> {
        let plan = self.plan()?;
        self.session.count(&plan.for_count()).await
    }

    /// One page of results together with the unpaged total
    pub async fn fetch_results(&self) -> Result<QueryResults<P::Output>, QueryError> {
        let plan = self.plan()?;
        let total = self.session.count(&plan.for_count()).await?;
        let results = self.run(&plan).await?;
        Ok(QueryResults::new(
            total,
            plan.pagination.offset,
            plan.pagination.limit,
            results,
        ))
    }

    async fn run(&self, plan: &SelectSpec) -> Result<Vec<P::Output>, QueryError> {
        let rows = self.session.select(plan).await?;
        let ctx = LoadContext::new(self.session.downgrade(), plan.fetches());
        let width = plan.select.len();

        rows.into_iter()
            .map(|values| {
                if values.len() != width {
                    return Err(QueryError::MalformedRow {
                        expected: width,
                        found: values.len(),
                    });
                }
                let mut cursor = RowCursor::new(values);
                self.projection.decode(&mut cursor, &ctx)
            })
            .collect()
    }
}

impl<P> Query<P> {
    pub fn spec(&self) -> &SelectSpec {
        &self.spec
    }
}
