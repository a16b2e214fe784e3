//! Joins
//!
//! A join either follows a declared association (`join(&member.team, &team)`)
//! or names an arbitrary entity and relies entirely on `on(..)`.

use crate::query_builder::expr::ExprNode;
use crate::query_builder::filter::QueryFilter;
use crate::schema::{RelationKind, RelationSchema, TableSchema};
use crate::traits::Entity;
use std::marker::PhantomData;
use type_mapping::ValueType;

/// Represents the type of SQL JOIN operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN - returns rows that have matching values in both tables
    Inner,
    /// LEFT JOIN - keeps every left row, padding the right side with NULLs
    Left,
}

impl JoinType {
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

/// How the joined rows are matched
#[derive(Debug, Clone)]
pub enum JoinCondition {
    /// Key equality derived from a declared association
    Relation {
        source_alias: String,
        relation: &'static str,
        kind: RelationKind,
        source_key: ExprNode,
        target_key: ExprNode,
    },
    /// Entity-only join, matched by the ON clause alone
    Entity,
}

/// Represents a complete JOIN clause
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: &'static TableSchema,
    pub alias: String,
    pub condition: JoinCondition,
    /// Extra ON conditions, ANDed with the relation keys
    pub on: Option<QueryFilter>,
    /// Load the association together with its owner
    pub fetch: bool,
}

impl JoinClause {
    pub fn relation(
        join_type: JoinType,
        source_alias: &str,
        source: &'static TableSchema,
        relation: &'static RelationSchema,
        alias: &str,
    ) -> Result<Self, String> {
        let target = relation.target_schema();
        let (source_key, target_key) = match relation.kind {
            RelationKind::ManyToOne { join_column } => (
                key_column(source, source_alias, join_column),
                key_column(target, alias, target.primary_key),
            ),
            RelationKind::OneToMany { mapped_by } => {
                let foreign_key = relation.foreign_key().ok_or_else(|| {
                    format!(
                        "relation {}.{} is mapped by '{}', which is not a many-to-one association of {}",
                        source.entity, relation.name, mapped_by, target.entity
                    )
                })?;
                (
                    key_column(source, source_alias, source.primary_key),
                    key_column(target, alias, foreign_key),
                )
            }
        };

        Ok(Self {
            join_type,
            table: target,
            alias: alias.to_string(),
            condition: JoinCondition::Relation {
                source_alias: source_alias.to_string(),
                relation: relation.name,
                kind: relation.kind,
                source_key,
                target_key,
            },
            on: None,
            fetch: false,
        })
    }

    pub fn entity(join_type: JoinType, table: &'static TableSchema, alias: &str) -> Self {
        Self {
            join_type,
            table,
            alias: alias.to_string(),
            condition: JoinCondition::Entity,
            on: None,
            fetch: false,
        }
    }

    pub fn add_on(&mut self, filter: QueryFilter) {
        self.on = Some(match self.on.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
    }

    /// The fetch this join contributes, if it is a fetch join
    pub fn fetch_join(&self) -> Option<FetchJoin> {
        match &self.condition {
            JoinCondition::Relation {
                source_alias,
                relation,
                ..
            } if self.fetch => Some(FetchJoin {
                source_alias: source_alias.clone(),
                relation: *relation,
                target_alias: self.alias.clone(),
            }),
            _ => None,
        }
    }
}

fn key_column(schema: &TableSchema, alias: &str, column: &'static str) -> ExprNode {
    let value_type = schema
        .column(column)
        .map(|c| c.value_type)
        .unwrap_or(ValueType::Uuid);
    ExprNode::column(alias, column, value_type)
}

/// An association loaded together with its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJoin {
    pub source_alias: String,
    pub relation: &'static str,
    pub target_alias: String,
}

impl FetchJoin {
    /// Alias under which `relation` of `source_alias` was fetched
    pub fn target_alias<'a>(fetches: &'a [FetchJoin], source_alias: &str, relation: &str) -> Option<&'a str> {
        fetches
            .iter()
            .find(|f| f.source_alias == source_alias && f.relation == relation)
            .map(|f| f.target_alias.as_str())
    }
}

/// Typed handle to an association of an aliased entity, e.g. `member.team`
pub struct RelationPath<T> {
    source_alias: String,
    source: &'static TableSchema,
    relation: &'static RelationSchema,
    _target: PhantomData<fn() -> T>,
}

impl<T> Clone for RelationPath<T> {
    fn clone(&self) -> Self {
        Self {
            source_alias: self.source_alias.clone(),
            source: self.source,
            relation: self.relation,
            _target: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for RelationPath<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RelationPath({}.{})", self.source_alias, self.relation.name)
    }
}

impl<T: Entity> RelationPath<T> {
    pub fn new(source_alias: &str, source: &'static TableSchema, relation: &'static RelationSchema) -> Self {
        Self {
            source_alias: source_alias.to_string(),
            source,
            relation,
            _target: PhantomData,
        }
    }

    pub fn source_alias(&self) -> &str {
        &self.source_alias
    }

    pub fn source(&self) -> &'static TableSchema {
        self.source
    }

    pub fn relation(&self) -> &'static RelationSchema {
        self.relation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::{MEMBER, TEAM};

    #[test]
    fn test_join_type_to_sql() {
        assert_eq!(JoinType::Inner.to_sql(), "INNER JOIN");
        assert_eq!(JoinType::Left.to_sql(), "LEFT JOIN");
    }

    #[test]
    fn test_many_to_one_keys() {
        let relation = MEMBER.relation("team").unwrap();
        let join = JoinClause::relation(JoinType::Inner, "member", &MEMBER, relation, "t").unwrap();
        let JoinCondition::Relation { source_key, target_key, .. } = &join.condition else {
            panic!("expected relation join");
        };
        assert!(source_key.same_as(&ExprNode::column("member", "team_id", ValueType::Uuid)));
        assert!(target_key.same_as(&ExprNode::column("t", "team_id", ValueType::Uuid)));
        assert_eq!(join.table.name, "team");
    }

    #[test]
    fn test_one_to_many_keys() {
        let relation = TEAM.relation("members").unwrap();
        let join = JoinClause::relation(JoinType::Left, "team", &TEAM, relation, "m").unwrap();
        let JoinCondition::Relation { source_key, target_key, .. } = &join.condition else {
            panic!("expected relation join");
        };
        assert!(source_key.same_as(&ExprNode::column("team", "team_id", ValueType::Uuid)));
        assert!(target_key.same_as(&ExprNode::column("m", "team_id", ValueType::Uuid)));
    }

    #[test]
    fn test_fetch_join_only_for_flagged_relation_joins() {
        let relation = MEMBER.relation("team").unwrap();
        let mut join = JoinClause::relation(JoinType::Inner, "member", &MEMBER, relation, "team").unwrap();
        assert_eq!(join.fetch_join(), None);
        join.fetch = true;
        assert_eq!(
            join.fetch_join(),
            Some(FetchJoin {
                source_alias: "member".into(),
                relation: "team",
                target_alias: "team".into(),
            })
        );

        let mut entity_join = JoinClause::entity(JoinType::Left, &TEAM, "team");
        entity_join.fetch = true;
        assert_eq!(entity_join.fetch_join(), None);
    }
}
