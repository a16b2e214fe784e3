//! PostgreSQL rendering of a [`SelectSpec`]
//!
//! Literals always become `$n` placeholders. The counter is shared across
//! the whole statement, subqueries included, so parameters line up with the
//! order in which their placeholders appear.

use crate::query_builder::case::CaseExpr;
use crate::query_builder::expr::ExprNode;
use crate::query_builder::filter::{LogicalOperator, Operand, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::join::{JoinClause, JoinCondition};
use crate::query_builder::ordering::OrderSpecifier;
use crate::query_builder::select::SelectSpec;
use crate::validation::quote_identifier;
use type_mapping::SqlValue;

pub struct SqlGenerator;

impl SqlGenerator {
    /// Full SELECT statement and its parameters
    pub fn build_select(spec: &SelectSpec) -> (String, Vec<SqlValue>) {
        let mut values = Vec::new();
        let sql = Self::select_sql(spec, &mut values);
        (sql, values)
    }

    /// `SELECT COUNT(*)` over the query without ordering and paging
    pub fn build_count(spec: &SelectSpec) -> (String, Vec<SqlValue>) {
        let mut values = Vec::new();
        let inner = Self::select_sql(&spec.for_count(), &mut values);
        (
            format!("SELECT COUNT(*) FROM ({}) AS \"counted\"", inner),
            values,
        )
    }

    fn select_sql(spec: &SelectSpec, values: &mut Vec<SqlValue>) -> String {
        let select_clause = spec
            .select
            .iter()
            .map(|expr| Self::expr_sql(expr, values))
            .collect::<Vec<_>>()
            .join(", ");
        let mut parts = vec![
            format!("SELECT {}", select_clause),
            format!("FROM {}", Self::build_from_clause(spec)),
        ];

        let join_clause = Self::build_join_clause(&spec.joins, values);
        if !join_clause.is_empty() {
            parts.push(join_clause);
        }

        let where_clause = Self::build_where_clause(&spec.conditions, values);
        if !where_clause.is_empty() {
            parts.push(where_clause);
        }

        if let Some(group_by) = &spec.group_by {
            if !group_by.fields.is_empty() {
                let fields = group_by
                    .fields
                    .iter()
                    .map(|expr| Self::expr_sql(expr, values))
                    .collect::<Vec<_>>()
                    .join(", ");
                parts.push(format!("GROUP BY {}", fields));
            }
            if group_by.has_having() {
                parts.push(format!(
                    "HAVING {}",
                    Self::conjunction(group_by.having_conditions(), values)
                ));
            }
        }

        let order_clause = Self::build_order_clause(&spec.order_by, values);
        if !order_clause.is_empty() {
            parts.push(order_clause);
        }

        let limit_clause = spec.pagination.to_sql();
        if !limit_clause.is_empty() {
            parts.push(limit_clause);
        }

        parts.join(" ")
    }

    fn build_from_clause(spec: &SelectSpec) -> String {
        spec.sources
            .iter()
            .map(|source| {
                format!(
                    "{} AS {}",
                    quote_identifier(source.table.name),
                    quote_identifier(&source.alias)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn build_join_clause(joins: &[JoinClause], values: &mut Vec<SqlValue>) -> String {
        joins
            .iter()
            .map(|join| {
                let table_part = format!(
                    "{} AS {}",
                    quote_identifier(join.table.name),
                    quote_identifier(&join.alias)
                );

                let mut conditions = Vec::new();
                if let JoinCondition::Relation {
                    source_key,
                    target_key,
                    ..
                } = &join.condition
                {
                    conditions.push(format!(
                        "{} = {}",
                        Self::expr_sql(source_key, values),
                        Self::expr_sql(target_key, values)
                    ));
                }
                if let Some(on) = &join.on {
                    conditions.push(Self::filter_sql(on, values));
                }
                // an entity join without ON is rejected by validation
                let condition_part = if conditions.is_empty() {
                    "TRUE".to_string()
                } else {
                    conditions.join(" AND ")
                };

                format!("{} {} ON {}", join.join_type.to_sql(), table_part, condition_part)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build WHERE clause from conditions
    fn build_where_clause(conditions: &[QueryFilter], values: &mut Vec<SqlValue>) -> String {
        if conditions.is_empty() {
            return String::new();
        }
        format!("WHERE {}", Self::conjunction(conditions, values))
    }

    fn conjunction(conditions: &[QueryFilter], values: &mut Vec<SqlValue>) -> String {
        conditions
            .iter()
            .map(|condition| Self::filter_sql(condition, values))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn build_order_clause(order_by: &[OrderSpecifier], values: &mut Vec<SqlValue>) -> String {
        if order_by.is_empty() {
            return String::new();
        }

        let order_items: Vec<String> = order_by
            .iter()
            .map(|order| format!("{} {}", Self::expr_sql(&order.target, values), order.direction_sql()))
            .collect();

        format!("ORDER BY {}", order_items.join(", "))
    }

    fn placeholder(value: &SqlValue, values: &mut Vec<SqlValue>) -> String {
        values.push(value.clone());
        format!("${}", values.len())
    }

    pub(crate) fn expr_sql(expr: &ExprNode, values: &mut Vec<SqlValue>) -> String {
        match expr {
            ExprNode::Column { alias, column, .. } => {
                format!("{}.{}", quote_identifier(alias), quote_identifier(column))
            }
            ExprNode::Literal(value) => Self::placeholder(value, values),
            ExprNode::Aggregate { function, arg } => match arg {
                Some(arg) => {
                    let arg_sql = Self::expr_sql(arg, values);
                    function.render(&arg_sql, arg.value_type())
                }
                None => format!("{}(*)", function.to_sql()),
            },
            ExprNode::Case(case) => Self::case_sql(case, values),
            ExprNode::SubQuery(spec) => format!("({})", Self::select_sql(spec, values)),
        }
    }

    fn case_sql(case: &CaseExpr, values: &mut Vec<SqlValue>) -> String {
        let mut sql = String::from("CASE");
        match case {
            CaseExpr::Simple {
                operand,
                arms,
                otherwise,
            } => {
                sql.push(' ');
                sql.push_str(&Self::expr_sql(operand, values));
                for (when, then) in arms {
                    let when = Self::expr_sql(when, values);
                    let then = Self::expr_sql(then, values);
                    sql.push_str(&format!(" WHEN {} THEN {}", when, then));
                }
                sql.push_str(&format!(" ELSE {} END", Self::expr_sql(otherwise, values)));
            }
            CaseExpr::Searched { arms, otherwise } => {
                for (condition, then) in arms {
                    let condition = Self::filter_sql(condition, values);
                    let then = Self::expr_sql(then, values);
                    sql.push_str(&format!(" WHEN {} THEN {}", condition, then));
                }
                sql.push_str(&format!(" ELSE {} END", Self::expr_sql(otherwise, values)));
            }
        }
        sql
    }

    pub(crate) fn filter_sql(filter: &QueryFilter, values: &mut Vec<SqlValue>) -> String {
        match filter {
            QueryFilter::Condition(condition) => Self::condition_sql(condition, values),
            QueryFilter::Group { operator, filters } => {
                if filters.is_empty() {
                    return match operator {
                        LogicalOperator::And => "1=1".to_string(),
                        LogicalOperator::Or => "1=0".to_string(),
                    };
                }
                let group_conditions = filters
                    .iter()
                    .map(|f| Self::filter_sql(f, values))
                    .collect::<Vec<_>>()
                    .join(operator.to_sql());

                format!("({})", group_conditions)
            }
            QueryFilter::Not(inner) => format!("NOT ({})", Self::filter_sql(inner, values)),
        }
    }

    fn condition_sql(condition: &QueryCondition, values: &mut Vec<SqlValue>) -> String {
        let left = Self::expr_sql(&condition.left, values);
        let operator = condition.operator;

        match (&condition.operand, operator) {
            (_, QueryOperator::IsNull) | (_, QueryOperator::IsNotNull) => {
                format!("{} {}", left, operator.symbol())
            }
            (Operand::Range(low, high), _) => {
                let low = Self::expr_sql(low, values);
                let high = Self::expr_sql(high, values);
                format!("{} BETWEEN {} AND {}", left, low, high)
            }
            (Operand::List(items), QueryOperator::In | QueryOperator::NotIn) => {
                if items.is_empty() {
                    // IN () is never true, NOT IN () always is
                    return if operator == QueryOperator::In { "1=0" } else { "1=1" }.to_string();
                }
                let placeholders = items
                    .iter()
                    .map(|item| Self::expr_sql(item, values))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} {} ({})", left, operator.symbol(), placeholders)
            }
            (Operand::SubQuery(spec), _) => {
                format!("{} {} ({})", left, operator.symbol(), Self::select_sql(spec, values))
            }
            (Operand::Value(right), _) => {
                format!("{} {} {}", left, operator.symbol(), Self::expr_sql(right, values))
            }
            // malformed combinations cannot be built through the typed API
            _ => "1=0".to_string(),
        }
    }
}
