//! Relational evaluation of a [`SelectSpec`] over in-memory tables
//!
//! Semantics follow PostgreSQL: comparisons with NULL are unknown, WHERE,
//! ON and HAVING keep only rows that are true, aggregates ignore NULLs and
//! an ungrouped aggregate query yields one row even over no input.

use super::MemTable;
use crate::errors::QueryError;
use crate::query_builder::aggregation::AggregateFunction;
use crate::query_builder::case::CaseExpr;
use crate::query_builder::expr::ExprNode;
use crate::query_builder::filter::{LogicalOperator, Operand, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::join::{JoinClause, JoinCondition, JoinType};
use crate::query_builder::ordering::{OrderSpecifier, SortOrder};
use crate::query_builder::select::SelectSpec;
use crate::schema::TableSchema;
use std::cmp::Ordering;
use std::collections::HashMap;
use type_mapping::{compare_values, same_group_value, sort_values, values_equal, SqlValue};

/// One row of the FROM/JOIN product; `None` is the NULL side of a left join
type JoinedRow = Vec<Option<Vec<SqlValue>>>;

struct Binding {
    alias: String,
    schema: &'static TableSchema,
}

struct Scope<'a> {
    bindings: &'a [Binding],
    row: &'a [Option<Vec<SqlValue>>],
    /// Rows of the current group, present while evaluating a grouped query
    group: Option<&'a [JoinedRow]>,
    /// Enclosing query, for correlated subqueries
    outer: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    fn column(&self, alias: &str, column: &str) -> Result<SqlValue, QueryError> {
        if let Some(index) = self.bindings.iter().position(|b| b.alias == alias) {
            let position = self.bindings[index].schema.column_index(column).ok_or_else(|| {
                QueryError::translation(format!("column {}.{} does not exist", alias, column))
            })?;
            return Ok(match self.row.get(index) {
                Some(Some(values)) => values.get(position).cloned().unwrap_or(SqlValue::Null),
                _ => SqlValue::Null,
            });
        }
        match self.outer {
            Some(outer) => outer.column(alias, column),
            None => Err(QueryError::translation(format!("unknown alias '{}'", alias))),
        }
    }
}

pub(crate) struct Evaluator<'t> {
    tables: &'t HashMap<String, MemTable>,
}

impl<'t> Evaluator<'t> {
    pub(crate) fn new(tables: &'t HashMap<String, MemTable>) -> Self {
        Self { tables }
    }

    pub(crate) fn select(&self, spec: &SelectSpec) -> Result<Vec<Vec<SqlValue>>, QueryError> {
        self.run(spec, None)
    }

    pub(crate) fn count(&self, spec: &SelectSpec) -> Result<i64, QueryError> {
        Ok(self.run(&spec.for_count(), None)?.len() as i64)
    }

    fn run(&self, spec: &SelectSpec, outer: Option<&Scope<'_>>) -> Result<Vec<Vec<SqlValue>>, QueryError> {
        let (bindings, rows) = self.joined_rows(spec, outer)?;

        let mut kept = Vec::new();
        for row in rows {
            let scope = Scope {
                bindings: &bindings,
                row: &row,
                group: None,
                outer,
            };
            if self.all_true(&spec.conditions, &scope)? {
                kept.push(row);
            }
        }

        // (select values, order keys)
        let mut output: Vec<(Vec<SqlValue>, Vec<SqlValue>)> = Vec::new();
        if spec.is_aggregate() {
            let having = spec
                .group_by
                .as_ref()
                .map(|g| g.having_conditions())
                .unwrap_or(&[]);
            let empty: JoinedRow = vec![None; bindings.len()];

            for group in self.group_rows(spec, &bindings, kept, outer)? {
                let scope = Scope {
                    bindings: &bindings,
                    row: group.first().unwrap_or(&empty),
                    group: Some(&group),
                    outer,
                };
                if self.all_true(having, &scope)? {
                    output.push(self.project(spec, &scope)?);
                }
            }
        } else {
            for row in &kept {
                let scope = Scope {
                    bindings: &bindings,
                    row,
                    group: None,
                    outer,
                };
                output.push(self.project(spec, &scope)?);
            }
        }

        if !spec.order_by.is_empty() {
            output.sort_by(|(_, a), (_, b)| compare_keys(&spec.order_by, a, b));
        }
        let rows = output.into_iter().map(|(values, _)| values).collect();
        Ok(spec.pagination.apply(rows))
    }

    fn table(&self, schema: &TableSchema) -> Result<&'t MemTable, QueryError> {
        self.tables.get(schema.name).ok_or_else(|| {
            QueryError::database("select", format!("relation \"{}\" does not exist", schema.name))
        })
    }

    /// Cross product of the FROM sources, then each join in order
    fn joined_rows(
        &self,
        spec: &SelectSpec,
        outer: Option<&Scope<'_>>,
    ) -> Result<(Vec<Binding>, Vec<JoinedRow>), QueryError> {
        let mut bindings = Vec::new();
        let mut rows: Vec<JoinedRow> = vec![Vec::new()];

        for source in &spec.sources {
            let table = self.table(source.table)?;
            bindings.push(Binding {
                alias: source.alias.clone(),
                schema: source.table,
            });
            let mut next = Vec::with_capacity(rows.len() * table.rows.len());
            for row in &rows {
                for values in &table.rows {
                    let mut extended = row.clone();
                    extended.push(Some(values.clone()));
                    next.push(extended);
                }
            }
            rows = next;
        }

        for join in &spec.joins {
            let table = self.table(join.table)?;
            bindings.push(Binding {
                alias: join.alias.clone(),
                schema: join.table,
            });
            let mut next = Vec::new();
            for row in rows {
                let mut matched = false;
                for values in &table.rows {
                    let mut extended = row.clone();
                    extended.push(Some(values.clone()));
                    let scope = Scope {
                        bindings: &bindings,
                        row: &extended,
                        group: None,
                        outer,
                    };
                    if self.join_matches(join, &scope)? {
                        matched = true;
                        next.push(extended);
                    }
                }
                if !matched && join.join_type == JoinType::Left {
                    let mut padded = row;
                    padded.push(None);
                    next.push(padded);
                }
            }
            rows = next;
        }

        Ok((bindings, rows))
    }

    fn join_matches(&self, join: &JoinClause, scope: &Scope<'_>) -> Result<bool, QueryError> {
        if let JoinCondition::Relation {
            source_key,
            target_key,
            ..
        } = &join.condition
        {
            let source = self.eval(source_key, scope)?;
            let target = self.eval(target_key, scope)?;
            if values_equal(&source, &target) != Some(true) {
                return Ok(false);
            }
        }
        match &join.on {
            Some(on) => Ok(self.test(on, scope)? == Some(true)),
            None => Ok(true),
        }
    }

    /// Groups in order of first appearance; without GROUP BY all rows form
    /// one group, even when there are none
    fn group_rows(
        &self,
        spec: &SelectSpec,
        bindings: &[Binding],
        rows: Vec<JoinedRow>,
        outer: Option<&Scope<'_>>,
    ) -> Result<Vec<Vec<JoinedRow>>, QueryError> {
        let Some(group_by) = &spec.group_by else {
            return Ok(vec![rows]);
        };

        let mut keys: Vec<Vec<SqlValue>> = Vec::new();
        let mut groups: Vec<Vec<JoinedRow>> = Vec::new();
        for row in rows {
            let key = {
                let scope = Scope {
                    bindings,
                    row: &row,
                    group: None,
                    outer,
                };
                group_by
                    .fields
                    .iter()
                    .map(|field| self.eval(field, &scope))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let existing = keys.iter().position(|k| {
                k.iter().zip(&key).all(|(a, b)| same_group_value(a, b))
            });
            match existing {
                Some(index) => groups[index].push(row),
                None => {
                    keys.push(key);
                    groups.push(vec![row]);
                }
            }
        }
        Ok(groups)
    }

    fn project(&self, spec: &SelectSpec, scope: &Scope<'_>) -> Result<(Vec<SqlValue>, Vec<SqlValue>), QueryError> {
        let values = spec
            .select
            .iter()
            .map(|expr| self.eval(expr, scope))
            .collect::<Result<Vec<_>, _>>()?;
        let keys = spec
            .order_by
            .iter()
            .map(|order| self.eval(&order.target, scope))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((values, keys))
    }

    fn eval(&self, expr: &ExprNode, scope: &Scope<'_>) -> Result<SqlValue, QueryError> {
        match expr {
            ExprNode::Column { alias, column, .. } => scope.column(alias, column),
            ExprNode::Literal(value) => Ok(value.clone()),
            ExprNode::Aggregate { function, arg } => self.aggregate(*function, arg.as_deref(), scope),
            ExprNode::Case(case) => self.case(case, scope),
            ExprNode::SubQuery(spec) => {
                let rows = self.run(spec, Some(scope))?;
                if rows.len() > 1 {
                    return Err(QueryError::database(
                        "select",
                        format!(
                            "more than one row returned by a subquery used as an expression ({} rows)",
                            rows.len()
                        ),
                    ));
                }
                Ok(rows
                    .into_iter()
                    .next()
                    .and_then(|row| row.into_iter().next())
                    .unwrap_or(SqlValue::Null))
            }
        }
    }

    fn aggregate(
        &self,
        function: AggregateFunction,
        arg: Option<&ExprNode>,
        scope: &Scope<'_>,
    ) -> Result<SqlValue, QueryError> {
        let group = scope
            .group
            .ok_or_else(|| QueryError::translation("aggregate used outside of a grouped query"))?;
        let Some(arg) = arg else {
            return Ok(SqlValue::BigInt(group.len() as i64));
        };

        let mut values = Vec::new();
        for row in group {
            let row_scope = Scope {
                bindings: scope.bindings,
                row,
                group: None,
                outer: scope.outer,
            };
            let value = self.eval(arg, &row_scope)?;
            if !value.is_null() {
                values.push(value);
            }
        }
        fold_aggregate(function, values)
    }

    fn case(&self, case: &CaseExpr, scope: &Scope<'_>) -> Result<SqlValue, QueryError> {
        match case {
            CaseExpr::Simple {
                operand,
                arms,
                otherwise,
            } => {
                let value = self.eval(operand, scope)?;
                for (when, then) in arms {
                    let candidate = self.eval(when, scope)?;
                    if values_equal(&value, &candidate) == Some(true) {
                        return self.eval(then, scope);
                    }
                }
                self.eval(otherwise, scope)
            }
            CaseExpr::Searched { arms, otherwise } => {
                for (condition, then) in arms {
                    if self.test(condition, scope)? == Some(true) {
                        return self.eval(then, scope);
                    }
                }
                self.eval(otherwise, scope)
            }
        }
    }

    fn all_true(&self, filters: &[QueryFilter], scope: &Scope<'_>) -> Result<bool, QueryError> {
        for filter in filters {
            if self.test(filter, scope)? != Some(true) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Three-valued truth of a filter; `None` is unknown
    fn test(&self, filter: &QueryFilter, scope: &Scope<'_>) -> Result<Option<bool>, QueryError> {
        match filter {
            QueryFilter::Condition(condition) => self.test_condition(condition, scope),
            QueryFilter::Group { operator, filters } => {
                let mut unknown = false;
                for filter in filters {
                    match (operator, self.test(filter, scope)?) {
                        (LogicalOperator::And, Some(false)) => return Ok(Some(false)),
                        (LogicalOperator::Or, Some(true)) => return Ok(Some(true)),
                        (_, None) => unknown = true,
                        _ => {}
                    }
                }
                Ok(if unknown {
                    None
                } else {
                    Some(*operator == LogicalOperator::And)
                })
            }
            QueryFilter::Not(inner) => Ok(self.test(inner, scope)?.map(|value| !value)),
        }
    }

    fn test_condition(&self, condition: &QueryCondition, scope: &Scope<'_>) -> Result<Option<bool>, QueryError> {
        let left = self.eval(&condition.left, scope)?;
        let operator = condition.operator;

        match (&condition.operand, operator) {
            (_, QueryOperator::IsNull) => Ok(Some(left.is_null())),
            (_, QueryOperator::IsNotNull) => Ok(Some(!left.is_null())),
            (Operand::Range(low, high), _) => {
                let low = self.eval(low, scope)?;
                let high = self.eval(high, scope)?;
                Ok(and3(
                    compare_values(&left, &low).map(|o| o != Ordering::Less),
                    compare_values(&left, &high).map(|o| o != Ordering::Greater),
                ))
            }
            (Operand::List(items), _) => {
                let candidates = items
                    .iter()
                    .map(|item| self.eval(item, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(membership(operator, &left, &candidates))
            }
            (Operand::SubQuery(spec), _) => {
                let candidates: Vec<SqlValue> = self
                    .run(spec, Some(scope))?
                    .into_iter()
                    .filter_map(|row| row.into_iter().next())
                    .collect();
                Ok(membership(operator, &left, &candidates))
            }
            (Operand::Value(right), QueryOperator::Like) => {
                let pattern = self.eval(right, scope)?;
                Ok(match (left.as_str(), pattern.as_str()) {
                    (Some(text), Some(pattern)) => Some(like_matches(text, pattern)),
                    _ => None,
                })
            }
            (Operand::Value(right), _) => {
                let right = self.eval(right, scope)?;
                Ok(compare_values(&left, &right).map(|ordering| match operator {
                    QueryOperator::Eq => ordering == Ordering::Equal,
                    QueryOperator::Ne => ordering != Ordering::Equal,
                    QueryOperator::Gt => ordering == Ordering::Greater,
                    QueryOperator::Gte => ordering != Ordering::Less,
                    QueryOperator::Lt => ordering == Ordering::Less,
                    QueryOperator::Lte => ordering != Ordering::Greater,
                    _ => false,
                }))
            }
            (Operand::None, _) => Ok(None),
        }
    }
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// SQL `IN` / `NOT IN` over already evaluated candidates
fn membership(operator: QueryOperator, left: &SqlValue, candidates: &[SqlValue]) -> Option<bool> {
    let mut unknown = false;
    let mut found = false;
    for candidate in candidates {
        match values_equal(left, candidate) {
            Some(true) => {
                found = true;
                break;
            }
            Some(false) => {}
            None => unknown = true,
        }
    }
    let result = if found {
        Some(true)
    } else if unknown {
        None
    } else {
        Some(false)
    };
    if operator == QueryOperator::NotIn {
        result.map(|value| !value)
    } else {
        result
    }
}

fn compare_keys(order_by: &[OrderSpecifier], a: &[SqlValue], b: &[SqlValue]) -> Ordering {
    for (order, (x, y)) in order_by.iter().zip(a.iter().zip(b)) {
        let nulls_first = order.places_nulls_first();
        let ordering = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) if nulls_first => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, true) if nulls_first => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match order.order {
                SortOrder::Asc => sort_values(x, y),
                SortOrder::Desc => sort_values(x, y).reverse(),
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Aggregate over the non-NULL values of a group
fn fold_aggregate(function: AggregateFunction, values: Vec<SqlValue>) -> Result<SqlValue, QueryError> {
    let integers: Option<Vec<i64>> = values.iter().map(SqlValue::as_i64).collect();

    let result = match function {
        AggregateFunction::Count => SqlValue::BigInt(values.len() as i64),
        AggregateFunction::CountDistinct => {
            let mut distinct: Vec<&SqlValue> = Vec::new();
            for value in &values {
                if !distinct.iter().any(|d| same_group_value(d, value)) {
                    distinct.push(value);
                }
            }
            SqlValue::BigInt(distinct.len() as i64)
        }
        _ if values.is_empty() => SqlValue::Null,
        AggregateFunction::Sum => match integers {
            Some(integers) => integers
                .iter()
                .try_fold(0i64, |acc, v| acc.checked_add(*v))
                .map(SqlValue::BigInt)
                .ok_or_else(|| QueryError::database("select", "bigint out of range"))?,
            None => SqlValue::Double(float_sum(&values)),
        },
        AggregateFunction::Avg => match integers {
            Some(integers) => {
                let sum: i128 = integers.iter().map(|v| i128::from(*v)).sum();
                SqlValue::BigInt((sum / integers.len() as i128) as i64)
            }
            None => SqlValue::Double(float_sum(&values) / values.len() as f64),
        },
        AggregateFunction::AvgExact => SqlValue::Double(float_sum(&values) / values.len() as f64),
        AggregateFunction::Min => pick(values, Ordering::Less),
        AggregateFunction::Max => pick(values, Ordering::Greater),
    };
    Ok(result)
}

fn float_sum(values: &[SqlValue]) -> f64 {
    values.iter().filter_map(SqlValue::as_f64).sum()
}

// Keeps the first value among equals
fn pick(values: Vec<SqlValue>, wanted: Ordering) -> SqlValue {
    values
        .into_iter()
        .reduce(|best, candidate| {
            if compare_values(&candidate, &best) == Some(wanted) {
                candidate
            } else {
                best
            }
        })
        .unwrap_or(SqlValue::Null)
}

/// SQL `LIKE`: `%` matches any run of characters, `_` exactly one
#[derive(Clone, Copy, PartialEq)]
enum LikeToken {
    Any,
    One,
    Literal(char),
}

// backslash escapes the next character, as PostgreSQL's default ESCAPE
fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            c => LikeToken::Literal(c),
        });
    }
    tokens
}

pub(crate) fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = like_tokens(pattern);
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        let single = match pattern.get(p) {
            Some(LikeToken::One) => true,
            Some(LikeToken::Literal(c)) => *c == text[t],
            _ => false,
        };
        if single {
            t += 1;
            p += 1;
        } else if pattern.get(p) == Some(&LikeToken::Any) {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|token| *token == LikeToken::Any)
}
