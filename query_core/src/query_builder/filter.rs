//! Predicates
//!
//! Filters are built from typed expressions (`member.age.gt(10)`) and
//! composed with [`QueryFilter::and`], [`QueryFilter::or`] and
//! [`QueryFilter::not`].

use crate::query_builder::expr::ExprNode;
use crate::query_builder::select::SelectSpec;

/// Query condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    Between,   // BETWEEN .. AND ..
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

impl QueryOperator {
    /// SQL symbol of a binary comparison
    pub fn symbol(&self) -> &'static str {
        match self {
            QueryOperator::Eq => "=",
            QueryOperator::Ne => "!=",
            QueryOperator::Gt => ">",
            QueryOperator::Gte => ">=",
            QueryOperator::Lt => "<",
            QueryOperator::Lte => "<=",
            QueryOperator::Like => "LIKE",
            QueryOperator::Between => "BETWEEN",
            QueryOperator::In => "IN",
            QueryOperator::NotIn => "NOT IN",
            QueryOperator::IsNull => "IS NULL",
            QueryOperator::IsNotNull => "IS NOT NULL",
        }
    }
}

/// Right-hand side of a condition
#[derive(Debug, Clone)]
pub enum Operand {
    /// IS NULL / IS NOT NULL
    None,
    Value(ExprNode),
    Range(ExprNode, ExprNode),
    List(Vec<ExprNode>),
    SubQuery(Box<SelectSpec>),
}

/// Single condition in WHERE, ON or HAVING
#[derive(Debug, Clone)]
pub struct QueryCondition {
    pub left: ExprNode,
    pub operator: QueryOperator,
    pub operand: Operand,
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            LogicalOperator::And => " AND ",
            LogicalOperator::Or => " OR ",
        }
    }
}

/// Query filter that can be nested
#[derive(Debug, Clone)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
    Not(Box<QueryFilter>),
}

impl QueryFilter {
    pub fn condition(left: ExprNode, operator: QueryOperator, operand: Operand) -> Self {
        Self::Condition(QueryCondition {
            left,
            operator,
            operand,
        })
    }

    /// AND group; an empty group is always true
    pub fn all(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// OR group; an empty group is always false
    pub fn any(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    pub fn and(self, other: QueryFilter) -> Self {
        self.combine(LogicalOperator::And, other)
    }

    pub fn or(self, other: QueryFilter) -> Self {
        self.combine(LogicalOperator::Or, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    // Flattens `a.and(b).and(c)` into a single group
    fn combine(self, operator: LogicalOperator, other: QueryFilter) -> Self {
        match self {
            QueryFilter::Group {
                operator: existing,
                mut filters,
            } if existing == operator => {
                filters.push(other);
                QueryFilter::Group { operator, filters }
            }
            first => QueryFilter::Group {
                operator,
                filters: vec![first, other],
            },
        }
    }

    /// Visit every expression referenced at this query level
    pub(crate) fn for_each_expr(&self, visit: &mut dyn FnMut(&ExprNode)) {
        match self {
            QueryFilter::Condition(condition) => {
                visit(&condition.left);
                match &condition.operand {
                    Operand::None | Operand::SubQuery(_) => {}
                    Operand::Value(value) => visit(value),
                    Operand::Range(low, high) => {
                        visit(low);
                        visit(high);
                    }
                    Operand::List(values) => values.iter().for_each(|v| visit(v)),
                }
            }
            QueryFilter::Group { filters, .. } => {
                filters.iter().for_each(|f| f.for_each_expr(visit));
            }
            QueryFilter::Not(inner) => inner.for_each_expr(visit),
        }
    }

    /// Subqueries used as `IN (SELECT ..)` operands at this level
    pub(crate) fn for_each_subquery(&self, visit: &mut dyn FnMut(&SelectSpec)) {
        match self {
            QueryFilter::Condition(QueryCondition {
                operand: Operand::SubQuery(spec),
                ..
            }) => visit(spec),
            QueryFilter::Condition(_) => {}
            QueryFilter::Group { filters, .. } => {
                filters.iter().for_each(|f| f.for_each_subquery(visit));
            }
            QueryFilter::Not(inner) => inner.for_each_subquery(visit),
        }
    }
}
