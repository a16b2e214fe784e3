//! Typed expressions
//!
//! `Expr<T>` is a thin typed wrapper over the untyped [`ExprNode`] tree. The
//! type parameter is what a projected value decodes into, and it restricts
//! which operands a comparison accepts.

use crate::query_builder::aggregation::AggregateFunction;
use crate::query_builder::case::{CaseExpr, SimpleCaseWhen};
use crate::query_builder::filter::{Operand, QueryFilter, QueryOperator};
use crate::query_builder::ordering::{OrderSpecifier, SortOrder};
use crate::query_builder::select::SelectSpec;
use crate::query_builder::subquery::SubQuery;
use std::fmt;
use std::marker::PhantomData;
use type_mapping::{SqlType, SqlValue, ValueType};
use uuid::Uuid;

/// Untyped expression tree shared by the SQL writer and the memory engine
#[derive(Debug, Clone)]
pub enum ExprNode {
    Column {
        alias: String,
        column: &'static str,
        value_type: ValueType,
    },
    Literal(SqlValue),
    Aggregate {
        function: AggregateFunction,
        /// `None` for `COUNT(*)`
        arg: Option<Box<ExprNode>>,
    },
    Case(Box<CaseExpr>),
    SubQuery(Box<SelectSpec>),
}

impl ExprNode {
    pub fn column(alias: &str, column: &'static str, value_type: ValueType) -> Self {
        ExprNode::Column {
            alias: alias.to_string(),
            column,
            value_type,
        }
    }

    /// Type of the produced value, `None` for an untyped NULL literal
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            ExprNode::Column { value_type, .. } => Some(*value_type),
            ExprNode::Literal(value) => value.value_type(),
            ExprNode::Aggregate { function, arg } => {
                function.result_type(arg.as_ref().and_then(|a| a.value_type()))
            }
            ExprNode::Case(case) => case.value_type(),
            ExprNode::SubQuery(spec) => spec.select.first().and_then(ExprNode::value_type),
        }
    }

    /// Whether an aggregate appears at this query level
    pub fn contains_aggregate(&self) -> bool {
        match self {
            ExprNode::Aggregate { .. } => true,
            ExprNode::Case(case) => case.contains_aggregate(),
            ExprNode::Column { .. } | ExprNode::Literal(_) | ExprNode::SubQuery(_) => false,
        }
    }

    /// Visit this node and every node nested in it at the same query level.
    /// Subqueries are visited but not entered.
    pub fn walk(&self, visit: &mut dyn FnMut(&ExprNode)) {
        visit(self);
        match self {
            ExprNode::Aggregate { arg: Some(arg), .. } => arg.walk(visit),
            ExprNode::Case(case) => case.for_each_expr(&mut |e| e.walk(visit)),
            _ => {}
        }
    }

    /// Structural equality, used to match select items against GROUP BY
    pub fn same_as(&self, other: &ExprNode) -> bool {
        match (self, other) {
            (
                ExprNode::Column { alias: a1, column: c1, .. },
                ExprNode::Column { alias: a2, column: c2, .. },
            ) => a1 == a2 && c1 == c2,
            (ExprNode::Literal(a), ExprNode::Literal(b)) => a == b,
            _ => false,
        }
    }
}

/// Marker types grouping value types that compare with each other
pub mod family {
    #[derive(Debug)]
    pub struct Boolean;
    #[derive(Debug)]
    pub struct Number;
    #[derive(Debug)]
    pub struct Text;
    #[derive(Debug)]
    pub struct Identifier;
}

/// Value types usable in expressions
pub trait Comparable: SqlType {
    type Family: 'static;
}

impl Comparable for bool {
    type Family = family::Boolean;
}
impl Comparable for i32 {
    type Family = family::Number;
}
impl Comparable for i64 {
    type Family = family::Number;
}
impl Comparable for f64 {
    type Family = family::Number;
}
impl Comparable for String {
    type Family = family::Text;
}
impl Comparable for Uuid {
    type Family = family::Identifier;
}
impl<T: Comparable> Comparable for Option<T> {
    type Family = T::Family;
}

/// Numeric types and the types their sum and average produce
pub trait Numeric: Comparable<Family = family::Number> {
    type Sum: Comparable;
    type Avg: Comparable;
}

impl Numeric for i32 {
    type Sum = i64;
    type Avg = i64;
}
impl Numeric for i64 {
    type Sum = i64;
    type Avg = i64;
}
impl Numeric for f64 {
    type Sum = f64;
    type Avg = f64;
}

/// Anything usable as the right-hand side of a comparison against a value
/// of family `F`
pub trait IntoOperand<F> {
    fn into_operand(self) -> ExprNode;
}

macro_rules! literal_operand {
    ($($t:ty),*) => {
        $(
            impl IntoOperand<<$t as Comparable>::Family> for $t {
                fn into_operand(self) -> ExprNode {
                    ExprNode::Literal(self.into_sql_value())
                }
            }
        )*
    };
}

literal_operand!(bool, i32, i64, f64, String, Uuid);

impl IntoOperand<family::Text> for &str {
    fn into_operand(self) -> ExprNode {
        ExprNode::Literal(SqlValue::Text(self.to_string()))
    }
}

impl IntoOperand<family::Text> for &String {
    fn into_operand(self) -> ExprNode {
        ExprNode::Literal(SqlValue::Text(self.clone()))
    }
}

impl<T: Comparable> IntoOperand<T::Family> for Expr<T> {
    fn into_operand(self) -> ExprNode {
        self.node
    }
}

impl<T: Comparable> IntoOperand<T::Family> for &Expr<T> {
    fn into_operand(self) -> ExprNode {
        self.node.clone()
    }
}

impl<T: Comparable> IntoOperand<T::Family> for SubQuery<T> {
    fn into_operand(self) -> ExprNode {
        ExprNode::SubQuery(Box::new(self.into_spec()))
    }
}

/// Literal values whose type fixes the result type of a CASE expression
pub trait IntoLiteral {
    type Type: Comparable;

    fn into_literal(self) -> SqlValue;
}

macro_rules! literal_value {
    ($($t:ty),*) => {
        $(
            impl IntoLiteral for $t {
                type Type = $t;

                fn into_literal(self) -> SqlValue {
                    self.into_sql_value()
                }
            }
        )*
    };
}

literal_value!(bool, i32, i64, f64, String, Uuid);

impl IntoLiteral for &str {
    type Type = String;

    fn into_literal(self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

/// A typed expression producing values of type `T`
pub struct Expr<T> {
    node: ExprNode,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expr").field(&self.node).finish()
    }
}

/// Accepts an expression by value or by reference
pub trait IntoExpr<T> {
    fn into_expr(self) -> Expr<T>;
}

impl<T> IntoExpr<T> for Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self
    }
}

impl<T> IntoExpr<T> for &Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self.clone()
    }
}

impl<T> Expr<T> {
    pub fn from_node(node: ExprNode) -> Self {
        Self {
            node,
            _type: PhantomData,
        }
    }

    pub fn node(&self) -> &ExprNode {
        &self.node
    }

    pub fn into_node(self) -> ExprNode {
        self.node
    }
}

impl<T: Comparable> Expr<T> {
    /// Column `column` of the entity aliased as `alias`
    pub fn column(alias: &str, column: &'static str) -> Self {
        Self::from_node(ExprNode::column(alias, column, T::VALUE_TYPE))
    }

    pub fn literal(value: T) -> Self {
        Self::from_node(ExprNode::Literal(value.into_sql_value()))
    }

    fn compare(&self, operator: QueryOperator, rhs: ExprNode) -> QueryFilter {
        QueryFilter::condition(self.node.clone(), operator, Operand::Value(rhs))
    }

    pub fn eq(&self, rhs: impl IntoOperand<T::Family>) -> QueryFilter {
        self.compare(QueryOperator::Eq, rhs.into_operand())
    }

    pub fn ne(&self, rhs: impl IntoOperand<T::Family>) -> QueryFilter {
        self.compare(QueryOperator::Ne, rhs.into_operand())
    }

    pub fn gt(&self, rhs: impl IntoOperand<T::Family>) -> QueryFilter {
        self.compare(QueryOperator::Gt, rhs.into_operand())
    }

    pub fn gte(&self, rhs: impl IntoOperand<T::Family>) -> QueryFilter {
        self.compare(QueryOperator::Gte, rhs.into_operand())
    }

    pub fn lt(&self, rhs: impl IntoOperand<T::Family>) -> QueryFilter {
        self.compare(QueryOperator::Lt, rhs.into_operand())
    }

    pub fn lte(&self, rhs: impl IntoOperand<T::Family>) -> QueryFilter {
        self.compare(QueryOperator::Lte, rhs.into_operand())
    }

    /// Inclusive range check
    pub fn between(
        &self,
        low: impl IntoOperand<T::Family>,
        high: impl IntoOperand<T::Family>,
    ) -> QueryFilter {
        QueryFilter::condition(
            self.node.clone(),
            QueryOperator::Between,
            Operand::Range(low.into_operand(), high.into_operand()),
        )
    }

    pub fn is_in<V, I>(&self, values: I) -> QueryFilter
    where
        V: IntoOperand<T::Family>,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(IntoOperand::into_operand).collect();
        QueryFilter::condition(self.node.clone(), QueryOperator::In, Operand::List(values))
    }

    pub fn not_in<V, I>(&self, values: I) -> QueryFilter
    where
        V: IntoOperand<T::Family>,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(IntoOperand::into_operand).collect();
        QueryFilter::condition(self.node.clone(), QueryOperator::NotIn, Operand::List(values))
    }

    pub fn in_subquery<U>(&self, subquery: SubQuery<U>) -> QueryFilter
    where
        U: Comparable<Family = T::Family>,
    {
        QueryFilter::condition(
            self.node.clone(),
            QueryOperator::In,
            Operand::SubQuery(Box::new(subquery.into_spec())),
        )
    }

    pub fn is_null(&self) -> QueryFilter {
        QueryFilter::condition(self.node.clone(), QueryOperator::IsNull, Operand::None)
    }

    pub fn is_not_null(&self) -> QueryFilter {
        QueryFilter::condition(self.node.clone(), QueryOperator::IsNotNull, Operand::None)
    }

    pub fn asc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.node.clone(), SortOrder::Asc)
    }

    pub fn desc(&self) -> OrderSpecifier {
        OrderSpecifier::new(self.node.clone(), SortOrder::Desc)
    }

    fn aggregate<R>(&self, function: AggregateFunction) -> Expr<R> {
        Expr::from_node(ExprNode::Aggregate {
            function,
            arg: Some(Box::new(self.node.clone())),
        })
    }

    /// `COUNT(expr)`, ignoring NULLs
    pub fn count(&self) -> Expr<i64> {
        self.aggregate(AggregateFunction::Count)
    }

    pub fn count_distinct(&self) -> Expr<i64> {
        self.aggregate(AggregateFunction::CountDistinct)
    }

    pub fn max(&self) -> Expr<T> {
        self.aggregate(AggregateFunction::Max)
    }

    pub fn min(&self) -> Expr<T> {
        self.aggregate(AggregateFunction::Min)
    }

    /// Start a simple `CASE expr WHEN value THEN ...` expression
    pub fn when(&self, value: impl IntoOperand<T::Family>) -> SimpleCaseWhen<T> {
        SimpleCaseWhen::new(self.node.clone(), value.into_operand())
    }

    /// Same expression decoded as nullable, for columns that may be NULL in
    /// the result such as the right side of a left join
    pub fn optional(&self) -> Expr<Option<T>> {
        Expr::from_node(self.node.clone())
    }
}

impl Expr<String> {
    /// SQL `LIKE` with `%` and `_` wildcards
    pub fn like(&self, pattern: impl IntoOperand<family::Text>) -> QueryFilter {
        self.compare(QueryOperator::Like, pattern.into_operand())
    }

    /// Prefix match; `%` and `_` in `prefix` match literally
    pub fn starts_with(&self, prefix: &str) -> QueryFilter {
        self.like(format!("{}%", escape_like(prefix)))
    }

    pub fn contains(&self, fragment: &str) -> QueryFilter {
        self.like(format!("%{}%", escape_like(fragment)))
    }
}

/// Escape LIKE wildcards so `text` matches itself
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl<T: Numeric> Expr<T> {
    /// `SUM(expr)`; integer sums widen to `i64`
    pub fn sum(&self) -> Expr<T::Sum> {
        self.aggregate(AggregateFunction::Sum)
    }

    /// `AVG(expr)`; integer averages are truncated toward zero
    pub fn avg(&self) -> Expr<T::Avg> {
        self.aggregate(AggregateFunction::Avg)
    }

    /// `AVG(expr)` as a double regardless of the column type
    pub fn avg_exact(&self) -> Expr<f64> {
        self.aggregate(AggregateFunction::AvgExact)
    }
}

/// Free-standing expression constructors
pub mod expressions {
    use super::*;

    /// `COUNT(*)`
    pub fn count_all() -> Expr<i64> {
        Expr::from_node(ExprNode::Aggregate {
            function: AggregateFunction::Count,
            arg: None,
        })
    }

    /// A constant projected alongside columns
    pub fn constant<V: IntoLiteral>(value: V) -> Expr<V::Type> {
        Expr::from_node(ExprNode::Literal(value.into_literal()))
    }

    /// Start a subquery selecting `expr`
    pub fn select<T: Comparable>(expr: impl IntoExpr<T>) -> SubQuery<T> {
        SubQuery::new(expr.into_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::filter::QueryCondition;

    fn age() -> Expr<i32> {
        Expr::column("member", "age")
    }

    #[test]
    fn test_literal_operand_types() {
        let filter = age().eq(10);
        let QueryFilter::Condition(QueryCondition { operand, .. }) = filter else {
            panic!("expected a condition");
        };
        assert!(matches!(
            operand,
            Operand::Value(ExprNode::Literal(SqlValue::Integer(10)))
        ));
    }

    #[test]
    fn test_aggregate_result_types() {
        assert_eq!(age().sum().node().value_type(), Some(ValueType::BigInt));
        assert_eq!(age().avg().node().value_type(), Some(ValueType::BigInt));
        assert_eq!(age().avg_exact().node().value_type(), Some(ValueType::Double));
        assert_eq!(age().max().node().value_type(), Some(ValueType::Integer));
        assert_eq!(expressions::count_all().node().value_type(), Some(ValueType::BigInt));
    }

    #[test]
    fn test_contains_aggregate() {
        assert!(age().max().node().contains_aggregate());
        assert!(!age().node().contains_aggregate());
    }

    #[test]
    fn test_same_as() {
        assert!(age().node().same_as(Expr::<i32>::column("member", "age").node()));
        assert!(!age().node().same_as(Expr::<i32>::column("memberSub", "age").node()));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("member1"), "member1");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
