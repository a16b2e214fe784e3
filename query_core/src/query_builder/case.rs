//! CASE expressions
//!
//! Simple form: `member.age.when(10).then("ten").when(20).then("twenty").otherwise("other")`
//!
//! Searched form:
//! `CaseBuilder::new().when(member.age.between(0, 20)).then("young").otherwise("old")`
//!
//! The first `then` fixes the result type; later branches must belong to the
//! same value family.

use crate::query_builder::expr::{Comparable, Expr, ExprNode, IntoLiteral, IntoOperand};
use crate::query_builder::filter::QueryFilter;
use std::marker::PhantomData;
use type_mapping::ValueType;

#[derive(Debug, Clone)]
pub enum CaseExpr {
    Simple {
        operand: ExprNode,
        arms: Vec<(ExprNode, ExprNode)>,
        otherwise: ExprNode,
    },
    Searched {
        arms: Vec<(QueryFilter, ExprNode)>,
        otherwise: ExprNode,
    },
}

impl CaseExpr {
    pub fn value_type(&self) -> Option<ValueType> {
        let (results, otherwise): (Vec<&ExprNode>, &ExprNode) = match self {
            CaseExpr::Simple { arms, otherwise, .. } => (arms.iter().map(|(_, r)| r).collect(), otherwise),
            CaseExpr::Searched { arms, otherwise } => (arms.iter().map(|(_, r)| r).collect(), otherwise),
        };
        results
            .into_iter()
            .chain(std::iter::once(otherwise))
            .find_map(ExprNode::value_type)
    }

    pub fn contains_aggregate(&self) -> bool {
        match self {
            CaseExpr::Simple {
                operand,
                arms,
                otherwise,
            } => {
                operand.contains_aggregate()
                    || otherwise.contains_aggregate()
                    || arms
                        .iter()
                        .any(|(w, r)| w.contains_aggregate() || r.contains_aggregate())
            }
            CaseExpr::Searched { arms, otherwise } => {
                let mut found = otherwise.contains_aggregate();
                for (condition, result) in arms {
                    found |= result.contains_aggregate();
                    condition.for_each_expr(&mut |e| found |= e.contains_aggregate());
                }
                found
            }
        }
    }

    /// Visit every expression at this query level
    pub(crate) fn for_each_expr(&self, visit: &mut dyn FnMut(&ExprNode)) {
        match self {
            CaseExpr::Simple {
                operand,
                arms,
                otherwise,
            } => {
                visit(operand);
                for (when, result) in arms {
                    visit(when);
                    visit(result);
                }
                visit(otherwise);
            }
            CaseExpr::Searched { arms, otherwise } => {
                for (condition, result) in arms {
                    condition.for_each_expr(visit);
                    visit(result);
                }
                visit(otherwise);
            }
        }
    }
}

/// `CASE operand WHEN value` awaiting its first `then`
pub struct SimpleCaseWhen<T> {
    operand: ExprNode,
    pending: ExprNode,
    _type: PhantomData<fn() -> T>,
}

impl<T: Comparable> SimpleCaseWhen<T> {
    pub(crate) fn new(operand: ExprNode, pending: ExprNode) -> Self {
        Self {
            operand,
            pending,
            _type: PhantomData,
        }
    }

    pub fn then<V: IntoLiteral>(self, result: V) -> SimpleCase<T, V::Type> {
        SimpleCase {
            operand: self.operand,
            arms: vec![(self.pending, ExprNode::Literal(result.into_literal()))],
            _type: PhantomData,
        }
    }
}

/// Simple CASE with at least one branch
pub struct SimpleCase<T, R> {
    operand: ExprNode,
    arms: Vec<(ExprNode, ExprNode)>,
    _type: PhantomData<fn() -> (T, R)>,
}

impl<T: Comparable, R: Comparable> SimpleCase<T, R> {
    pub fn when(self, value: impl IntoOperand<T::Family>) -> SimpleCaseThen<T, R> {
        SimpleCaseThen {
            case: self,
            pending: value.into_operand(),
        }
    }

    pub fn otherwise(self, result: impl IntoOperand<R::Family>) -> Expr<R> {
        Expr::from_node(ExprNode::Case(Box::new(CaseExpr::Simple {
            operand: self.operand,
            arms: self.arms,
            otherwise: result.into_operand(),
        })))
    }
}

pub struct SimpleCaseThen<T, R> {
    case: SimpleCase<T, R>,
    pending: ExprNode,
}

impl<T: Comparable, R: Comparable> SimpleCaseThen<T, R> {
    pub fn then(mut self, result: impl IntoOperand<R::Family>) -> SimpleCase<T, R> {
        self.case.arms.push((self.pending, result.into_operand()));
        self.case
    }
}

/// Entry point of a searched CASE expression
#[derive(Debug, Default, Clone, Copy)]
pub struct CaseBuilder;

impl CaseBuilder {
    pub fn new() -> Self {
        CaseBuilder
    }

    pub fn when(self, condition: QueryFilter) -> CaseWhen {
        CaseWhen { condition }
    }
}

pub struct CaseWhen {
    condition: QueryFilter,
}

impl CaseWhen {
    pub fn then<V: IntoLiteral>(self, result: V) -> Cases<V::Type> {
        Cases {
            arms: vec![(self.condition, ExprNode::Literal(result.into_literal()))],
            _type: PhantomData,
        }
    }
}

/// Searched CASE with at least one branch
pub struct Cases<R> {
    arms: Vec<(QueryFilter, ExprNode)>,
    _type: PhantomData<fn() -> R>,
}

impl<R: Comparable> Cases<R> {
    pub fn when(self, condition: QueryFilter) -> CasesWhen<R> {
        CasesWhen {
            cases: self,
            condition,
        }
    }

    pub fn otherwise(self, result: impl IntoOperand<R::Family>) -> Expr<R> {
        Expr::from_node(ExprNode::Case(Box::new(CaseExpr::Searched {
            arms: self.arms,
            otherwise: result.into_operand(),
        })))
    }
}

pub struct CasesWhen<R> {
    cases: Cases<R>,
    condition: QueryFilter,
}

impl<R: Comparable> CasesWhen<R> {
    pub fn then(mut self, result: impl IntoOperand<R::Family>) -> Cases<R> {
        self.cases.arms.push((self.condition, result.into_operand()));
        self.cases
    }
}
