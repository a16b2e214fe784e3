use super::expr::ExprNode;
use super::filter::QueryFilter;

/// Represents a GROUP BY clause with optional HAVING conditions
#[derive(Debug, Clone)]
pub struct GroupBy {
    /// Expressions to group by
    pub fields: Vec<ExprNode>,
    /// Optional HAVING conditions for filtering grouped results
    pub having: Option<Vec<QueryFilter>>,
}

impl GroupBy {
    pub fn new(fields: Vec<ExprNode>) -> Self {
        Self {
            fields,
            having: None,
        }
    }

    pub fn single(field: ExprNode) -> Self {
        Self::new(vec![field])
    }

    /// Add a grouping expression
    pub fn then_by(mut self, field: ExprNode) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a single HAVING condition
    pub fn having(mut self, condition: QueryFilter) -> Self {
        match &mut self.having {
            Some(conditions) => conditions.push(condition),
            None => self.having = Some(vec![condition]),
        }
        self
    }

    pub fn has_having(&self) -> bool {
        self.having
            .as_ref()
            .map(|h| !h.is_empty())
            .unwrap_or(false)
    }

    pub fn having_conditions(&self) -> &[QueryFilter] {
        self.having.as_deref().unwrap_or(&[])
    }

    /// Whether `expr` is one of the grouping expressions
    pub fn groups_on(&self, expr: &ExprNode) -> bool {
        self.fields.iter().any(|field| field.same_as(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::expr::Expr;

    #[test]
    fn test_group_by_having_chain() {
        let team_name = Expr::<String>::column("team", "name");
        let age = Expr::<i32>::column("member", "age");
        let group_by = GroupBy::single(team_name.node().clone())
            .having(age.avg().gt(10))
            .having(age.count().gt(1));

        assert!(group_by.has_having());
        assert_eq!(group_by.having_conditions().len(), 2);
        assert!(group_by.groups_on(team_name.node()));
        assert!(!group_by.groups_on(age.node()));
    }

    #[test]
    fn test_has_having_empty() {
        let group_by = GroupBy::single(Expr::<i32>::column("member", "age").into_node());
        assert!(!group_by.has_having());

        let group_by_with_empty = GroupBy {
            fields: vec![],
            having: Some(vec![]),
        };
        assert!(!group_by_with_empty.has_having());
    }
}
