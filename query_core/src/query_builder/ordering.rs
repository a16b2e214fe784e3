use crate::query_builder::expr::ExprNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Placement of NULLs in a sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullHandling {
    /// PostgreSQL default: last when ascending, first when descending
    Default,
    NullsFirst,
    NullsLast,
}

/// One ORDER BY item
#[derive(Debug, Clone)]
pub struct OrderSpecifier {
    pub target: ExprNode,
    pub order: SortOrder,
    pub nulls: NullHandling,
}

impl OrderSpecifier {
    pub fn new(target: ExprNode, order: SortOrder) -> Self {
        Self {
            target,
            order,
            nulls: NullHandling::Default,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullHandling::NullsFirst;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullHandling::NullsLast;
        self
    }

    /// Whether NULLs sort before non-NULL values once defaults are resolved
    pub fn places_nulls_first(&self) -> bool {
        match self.nulls {
            NullHandling::NullsFirst => true,
            NullHandling::NullsLast => false,
            NullHandling::Default => self.order == SortOrder::Desc,
        }
    }

    /// Order keyword plus an explicit NULLS clause when one was requested
    pub fn direction_sql(&self) -> String {
        match self.nulls {
            NullHandling::Default => self.order.to_sql().to_string(),
            NullHandling::NullsFirst => format!("{} NULLS FIRST", self.order.to_sql()),
            NullHandling::NullsLast => format!("{} NULLS LAST", self.order.to_sql()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::expr::Expr;

    #[test]
    fn test_default_null_placement() {
        let name = Expr::<String>::column("member", "name");
        assert!(!name.asc().places_nulls_first());
        assert!(name.desc().places_nulls_first());
        assert!(name.asc().nulls_first().places_nulls_first());
        assert!(!name.desc().nulls_last().places_nulls_first());
    }

    #[test]
    fn test_direction_sql() {
        let age = Expr::<i32>::column("member", "age");
        assert_eq!(age.desc().direction_sql(), "DESC");
        assert_eq!(age.asc().nulls_last().direction_sql(), "ASC NULLS LAST");
    }
}
