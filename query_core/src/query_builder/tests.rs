//! SQL rendering and validation of assembled queries

#[cfg(test)]
mod tests {
    use crate::query_builder::expr::{expressions, Expr};
    use crate::query_builder::filter::QueryFilter;
    use crate::query_builder::grouping::GroupBy;
    use crate::query_builder::join::{JoinClause, JoinType};
    use crate::query_builder::select::SelectSpec;
    use crate::query_builder::sql_generation::SqlGenerator;
    use crate::errors::QueryError;
    use crate::query_builder::{CaseBuilder, SelectBuilder};
    use crate::schema::fixtures::{MEMBER, TEAM};
    use type_mapping::SqlValue;

    fn name(alias: &str) -> Expr<String> {
        Expr::column(alias, "name")
    }

    fn age(alias: &str) -> Expr<i32> {
        Expr::column(alias, "age")
    }

    fn members(select: Vec<crate::query_builder::ExprNode>) -> SelectSpec {
        let mut spec = SelectSpec::default();
        spec.add_source(&MEMBER, "member");
        spec.select = select;
        spec
    }

    fn team_join(join_type: JoinType) -> JoinClause {
        let relation = MEMBER.relation("team").unwrap();
        JoinClause::relation(join_type, "member", &MEMBER, relation, "team").unwrap()
    }

    // ========================================
    // SELECT / WHERE
    // ========================================

    #[test]
    fn test_simple_filter() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.conditions.push(name("member").eq("member1").and(age("member").eq(10)));

        let (sql, values) = SqlGenerator::build_select(&spec);
        assert_eq!(
            sql,
            "SELECT \"member\".\"name\" FROM \"member\" AS \"member\" \
             WHERE (\"member\".\"name\" = $1 AND \"member\".\"age\" = $2)"
        );
        assert_eq!(values, vec![SqlValue::from("member1"), SqlValue::Integer(10)]);
    }

    #[test]
    fn test_separate_filters_are_conjoined() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.conditions.push(name("member").eq("member1"));
        spec.conditions.push(age("member").between(10, 30));

        let (sql, values) = SqlGenerator::build_select(&spec);
        assert!(sql.ends_with(
            "WHERE \"member\".\"name\" = $1 AND \"member\".\"age\" BETWEEN $2 AND $3"
        ));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_in_lists() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.conditions.push(age("member").is_in(vec![10, 20]));
        spec.conditions.push(age("member").not_in(Vec::<i32>::new()));

        let (sql, _) = SqlGenerator::build_select(&spec);
        assert!(sql.contains("\"member\".\"age\" IN ($1, $2)"));
        assert!(sql.ends_with("AND 1=1"));
    }

    #[test]
    fn test_like_and_null_checks() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.conditions.push(name("member").starts_with("member"));
        spec.conditions.push(name("member").is_not_null());

        let (sql, values) = SqlGenerator::build_select(&spec);
        assert!(sql.contains("\"member\".\"name\" LIKE $1"));
        assert!(sql.contains("\"member\".\"name\" IS NOT NULL"));
        assert_eq!(values, vec![SqlValue::from("member%")]);
    }

    #[test]
    fn test_negated_group() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.conditions.push(QueryFilter::any(vec![age("member").lt(15), age("member").gte(40)]).not());

        let (sql, _) = SqlGenerator::build_select(&spec);
        assert!(sql.ends_with("WHERE NOT ((\"member\".\"age\" < $1 OR \"member\".\"age\" >= $2))"));
    }

    // ========================================
    // ORDER BY / paging
    // ========================================

    #[test]
    fn test_order_and_paging() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.order_by.push(age("member").desc());
        spec.order_by.push(name("member").asc().nulls_last());
        spec.pagination = spec.pagination.clone().with_offset(1).with_limit(2);

        let (sql, _) = SqlGenerator::build_select(&spec);
        assert!(sql.ends_with(
            "ORDER BY \"member\".\"age\" DESC, \"member\".\"name\" ASC NULLS LAST LIMIT 2 OFFSET 1"
        ));
    }

    #[test]
    fn test_count_drops_order_and_paging() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.order_by.push(age("member").desc());
        spec.pagination = spec.pagination.clone().with_limit(2);

        let (sql, _) = SqlGenerator::build_count(&spec);
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM (SELECT \"member\".\"name\" FROM \"member\" AS \"member\") AS \"counted\""
        );
    }

    // ========================================
    // Aggregation
    // ========================================

    #[test]
    fn test_aggregates_render_with_casts() {
        let spec = members(vec![
            expressions::count_all().into_node(),
            age("member").sum().into_node(),
            age("member").avg().into_node(),
            age("member").max().into_node(),
        ]);

        let (sql, _) = SqlGenerator::build_select(&spec);
        assert_eq!(
            sql,
            "SELECT COUNT(*), CAST(SUM(\"member\".\"age\") AS BIGINT), \
             CAST(TRUNC(AVG(\"member\".\"age\")) AS BIGINT), MAX(\"member\".\"age\") \
             FROM \"member\" AS \"member\""
        );
    }

    #[test]
    fn test_group_by_having() {
        let mut spec = members(vec![name("team").into_node(), age("member").avg().into_node()]);
        spec.joins.push(team_join(JoinType::Inner));
        spec.group_by = Some(GroupBy::single(name("team").into_node()).having(age("member").avg().gt(10)));

        let (sql, values) = SqlGenerator::build_select(&spec);
        assert!(sql.contains(
            "INNER JOIN \"team\" AS \"team\" ON \"member\".\"team_id\" = \"team\".\"team_id\""
        ));
        assert!(sql.ends_with(
            "GROUP BY \"team\".\"name\" HAVING CAST(TRUNC(AVG(\"member\".\"age\")) AS BIGINT) > $1"
        ));
        assert_eq!(values, vec![SqlValue::Integer(10)]);
        assert!(spec.validate(&[]).is_ok());
    }

    // ========================================
    // Joins
    // ========================================

    #[test]
    fn test_left_join_with_on() {
        let mut spec = members(vec![name("member").into_node(), name("team").into_node()]);
        let mut join = team_join(JoinType::Left);
        join.add_on(name("team").eq("teamA"));
        spec.joins.push(join);

        let (sql, _) = SqlGenerator::build_select(&spec);
        assert!(sql.ends_with(
            "LEFT JOIN \"team\" AS \"team\" ON \"member\".\"team_id\" = \"team\".\"team_id\" \
             AND \"team\".\"name\" = $1"
        ));
    }

    #[test]
    fn test_entity_join_uses_on_only() {
        let mut spec = members(vec![name("member").into_node()]);
        let mut join = JoinClause::entity(JoinType::Inner, &TEAM, "team");
        join.add_on(name("member").eq(name("team")));
        spec.joins.push(join);

        let (sql, values) = SqlGenerator::build_select(&spec);
        assert!(sql.ends_with("INNER JOIN \"team\" AS \"team\" ON \"member\".\"name\" = \"team\".\"name\""));
        assert!(values.is_empty());
    }

    #[test]
    fn test_entity_join_without_on_is_rejected() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.joins.push(JoinClause::entity(JoinType::Inner, &TEAM, "team"));
        assert!(matches!(spec.validate(&[]), Err(QueryError::Translation(_))));
    }

    #[test]
    fn test_one_to_many_join_keys() {
        let relation = TEAM.relation("members").unwrap();
        let join = JoinClause::relation(JoinType::Inner, "team", &TEAM, relation, "member").unwrap();

        let mut spec = SelectSpec::default();
        spec.add_source(&TEAM, "team");
        spec.select = vec![name("team").into_node()];
        spec.joins.push(join);

        let (sql, _) = SqlGenerator::build_select(&spec);
        assert!(sql.ends_with("ON \"team\".\"team_id\" = \"member\".\"team_id\""));
    }

    #[test]
    fn test_theta_join_cross_product() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.add_source(&TEAM, "team");
        spec.conditions.push(name("member").eq(name("team")));

        let (sql, _) = SqlGenerator::build_select(&spec);
        assert!(sql.contains("FROM \"member\" AS \"member\", \"team\" AS \"team\""));
    }

    // ========================================
    // Subqueries and CASE
    // ========================================

    #[test]
    fn test_subquery_shares_placeholder_counter() {
        let mut sub = expressions::select(age("member_sub").max());
        sub.spec_mut().add_source(&MEMBER, "member_sub");
        let sub = sub.filter(age("member_sub").gt(5));

        let mut spec = members(vec![name("member").into_node()]);
        spec.conditions.push(name("member").ne("nobody"));
        spec.conditions.push(age("member").eq(sub));

        let (sql, values) = SqlGenerator::build_select(&spec);
        assert!(sql.ends_with(
            "WHERE \"member\".\"name\" != $1 AND \"member\".\"age\" = \
             (SELECT MAX(\"member_sub\".\"age\") FROM \"member\" AS \"member_sub\" WHERE \"member_sub\".\"age\" > $2)"
        ));
        assert_eq!(values, vec![SqlValue::from("nobody"), SqlValue::Integer(5)]);
        assert!(spec.validate(&[]).is_ok());
    }

    #[test]
    fn test_subquery_must_select_one_column() {
        let mut sub = expressions::select(age("member_sub").max());
        sub.spec_mut().add_source(&MEMBER, "member_sub");
        sub.spec_mut().select.push(name("member_sub").into_node());

        let mut spec = members(vec![name("member").into_node()]);
        spec.conditions.push(age("member").eq(sub));
        assert!(spec.validate(&[]).is_err());
    }

    #[test]
    fn test_case_expressions() {
        let simple = age("member").when(10).then("ten").when(20).then("twenty").otherwise("other");
        let searched = CaseBuilder::new()
            .when(age("member").between(0, 20))
            .then("0-20")
            .otherwise("other");

        let spec = members(vec![simple.into_node(), searched.into_node()]);
        let (sql, values) = SqlGenerator::build_select(&spec);
        assert_eq!(
            sql,
            "SELECT CASE \"member\".\"age\" WHEN $1 THEN $2 WHEN $3 THEN $4 ELSE $5 END, \
             CASE WHEN \"member\".\"age\" BETWEEN $6 AND $7 THEN $8 ELSE $9 END \
             FROM \"member\" AS \"member\""
        );
        assert_eq!(values.len(), 9);
    }

    // ========================================
    // Validation
    // ========================================

    #[test]
    fn test_missing_from_is_rejected() {
        let spec = SelectSpec {
            select: vec![name("member").into_node()],
            ..SelectSpec::default()
        };
        assert!(spec.validate(&[]).is_err());
    }

    #[test]
    fn test_unknown_alias_is_rejected() {
        let spec = members(vec![name("team").into_node()]);
        assert!(spec.validate(&[]).is_err());
    }

    #[test]
    fn test_aggregate_in_where_is_rejected() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.conditions.push(age("member").max().gt(10));
        assert!(spec.validate(&[]).is_err());
    }

    #[test]
    fn test_ungrouped_column_is_rejected() {
        let spec = members(vec![name("member").into_node(), age("member").max().into_node()]);
        assert!(spec.validate(&[]).is_err());
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.add_source(&TEAM, "member");
        assert!(spec.validate(&[]).is_err());
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let mut spec = members(vec![name("member").into_node()]);
        spec.pagination = spec.pagination.clone().with_limit(-1);
        assert!(spec.validate(&[]).is_err());
    }
}
