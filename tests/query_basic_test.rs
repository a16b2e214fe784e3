//! Integration tests for the query layer
//!
//! Every test runs against the in-memory backend with two teams and four
//! members: member1 (10) and member2 (20) in teamA, member3 (30) and
//! member4 (40) in teamB.

use querykit::prelude::*;

struct Fixture {
    querykit: QueryKit,
    session: Session,
    team_a: Team,
}

async fn setup() -> Fixture {
    let querykit = QueryKit::new(AppConfig::in_memory())
        .await
        .expect("in-memory setup cannot fail");
    let session = querykit.session().await.unwrap();

    let mut team_a = Team::new("teamA");
    let mut team_b = Team::new("teamB");
    let members = vec![
        Member::new(Some("member1"), 10, &mut team_a),
        Member::new(Some("member2"), 20, &mut team_a),
        Member::new(Some("member3"), 30, &mut team_b),
        Member::new(Some("member4"), 40, &mut team_b),
    ];

    session.persist(&team_a).await.unwrap();
    session.persist(&team_b).await.unwrap();
    for member in &members {
        session.persist(member).await.unwrap();
    }

    Fixture {
        querykit,
        session,
        team_a,
    }
}

fn names(members: &[Member]) -> Vec<Option<&str>> {
    members.iter().map(|m| m.name.as_deref()).collect()
}

// ========================================
// Model
// ========================================

#[tokio::test]
async fn test_bidirectional_link_on_construction() {
    let fixture = setup().await;
    assert_eq!(fixture.team_a.members.len(), 2);

    let m = QMember::default();
    let member1 = fixture
        .session
        .query()
        .select_from(&m)
        .filter(m.name.eq("member1"))
        .fetch_one()
        .await
        .unwrap();
    assert!(fixture.team_a.members.contains(&member1.id));
    assert_eq!(member1.team_id(), Some(fixture.team_a.id));
}

#[tokio::test]
async fn test_find_by_id() {
    let fixture = setup().await;
    let found = fixture
        .session
        .find::<Team>(fixture.team_a.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "teamA");
    // the inverse collection is not loaded from the store
    assert!(found.members.is_empty());

    assert!(fixture.session.find::<Team>(Uuid::new_v4()).await.unwrap().is_none());
}

// ========================================
// Filtering
// ========================================

#[tokio::test]
async fn test_start_query() {
    let fixture = setup().await;
    let m = QMember::default();

    let member = fixture
        .session
        .query()
        .select_from(&m)
        .filter(m.name.eq("member1"))
        .fetch_one()
        .await
        .unwrap();
    assert_eq!(member.name.as_deref(), Some("member1"));
}

#[tokio::test]
async fn test_search_with_conjoined_filters() {
    let fixture = setup().await;
    let m = QMember::default();

    let chained = fixture
        .session
        .query()
        .select_from(&m)
        .filter(m.name.eq("member1").and(m.age.eq(10)))
        .fetch_one()
        .await
        .unwrap();
    let listed = fixture
        .session
        .query()
        .select_from(&m)
        .filters([m.name.eq("member1"), m.age.between(10, 30)])
        .fetch_one()
        .await
        .unwrap();

    assert_eq!(chained.id, listed.id);
    assert_eq!(listed.age, 10);
}

#[tokio::test]
async fn test_comparison_operators() {
    let fixture = setup().await;
    let m = QMember::default();
    let query = fixture.session.query();

    let count = |filter: QueryFilter| {
        let query = query.select_from(&m).filter(filter);
        async move { query.fetch_count().await.unwrap() }
    };

    assert_eq!(count(m.age.ne(10)).await, 3);
    assert_eq!(count(m.age.lt(20)).await, 1);
    assert_eq!(count(m.age.lte(20)).await, 2);
    assert_eq!(count(m.age.gt(20)).await, 2);
    assert_eq!(count(m.age.gte(20)).await, 3);
    assert_eq!(count(m.age.is_in([10, 40])).await, 2);
    assert_eq!(count(m.age.not_in([10, 40])).await, 2);
    assert_eq!(count(m.name.like("member%")).await, 4);
    assert_eq!(count(m.name.starts_with("member1")).await, 1);
    assert_eq!(count(m.age.lt(15).or(m.age.gt(35))).await, 2);
    assert_eq!(count(m.age.lt(15).or(m.age.gt(35)).not()).await, 2);
}

#[tokio::test]
async fn test_like_wildcards_and_escapes() {
    let fixture = setup().await;
    for name in ["a%b", "axb"] {
        fixture.session.persist(&Member::named(Some(name))).await.unwrap();
    }
    let m = QMember::default();

    let matching = |filter: QueryFilter| {
        let query = fixture
            .session
            .query()
            .select(m.name.optional())
            .from(&m)
            .filter(filter)
            .order_by(m.name.asc());
        async move { query.fetch().await.unwrap() }
    };

    let both = vec![Some("a%b".to_string()), Some("axb".to_string())];
    let literal = vec![Some("a%b".to_string())];
    assert_eq!(matching(m.name.like("a%b")).await, both);
    assert_eq!(matching(m.name.like("a\\%b")).await, literal);
    assert_eq!(matching(m.name.starts_with("a%")).await, literal);
    assert_eq!(matching(m.name.contains("%")).await, literal);
}

#[tokio::test]
async fn test_null_checks() {
    let fixture = setup().await;
    fixture.session.persist(&Member::named(None)).await.unwrap();
    let m = QMember::default();

    let nameless = fixture
        .session
        .query()
        .select_from(&m)
        .filter(m.name.is_null())
        .fetch_one()
        .await
        .unwrap();
    assert_eq!(nameless.age, 0);
    assert!(nameless.team.is_none());

    // NULL never compares equal or unequal
    let named = fixture
        .session
        .query()
        .select_from(&m)
        .filter(m.name.ne("member1"))
        .fetch_count()
        .await
        .unwrap();
    assert_eq!(named, 3);
}

// ========================================
// Result shapes
// ========================================

#[tokio::test]
async fn test_result_shapes() {
    let fixture = setup().await;
    let m = QMember::default();
    let query = fixture.session.query();

    let all = query.select_from(&m).fetch().await.unwrap();
    assert_eq!(all.len(), 4);

    let err = query.select_from(&m).fetch_one().await.unwrap_err();
    assert!(matches!(err, QueryError::NonUniqueResult { count: 4 }));

    let err = query
        .select_from(&m)
        .filter(m.name.eq("nobody"))
        .fetch_one()
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::NoResult));

    let first = query
        .select_from(&m)
        .order_by(m.age.desc())
        .fetch_first()
        .await
        .unwrap();
    assert_eq!(first.map(|member| member.age), Some(40));

    let none = query
        .select_from(&m)
        .filter(m.name.eq("nobody"))
        .fetch_first()
        .await
        .unwrap();
    assert!(none.is_none());

    assert_eq!(query.select_from(&m).fetch_count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_fetch_results() {
    let fixture = setup().await;
    let m = QMember::default();

    let page = fixture
        .session
        .query()
        .select_from(&m)
        .order_by(m.name.desc())
        .offset(1)
        .limit(2)
        .fetch_results()
        .await
        .unwrap();

    assert_eq!(page.total, 4);
    assert_eq!(page.offset, Some(1));
    assert_eq!(page.limit, Some(2));
    assert_eq!(names(&page.results), vec![Some("member3"), Some("member2")]);
    assert!(page.has_more());
}

// ========================================
// Ordering and paging
// ========================================

#[tokio::test]
async fn test_sort_with_nulls_last() {
    let fixture = setup().await;
    fixture.session.persist(&Member::without_team(None, 100)).await.unwrap();
    fixture.session.persist(&Member::without_team(Some("member5"), 100)).await.unwrap();
    fixture.session.persist(&Member::without_team(Some("member6"), 100)).await.unwrap();
    let m = QMember::default();

    let result = fixture
        .session
        .query()
        .select_from(&m)
        .order_by(m.age.desc())
        .order_by(m.name.asc().nulls_last())
        .fetch()
        .await
        .unwrap();

    assert_eq!(
        names(&result[..3]),
        vec![Some("member5"), Some("member6"), None]
    );
}

#[tokio::test]
async fn test_default_null_ordering() {
    let fixture = setup().await;
    fixture.session.persist(&Member::named(None)).await.unwrap();
    let m = QMember::default();
    let query = fixture.session.query();

    let ascending = query.select_from(&m).order_by(m.name.asc()).fetch().await.unwrap();
    assert!(ascending.last().unwrap().name.is_none());

    let descending = query.select_from(&m).order_by(m.name.desc()).fetch().await.unwrap();
    assert!(descending.first().unwrap().name.is_none());
}

#[tokio::test]
async fn test_paging() {
    let fixture = setup().await;
    let m = QMember::default();
    let query = fixture.session.query();

    let result = query
        .select_from(&m)
        .order_by(m.name.desc())
        .offset(1)
        .limit(2)
        .fetch()
        .await
        .unwrap();
    assert_eq!(names(&result), vec![Some("member3"), Some("member2")]);

    let past_end = query
        .select_from(&m)
        .order_by(m.name.desc())
        .offset(10)
        .limit(2)
        .fetch()
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_paging_total_count() {
    let fixture = setup().await;
    let m = QMember::default();

    let total = fixture
        .session
        .query()
        .select(m.count())
        .from(&m)
        .filter(m.age.lt(30))
        .fetch_one()
        .await
        .unwrap();
    assert_eq!(total, 2);
}

// ========================================
// Aggregation and grouping
// ========================================

#[tokio::test]
async fn test_aggregation() {
    let fixture = setup().await;
    let m = QMember::default();

    let (count, sum, avg, max, min) = fixture
        .session
        .query()
        .select((
            count_all(),
            m.age.sum(),
            m.age.avg(),
            m.age.max(),
            m.age.min(),
        ))
        .from(&m)
        .fetch_one()
        .await
        .unwrap();

    assert_eq!((count, sum, avg, max, min), (4, 100, 25, 40, 10));
}

#[tokio::test]
async fn test_average_truncation() {
    let fixture = setup().await;
    let m = QMember::default();

    let (avg, exact) = fixture
        .session
        .query()
        .select((m.age.avg(), m.age.avg_exact()))
        .from(&m)
        .filter(m.age.is_in([10, 20, 40]))
        .fetch_one()
        .await
        .unwrap();

    assert_eq!(avg, 23);
    assert!((exact - 70.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_aggregation_over_no_rows() {
    let fixture = setup().await;
    let m = QMember::default();

    let (count, sum, max) = fixture
        .session
        .query()
        .select((count_all(), m.age.sum().optional(), m.age.max().optional()))
        .from(&m)
        .filter(m.age.gt(100))
        .fetch_one()
        .await
        .unwrap();

    assert_eq!((count, sum, max), (0, None, None));
}

#[tokio::test]
async fn test_group_by() {
    let fixture = setup().await;
    let m = QMember::default();
    let t = QTeam::default();

    let result = fixture
        .session
        .query()
        .select((&t.name, m.age.avg()))
        .from(&m)
        .join(&m.team, &t)
        .group_by(&t.name)
        .order_by(t.name.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(
        result,
        vec![("teamA".to_string(), 15), ("teamB".to_string(), 35)]
    );
}

#[tokio::test]
async fn test_having() {
    let fixture = setup().await;
    let m = QMember::default();
    let t = QTeam::default();

    let result = fixture
        .session
        .query()
        .select((&t.name, m.count()))
        .from(&m)
        .join(&m.team, &t)
        .group_by(&t.name)
        .having(m.age.avg().gt(20))
        .fetch()
        .await
        .unwrap();

    assert_eq!(result, vec![("teamB".to_string(), 2)]);
}

// ========================================
// Joins
// ========================================

#[tokio::test]
async fn test_join() {
    let fixture = setup().await;
    fixture.session.persist(&Member::named(Some("loner"))).await.unwrap();
    let m = QMember::default();
    let t = QTeam::default();

    let result = fixture
        .session
        .query()
        .select_from(&m)
        .join(&m.team, &t)
        .filter(t.name.eq("teamA"))
        .order_by(m.name.asc())
        .fetch()
        .await
        .unwrap();
    assert_eq!(names(&result), vec![Some("member1"), Some("member2")]);

    // members without a team drop out of an inner join
    let joined = fixture
        .session
        .query()
        .select_from(&m)
        .join(&m.team, &t)
        .fetch_count()
        .await
        .unwrap();
    assert_eq!(joined, 4);
}

#[tokio::test]
async fn test_theta_join() {
    let fixture = setup().await;
    for name in ["teamA", "teamB", "teamC"] {
        fixture.session.persist(&Member::named(Some(name))).await.unwrap();
    }
    let m = QMember::default();
    let t = QTeam::default();

    let result = fixture
        .session
        .query()
        .select_from(&m)
        .from(&t)
        .filter(m.name.eq(&t.name))
        .order_by(m.name.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(names(&result), vec![Some("teamA"), Some("teamB")]);
}

#[tokio::test]
async fn test_left_join_on() {
    let fixture = setup().await;
    let m = QMember::default();
    let t = QTeam::default();

    let result = fixture
        .session
        .query()
        .select((&m, t.optional()))
        .from(&m)
        .left_join(&m.team, &t)
        .on(t.name.eq("teamA"))
        .order_by(m.age.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(result.len(), 4);
    let teams: Vec<Option<String>> = result
        .iter()
        .map(|(_, team)| team.as_ref().map(|team| team.name.clone()))
        .collect();
    assert_eq!(
        teams,
        vec![Some("teamA".to_string()), Some("teamA".to_string()), None, None]
    );

    let inner = fixture
        .session
        .query()
        .select((&m, &t))
        .from(&m)
        .join(&m.team, &t)
        .on(t.name.eq("teamA"))
        .fetch()
        .await
        .unwrap();
    assert_eq!(inner.len(), 2);
}

#[tokio::test]
async fn test_join_on_no_relation() {
    let fixture = setup().await;
    for name in ["teamA", "teamB", "teamC"] {
        fixture.session.persist(&Member::named(Some(name))).await.unwrap();
    }
    let m = QMember::default();
    let t = QTeam::default();

    let outer = fixture
        .session
        .query()
        .select((m.name.optional(), t.name.optional()))
        .from(&m)
        .left_join_entity(&t)
        .on(m.name.eq(&t.name))
        .fetch()
        .await
        .unwrap();

    assert_eq!(outer.len(), 7);
    let matched: Vec<_> = outer.iter().filter(|(_, team)| team.is_some()).collect();
    assert_eq!(matched.len(), 2);
    assert!(outer.contains(&(Some("teamC".to_string()), None)));

    let inner = fixture
        .session
        .query()
        .select(&m)
        .from(&m)
        .join_entity(&t)
        .on(m.name.eq(&t.name))
        .fetch()
        .await
        .unwrap();
    assert_eq!(inner.len(), 2);
}

// ========================================
// Lazy associations and fetch joins
// ========================================

#[tokio::test]
async fn test_without_fetch_join_team_is_unloaded() {
    let fixture = setup().await;
    let m = QMember::default();

    let mut member = fixture
        .session
        .query()
        .select_from(&m)
        .filter(m.name.eq("member1"))
        .fetch_one()
        .await
        .unwrap();

    let team = member.team.as_mut().unwrap();
    assert!(!team.is_loaded());
    assert!(team.get().is_none());

    let loaded = team.load().await.unwrap();
    assert_eq!(loaded.name, "teamA");
    assert!(team.is_loaded());
}

#[tokio::test]
async fn test_fetch_join_loads_team() {
    let fixture = setup().await;
    let m = QMember::default();
    let t = QTeam::default();

    let member = fixture
        .session
        .query()
        .select_from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .filter(m.name.eq("member1"))
        .fetch_one()
        .await
        .unwrap();
    fixture.session.commit().await.unwrap();

    let team = member.team.as_ref().unwrap();
    assert!(team.is_loaded());
    assert_eq!(team.get().map(|team| team.name.as_str()), Some("teamA"));
}

#[tokio::test]
async fn test_lazy_load_after_commit_fails() {
    let fixture = setup().await;
    let m = QMember::default();

    let mut member = fixture
        .session
        .query()
        .select_from(&m)
        .filter(m.name.eq("member3"))
        .fetch_one()
        .await
        .unwrap();
    fixture.session.commit().await.unwrap();

    let err = member.team.as_mut().unwrap().load().await.unwrap_err();
    assert!(matches!(err, QueryError::LazyInitialization { entity: "Team", .. }));
}

// ========================================
// Subqueries
// ========================================

#[tokio::test]
async fn test_subquery_eq() {
    let fixture = setup().await;
    let m = QMember::default();
    let sub = QMember::new("member_sub");

    let result = fixture
        .session
        .query()
        .select_from(&m)
        .filter(m.age.eq(select(sub.age.max()).from(&sub)))
        .fetch()
        .await
        .unwrap();

    let ages: Vec<i32> = result.iter().map(|member| member.age).collect();
    assert_eq!(ages, vec![40]);
}

#[tokio::test]
async fn test_subquery_gte() {
    let fixture = setup().await;
    let m = QMember::default();
    let sub = QMember::new("member_sub");

    let ages = fixture
        .session
        .query()
        .select(&m.age)
        .from(&m)
        .filter(m.age.gte(select(sub.age.avg()).from(&sub)))
        .order_by(m.age.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(ages, vec![30, 40]);
}

#[tokio::test]
async fn test_subquery_in() {
    let fixture = setup().await;
    let m = QMember::default();
    let sub = QMember::new("member_sub");

    let ages = fixture
        .session
        .query()
        .select(&m.age)
        .from(&m)
        .filter(m.age.in_subquery(select(&sub.age).from(&sub).filter(sub.age.gt(10))))
        .order_by(m.age.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(ages, vec![20, 30, 40]);
}

#[tokio::test]
async fn test_subquery_in_select() {
    let fixture = setup().await;
    let m = QMember::default();
    let sub = QMember::new("member_sub");

    let result = fixture
        .session
        .query()
        .select((&m.name, select(sub.age.avg()).from(&sub).as_expr()))
        .from(&m)
        .order_by(m.name.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(result.len(), 4);
    assert!(result.iter().all(|(_, avg)| *avg == 25));
    assert_eq!(result[0].0, "member1");
}

// ========================================
// CASE
// ========================================

#[tokio::test]
async fn test_simple_case() {
    let fixture = setup().await;
    let m = QMember::default();

    let labels = fixture
        .session
        .query()
        .select(m.age.when(10).then("ten").when(20).then("twenty").otherwise("other"))
        .from(&m)
        .order_by(m.age.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(labels, vec!["ten", "twenty", "other", "other"]);
}

#[tokio::test]
async fn test_searched_case() {
    let fixture = setup().await;
    let m = QMember::default();

    let labels = fixture
        .session
        .query()
        .select(
            CaseBuilder::new()
                .when(m.age.between(0, 20))
                .then("0-20")
                .when(m.age.between(21, 30))
                .then("21-30")
                .otherwise("other"),
        )
        .from(&m)
        .order_by(m.age.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(labels, vec!["0-20", "0-20", "21-30", "other"]);
}

#[tokio::test]
async fn test_case_as_sort_key() {
    let fixture = setup().await;
    let m = QMember::default();
    let rank = CaseBuilder::new()
        .when(m.age.between(0, 20))
        .then(2)
        .when(m.age.between(21, 30))
        .then(1)
        .otherwise(3);

    let result = fixture
        .session
        .query()
        .select((&m.age, &rank))
        .from(&m)
        .order_by(rank.desc())
        .order_by(m.age.asc())
        .fetch()
        .await
        .unwrap();

    assert_eq!(result, vec![(40, 3), (10, 2), (20, 2), (30, 1)]);
}

#[tokio::test]
async fn test_constant_projection() {
    let fixture = setup().await;
    let m = QMember::default();

    let result = fixture
        .session
        .query()
        .select((&m.name, constant("A")))
        .from(&m)
        .filter(m.age.eq(10))
        .fetch_one()
        .await
        .unwrap();

    assert_eq!(result, ("member1".to_string(), "A".to_string()));
}

// ========================================
// Translation
// ========================================

#[tokio::test]
async fn test_to_sql() {
    let fixture = setup().await;
    let m = QMember::default();
    let t = QTeam::default();

    let (sql, params) = fixture
        .session
        .query()
        .select_from(&m)
        .join(&m.team, &t)
        .filter(t.name.eq("teamA"))
        .to_sql()
        .unwrap();

    assert!(sql.starts_with(
        "SELECT \"member\".\"member_id\", \"member\".\"name\", \"member\".\"age\", \"member\".\"team_id\" \
         FROM \"member\" AS \"member\""
    ));
    assert!(sql.ends_with(
        "INNER JOIN \"team\" AS \"team\" ON \"member\".\"team_id\" = \"team\".\"team_id\" \
         WHERE \"team\".\"name\" = $1"
    ));
    assert_eq!(params, vec![querykit::type_mapping::SqlValue::from("teamA")]);
}

#[tokio::test]
async fn test_malformed_queries_are_rejected() {
    let fixture = setup().await;
    let m = QMember::default();
    let t = QTeam::default();
    let query = fixture.session.query();

    let is_translation = |result: Result<Vec<Member>, QueryError>| {
        matches!(result, Err(QueryError::Translation(_)))
    };

    assert!(is_translation(query.select_from(&m).on(t.name.eq("teamA")).fetch().await));
    assert!(is_translation(query.select_from(&m).fetch_join().fetch().await));
    assert!(is_translation(query.select_from(&m).join_entity(&t).fetch().await));
    assert!(is_translation(
        query
            .select_from(&m)
            .join_entity(&t)
            .on(m.name.eq(&t.name))
            .fetch_join()
            .fetch()
            .await
    ));
    assert!(is_translation(query.select_from(&m).having(m.age.gt(1)).fetch().await));
    assert!(is_translation(query.select_from(&m).limit(-1).fetch().await));
    assert!(is_translation(query.select_from(&m).offset(-1).fetch().await));
    assert!(is_translation(query.select(&m).fetch().await));
    assert!(is_translation(query.select_from(&m).filter(t.name.eq("teamA")).fetch().await));
    assert!(is_translation(query.select_from(&m).from(&QMember::default()).fetch().await));
}

// ========================================
// Sessions
// ========================================

#[tokio::test]
async fn test_commit_and_rollback() {
    let fixture = setup().await;
    fixture.session.commit().await.unwrap();

    let m = QMember::default();
    let session = fixture.querykit.session().await.unwrap();
    session.persist(&Member::named(Some("discarded"))).await.unwrap();
    assert_eq!(session.query().select_from(&m).fetch_count().await.unwrap(), 5);
    session.rollback().await.unwrap();

    let session = fixture.querykit.session().await.unwrap();
    assert_eq!(session.query().select_from(&m).fetch_count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_interleaved_sessions_keep_committed_writes() {
    let fixture = setup().await;
    fixture.session.commit().await.unwrap();

    let reader = fixture.querykit.session().await.unwrap();
    let writer = fixture.querykit.session().await.unwrap();
    writer.persist(&Team::new("teamC")).await.unwrap();
    writer.commit().await.unwrap();

    let t = QTeam::default();
    assert_eq!(reader.query().select_from(&t).fetch_count().await.unwrap(), 2);
    reader.commit().await.unwrap();

    let session = fixture.querykit.session().await.unwrap();
    assert_eq!(session.query().select_from(&t).fetch_count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_closed_session_is_rejected() {
    let fixture = setup().await;
    fixture.session.commit().await.unwrap();
    assert!(!fixture.session.is_open());

    let m = QMember::default();
    let err = fixture.session.query().select_from(&m).fetch().await.unwrap_err();
    assert!(matches!(err, QueryError::SessionClosed));
    assert!(matches!(
        fixture.session.commit().await,
        Err(QueryError::SessionClosed)
    ));
}

#[tokio::test]
async fn test_dropped_session_rolls_back() {
    let fixture = setup().await;
    let querykit = fixture.querykit.clone();
    drop(fixture);

    let m = QMember::default();
    let session = querykit.session().await.unwrap();
    assert_eq!(session.query().select_from(&m).fetch_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_constraint_violations() {
    let fixture = setup().await;

    let duplicate = fixture.session.persist(&fixture.team_a).await;
    assert!(matches!(duplicate, Err(QueryError::Database { .. })));

    let mut orphan_team = Team::new("unsaved");
    let orphan = Member::new(Some("orphan"), 1, &mut orphan_team);
    let missing_team = fixture.session.persist(&orphan).await;
    assert!(matches!(missing_team, Err(QueryError::Database { .. })));
}
