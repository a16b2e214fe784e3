//! # Query Tutorial
//!
//! This example walks through the query layer with the bundled model:
//! - Persisting teams and members in a session
//! - Filtering, sorting and paging
//! - Aggregation and grouping
//! - Joins, fetch joins and lazy associations
//! - Subqueries and CASE expressions
//!
//! It runs on the in-memory backend unless `QUERYKIT_CONFIG` or
//! `./querykit.toml` selects PostgreSQL.

use querykit::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 querykit Tutorial");
    println!("====================");

    // 1. Setup
    println!("\n📊 Step 1: Setup");
    println!("-----------------");

    let config = AppConfig::load().unwrap_or_else(|e| {
        println!("ℹ️  No configuration loaded ({}), using the in-memory backend", e);
        AppConfig::in_memory()
    });
    let querykit = QueryKit::new(config).await?;
    println!("✅ Backend ready: {}", querykit.backend_name());

    let session = querykit.session().await?;
    let mut team_a = Team::new("teamA");
    let mut team_b = Team::new("teamB");
    let members = [
        Member::new(Some("member1"), 10, &mut team_a),
        Member::new(Some("member2"), 20, &mut team_a),
        Member::new(Some("member3"), 30, &mut team_b),
        Member::new(Some("member4"), 40, &mut team_b),
    ];
    session.persist(&team_a).await?;
    session.persist(&team_b).await?;
    for member in &members {
        session.persist(member).await?;
    }
    println!("✅ Persisted 2 teams and {} members", members.len());

    let m = QMember::default();
    let t = QTeam::default();

    // 2. Filtering, sorting and paging
    println!("\n🔍 Step 2: Filtering, sorting and paging");
    println!("-----------------------------------------");

    let query = session
        .query()
        .select_from(&m)
        .filter(m.name.eq("member1").and(m.age.eq(10)));
    let (sql, params) = query.to_sql()?;
    println!("SQL: {}", sql);
    println!("Params: {:?}", params);
    let member1 = query.fetch_one().await?;
    println!("✅ Found {:?} aged {}", member1.name, member1.age);

    let page = session
        .query()
        .select_from(&m)
        .order_by(m.name.desc())
        .offset(1)
        .limit(2)
        .fetch_results()
        .await?;
    println!(
        "✅ Page of {} out of {} total: {:?}",
        page.len(),
        page.total,
        page.results.iter().map(|m| m.name.clone()).collect::<Vec<_>>()
    );

    // 3. Aggregation and grouping
    println!("\n📈 Step 3: Aggregation and grouping");
    println!("-----------------------------------");

    let (count, sum, avg, max, min) = session
        .query()
        .select((count_all(), m.age.sum(), m.age.avg(), m.age.max(), m.age.min()))
        .from(&m)
        .fetch_one()
        .await?;
    println!("count={} sum={} avg={} max={} min={}", count, sum, avg, max, min);

    let by_team = session
        .query()
        .select((&t.name, m.age.avg()))
        .from(&m)
        .join(&m.team, &t)
        .group_by(&t.name)
        .order_by(t.name.asc())
        .fetch()
        .await?;
    for (team, avg) in &by_team {
        println!("  {} average age: {}", team, avg);
    }

    // 4. Joins and lazy associations
    println!("\n🔗 Step 4: Joins and lazy associations");
    println!("--------------------------------------");

    let rows = session
        .query()
        .select((&m, t.optional()))
        .from(&m)
        .left_join(&m.team, &t)
        .on(t.name.eq("teamA"))
        .fetch()
        .await?;
    for (member, team) in &rows {
        println!("  {:?} -> {:?}", member.name, team.as_ref().map(|t| &t.name));
    }

    let mut plain = session.query().select_from(&m).filter(m.name.eq("member3")).fetch_one().await?;
    if let Some(team) = plain.team.as_mut() {
        println!("  loaded before access: {}", team.is_loaded());
        println!("  loaded on access: {}", team.load().await?.name);
    }

    let fetched = session
        .query()
        .select_from(&m)
        .join(&m.team, &t)
        .fetch_join()
        .filter(m.name.eq("member1"))
        .fetch_one()
        .await?;
    println!(
        "  fetch join loaded: {}",
        fetched.team.as_ref().is_some_and(Lazy::is_loaded)
    );

    // 5. Subqueries and CASE
    println!("\n🧮 Step 5: Subqueries and CASE");
    println!("------------------------------");

    let sub = QMember::new("member_sub");
    let oldest = session
        .query()
        .select(&m.name)
        .from(&m)
        .filter(m.age.eq(select(sub.age.max()).from(&sub)))
        .fetch()
        .await?;
    println!("  oldest: {:?}", oldest);

    let labels = session
        .query()
        .select((
            &m.age,
            CaseBuilder::new()
                .when(m.age.between(0, 20))
                .then("0-20")
                .when(m.age.between(21, 30))
                .then("21-30")
                .otherwise("other"),
        ))
        .from(&m)
        .order_by(m.age.asc())
        .fetch()
        .await?;
    for (age, label) in &labels {
        println!("  {} -> {}", age, label);
    }

    session.rollback().await?;
    println!("\n🎉 Tutorial completed!");
    Ok(())
}
