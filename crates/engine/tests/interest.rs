use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{DepositSource, Engine, GoalStatus};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn active_goal(engine: &Engine, account_id: i64, price_minor: i64) -> engine::SavingsGoal {
    let user = engine
        .get_or_create_user(account_id, &format!("Member {account_id}"), None)
        .await
        .unwrap();
    engine
        .create_goal(user.id, "Expedition frigate", price_minor, None)
        .await
        .unwrap()
}

async fn backdate_goal(db: &DatabaseConnection, goal_id: Uuid, days: i64) {
    let backend = db.get_database_backend();
    let ts = Utc::now() - Duration::days(days);
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE goals SET created_at = ? WHERE id = ?",
        vec![ts.into(), goal_id.to_string().into()],
    ))
    .await
    .unwrap();
}

async fn backdate_deposits(db: &DatabaseConnection, goal_id: Uuid, days: i64) {
    let backend = db.get_database_backend();
    let ts = Utc::now() - Duration::days(days);
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE deposits SET deposited_at = ? WHERE goal_id = ?",
        vec![ts.into(), goal_id.to_string().into()],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn fresh_database_carries_the_default_settings() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();

    for (key, want) in [("interest_rate", "0.05"), ("interest_period", "monthly")] {
        let row = db
            .query_one(Statement::from_sql_and_values(
                backend,
                "SELECT value FROM settings WHERE key = ?",
                vec![key.into()],
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.try_get::<String>("", "value").unwrap(), want);
    }

    let settings = engine.interest_settings().await.unwrap();
    assert_eq!(settings.rate, 0.05);
    assert_eq!(settings.period, engine::InterestPeriod::Monthly);
}

#[tokio::test]
async fn compounds_one_period_per_elapsed_window() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 1_000_000).await;

    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 61).await;
    backdate_deposits(&db, goal.id, 61).await;

    // 61 days at the default monthly period and 5% rate: two compounding
    // periods on 1000.00 give 50.00 + 52.50.
    let result = engine.accrue_one(goal.id).await.unwrap().unwrap();
    assert_eq!(result.periods_accrued, 2);
    assert_eq!(result.interest_added_minor, 10_250);
    assert_eq!(result.new_balance_minor, 110_250);

    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.interest_earned_minor, 10_250);
    assert_eq!(goal.savings_balance_minor(), 110_250);
}

#[tokio::test]
async fn repeated_runs_within_a_period_accrue_nothing() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 1_000_000).await;

    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 61).await;
    backdate_deposits(&db, goal.id, 61).await;

    engine.accrue_one(goal.id).await.unwrap().unwrap();
    let again = engine.accrue_one(goal.id).await.unwrap().unwrap();
    assert_eq!(again.periods_accrued, 0);
    assert_eq!(again.interest_added_minor, 0);

    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.interest_earned_minor, 10_250);
}

#[tokio::test]
async fn deposits_inside_the_window_earn_nothing() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 1_000_000).await;

    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 61).await;
    // Deposit stays at "now": too young to be eligible.

    let result = engine.accrue_one(goal.id).await.unwrap().unwrap();
    assert_eq!(result.periods_accrued, 0);
    assert_eq!(result.interest_added_minor, 0);

    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.interest_earned_minor, 0);
}

#[tokio::test]
async fn only_seasoned_deposits_enter_the_base() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 10_000_000).await;

    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 31).await;
    backdate_deposits(&db, goal.id, 31).await;
    engine
        .record_deposit(goal.id, 50_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();

    // Only the 31-day-old deposit compounds; the fresh one still counts
    // toward the balance.
    let result = engine.accrue_one(goal.id).await.unwrap().unwrap();
    assert_eq!(result.periods_accrued, 1);
    assert_eq!(result.interest_added_minor, 5_000);

    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 150_000);
    assert_eq!(goal.interest_earned_minor, 5_000);
}

#[tokio::test]
async fn non_active_goal_is_not_eligible() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 1_000_000).await;
    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 61).await;
    backdate_deposits(&db, goal.id, 61).await;
    engine.cancel_goal(goal.id).await.unwrap();

    assert!(engine.accrue_one(goal.id).await.unwrap().is_none());
}

#[tokio::test]
async fn accrued_interest_can_complete_a_goal() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 105_000).await;

    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 31).await;
    backdate_deposits(&db, goal.id, 31).await;

    let result = engine.accrue_one(goal.id).await.unwrap().unwrap();
    assert_eq!(result.interest_added_minor, 5_000);

    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.status, GoalStatus::Completed);
}

#[tokio::test]
async fn event_log_matches_the_denormalized_total() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 10_000_000).await;

    engine
        .record_deposit(goal.id, 333, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 95).await;
    backdate_deposits(&db, goal.id, 95).await;

    let result = engine.accrue_one(goal.id).await.unwrap().unwrap();
    assert_eq!(result.periods_accrued, 3);

    let events = engine.interest_history(goal.id).await.unwrap();
    assert_eq!(events.len(), 3);
    let event_sum: i64 = events.iter().map(|e| e.amount_minor).sum();
    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.interest_earned_minor, event_sum);

    // Events are stamped at period boundaries and chain balances.
    for pair in events.windows(2) {
        assert!(pair[0].accrued_at < pair[1].accrued_at);
        assert_eq!(pair[0].balance_after_minor, pair[1].balance_before_minor);
    }
}

#[tokio::test]
async fn accrue_all_covers_every_active_goal() {
    let (engine, db) = engine_with_db().await;
    let first = active_goal(&engine, 1, 1_000_000).await;
    let second = active_goal(&engine, 2, 1_000_000).await;

    for goal_id in [first.id, second.id] {
        engine
            .record_deposit(goal_id, 100_000, None, None, DepositSource::Manual, None)
            .await
            .unwrap();
        backdate_goal(&db, goal_id, 31).await;
        backdate_deposits(&db, goal_id, 31).await;
    }

    let results = engine.accrue_all().await.unwrap();
    assert_eq!(results.len(), 2);
    for (_, result) in results {
        assert_eq!(result.periods_accrued, 1);
        assert_eq!(result.interest_added_minor, 5_000);
    }
}

#[tokio::test]
async fn projection_simulates_without_persisting() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 1_000_000).await;

    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 61).await;
    backdate_deposits(&db, goal.id, 61).await;

    let projection = engine.projected_balance(goal.id).await.unwrap();
    assert_eq!(projection.periods_due, 2);
    assert_eq!(projection.pending_interest_minor, 10_250);
    assert_eq!(projection.total_balance_minor, 110_250);
    assert_eq!(projection.remaining_minor, 889_750);

    // Nothing was written.
    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.interest_earned_minor, 0);
    assert!(engine.interest_history(goal.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn rate_changes_apply_from_the_next_run() {
    let (engine, db) = engine_with_db().await;
    let goal = active_goal(&engine, 1, 10_000_000).await;

    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();
    backdate_goal(&db, goal.id, 31).await;
    backdate_deposits(&db, goal.id, 31).await;

    engine.set_interest_rate(0.10).await.unwrap();
    let result = engine.accrue_one(goal.id).await.unwrap().unwrap();
    assert_eq!(result.interest_added_minor, 10_000);
}
