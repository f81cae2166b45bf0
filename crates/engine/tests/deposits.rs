use sea_orm::{Database, DatabaseConnection};

use engine::{DepositSource, Engine, EngineError, EventKind, GoalStatus, User};
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

async fn member(engine: &Engine, account_id: i64) -> User {
    engine
        .get_or_create_user(account_id, &format!("Member {account_id}"), None)
        .await
        .unwrap()
}

#[tokio::test]
async fn deposit_moves_the_balance() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();

    let deposit = engine
        .record_deposit(
            goal.id,
            250_000,
            Some(user.id),
            Some("first installment"),
            DepositSource::Manual,
            None,
        )
        .await
        .unwrap();
    assert_eq!(deposit.amount_minor, 250_000);
    assert_eq!(deposit.note.as_deref(), Some("first installment"));

    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 250_000);
    assert_eq!(goal.status, GoalStatus::Active);
}

#[tokio::test]
async fn crossing_the_price_completes_the_goal() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 100_000, None)
        .await
        .unwrap();

    engine
        .record_deposit(goal.id, 100_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap();

    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.status, GoalStatus::Completed);

    let feed = engine.notifications_for(user.id, 10).await.unwrap();
    assert!(feed
        .iter()
        .any(|n| n.kind == EventKind::GoalCompleted.as_str()));
}

#[tokio::test]
async fn replayed_external_reference_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();

    engine
        .record_deposit(goal.id, 50_000, None, None, DepositSource::WalletSync, Some(42))
        .await
        .unwrap();
    let err = engine
        .record_deposit(goal.id, 50_000, None, None, DepositSource::WalletSync, Some(42))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Duplicate(_)));

    let goal = engine.goal(goal.id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 50_000);
}

#[tokio::test]
async fn deposits_need_an_active_goal() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();
    engine.cancel_goal(goal.id).await.unwrap();

    let err = engine
        .record_deposit(goal.id, 50_000, None, None, DepositSource::Manual, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn non_positive_amounts_are_invalid() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();

    for amount in [0, -100] {
        let err = engine
            .record_deposit(goal.id, amount, None, None, DepositSource::Manual, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}

#[tokio::test]
async fn bonus_splits_proportionally_with_remainder_to_largest() {
    let (engine, _db) = engine_with_db().await;
    let mut goal_ids = Vec::new();
    for (account_id, deposited) in [(1, 100), (2, 200), (3, 33)] {
        let user = member(&engine, account_id).await;
        let goal = engine
            .create_goal(user.id, "Mining barge", 1_000_000, None)
            .await
            .unwrap();
        engine
            .record_deposit(goal.id, deposited, None, None, DepositSource::Manual, None)
            .await
            .unwrap();
        goal_ids.push(goal.id);
    }

    let summary = engine
        .distribute_bonus(1_000, None, Some("monthly surplus"))
        .await
        .unwrap();
    assert_eq!(summary.total_minor, 1_000);
    assert_eq!(summary.shares.len(), 3);

    let expected = [100 + 300, 200 + 601, 33 + 99];
    for (goal_id, want) in goal_ids.iter().zip(expected) {
        let goal = engine.goal(*goal_id).await.unwrap();
        assert_eq!(goal.amount_deposited_minor, want);
    }
}

#[tokio::test]
async fn bonus_splits_equally_when_nothing_is_deposited() {
    let (engine, _db) = engine_with_db().await;
    for account_id in 1..=3 {
        let user = member(&engine, account_id).await;
        engine
            .create_goal(user.id, "Mining barge", 1_000_000, None)
            .await
            .unwrap();
    }

    let summary = engine.distribute_bonus(100, None, None).await.unwrap();
    let mut amounts: Vec<i64> = summary.shares.iter().map(|s| s.amount_minor).collect();
    amounts.sort_unstable();
    assert_eq!(amounts, vec![33, 33, 34]);
}

#[tokio::test]
async fn bonus_needs_active_goals() {
    let (engine, _db) = engine_with_db().await;
    let err = engine.distribute_bonus(1_000, None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}
