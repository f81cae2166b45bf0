use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, EngineError, GoalStatus, User};
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
async fn submitted_goal_waits_for_approval() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let item = engine
        .add_catalog_item("Mining barge", 750_000, None, Some("ships"))
        .await
        .unwrap();

    let goal = engine.submit_goal(user.id, item.id, None).await.unwrap();
    assert_eq!(goal.status, GoalStatus::PendingApproval);
    assert_eq!(goal.item_name, "Mining barge");
    assert_eq!(goal.goal_price_minor, 750_000);

    let approved = engine.approve_goal(goal.id).await.unwrap();
    assert_eq!(approved.status, GoalStatus::Active);
}

#[tokio::test]
async fn one_open_goal_per_user() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();

    let err = engine
        .create_goal(user.id, "Second ship", 100_000, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn cancelled_goal_frees_the_slot() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();
    engine.cancel_goal(goal.id).await.unwrap();

    let replacement = engine
        .create_goal(user.id, "Second ship", 100_000, None)
        .await
        .unwrap();
    assert_eq!(replacement.status, GoalStatus::Active);
}

#[tokio::test]
async fn rejection_moves_to_cancelled() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let item = engine
        .add_catalog_item("Mining barge", 750_000, None, None)
        .await
        .unwrap();
    let goal = engine.submit_goal(user.id, item.id, None).await.unwrap();

    let rejected = engine.reject_goal(goal.id).await.unwrap();
    assert_eq!(rejected.status, GoalStatus::Cancelled);

    // Approval is no longer possible.
    let err = engine.approve_goal(goal.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn unavailable_item_cannot_be_targeted() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let item = engine
        .add_catalog_item("Mining barge", 750_000, None, None)
        .await
        .unwrap();
    engine
        .update_catalog_item(item.id, "Mining barge", 750_000, None, None, false)
        .await
        .unwrap();

    let err = engine.submit_goal(user.id, item.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn withdrawal_round_trip() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();

    let pending = engine.request_withdrawal(goal.id, user.id).await.unwrap();
    assert_eq!(pending.status, GoalStatus::WithdrawalPending);

    let denied = engine.deny_withdrawal(goal.id).await.unwrap();
    assert_eq!(denied.status, GoalStatus::Active);

    engine.request_withdrawal(goal.id, user.id).await.unwrap();
    let withdrawn = engine.approve_withdrawal(goal.id).await.unwrap();
    assert_eq!(withdrawn.status, GoalStatus::Withdrawn);
}

#[tokio::test]
async fn only_the_owner_can_request_withdrawal() {
    let (engine, _db) = engine_with_db().await;
    let owner = member(&engine, 1).await;
    let stranger = member(&engine, 2).await;
    let goal = engine
        .create_goal(owner.id, "Mining barge", 750_000, None)
        .await
        .unwrap();

    let err = engine
        .request_withdrawal(goal.id, stranger.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn visibility_only_changes_while_active() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();

    let public = engine
        .toggle_visibility(goal.id, user.id, true)
        .await
        .unwrap();
    assert!(public.is_public);

    engine.cancel_goal(goal.id).await.unwrap();
    let err = engine
        .toggle_visibility(goal.id, user.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn terminal_goals_cannot_be_edited() {
    let (engine, _db) = engine_with_db().await;
    let user = member(&engine, 1).await;
    let goal = engine
        .create_goal(user.id, "Mining barge", 750_000, None)
        .await
        .unwrap();
    engine.cancel_goal(goal.id).await.unwrap();

    let err = engine
        .update_goal_details(goal.id, "Renamed", 500_000, false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn leaderboard_hides_private_item_names() {
    let (engine, _db) = engine_with_db().await;
    let quiet = member(&engine, 1).await;
    let open = member(&engine, 2).await;

    let quiet_goal = engine
        .create_goal(quiet.id, "Secret ship", 100_000, None)
        .await
        .unwrap();
    let open_goal = engine
        .create_goal(open.id, "Mining barge", 100_000, None)
        .await
        .unwrap();
    engine
        .toggle_visibility(open_goal.id, open.id, true)
        .await
        .unwrap();

    engine
        .record_deposit(
            quiet_goal.id,
            75_000,
            None,
            None,
            engine::DepositSource::Manual,
            None,
        )
        .await
        .unwrap();
    engine
        .record_deposit(
            open_goal.id,
            25_000,
            None,
            None,
            engine::DepositSource::Manual,
            None,
        )
        .await
        .unwrap();

    let board = engine.leaderboard().await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].display_name, "Member 1");
    assert_eq!(board[0].progress, 75.0);
    assert!(board[0].item_name.is_none());
    assert_eq!(board[1].item_name.as_deref(), Some("Mining barge"));
}
