use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{
    Engine, EngineError, GoalStatus, LedgerClient, ResultEngine, SyncOutcome, TransactionStatus,
    Transfer, User,
};
use migration::MigratorTrait;

const TREASURY_ACCOUNT: i64 = 999;

/// Serves a fixed page list; an empty trailing page terminates pagination.
struct FakeLedger {
    pages: Vec<ResultEngine<Vec<Transfer>>>,
    name_lookups: AtomicU32,
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn fetch_transfer_page(
        &self,
        _credential: &str,
        _account_id: i64,
        page: u32,
    ) -> ResultEngine<Vec<Transfer>> {
        match self.pages.get(page as usize - 1) {
            Some(Ok(transfers)) => Ok(transfers.clone()),
            Some(Err(err)) => Err(EngineError::ExternalFetch(err.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn resolve_display_name(&self, account_id: i64) -> Option<String> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        Some(format!("Pilot {account_id}"))
    }
}

fn donation(external_id: i64, sender_account_id: i64, amount_minor: i64) -> Transfer {
    Transfer {
        external_id,
        sender_account_id,
        amount_minor,
        kind: "donation".to_string(),
        reason: Some("savings".to_string()),
        occurred_at: Utc::now(),
    }
}

async fn engine_with_ledger(
    pages: Vec<ResultEngine<Vec<Transfer>>>,
) -> (Engine, DatabaseConnection, Arc<FakeLedger>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let ledger = Arc::new(FakeLedger {
        pages,
        name_lookups: AtomicU32::new(0),
    });
    let engine = Engine::builder()
        .database(db.clone())
        .ledger(ledger.clone())
        .treasury_account(TREASURY_ACCOUNT)
        .build()
        .await
        .unwrap();
    (engine, db, ledger)
}

async fn treasury_login(engine: &Engine) -> User {
    engine
        .get_or_create_user(TREASURY_ACCOUNT, "Treasury", Some("token"))
        .await
        .unwrap()
}

async fn saver_with_goal(engine: &Engine, account_id: i64) -> (User, Uuid) {
    let user = engine
        .get_or_create_user(account_id, &format!("Member {account_id}"), None)
        .await
        .unwrap();
    let goal = engine
        .create_goal(user.id, "Mining barge", 1_000_000, None)
        .await
        .unwrap();
    (user, goal.id)
}

fn completed(outcome: SyncOutcome) -> engine::SyncSummary {
    match outcome {
        SyncOutcome::Completed(summary) => summary,
        SyncOutcome::NoCredential => panic!("expected a completed sync"),
    }
}

#[tokio::test]
async fn donations_from_known_savers_are_matched() {
    let (engine, _db, _) =
        engine_with_ledger(vec![Ok(vec![donation(77, 1001, 250_000)])]).await;
    treasury_login(&engine).await;
    let (_, goal_id) = saver_with_goal(&engine, 1001).await;

    let summary = completed(engine.sync().await.unwrap());
    assert_eq!(summary.matched_count, 1);
    assert_eq!(summary.matched_amount_minor, 250_000);
    assert_eq!(summary.unmatched_count, 0);

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 250_000);
}

#[tokio::test]
async fn replayed_entries_are_skipped() {
    let (engine, _db, _) =
        engine_with_ledger(vec![Ok(vec![donation(77, 1001, 250_000)])]).await;
    treasury_login(&engine).await;
    let (_, goal_id) = saver_with_goal(&engine, 1001).await;

    engine.sync().await.unwrap();
    let summary = completed(engine.sync().await.unwrap());
    assert_eq!(summary.matched_count, 0);
    assert_eq!(summary.total_processed, 0);

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 250_000);
}

#[tokio::test]
async fn replayed_unknown_senders_skip_name_resolution() {
    let (engine, _db, ledger) =
        engine_with_ledger(vec![Ok(vec![donation(78, 5555, 40_000)])]).await;
    treasury_login(&engine).await;

    engine.sync().await.unwrap();
    let summary = completed(engine.sync().await.unwrap());
    assert_eq!(summary.total_processed, 0);
    assert_eq!(summary.unmatched_count, 0);

    // The name was resolved once, when the entry was first parked.
    assert_eq!(ledger.name_lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sync_without_a_stored_credential_does_nothing() {
    let (engine, _db, _) =
        engine_with_ledger(vec![Ok(vec![donation(77, 1001, 250_000)])]).await;
    engine
        .get_or_create_user(TREASURY_ACCOUNT, "Treasury", None)
        .await
        .unwrap();
    saver_with_goal(&engine, 1001).await;

    assert!(matches!(
        engine.sync().await.unwrap(),
        SyncOutcome::NoCredential
    ));
}

#[tokio::test]
async fn unknown_senders_park_as_unmatched() {
    let (engine, _db, _) =
        engine_with_ledger(vec![Ok(vec![donation(78, 5555, 40_000)])]).await;
    treasury_login(&engine).await;

    let summary = completed(engine.sync().await.unwrap());
    assert_eq!(summary.matched_count, 0);
    assert_eq!(summary.unmatched_count, 1);

    let unmatched = engine.unmatched_transactions().await.unwrap();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].external_id, 78);
    assert_eq!(unmatched[0].sender_name, "Pilot 5555");
    assert_eq!(unmatched[0].status, TransactionStatus::Unmatched);
}

#[tokio::test]
async fn assigning_an_unmatched_entry_records_the_deposit() {
    let (engine, _db, _) =
        engine_with_ledger(vec![Ok(vec![donation(78, 5555, 40_000)])]).await;
    treasury_login(&engine).await;
    let (_, goal_id) = saver_with_goal(&engine, 1001).await;

    engine.sync().await.unwrap();
    let record = engine.assign_transaction(78, goal_id, None).await.unwrap();
    assert_eq!(record.status, TransactionStatus::Matched);
    assert_eq!(record.goal_id, Some(goal_id));

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 40_000);
    assert!(engine.unmatched_transactions().await.unwrap().is_empty());

    // Resolution is final.
    let err = engine.assign_transaction(78, goal_id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyProcessed(_)));
}

#[tokio::test]
async fn ignored_entries_never_become_deposits() {
    let (engine, _db, _) =
        engine_with_ledger(vec![Ok(vec![donation(78, 5555, 40_000)])]).await;
    treasury_login(&engine).await;
    let (_, goal_id) = saver_with_goal(&engine, 1001).await;

    engine.sync().await.unwrap();
    let record = engine.ignore_transaction(78).await.unwrap();
    assert_eq!(record.status, TransactionStatus::Ignored);

    let err = engine.assign_transaction(78, goal_id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyProcessed(_)));

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 0);
}

#[tokio::test]
async fn non_donations_and_self_transfers_are_filtered() {
    let mut fee = donation(80, 1001, 10_000);
    fee.kind = "fee".to_string();
    let self_transfer = donation(81, TREASURY_ACCOUNT, 10_000);
    let (engine, _db, _) = engine_with_ledger(vec![Ok(vec![fee, self_transfer])]).await;
    treasury_login(&engine).await;
    let (_, goal_id) = saver_with_goal(&engine, 1001).await;

    let summary = completed(engine.sync().await.unwrap());
    assert_eq!(summary.total_processed, 0);

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 0);
    assert!(engine.unmatched_transactions().await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_failure_truncates_but_keeps_earlier_pages() {
    let (engine, _db, _) = engine_with_ledger(vec![
        Ok(vec![donation(90, 1001, 100_000)]),
        Err(EngineError::ExternalFetch("boom".to_string())),
        Ok(vec![donation(91, 1001, 100_000)]),
    ])
    .await;
    treasury_login(&engine).await;
    let (_, goal_id) = saver_with_goal(&engine, 1001).await;

    let summary = completed(engine.sync().await.unwrap());
    assert_eq!(summary.matched_count, 1);
    assert_eq!(summary.matched_amount_minor, 100_000);

    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.amount_deposited_minor, 100_000);
}

#[tokio::test]
async fn matched_donation_can_complete_the_goal() {
    let (engine, _db, _) =
        engine_with_ledger(vec![Ok(vec![donation(95, 1001, 1_000_000)])]).await;
    treasury_login(&engine).await;
    let (_, goal_id) = saver_with_goal(&engine, 1001).await;

    engine.sync().await.unwrap();
    let goal = engine.goal(goal_id).await.unwrap();
    assert_eq!(goal.status, GoalStatus::Completed);
}
