use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DepositSource, EngineError, EventKind, ExternalTransaction, GoalStatus, ResultEngine,
    SavingsGoal, TransactionStatus, User, external_transactions, goals, ledger::Transfer,
};

use super::{Engine, with_tx};

/// Totals for one reconciliation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub matched_count: u32,
    pub matched_amount_minor: i64,
    pub unmatched_count: u32,
    /// Entries newly booked this run: matched plus unmatched. Replayed
    /// entries are not counted.
    pub total_processed: u32,
}

/// Result of [`Engine::sync`]. `NoCredential` is a normal outcome, not an
/// error: the treasury account simply has not logged in yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    NoCredential,
    Completed(SyncSummary),
}

enum EntryOutcome {
    AlreadySeen,
    Matched { goal: SavingsGoal, completed: bool },
    Unmatched,
}

impl Engine {
    /// Pull the treasury's transfer history and book every new inbound
    /// donation: matched to the sender's active goal when one exists,
    /// parked as unmatched otherwise.
    ///
    /// Each entry is committed in its own transaction, so one bad entry
    /// never rolls back the rest of the run. A fetch failure mid-pagination
    /// truncates the run; the skipped entries are picked up next time.
    pub async fn sync(&self) -> ResultEngine<SyncOutcome> {
        let ledger = self.ledger_client()?;
        let treasury_account_id = self.treasury_account_id()?;

        let Some(treasury) = self.treasury_user().await? else {
            tracing::info!("sync skipped: treasury user has not logged in");
            return Ok(SyncOutcome::NoCredential);
        };
        let Some(credential) = treasury.credential.as_deref() else {
            tracing::info!("sync skipped: treasury user has no stored credential");
            return Ok(SyncOutcome::NoCredential);
        };

        let mut transfers: Vec<Transfer> = Vec::new();
        let mut page = 1;
        loop {
            match ledger
                .fetch_transfer_page(credential, treasury_account_id, page)
                .await
            {
                Ok(batch) if batch.is_empty() => break,
                Ok(batch) => {
                    transfers.extend(batch);
                    page += 1;
                }
                Err(err) => {
                    tracing::warn!("transfer fetch truncated at page {page}: {err}");
                    break;
                }
            }
        }

        let mut summary = SyncSummary::default();
        for transfer in &transfers {
            if !transfer.is_inbound_donation()
                || transfer.sender_account_id == treasury_account_id
            {
                continue;
            }

            // Cheap replay check before any name resolution. The
            // in-transaction check below stays authoritative.
            let seen = external_transactions::Entity::find_by_id(transfer.external_id)
                .one(&self.database)
                .await?;
            if seen.is_some() {
                continue;
            }

            let sender = self.user_by_account(transfer.sender_account_id).await?;
            let sender_name = match &sender {
                Some(user) => user.display_name.clone(),
                None => ledger
                    .resolve_display_name(transfer.sender_account_id)
                    .await
                    .unwrap_or_else(|| format!("account {}", transfer.sender_account_id)),
            };

            let applied = with_tx!(self, |db_tx| {
                self.apply_transfer_tx(&db_tx, transfer, sender.as_ref(), &sender_name)
                    .await
            });
            match applied {
                Ok(EntryOutcome::AlreadySeen) => {}
                Ok(EntryOutcome::Matched { goal, completed }) => {
                    summary.total_processed += 1;
                    summary.matched_count += 1;
                    summary.matched_amount_minor += transfer.amount_minor;
                    self.notify_matched(&goal, transfer.amount_minor).await;
                    if completed {
                        self.notify_completed(&goal).await;
                    }
                }
                Ok(EntryOutcome::Unmatched) => {
                    summary.total_processed += 1;
                    summary.unmatched_count += 1;
                }
                Err(EngineError::Duplicate(reason)) => {
                    tracing::debug!(
                        external_id = transfer.external_id,
                        "skipping transfer: {reason}"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        external_id = transfer.external_id,
                        "failed to book transfer: {err}"
                    );
                }
            }
        }

        tracing::info!(
            matched = summary.matched_count,
            unmatched = summary.unmatched_count,
            processed = summary.total_processed,
            "ledger sync finished"
        );
        Ok(SyncOutcome::Completed(summary))
    }

    /// External transactions still waiting for a manual match, newest first.
    pub async fn unmatched_transactions(&self) -> ResultEngine<Vec<ExternalTransaction>> {
        let models = external_transactions::Entity::find()
            .filter(
                external_transactions::Column::Status.eq(TransactionStatus::Unmatched.as_str()),
            )
            .order_by_desc(external_transactions::Column::OccurredAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(ExternalTransaction::try_from).collect()
    }

    /// Manually book an unmatched transaction against a goal. Terminal
    /// records (already matched or ignored) are rejected.
    pub async fn assign_transaction(
        &self,
        external_id: i64,
        goal_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> ResultEngine<ExternalTransaction> {
        let (record, goal, completed) = with_tx!(self, |db_tx| {
            let record = self.unmatched_record_tx(&db_tx, external_id).await?;

            let (_, goal, completed) = self
                .record_deposit_tx(
                    &db_tx,
                    goal_id,
                    record.amount_minor,
                    assigned_by,
                    record.reason.clone(),
                    DepositSource::WalletSync,
                    Some(external_id),
                )
                .await?;

            let record = self
                .mark_record_tx(&db_tx, record, TransactionStatus::Matched, Some(goal_id))
                .await?;
            Ok::<_, EngineError>((record, goal, completed))
        })?;

        self.notify_matched(&goal, record.amount_minor).await;
        if completed {
            self.notify_completed(&goal).await;
        }
        Ok(record)
    }

    /// Mark an unmatched transaction as ignored so it stops appearing in the
    /// review queue.
    pub async fn ignore_transaction(&self, external_id: i64) -> ResultEngine<ExternalTransaction> {
        with_tx!(self, |db_tx| {
            let record = self.unmatched_record_tx(&db_tx, external_id).await?;
            self.mark_record_tx(&db_tx, record, TransactionStatus::Ignored, None)
                .await
        })
    }

    async fn apply_transfer_tx(
        &self,
        db_tx: &DatabaseTransaction,
        transfer: &Transfer,
        sender: Option<&User>,
        sender_name: &str,
    ) -> ResultEngine<EntryOutcome> {
        // Idempotency boundary: the external id. Re-running sync over a feed
        // that overlaps an earlier run books nothing twice.
        let seen = external_transactions::Entity::find_by_id(transfer.external_id)
            .one(db_tx)
            .await?;
        if seen.is_some() {
            return Ok(EntryOutcome::AlreadySeen);
        }

        let active_goal = match sender {
            Some(user) => {
                let model = goals::Entity::find()
                    .filter(goals::Column::UserId.eq(user.id.to_string()))
                    .filter(goals::Column::Status.eq(GoalStatus::Active.as_str()))
                    .one(db_tx)
                    .await?;
                model.map(SavingsGoal::try_from).transpose()?
            }
            None => None,
        };

        let record = ExternalTransaction {
            external_id: transfer.external_id,
            sender_account_id: transfer.sender_account_id,
            sender_name: sender_name.to_string(),
            amount_minor: transfer.amount_minor,
            reason: transfer.reason.clone(),
            occurred_at: transfer.occurred_at,
            goal_id: None,
            status: TransactionStatus::Unmatched,
            created_at: chrono::Utc::now(),
        };

        let Some(goal) = active_goal else {
            external_transactions::ActiveModel::from(&record)
                .insert(db_tx)
                .await?;
            return Ok(EntryOutcome::Unmatched);
        };

        let (_, goal, completed) = self
            .record_deposit_tx(
                db_tx,
                goal.id,
                transfer.amount_minor,
                None,
                transfer.reason.clone(),
                DepositSource::WalletSync,
                Some(transfer.external_id),
            )
            .await?;

        let record = ExternalTransaction {
            goal_id: Some(goal.id),
            status: TransactionStatus::Matched,
            ..record
        };
        external_transactions::ActiveModel::from(&record)
            .insert(db_tx)
            .await?;

        Ok(EntryOutcome::Matched { goal, completed })
    }

    async fn unmatched_record_tx(
        &self,
        db_tx: &DatabaseTransaction,
        external_id: i64,
    ) -> ResultEngine<ExternalTransaction> {
        let model = external_transactions::Entity::find_by_id(external_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("external transaction".to_string()))?;
        let record = ExternalTransaction::try_from(model)?;
        if record.status != TransactionStatus::Unmatched {
            return Err(EngineError::AlreadyProcessed(format!(
                "external transaction {external_id} is already {}",
                record.status.as_str()
            )));
        }
        Ok(record)
    }

    async fn mark_record_tx(
        &self,
        db_tx: &DatabaseTransaction,
        record: ExternalTransaction,
        status: TransactionStatus,
        goal_id: Option<Uuid>,
    ) -> ResultEngine<ExternalTransaction> {
        let mut active: external_transactions::ActiveModel =
            external_transactions::Entity::find_by_id(record.external_id)
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("external transaction".to_string()))?
                .into();
        active.status = ActiveValue::Set(status.as_str().to_string());
        active.goal_id = ActiveValue::Set(goal_id.map(|id| id.to_string()));
        let model = active.update(db_tx).await?;
        ExternalTransaction::try_from(model)
    }

    async fn notify_matched(&self, goal: &SavingsGoal, amount_minor: i64) {
        self.notify(
            goal.user_id,
            EventKind::TransactionMatched,
            format!(
                "A donation of {amount_minor} was matched to your {} goal.",
                goal.item_name
            ),
            Some(goal.id),
        )
        .await;
    }
}
