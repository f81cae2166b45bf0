use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Deposit, DepositSource, EngineError, EventKind, GoalStatus, ResultEngine, SavingsGoal,
    deposits, goals,
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Append a deposit and move the goal's running total in one atomic
    /// step; completion is re-evaluated in the same transaction so a deposit
    /// alone can complete a goal.
    pub async fn record_deposit(
        &self,
        goal_id: Uuid,
        amount_minor: i64,
        recorded_by: Option<Uuid>,
        note: Option<&str>,
        source: DepositSource,
        external_ref: Option<i64>,
    ) -> ResultEngine<Deposit> {
        let (deposit, goal, completed) = with_tx!(self, |db_tx| {
            self.record_deposit_tx(
                &db_tx,
                goal_id,
                amount_minor,
                recorded_by,
                normalize_optional_text(note),
                source,
                external_ref,
            )
            .await
        })?;

        self.notify(
            goal.user_id,
            EventKind::DepositRecorded,
            format!(
                "{} credited to your {} goal.",
                deposit.amount_minor, goal.item_name
            ),
            Some(goal.id),
        )
        .await;
        if completed {
            self.notify_completed(&goal).await;
        }

        Ok(deposit)
    }

    pub async fn deposits_for_goal(&self, goal_id: Uuid) -> ResultEngine<Vec<Deposit>> {
        let models = deposits::Entity::find()
            .filter(deposits::Column::GoalId.eq(goal_id.to_string()))
            .order_by_desc(deposits::Column::DepositedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Deposit::try_from).collect()
    }

    /// Deposit insert plus in-place balance increment plus completion check,
    /// all against the caller's transaction. Shared by the manual path,
    /// reconciliation, and bonus distribution.
    pub(crate) async fn record_deposit_tx(
        &self,
        db_tx: &DatabaseTransaction,
        goal_id: Uuid,
        amount_minor: i64,
        recorded_by: Option<Uuid>,
        note: Option<String>,
        source: DepositSource,
        external_ref: Option<i64>,
    ) -> ResultEngine<(Deposit, SavingsGoal, bool)> {
        let deposit = Deposit::new(goal_id, amount_minor, recorded_by, note, source, external_ref)?;

        let goal_model = goals::Entity::find_by_id(goal_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("goal".to_string()))?;
        let status = GoalStatus::try_from(goal_model.status.as_str())?;
        if status != GoalStatus::Active {
            return Err(EngineError::InvalidState(format!(
                "deposits are only accepted on active goals, not {}",
                status.as_str()
            )));
        }

        // Replay protection for reconciliation retries: one deposit per
        // external reference, ever.
        if let Some(external_ref) = external_ref {
            let existing = deposits::Entity::find()
                .filter(deposits::Column::ExternalRef.eq(external_ref))
                .one(db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::Duplicate(format!(
                    "external reference {external_ref} is already booked"
                )));
            }
        }

        deposits::ActiveModel::from(&deposit).insert(db_tx).await?;

        // In-place increment, not application-memory read-modify-write.
        goals::Entity::update_many()
            .col_expr(
                goals::Column::AmountDepositedMinor,
                Expr::col(goals::Column::AmountDepositedMinor).add(amount_minor),
            )
            .col_expr(goals::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(goals::Column::Id.eq(goal_id.to_string()))
            .exec(db_tx)
            .await?;

        let (goal, completed) = self.finish_completion_check(db_tx, goal_id).await?;
        Ok((deposit, goal, completed))
    }

    /// Re-read the goal and flip it to `completed` when the running totals
    /// have crossed the price. Returns the post-update goal.
    pub(crate) async fn finish_completion_check(
        &self,
        db_tx: &DatabaseTransaction,
        goal_id: Uuid,
    ) -> ResultEngine<(SavingsGoal, bool)> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("goal".to_string()))?;
        let mut goal = SavingsGoal::try_from(model)?;

        if goal.status == GoalStatus::Active && goal.is_complete() {
            let now = Utc::now();
            let active = goals::ActiveModel {
                id: ActiveValue::Set(goal_id.to_string()),
                status: ActiveValue::Set(GoalStatus::Completed.as_str().to_string()),
                updated_at: ActiveValue::Set(now),
                ..Default::default()
            };
            active.update(db_tx).await?;
            goal.status = GoalStatus::Completed;
            goal.updated_at = now;
            return Ok((goal, true));
        }
        Ok((goal, false))
    }

    pub(crate) async fn notify_completed(&self, goal: &SavingsGoal) {
        self.notify(
            goal.user_id,
            EventKind::GoalCompleted,
            format!(
                "Congratulations! Your savings goal for {} is complete!",
                goal.item_name
            ),
            Some(goal.id),
        )
        .await;
    }
}
