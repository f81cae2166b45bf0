use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EventKind, GoalStatus, ResultEngine, SavingsGoal, goals, goals::OPEN_STATUSES,
    users,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

/// One row of the savings leaderboard. The item name is withheld unless the
/// owner has made the goal public.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub display_name: String,
    pub progress: f64,
    pub item_name: Option<String>,
    pub is_public: bool,
}

impl Engine {
    /// Member-initiated goal over a catalog item; starts in
    /// `pending_approval`.
    pub async fn submit_goal(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        note: Option<&str>,
    ) -> ResultEngine<SavingsGoal> {
        self.user(user_id).await?;
        let item = self.catalog_item(item_id).await?;
        if !item.available {
            return Err(EngineError::Conflict(format!(
                "item {} is not available",
                item.name
            )));
        }

        let goal = SavingsGoal::new(
            user_id,
            item.name,
            item.price_minor,
            normalize_optional_text(note),
            GoalStatus::PendingApproval,
        )?;
        with_tx!(self, |db_tx| {
            self.ensure_no_open_goal(&db_tx, user_id).await?;
            goals::ActiveModel::from(&goal).insert(&db_tx).await?;
            Ok::<_, EngineError>(())
        })?;
        Ok(goal)
    }

    /// Admin-initiated goal with a free-form item and price; starts
    /// `active` immediately.
    pub async fn create_goal(
        &self,
        user_id: Uuid,
        item_name: &str,
        goal_price_minor: i64,
        note: Option<&str>,
    ) -> ResultEngine<SavingsGoal> {
        self.user(user_id).await?;
        let item_name = normalize_required_name(item_name, "item")?;

        let goal = SavingsGoal::new(
            user_id,
            item_name,
            goal_price_minor,
            normalize_optional_text(note),
            GoalStatus::Active,
        )?;
        with_tx!(self, |db_tx| {
            self.ensure_no_open_goal(&db_tx, user_id).await?;
            goals::ActiveModel::from(&goal).insert(&db_tx).await?;
            Ok::<_, EngineError>(())
        })?;
        Ok(goal)
    }

    pub async fn goal(&self, goal_id: Uuid) -> ResultEngine<SavingsGoal> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("goal".to_string()))?;
        SavingsGoal::try_from(model)
    }

    pub async fn goals_for_user(&self, user_id: Uuid) -> ResultEngine<Vec<SavingsGoal>> {
        let models = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(goals::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(SavingsGoal::try_from).collect()
    }

    pub async fn goals_with_status(&self, status: GoalStatus) -> ResultEngine<Vec<SavingsGoal>> {
        let models = goals::Entity::find()
            .filter(goals::Column::Status.eq(status.as_str()))
            .order_by_desc(goals::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(SavingsGoal::try_from).collect()
    }

    /// The single `active` goal for a user, if any. At most one exists by
    /// the one-goal-at-a-time invariant.
    pub async fn active_goal_for_user(&self, user_id: Uuid) -> ResultEngine<Option<SavingsGoal>> {
        let model = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .filter(goals::Column::Status.eq(GoalStatus::Active.as_str()))
            .one(&self.database)
            .await?;
        model.map(SavingsGoal::try_from).transpose()
    }

    pub async fn approve_goal(&self, goal_id: Uuid) -> ResultEngine<SavingsGoal> {
        let goal = self
            .transition(goal_id, &[GoalStatus::PendingApproval], GoalStatus::Active)
            .await?;
        self.notify(
            goal.user_id,
            EventKind::GoalApproved,
            format!("Your savings goal for {} was approved.", goal.item_name),
            Some(goal.id),
        )
        .await;
        Ok(goal)
    }

    pub async fn reject_goal(&self, goal_id: Uuid) -> ResultEngine<SavingsGoal> {
        let goal = self
            .transition(goal_id, &[GoalStatus::PendingApproval], GoalStatus::Cancelled)
            .await?;
        self.notify(
            goal.user_id,
            EventKind::GoalRejected,
            format!("Your savings goal for {} was rejected.", goal.item_name),
            Some(goal.id),
        )
        .await;
        Ok(goal)
    }

    /// Owner asks to withdraw an active goal; an admin settles it later.
    pub async fn request_withdrawal(
        &self,
        goal_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<SavingsGoal> {
        self.ensure_owner(goal_id, user_id).await?;
        self.transition(goal_id, &[GoalStatus::Active], GoalStatus::WithdrawalPending)
            .await
    }

    pub async fn approve_withdrawal(&self, goal_id: Uuid) -> ResultEngine<SavingsGoal> {
        let goal = self
            .transition(
                goal_id,
                &[GoalStatus::WithdrawalPending],
                GoalStatus::Withdrawn,
            )
            .await?;
        self.notify(
            goal.user_id,
            EventKind::WithdrawalApproved,
            format!("Your withdrawal from the {} goal was approved.", goal.item_name),
            Some(goal.id),
        )
        .await;
        Ok(goal)
    }

    pub async fn deny_withdrawal(&self, goal_id: Uuid) -> ResultEngine<SavingsGoal> {
        let goal = self
            .transition(goal_id, &[GoalStatus::WithdrawalPending], GoalStatus::Active)
            .await?;
        self.notify(
            goal.user_id,
            EventKind::WithdrawalDenied,
            format!(
                "Your withdrawal request for the {} goal was denied; the goal stays active.",
                goal.item_name
            ),
            Some(goal.id),
        )
        .await;
        Ok(goal)
    }

    pub async fn cancel_goal(&self, goal_id: Uuid) -> ResultEngine<SavingsGoal> {
        self.transition(
            goal_id,
            &[
                GoalStatus::Active,
                GoalStatus::WithdrawalPending,
                GoalStatus::PendingApproval,
            ],
            GoalStatus::Cancelled,
        )
        .await
    }

    /// Owner flips whether the goal's item shows on the leaderboard.
    pub async fn toggle_visibility(
        &self,
        goal_id: Uuid,
        user_id: Uuid,
        is_public: bool,
    ) -> ResultEngine<SavingsGoal> {
        let goal = self.ensure_owner(goal_id, user_id).await?;
        if goal.status != GoalStatus::Active {
            return Err(EngineError::InvalidState(
                "visibility can only change on an active goal".to_string(),
            ));
        }
        let active = goals::ActiveModel {
            id: ActiveValue::Set(goal_id.to_string()),
            is_public: ActiveValue::Set(is_public),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let updated = active.update(&self.database).await?;
        SavingsGoal::try_from(updated)
    }

    /// Admin edit of item name, price, and visibility on a non-terminal
    /// goal.
    pub async fn update_goal_details(
        &self,
        goal_id: Uuid,
        item_name: &str,
        goal_price_minor: i64,
        is_public: bool,
    ) -> ResultEngine<SavingsGoal> {
        let item_name = normalize_required_name(item_name, "item")?;
        if goal_price_minor <= 0 {
            return Err(EngineError::Validation(
                "goal_price_minor must be > 0".to_string(),
            ));
        }
        let goal = self.goal(goal_id).await?;
        if goal.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "cannot edit a {} goal",
                goal.status.as_str()
            )));
        }
        let active = goals::ActiveModel {
            id: ActiveValue::Set(goal_id.to_string()),
            item_name: ActiveValue::Set(item_name),
            goal_price_minor: ActiveValue::Set(goal_price_minor),
            is_public: ActiveValue::Set(is_public),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let updated = active.update(&self.database).await?;
        SavingsGoal::try_from(updated)
    }

    /// Active savers ranked by progress toward their goal, progress capped
    /// at 100%.
    pub async fn leaderboard(&self) -> ResultEngine<Vec<LeaderboardRow>> {
        let rows: Vec<(goals::Model, Option<users::Model>)> = goals::Entity::find()
            .filter(goals::Column::Status.eq(GoalStatus::Active.as_str()))
            .filter(goals::Column::GoalPriceMinor.gt(0))
            .find_also_related(users::Entity)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (goal_model, user_model) in rows {
            let Some(user_model) = user_model else { continue };
            let goal = SavingsGoal::try_from(goal_model)?;
            let progress = (goal.savings_balance_minor() as f64
                / goal.goal_price_minor as f64
                * 100.0)
                .min(100.0);
            out.push(LeaderboardRow {
                display_name: user_model.display_name,
                progress,
                item_name: goal.is_public.then_some(goal.item_name),
                is_public: goal.is_public,
            });
        }
        out.sort_by(|a, b| b.progress.total_cmp(&a.progress));
        Ok(out)
    }

    async fn ensure_owner(&self, goal_id: Uuid, user_id: Uuid) -> ResultEngine<SavingsGoal> {
        let goal = self.goal(goal_id).await?;
        if goal.user_id != user_id {
            return Err(EngineError::Forbidden(
                "goal belongs to another user".to_string(),
            ));
        }
        Ok(goal)
    }

    async fn ensure_no_open_goal(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<()> {
        let open = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .filter(goals::Column::Status.is_in(OPEN_STATUSES))
            .one(db_tx)
            .await?;
        if open.is_some() {
            return Err(EngineError::Conflict(
                "user already has an open savings goal".to_string(),
            ));
        }
        Ok(())
    }

    /// Single transition path: checks the current status against the allowed
    /// set, then writes the new status and refreshes `updated_at`.
    async fn transition(
        &self,
        goal_id: Uuid,
        from: &[GoalStatus],
        to: GoalStatus,
    ) -> ResultEngine<SavingsGoal> {
        let updated = with_tx!(self, |db_tx| {
            let model = goals::Entity::find_by_id(goal_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("goal".to_string()))?;
            let current = GoalStatus::try_from(model.status.as_str())?;
            if !from.contains(&current) {
                return Err(EngineError::InvalidState(format!(
                    "cannot move a {} goal to {}",
                    current.as_str(),
                    to.as_str()
                )));
            }
            let active = goals::ActiveModel {
                id: ActiveValue::Set(goal_id.to_string()),
                status: ActiveValue::Set(to.as_str().to_string()),
                updated_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            };
            let updated = active.update(&db_tx).await?;
            Ok::<_, EngineError>(updated)
        })?;
        tracing::info!(goal_id = %goal_id, status = to.as_str(), "goal transition");
        SavingsGoal::try_from(updated)
    }
}
