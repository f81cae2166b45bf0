use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EventKind, GoalStatus, InterestSettings, ResultEngine, SavingsGoal, deposits,
    goals, interest_events, interest_events::InterestEvent,
};

use super::{Engine, with_tx};

/// Deposits younger than this never earn interest in the current run. They
/// still count toward progress and completion.
pub const ELIGIBILITY_WINDOW_DAYS: i64 = 30;

/// Outcome of one accrual run over one goal. A zero-period result is the
/// normal answer for a call inside the current period, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualResult {
    pub periods_accrued: u32,
    pub interest_added_minor: i64,
    pub new_balance_minor: i64,
}

impl AccrualResult {
    fn zero(balance_minor: i64) -> Self {
        Self {
            periods_accrued: 0,
            interest_added_minor: 0,
            new_balance_minor: balance_minor,
        }
    }
}

/// Read-only balance projection for display: what the goal is worth now,
/// including interest that is due but not yet recorded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceProjection {
    pub savings_balance_minor: i64,
    pub eligible_balance_minor: i64,
    pub pending_interest_minor: i64,
    pub total_balance_minor: i64,
    /// Percent toward the goal price, capped at 100.
    pub progress: f64,
    /// Still needed to reach the goal, floored at 0.
    pub remaining_minor: i64,
    pub periods_due: u32,
}

fn period_interest_minor(balance_minor: i64, rate: f64) -> i64 {
    (balance_minor as f64 * rate).round() as i64
}

impl Engine {
    /// Commit compounding interest for every elapsed period on one goal.
    ///
    /// Returns `Ok(None)` when the goal is not `active` (not eligible) and a
    /// zero-period [`AccrualResult`] when nothing is due yet; repeated calls
    /// within one period never double-accrue because each recorded event is
    /// backdated to its own period boundary.
    pub async fn accrue_one(&self, goal_id: Uuid) -> ResultEngine<Option<AccrualResult>> {
        let settings = self.interest_settings().await?;

        let outcome =
            with_tx!(self, |db_tx| self.accrue_one_tx(&db_tx, goal_id, &settings).await)?;

        let Some((result, goal, completed)) = outcome else {
            return Ok(None);
        };

        if result.periods_accrued > 0 {
            // One aggregate event per run, not one per period.
            self.notify(
                goal.user_id,
                EventKind::InterestAccrued,
                format!(
                    "{} interest accrued on your {} goal over {} period(s).",
                    result.interest_added_minor, goal.item_name, result.periods_accrued
                ),
                Some(goal.id),
            )
            .await;
        }
        if completed {
            self.notify_completed(&goal).await;
        }

        Ok(Some(result))
    }

    /// Accrue over every active goal. A failing goal is logged and skipped;
    /// it never aborts the batch. Returns the goals that actually accrued.
    pub async fn accrue_all(&self) -> ResultEngine<Vec<(Uuid, AccrualResult)>> {
        let active = self.goals_with_status(GoalStatus::Active).await?;

        let mut results = Vec::new();
        for goal in active {
            match self.accrue_one(goal.id).await {
                Ok(Some(result)) if result.periods_accrued > 0 => {
                    results.push((goal.id, result));
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(goal_id = %goal.id, "interest accrual failed: {err}");
                }
            }
        }
        Ok(results)
    }

    /// Recorded accrual events for a goal, oldest first.
    pub async fn interest_history(&self, goal_id: Uuid) -> ResultEngine<Vec<InterestEvent>> {
        let models = interest_events::Entity::find()
            .filter(interest_events::Column::GoalId.eq(goal_id.to_string()))
            .order_by_asc(interest_events::Column::AccruedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(InterestEvent::try_from).collect()
    }

    /// Simulate the next accrual without persisting anything.
    pub async fn projected_balance(&self, goal_id: Uuid) -> ResultEngine<BalanceProjection> {
        let goal = self.goal(goal_id).await?;
        let settings = self.interest_settings().await?;
        let now = Utc::now();

        let savings_balance_minor = goal.savings_balance_minor();
        let eligible_balance_minor =
            self.eligible_deposits_minor(&self.database, goal_id, now).await?
                + goal.interest_earned_minor;

        let last_accrual = self.last_accrual(&self.database, &goal).await?;
        let period_days = settings.period.days();
        let elapsed_periods = ((now - last_accrual).num_days() / period_days).max(0);

        // Completed and withdrawn goals no longer earn; show no phantom
        // pending interest for them.
        let mut pending_interest_minor = 0;
        if goal.status == GoalStatus::Active && eligible_balance_minor > 0 {
            let mut balance_minor = eligible_balance_minor;
            for _ in 0..elapsed_periods {
                let interest_minor = period_interest_minor(balance_minor, settings.rate);
                pending_interest_minor += interest_minor;
                balance_minor += interest_minor;
            }
        }

        let total_balance_minor = savings_balance_minor + pending_interest_minor;
        let progress = if goal.goal_price_minor > 0 {
            (total_balance_minor as f64 / goal.goal_price_minor as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        let remaining_minor = (goal.goal_price_minor - total_balance_minor).max(0);

        Ok(BalanceProjection {
            savings_balance_minor,
            eligible_balance_minor,
            pending_interest_minor,
            total_balance_minor,
            progress,
            remaining_minor,
            periods_due: elapsed_periods as u32,
        })
    }

    async fn accrue_one_tx(
        &self,
        db_tx: &DatabaseTransaction,
        goal_id: Uuid,
        settings: &InterestSettings,
    ) -> ResultEngine<Option<(AccrualResult, SavingsGoal, bool)>> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("goal".to_string()))?;
        let goal = SavingsGoal::try_from(model)?;
        if goal.status != GoalStatus::Active {
            return Ok(None);
        }

        let now = Utc::now();
        let eligible_balance_minor = self.eligible_deposits_minor(db_tx, goal_id, now).await?
            + goal.interest_earned_minor;
        if eligible_balance_minor <= 0 {
            return Ok(Some((AccrualResult::zero(0), goal, false)));
        }

        let last_accrual = self.last_accrual(db_tx, &goal).await?;
        let period_days = settings.period.days();
        let elapsed_periods = (now - last_accrual).num_days() / period_days;
        if elapsed_periods <= 0 {
            return Ok(Some((
                AccrualResult::zero(eligible_balance_minor),
                goal,
                false,
            )));
        }

        let mut balance_minor = eligible_balance_minor;
        let mut total_interest_minor = 0;
        for i in 1..=elapsed_periods {
            let interest_minor = period_interest_minor(balance_minor, settings.rate);
            // Backdated stamp: the period boundary, never "now", so a
            // late-running job does not compress or inflate periods.
            let accrued_at = last_accrual + Duration::days(period_days * i);
            let event = InterestEvent::new(goal_id, interest_minor, balance_minor, accrued_at);
            interest_events::ActiveModel::from(&event)
                .insert(db_tx)
                .await?;
            balance_minor += interest_minor;
            total_interest_minor += interest_minor;
        }

        goals::Entity::update_many()
            .col_expr(
                goals::Column::InterestEarnedMinor,
                Expr::col(goals::Column::InterestEarnedMinor).add(total_interest_minor),
            )
            .col_expr(goals::Column::UpdatedAt, Expr::value(now))
            .filter(goals::Column::Id.eq(goal_id.to_string()))
            .exec(db_tx)
            .await?;

        let (goal, completed) = self.finish_completion_check(db_tx, goal_id).await?;
        let result = AccrualResult {
            periods_accrued: elapsed_periods as u32,
            interest_added_minor: total_interest_minor,
            new_balance_minor: balance_minor,
        };
        Ok(Some((result, goal, completed)))
    }

    /// Sum of deposits old enough to earn interest (the 30-day grace window
    /// is the anti-gaming rule).
    async fn eligible_deposits_minor<C: ConnectionTrait>(
        &self,
        conn: &C,
        goal_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<i64> {
        let cutoff = now - Duration::days(ELIGIBILITY_WINDOW_DAYS);
        let models = deposits::Entity::find()
            .filter(deposits::Column::GoalId.eq(goal_id.to_string()))
            .filter(deposits::Column::DepositedAt.lte(cutoff))
            .all(conn)
            .await?;
        Ok(models.iter().map(|m| m.amount_minor).sum())
    }

    /// Timestamp of the most recent interest event, or the goal's creation
    /// time when no event exists yet.
    async fn last_accrual<C: ConnectionTrait>(
        &self,
        conn: &C,
        goal: &SavingsGoal,
    ) -> ResultEngine<DateTime<Utc>> {
        let last = interest_events::Entity::find()
            .filter(interest_events::Column::GoalId.eq(goal.id.to_string()))
            .order_by_desc(interest_events::Column::AccruedAt)
            .one(conn)
            .await?;
        Ok(last.map_or(goal.created_at, |event| event.accrued_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_interest_rounds_to_nearest_minor_unit() {
        assert_eq!(period_interest_minor(100_000, 0.05), 5_000);
        assert_eq!(period_interest_minor(105_000, 0.05), 5_250);
        assert_eq!(period_interest_minor(333, 0.05), 17);
        assert_eq!(period_interest_minor(0, 0.05), 0);
    }
}
