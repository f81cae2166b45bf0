use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DepositSource, EngineError, GoalStatus, ResultEngine, SavingsGoal};

use super::Engine;

/// One goal's cut of a bonus distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusShare {
    pub goal_id: Uuid,
    pub user_id: Uuid,
    pub amount_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub total_minor: i64,
    pub shares: Vec<BonusShare>,
}

/// Split `total_minor` across the active goals in proportion to what each
/// has deposited. Shares are floored; the rounding remainder goes to the
/// largest depositor. When nobody has deposited anything yet the split is
/// equal instead.
fn split_shares(total_minor: i64, goals: &[SavingsGoal]) -> Vec<i64> {
    let deposited: i64 = goals.iter().map(|g| g.amount_deposited_minor).sum();

    let mut shares: Vec<i64> = if deposited > 0 {
        goals
            .iter()
            .map(|g| total_minor * g.amount_deposited_minor / deposited)
            .collect()
    } else {
        vec![total_minor / goals.len() as i64; goals.len()]
    };

    let remainder = total_minor - shares.iter().sum::<i64>();
    if remainder > 0 {
        // Ties break toward the earliest goal; goals are sorted by
        // created_at ascending before we get here.
        let largest = goals
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                a.amount_deposited_minor
                    .cmp(&b.amount_deposited_minor)
                    .then(ib.cmp(ia))
            })
            .map_or(0, |(i, _)| i);
        shares[largest] += remainder;
    }
    shares
}

impl Engine {
    /// Pay a treasury bonus out across every active goal. Each share lands
    /// as a regular deposit with the `affiliate` source, so it counts toward
    /// progress and completion but respects the interest eligibility window
    /// like any other deposit.
    pub async fn distribute_bonus(
        &self,
        total_minor: i64,
        recorded_by: Option<Uuid>,
        note: Option<&str>,
    ) -> ResultEngine<DistributionSummary> {
        if total_minor <= 0 {
            return Err(EngineError::Validation(
                "distribution amount must be positive".to_string(),
            ));
        }

        let mut goals = self.goals_with_status(GoalStatus::Active).await?;
        if goals.is_empty() {
            return Err(EngineError::Conflict(
                "no active savings goals to distribute to".to_string(),
            ));
        }
        goals.sort_by_key(|g| g.created_at);

        let amounts = split_shares(total_minor, &goals);

        let mut shares = Vec::with_capacity(goals.len());
        for (goal, amount_minor) in goals.iter().zip(amounts) {
            if amount_minor <= 0 {
                continue;
            }
            self.record_deposit(
                goal.id,
                amount_minor,
                recorded_by,
                note,
                DepositSource::Affiliate,
                None,
            )
            .await?;
            shares.push(BonusShare {
                goal_id: goal.id,
                user_id: goal.user_id,
                amount_minor,
            });
        }

        tracing::info!(
            total = total_minor,
            recipients = shares.len(),
            "bonus distributed"
        );
        Ok(DistributionSummary {
            total_minor,
            shares,
        })
    }
}
