//! Savings goal primitives.
//!
//! A `SavingsGoal` ties one member to one target item and price. The goal's
//! `amount_deposited_minor` and `interest_earned_minor` are denormalized
//! running sums over its deposits and interest events; every mutation goes
//! through a single engine code path that updates both atomically.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    PendingApproval,
    Active,
    WithdrawalPending,
    Completed,
    Cancelled,
    Withdrawn,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Active => "active",
            Self::WithdrawalPending => "withdrawal_pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Withdrawn => "withdrawn",
        }
    }

    /// A goal in an open state counts against the one-goal-at-a-time rule.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            Self::PendingApproval | Self::Active | Self::WithdrawalPending
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Withdrawn)
    }
}

/// Status strings that block a new goal for the same user.
pub const OPEN_STATUSES: [&str; 3] = ["pending_approval", "active", "withdrawal_pending"];

impl TryFrom<&str> for GoalStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending_approval" => Ok(Self::PendingApproval),
            "active" => Ok(Self::Active),
            "withdrawal_pending" => Ok(Self::WithdrawalPending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(EngineError::Validation(format!(
                "invalid goal status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_name: String,
    pub goal_price_minor: i64,
    pub amount_deposited_minor: i64,
    pub interest_earned_minor: i64,
    pub status: GoalStatus,
    pub note: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(
        user_id: Uuid,
        item_name: String,
        goal_price_minor: i64,
        note: Option<String>,
        status: GoalStatus,
    ) -> ResultEngine<Self> {
        if goal_price_minor <= 0 {
            return Err(EngineError::Validation(
                "goal_price_minor must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            item_name,
            goal_price_minor,
            amount_deposited_minor: 0,
            interest_earned_minor: 0,
            status,
            note,
            is_public: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Deposits plus recorded interest. Pending (unrecorded) interest is not
    /// part of this figure; see the balance projection.
    pub fn savings_balance_minor(&self) -> i64 {
        self.amount_deposited_minor + self.interest_earned_minor
    }

    pub fn is_complete(&self) -> bool {
        self.savings_balance_minor() >= self.goal_price_minor
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub item_name: String,
    pub goal_price_minor: i64,
    pub amount_deposited_minor: i64,
    pub interest_earned_minor: i64,
    pub status: String,
    pub note: Option<String>,
    pub is_public: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::deposits::Entity")]
    Deposits,
    #[sea_orm(has_many = "super::interest_events::Entity")]
    InterestEvents,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::deposits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deposits.def()
    }
}

impl Related<super::interest_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InterestEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SavingsGoal> for ActiveModel {
    fn from(goal: &SavingsGoal) -> Self {
        Self {
            id: ActiveValue::Set(goal.id.to_string()),
            user_id: ActiveValue::Set(goal.user_id.to_string()),
            item_name: ActiveValue::Set(goal.item_name.clone()),
            goal_price_minor: ActiveValue::Set(goal.goal_price_minor),
            amount_deposited_minor: ActiveValue::Set(goal.amount_deposited_minor),
            interest_earned_minor: ActiveValue::Set(goal.interest_earned_minor),
            status: ActiveValue::Set(goal.status.as_str().to_string()),
            note: ActiveValue::Set(goal.note.clone()),
            is_public: ActiveValue::Set(goal.is_public),
            created_at: ActiveValue::Set(goal.created_at),
            updated_at: ActiveValue::Set(goal.updated_at),
        }
    }
}

impl TryFrom<Model> for SavingsGoal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("goal".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::NotFound("goal owner".to_string()))?,
            item_name: model.item_name,
            goal_price_minor: model.goal_price_minor,
            amount_deposited_minor: model.amount_deposited_minor,
            interest_earned_minor: model.interest_earned_minor,
            status: GoalStatus::try_from(model.status.as_str())?,
            note: model.note,
            is_public: model.is_public,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_statuses_match_is_open() {
        for raw in OPEN_STATUSES {
            assert!(GoalStatus::try_from(raw).unwrap().is_open());
        }
        assert!(!GoalStatus::Completed.is_open());
        assert!(!GoalStatus::Withdrawn.is_open());
        assert!(!GoalStatus::Cancelled.is_open());
    }

    #[test]
    fn status_round_trips_through_as_str() {
        for status in [
            GoalStatus::PendingApproval,
            GoalStatus::Active,
            GoalStatus::WithdrawalPending,
            GoalStatus::Completed,
            GoalStatus::Cancelled,
            GoalStatus::Withdrawn,
        ] {
            assert_eq!(GoalStatus::try_from(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let err = SavingsGoal::new(
            Uuid::new_v4(),
            "Freighter".to_string(),
            0,
            None,
            GoalStatus::Active,
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("goal_price_minor must be > 0".to_string())
        );
    }
}
