//! Immutable interest accrual log.
//!
//! The sequence of events per goal is the authoritative history: the last
//! event's `accrued_at` anchors the elapsed-period math, and the goal's
//! `interest_earned_minor` must always equal the sum of event amounts.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestEvent {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub amount_minor: i64,
    pub balance_before_minor: i64,
    pub balance_after_minor: i64,
    pub accrued_at: DateTime<Utc>,
}

impl InterestEvent {
    pub fn new(
        goal_id: Uuid,
        amount_minor: i64,
        balance_before_minor: i64,
        accrued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            amount_minor,
            balance_before_minor,
            balance_after_minor: balance_before_minor + amount_minor,
            accrued_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "interest_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub goal_id: String,
    pub amount_minor: i64,
    pub balance_before_minor: i64,
    pub balance_after_minor: i64,
    pub accrued_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goals::Entity",
        from = "Column::GoalId",
        to = "super::goals::Column::Id"
    )]
    Goals,
}

impl Related<super::goals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&InterestEvent> for ActiveModel {
    fn from(event: &InterestEvent) -> Self {
        Self {
            id: ActiveValue::Set(event.id.to_string()),
            goal_id: ActiveValue::Set(event.goal_id.to_string()),
            amount_minor: ActiveValue::Set(event.amount_minor),
            balance_before_minor: ActiveValue::Set(event.balance_before_minor),
            balance_after_minor: ActiveValue::Set(event.balance_after_minor),
            accrued_at: ActiveValue::Set(event.accrued_at),
        }
    }
}

impl TryFrom<Model> for InterestEvent {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("interest event".to_string()))?,
            goal_id: Uuid::parse_str(&model.goal_id)
                .map_err(|_| EngineError::NotFound("interest event goal".to_string()))?,
            amount_minor: model.amount_minor,
            balance_before_minor: model.balance_before_minor,
            balance_after_minor: model.balance_after_minor,
            accrued_at: model.accrued_at,
        })
    }
}
