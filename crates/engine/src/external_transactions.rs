//! External transaction records from the treasury's ledger feed.
//!
//! `external_id` is the caller-assigned identifier from the external ledger
//! and is the idempotency boundary for reconciliation: a given id is
//! processed at most once. Once `matched` or `ignored` the record is
//! terminal.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Unmatched,
    Matched,
    Ignored,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::Matched => "matched",
            Self::Ignored => "ignored",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "unmatched" => Ok(Self::Unmatched),
            "matched" => Ok(Self::Matched),
            "ignored" => Ok(Self::Ignored),
            other => Err(EngineError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTransaction {
    pub external_id: i64,
    pub sender_account_id: i64,
    pub sender_name: String,
    pub amount_minor: i64,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub goal_id: Option<Uuid>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "external_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub external_id: i64,
    pub sender_account_id: i64,
    pub sender_name: String,
    pub amount_minor: i64,
    pub reason: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub goal_id: Option<String>,
    pub status: String,
    pub created_at: DateTimeUtc,
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

impl From<&ExternalTransaction> for ActiveModel {
    fn from(tx: &ExternalTransaction) -> Self {
        Self {
            external_id: ActiveValue::Set(tx.external_id),
            sender_account_id: ActiveValue::Set(tx.sender_account_id),
            sender_name: ActiveValue::Set(tx.sender_name.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            reason: ActiveValue::Set(tx.reason.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            goal_id: ActiveValue::Set(tx.goal_id.map(|id| id.to_string())),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for ExternalTransaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            external_id: model.external_id,
            sender_account_id: model.sender_account_id,
            sender_name: model.sender_name,
            amount_minor: model.amount_minor,
            reason: model.reason,
            occurred_at: model.occurred_at,
            goal_id: model.goal_id.and_then(|s| Uuid::parse_str(&s).ok()),
            status: TransactionStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}
