//! Deposit rows. Immutable once written.
//!
//! `deposited_at` drives the interest-eligibility aging; `external_ref`
//! carries the external transaction id for reconciled deposits and is unique
//! when present, which is what prevents double-booking on sync replays.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepositSource {
    Manual,
    WalletSync,
    Affiliate,
}

impl DepositSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::WalletSync => "wallet-sync",
            Self::Affiliate => "affiliate",
        }
    }
}

impl TryFrom<&str> for DepositSource {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "manual" => Ok(Self::Manual),
            "wallet-sync" => Ok(Self::WalletSync),
            "affiliate" => Ok(Self::Affiliate),
            other => Err(EngineError::Validation(format!(
                "invalid deposit source: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: Uuid,
    pub goal_id: Uuid,
    pub amount_minor: i64,
    pub recorded_by: Option<Uuid>,
    pub note: Option<String>,
    pub source: DepositSource,
    pub external_ref: Option<i64>,
    pub deposited_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Deposit {
    pub fn new(
        goal_id: Uuid,
        amount_minor: i64,
        recorded_by: Option<Uuid>,
        note: Option<String>,
        source: DepositSource,
        external_ref: Option<i64>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::Validation(
                "amount_minor must be > 0".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            goal_id,
            amount_minor,
            recorded_by,
            note,
            source,
            external_ref,
            deposited_at: now,
            created_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deposits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub goal_id: String,
    pub amount_minor: i64,
    pub recorded_by: Option<String>,
    pub note: Option<String>,
    pub source: String,
    pub external_ref: Option<i64>,
    pub deposited_at: DateTimeUtc,
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

impl From<&Deposit> for ActiveModel {
    fn from(deposit: &Deposit) -> Self {
        Self {
            id: ActiveValue::Set(deposit.id.to_string()),
            goal_id: ActiveValue::Set(deposit.goal_id.to_string()),
            amount_minor: ActiveValue::Set(deposit.amount_minor),
            recorded_by: ActiveValue::Set(deposit.recorded_by.map(|id| id.to_string())),
            note: ActiveValue::Set(deposit.note.clone()),
            source: ActiveValue::Set(deposit.source.as_str().to_string()),
            external_ref: ActiveValue::Set(deposit.external_ref),
            deposited_at: ActiveValue::Set(deposit.deposited_at),
            created_at: ActiveValue::Set(deposit.created_at),
        }
    }
}

impl TryFrom<Model> for Deposit {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("deposit".to_string()))?,
            goal_id: Uuid::parse_str(&model.goal_id)
                .map_err(|_| EngineError::NotFound("deposit goal".to_string()))?,
            amount_minor: model.amount_minor,
            recorded_by: model.recorded_by.and_then(|s| Uuid::parse_str(&s).ok()),
            note: model.note,
            source: DepositSource::try_from(model.source.as_str())?,
            external_ref: model.external_ref,
            deposited_at: model.deposited_at,
            created_at: model.created_at,
        })
    }
}
