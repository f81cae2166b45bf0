//! Domain event notifications.
//!
//! The engine emits events through the [`Notifier`] seam exactly once per
//! committed transition and never waits on or retries delivery. The default
//! [`DbNotifier`] persists rows to the `notifications` table so the UI can
//! list them; a failed insert is logged and dropped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseConnection, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DepositRecorded,
    InterestAccrued,
    GoalCompleted,
    GoalApproved,
    GoalRejected,
    WithdrawalApproved,
    WithdrawalDenied,
    TransactionMatched,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DepositRecorded => "deposit_recorded",
            Self::InterestAccrued => "interest_accrued",
            Self::GoalCompleted => "goal_completed",
            Self::GoalApproved => "goal_approved",
            Self::GoalRejected => "goal_rejected",
            Self::WithdrawalApproved => "withdrawal_approved",
            Self::WithdrawalDenied => "withdrawal_denied",
            Self::TransactionMatched => "transaction_matched",
        }
    }
}

/// Receiver of domain events. Fire-and-forget: implementations must not
/// propagate delivery failures back into ledger mutations.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn emit(&self, user_id: Uuid, event: EventKind, message: &str, goal_id: Option<Uuid>);
}

/// Default notifier backed by the `notifications` table.
#[derive(Debug, Clone)]
pub struct DbNotifier {
    database: DatabaseConnection,
}

impl DbNotifier {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Notifier for DbNotifier {
    async fn emit(&self, user_id: Uuid, event: EventKind, message: &str, goal_id: Option<Uuid>) {
        let model = ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            goal_id: ActiveValue::Set(goal_id.map(|id| id.to_string())),
            kind: ActiveValue::Set(event.as_str().to_string()),
            message: ActiveValue::Set(message.to_string()),
            is_read: ActiveValue::Set(false),
            created_at: ActiveValue::Set(Utc::now()),
        };
        if let Err(err) = model.insert(&self.database).await {
            tracing::warn!("failed to store {} notification: {err}", event.as_str());
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub goal_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub goal_id: Option<String>,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Notification {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("notification".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::NotFound("notification user".to_string()))?,
            goal_id: model.goal_id.and_then(|s| Uuid::parse_str(&s).ok()),
            kind: model.kind,
            message: model.message,
            is_read: model.is_read,
            created_at: model.created_at,
        })
    }
}
