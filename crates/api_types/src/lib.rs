//! Request and response bodies shared by the server and its clients.
//!
//! All amounts are integer minor units. Statuses and kinds travel as their
//! canonical snake_case strings; the engine owns the parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user {
    use super::*;

    /// Body for `POST /login`: upsert the caller's user row.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub account_id: i64,
        pub display_name: String,
        pub credential: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub account_id: i64,
        pub display_name: String,
        pub is_admin: bool,
        pub created_at: DateTime<Utc>,
    }
}

pub mod catalog {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CatalogItemNew {
        pub name: String,
        pub price_minor: i64,
        pub description: Option<String>,
        pub category: Option<String>,
        pub available: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CatalogItemView {
        pub id: Uuid,
        pub name: String,
        pub price_minor: i64,
        pub description: Option<String>,
        pub category: String,
        pub available: bool,
    }
}

pub mod goal {
    use super::*;

    /// Member goal submission: pick an item from the catalog.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalSubmit {
        pub item_id: Uuid,
        pub note: Option<String>,
    }

    /// Admin goal creation: free-form item, straight to `active`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AdminGoalNew {
        pub user_id: Uuid,
        pub item_name: String,
        pub goal_price_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalUpdate {
        pub item_name: String,
        pub goal_price_minor: i64,
        pub is_public: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VisibilityToggle {
        pub is_public: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub item_name: String,
        pub goal_price_minor: i64,
        pub amount_deposited_minor: i64,
        pub interest_earned_minor: i64,
        pub status: String,
        pub note: Option<String>,
        pub is_public: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Projected goal worth, including interest due but not yet recorded.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub savings_balance_minor: i64,
        pub eligible_balance_minor: i64,
        pub pending_interest_minor: i64,
        pub total_balance_minor: i64,
        pub progress: f64,
        pub remaining_minor: i64,
        pub periods_due: u32,
    }

    /// One leaderboard row; `item_name` is withheld for private goals.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeaderboardEntry {
        pub display_name: String,
        pub progress: f64,
        pub item_name: Option<String>,
        pub is_public: bool,
    }
}

pub mod deposit {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositView {
        pub id: Uuid,
        pub goal_id: Uuid,
        pub amount_minor: i64,
        pub source: String,
        pub note: Option<String>,
        pub deposited_at: DateTime<Utc>,
    }
}

pub mod interest {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccrualView {
        pub goal_id: Uuid,
        pub periods_accrued: u32,
        pub interest_added_minor: i64,
        pub new_balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InterestSettingsView {
        pub rate: f64,
        pub period: String,
    }

    /// `PUT /settings/interest`; absent fields are left unchanged.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct InterestSettingsUpdate {
        pub rate: Option<f64>,
        pub period: Option<String>,
    }
}

pub mod reconcile {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "status", rename_all = "snake_case")]
    pub enum SyncResponse {
        NoCredential,
        Completed {
            matched_count: u32,
            matched_amount_minor: i64,
            unmatched_count: u32,
            total_processed: u32,
        },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExternalTransactionView {
        pub external_id: i64,
        pub sender_account_id: i64,
        pub sender_name: String,
        pub amount_minor: i64,
        pub reason: Option<String>,
        pub occurred_at: DateTime<Utc>,
        pub goal_id: Option<Uuid>,
        pub status: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AssignRequest {
        pub goal_id: Uuid,
    }
}

pub mod distribution {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DistributeRequest {
        pub total_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareView {
        pub goal_id: Uuid,
        pub user_id: Uuid,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DistributionView {
        pub total_minor: i64,
        pub shares: Vec<ShareView>,
    }
}

pub mod notification {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: Uuid,
        pub goal_id: Option<Uuid>,
        pub kind: String,
        pub message: String,
        pub is_read: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnreadCount {
        pub unread: u64,
    }
}
