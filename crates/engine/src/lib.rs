//! Savings ledger engine for a community treasury.
//!
//! Members accumulate credit toward a goal through recorded deposits and
//! periodic compounding interest; the treasury's external ledger feed is
//! reconciled against open goals. All financial mutations go through the
//! [`Engine`], which serializes per-goal updates inside database
//! transactions and keeps the denormalized goal balances consistent with
//! the immutable deposit and interest-event logs.

pub use catalog::CatalogItem;
pub use deposits::{Deposit, DepositSource};
pub use error::EngineError;
pub use external_transactions::{ExternalTransaction, TransactionStatus};
pub use goals::{GoalStatus, SavingsGoal};
pub use interest_events::InterestEvent;
pub use ledger::{HttpLedgerClient, LedgerClient, Transfer};
pub use notifications::{DbNotifier, EventKind, Notification, Notifier};
pub use ops::{
    AccrualResult, BalanceProjection, BonusShare, DistributionSummary, Engine, EngineBuilder,
    LeaderboardRow, SyncOutcome, SyncSummary,
};
pub use settings::{InterestPeriod, InterestSettings};
pub use users::User;

mod catalog;
mod deposits;
mod error;
mod external_transactions;
mod goals;
mod interest_events;
mod ledger;
mod notifications;
mod ops;
mod settings;
mod users;

pub type ResultEngine<T> = Result<T, EngineError>;
