use std::sync::Arc;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    DbNotifier, EngineError, EventKind, LedgerClient, Notifier, ResultEngine,
};

mod catalog;
mod deposits;
mod distribution;
mod goals;
mod interest;
mod notifications;
mod reconcile;
mod settings;
mod users;

pub use distribution::{BonusShare, DistributionSummary};
pub use goals::LeaderboardRow;
pub use interest::{AccrualResult, BalanceProjection};
pub use reconcile::{SyncOutcome, SyncSummary};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
    ledger: Option<Arc<dyn LedgerClient>>,
    treasury_account_id: Option<i64>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("treasury_account_id", &self.treasury_account_id)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Emit a domain event. Fire-and-forget: never blocks a committed
    /// mutation on delivery.
    pub(crate) async fn notify(
        &self,
        user_id: Uuid,
        event: EventKind,
        message: String,
        goal_id: Option<Uuid>,
    ) {
        self.notifier.emit(user_id, event, &message, goal_id).await;
    }

    pub(crate) fn treasury_account_id(&self) -> ResultEngine<i64> {
        self.treasury_account_id.ok_or_else(|| {
            EngineError::Validation("treasury account is not configured".to_string())
        })
    }

    pub(crate) fn ledger_client(&self) -> ResultEngine<&dyn LedgerClient> {
        self.ledger
            .as_deref()
            .ok_or_else(|| EngineError::Validation("ledger client is not configured".to_string()))
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn Notifier>>,
    ledger: Option<Arc<dyn LedgerClient>>,
    treasury_account_id: Option<i64>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the default DB-backed notifier.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Client for the external ledger; required for reconciliation.
    pub fn ledger(mut self, ledger: Arc<dyn LedgerClient>) -> EngineBuilder {
        self.ledger = Some(ledger);
        self
    }

    /// External identity of the treasury account. The matching user is the
    /// admin and holds the external-ledger credential.
    pub fn treasury_account(mut self, account_id: i64) -> EngineBuilder {
        self.treasury_account_id = Some(account_id);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(DbNotifier::new(self.database.clone())));
        Ok(Engine {
            database: self.database,
            notifier,
            ledger: self.ledger,
            treasury_account_id: self.treasury_account_id,
        })
    }
}
