//! Reconciliation endpoints: sync trigger and the manual review queue.

use api_types::reconcile::{AssignRequest, ExternalTransactionView, SyncResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{ExternalTransaction, SyncOutcome, User};

use crate::{ServerError, ensure_admin, server::ServerState};

fn view(tx: &ExternalTransaction) -> ExternalTransactionView {
    ExternalTransactionView {
        external_id: tx.external_id,
        sender_account_id: tx.sender_account_id,
        sender_name: tx.sender_name.clone(),
        amount_minor: tx.amount_minor,
        reason: tx.reason.clone(),
        occurred_at: tx.occurred_at,
        goal_id: tx.goal_id,
        status: tx.status.as_str().to_string(),
    }
}

pub async fn sync(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<SyncResponse>, ServerError> {
    ensure_admin(&user)?;
    let response = match state.engine.sync().await? {
        SyncOutcome::NoCredential => SyncResponse::NoCredential,
        SyncOutcome::Completed(summary) => SyncResponse::Completed {
            matched_count: summary.matched_count,
            matched_amount_minor: summary.matched_amount_minor,
            unmatched_count: summary.unmatched_count,
            total_processed: summary.total_processed,
        },
    };
    Ok(Json(response))
}

pub async fn unmatched(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ExternalTransactionView>>, ServerError> {
    ensure_admin(&user)?;
    let records = state.engine.unmatched_transactions().await?;
    Ok(Json(records.iter().map(view).collect()))
}

pub async fn assign(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(external_id): Path<i64>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<ExternalTransactionView>, ServerError> {
    ensure_admin(&user)?;
    let record = state
        .engine
        .assign_transaction(external_id, payload.goal_id, Some(user.id))
        .await?;
    Ok(Json(view(&record)))
}

pub async fn ignore(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(external_id): Path<i64>,
) -> Result<Json<ExternalTransactionView>, ServerError> {
    ensure_admin(&user)?;
    let record = state.engine.ignore_transaction(external_id).await?;
    Ok(Json(view(&record)))
}
