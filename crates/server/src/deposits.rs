//! Manual deposit recording (admin only).

use api_types::deposit::{DepositNew, DepositView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{Deposit, DepositSource, User};
use uuid::Uuid;

use crate::{ServerError, ensure_admin, server::ServerState};

fn view(deposit: &Deposit) -> DepositView {
    DepositView {
        id: deposit.id,
        goal_id: deposit.goal_id,
        amount_minor: deposit.amount_minor,
        source: deposit.source.as_str().to_string(),
        note: deposit.note.clone(),
        deposited_at: deposit.deposited_at,
    }
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<DepositNew>,
) -> Result<Json<DepositView>, ServerError> {
    ensure_admin(&user)?;
    let deposit = state
        .engine
        .record_deposit(
            goal_id,
            payload.amount_minor,
            Some(user.id),
            payload.note.as_deref(),
            DepositSource::Manual,
            None,
        )
        .await?;
    Ok(Json(view(&deposit)))
}
