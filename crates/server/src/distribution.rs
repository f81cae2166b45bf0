//! Bonus distribution endpoint (admin only).

use api_types::distribution::{DistributeRequest, DistributionView, ShareView};
use axum::{Extension, Json, extract::State};
use engine::User;

use crate::{ServerError, ensure_admin, server::ServerState};

pub async fn distribute(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<DistributeRequest>,
) -> Result<Json<DistributionView>, ServerError> {
    ensure_admin(&user)?;
    let summary = state
        .engine
        .distribute_bonus(payload.total_minor, Some(user.id), payload.note.as_deref())
        .await?;
    Ok(Json(DistributionView {
        total_minor: summary.total_minor,
        shares: summary
            .shares
            .iter()
            .map(|share| ShareView {
                goal_id: share.goal_id,
                user_id: share.user_id,
                amount_minor: share.amount_minor,
            })
            .collect(),
    }))
}
