//! Identity endpoints: the login upsert and the admin user directory.

use api_types::user::{Login, UserView};
use axum::{Extension, Json, extract::State};
use engine::User;

use crate::{ServerError, ensure_admin, server::ServerState};

pub(crate) fn view(user: &User) -> UserView {
    UserView {
        id: user.id,
        account_id: user.account_id,
        display_name: user.display_name.clone(),
        is_admin: user.is_admin,
        created_at: user.created_at,
    }
}

/// Upsert the caller's user row after the identity layer has verified them.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<UserView>, ServerError> {
    let user = state
        .engine
        .get_or_create_user(
            payload.account_id,
            &payload.display_name,
            payload.credential.as_deref(),
        )
        .await?;
    Ok(Json(view(&user)))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<UserView>>, ServerError> {
    ensure_admin(&user)?;
    let users = state.engine.list_users().await?;
    Ok(Json(users.iter().map(view).collect()))
}
