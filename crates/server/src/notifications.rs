//! Per-user notification feed.

use api_types::notification::{NotificationView, UnreadCount};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Notification, User};

use crate::{ServerError, server::ServerState};

const FEED_LIMIT: u64 = 50;

fn view(notification: &Notification) -> NotificationView {
    NotificationView {
        id: notification.id,
        goal_id: notification.goal_id,
        kind: notification.kind.clone(),
        message: notification.message.clone(),
        is_read: notification.is_read,
        created_at: notification.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<NotificationView>>, ServerError> {
    let notifications = state.engine.notifications_for(user.id, FEED_LIMIT).await?;
    Ok(Json(notifications.iter().map(view).collect()))
}

pub async fn unread(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<UnreadCount>, ServerError> {
    let unread = state.engine.unread_count(user.id).await?;
    Ok(Json(UnreadCount { unread }))
}

pub async fn mark_read(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.mark_notifications_read(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
