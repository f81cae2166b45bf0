//! Goal lifecycle endpoints.
//!
//! Members submit, withdraw, and toggle visibility on their own goals;
//! admins approve, reject, cancel, edit, and create goals directly.

use api_types::goal::{
    AdminGoalNew, GoalSubmit, GoalUpdate, GoalView, LeaderboardEntry, VisibilityToggle,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{SavingsGoal, User};
use uuid::Uuid;

use crate::{ServerError, ensure_admin, server::ServerState};

pub(crate) fn view(goal: &SavingsGoal) -> GoalView {
    GoalView {
        id: goal.id,
        user_id: goal.user_id,
        item_name: goal.item_name.clone(),
        goal_price_minor: goal.goal_price_minor,
        amount_deposited_minor: goal.amount_deposited_minor,
        interest_earned_minor: goal.interest_earned_minor,
        status: goal.status.as_str().to_string(),
        note: goal.note.clone(),
        is_public: goal.is_public,
        created_at: goal.created_at,
        updated_at: goal.updated_at,
    }
}

/// Owner or admin may look at a goal; everyone else gets 403.
pub(crate) fn ensure_can_view(user: &User, goal: &SavingsGoal) -> Result<(), ServerError> {
    if user.is_admin || goal.user_id == user.id {
        Ok(())
    } else {
        Err(ServerError::Engine(engine::EngineError::Forbidden(
            "not your goal".to_string(),
        )))
    }
}

pub async fn submit(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalSubmit>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state
        .engine
        .submit_goal(user.id, payload.item_id, payload.note.as_deref())
        .await?;
    Ok(Json(view(&goal)))
}

pub async fn admin_create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<AdminGoalNew>,
) -> Result<Json<GoalView>, ServerError> {
    ensure_admin(&user)?;
    let goal = state
        .engine
        .create_goal(
            payload.user_id,
            &payload.item_name,
            payload.goal_price_minor,
            payload.note.as_deref(),
        )
        .await?;
    Ok(Json(view(&goal)))
}

pub async fn list_own(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let goals = state.engine.goals_for_user(user.id).await?;
    Ok(Json(goals.iter().map(view).collect()))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state.engine.goal(goal_id).await?;
    ensure_can_view(&user, &goal)?;
    Ok(Json(view(&goal)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    ensure_admin(&user)?;
    let goal = state
        .engine
        .update_goal_details(
            goal_id,
            &payload.item_name,
            payload.goal_price_minor,
            payload.is_public,
        )
        .await?;
    Ok(Json(view(&goal)))
}

pub async fn approve(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    ensure_admin(&user)?;
    let goal = state.engine.approve_goal(goal_id).await?;
    Ok(Json(view(&goal)))
}

pub async fn reject(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    ensure_admin(&user)?;
    let goal = state.engine.reject_goal(goal_id).await?;
    Ok(Json(view(&goal)))
}

pub async fn cancel(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    ensure_admin(&user)?;
    let goal = state.engine.cancel_goal(goal_id).await?;
    Ok(Json(view(&goal)))
}

pub async fn request_withdrawal(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state.engine.request_withdrawal(goal_id, user.id).await?;
    Ok(Json(view(&goal)))
}

pub async fn approve_withdrawal(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    ensure_admin(&user)?;
    let goal = state.engine.approve_withdrawal(goal_id).await?;
    Ok(Json(view(&goal)))
}

pub async fn deny_withdrawal(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    ensure_admin(&user)?;
    let goal = state.engine.deny_withdrawal(goal_id).await?;
    Ok(Json(view(&goal)))
}

pub async fn visibility(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<VisibilityToggle>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state
        .engine
        .toggle_visibility(goal_id, user.id, payload.is_public)
        .await?;
    Ok(Json(view(&goal)))
}

pub async fn leaderboard(
    Extension(_user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<LeaderboardEntry>>, ServerError> {
    let rows = state.engine.leaderboard().await?;
    Ok(Json(
        rows.into_iter()
            .map(|row| LeaderboardEntry {
                display_name: row.display_name,
                progress: row.progress,
                item_name: row.item_name,
                is_public: row.is_public,
            })
            .collect(),
    ))
}
