//! Interest endpoints: balance projection, accrual triggers, settings.

use api_types::goal::BalanceView;
use api_types::interest::{AccrualView, InterestSettingsUpdate, InterestSettingsView};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use engine::{AccrualResult, EngineError, InterestPeriod, User};
use uuid::Uuid;

use crate::{ServerError, ensure_admin, goals, server::ServerState};

fn accrual_view(goal_id: Uuid, result: &AccrualResult) -> AccrualView {
    AccrualView {
        goal_id,
        periods_accrued: result.periods_accrued,
        interest_added_minor: result.interest_added_minor,
        new_balance_minor: result.new_balance_minor,
    }
}

pub async fn balance(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<BalanceView>, ServerError> {
    let goal = state.engine.goal(goal_id).await?;
    goals::ensure_can_view(&user, &goal)?;

    let projection = state.engine.projected_balance(goal_id).await?;
    Ok(Json(BalanceView {
        savings_balance_minor: projection.savings_balance_minor,
        eligible_balance_minor: projection.eligible_balance_minor,
        pending_interest_minor: projection.pending_interest_minor,
        total_balance_minor: projection.total_balance_minor,
        progress: projection.progress,
        remaining_minor: projection.remaining_minor,
        periods_due: projection.periods_due,
    }))
}

pub async fn accrue_one(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<AccrualView>, ServerError> {
    ensure_admin(&user)?;
    let result = state.engine.accrue_one(goal_id).await?.ok_or_else(|| {
        ServerError::Engine(EngineError::InvalidState(
            "goal is not active".to_string(),
        ))
    })?;
    Ok(Json(accrual_view(goal_id, &result)))
}

pub async fn accrue_all(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<AccrualView>>, ServerError> {
    ensure_admin(&user)?;
    let results = state.engine.accrue_all().await?;
    Ok(Json(
        results
            .iter()
            .map(|(goal_id, result)| accrual_view(*goal_id, result))
            .collect(),
    ))
}

pub async fn get_settings(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<InterestSettingsView>, ServerError> {
    ensure_admin(&user)?;
    let settings = state.engine.interest_settings().await?;
    Ok(Json(InterestSettingsView {
        rate: settings.rate,
        period: settings.period.as_str().to_string(),
    }))
}

pub async fn put_settings(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<InterestSettingsUpdate>,
) -> Result<Json<InterestSettingsView>, ServerError> {
    ensure_admin(&user)?;

    if let Some(rate) = payload.rate {
        state.engine.set_interest_rate(rate).await?;
    }
    if let Some(period) = payload.period.as_deref() {
        let period = InterestPeriod::try_from(period)?;
        state.engine.set_interest_period(period).await?;
    }

    let settings = state.engine.interest_settings().await?;
    Ok(Json(InterestSettingsView {
        rate: settings.rate,
        period: settings.period.as_str().to_string(),
    }))
}
