use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod catalog;
mod deposits;
mod distribution;
mod goals;
mod interest;
mod notifications;
mod reconcile;
mod server;
mod users;

pub mod types {
    pub mod user {
        pub use api_types::user::{Login, UserView};
    }

    pub mod catalog {
        pub use api_types::catalog::{CatalogItemNew, CatalogItemView};
    }

    pub mod goal {
        pub use api_types::goal::{
            AdminGoalNew, BalanceView, GoalSubmit, GoalUpdate, GoalView, LeaderboardEntry,
            VisibilityToggle,
        };
    }

    pub mod deposit {
        pub use api_types::deposit::{DepositNew, DepositView};
    }

    pub mod interest {
        pub use api_types::interest::{AccrualView, InterestSettingsUpdate, InterestSettingsView};
    }

    pub mod reconcile {
        pub use api_types::reconcile::{AssignRequest, ExternalTransactionView, SyncResponse};
    }

    pub mod distribution {
        pub use api_types::distribution::{DistributeRequest, DistributionView, ShareView};
    }

    pub mod notification {
        pub use api_types::notification::{NotificationView, UnreadCount};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) | EngineError::Duplicate(_) | EngineError::AlreadyProcessed(_) => {
            StatusCode::CONFLICT
        }
        EngineError::Validation(_) | EngineError::InvalidState(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::ExternalFetch(_) => StatusCode::BAD_GATEWAY,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Admin gate used by the privileged handlers.
pub(crate) fn ensure_admin(user: &engine::User) -> Result<(), ServerError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(ServerError::Engine(EngineError::Forbidden(
            "admin access required".to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res =
            ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::Conflict("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = ServerError::from(EngineError::Duplicate("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res =
            ServerError::from(EngineError::AlreadyProcessed("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::InvalidState("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_external_fetch_maps_to_502() {
        let res = ServerError::from(EngineError::ExternalFetch("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
