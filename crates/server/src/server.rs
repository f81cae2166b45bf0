use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::sync::Arc;

use crate::{catalog, deposits, distribution, goals, interest, notifications, reconcile, users};
use engine::Engine;

static ACCOUNT_ID_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("account-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` for the identity header.
///
/// Every authenticated request must carry an "account-id" entry resolved by
/// the identity layer in front of this service; the middleware maps it to a
/// user row.
#[derive(Debug)]
struct AccountIdHeader(i64);

impl Header for AccountIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &ACCOUNT_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = value.parse() else {
            return Err(AxumError::invalid());
        };

        Ok(AccountIdHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        let as_string = self.0.to_string();
        match axum::http::HeaderValue::from_str(&as_string) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode account-id header"),
        }
    }
}

async fn auth(
    account_header: TypedHeader<AccountIdHeader>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = state
        .engine
        .user_by_account(account_header.0.0)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/catalog", get(catalog::list).post(catalog::create))
        .route(
            "/catalog/{id}",
            patch(catalog::update).delete(catalog::remove),
        )
        .route("/goals", post(goals::submit).get(goals::list_own))
        .route("/goals/{id}", get(goals::get).patch(goals::update))
        .route("/goals/{id}/balance", get(interest::balance))
        .route("/goals/{id}/approve", post(goals::approve))
        .route("/goals/{id}/reject", post(goals::reject))
        .route("/goals/{id}/cancel", post(goals::cancel))
        .route("/goals/{id}/withdrawal", post(goals::request_withdrawal))
        .route(
            "/goals/{id}/withdrawal/approve",
            post(goals::approve_withdrawal),
        )
        .route("/goals/{id}/withdrawal/deny", post(goals::deny_withdrawal))
        .route("/goals/{id}/visibility", post(goals::visibility))
        .route("/goals/{id}/deposits", post(deposits::create))
        .route("/goals/{id}/accrue", post(interest::accrue_one))
        .route("/admin/goals", post(goals::admin_create))
        .route("/accrue-all", post(interest::accrue_all))
        .route("/leaderboard", get(goals::leaderboard))
        .route("/sync", post(reconcile::sync))
        .route("/transactions/unmatched", get(reconcile::unmatched))
        .route("/transactions/{id}/assign", post(reconcile::assign))
        .route("/transactions/{id}/ignore", post(reconcile::ignore))
        .route(
            "/settings/interest",
            get(interest::get_settings).put(interest::put_settings),
        )
        .route("/distribute", post(distribution::distribute))
        .route("/users", get(users::list))
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread", get(notifications::unread))
        .route("/notifications/read", post(notifications::mark_read))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        // Login stays outside the auth layer: it is the upsert entry point
        // that creates the user row in the first place.
        .route("/login", post(users::login))
        .with_state(state)
}

pub async fn run(engine: Engine, bind_addr: &str) {
    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
