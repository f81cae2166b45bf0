//! Catalog endpoints: everyone reads, admins manage.

use api_types::catalog::{CatalogItemNew, CatalogItemView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CatalogItem, User};
use uuid::Uuid;

use crate::{ServerError, ensure_admin, server::ServerState};

fn view(item: &CatalogItem) -> CatalogItemView {
    CatalogItemView {
        id: item.id,
        name: item.name.clone(),
        price_minor: item.price_minor,
        description: item.description.clone(),
        category: item.category.clone(),
        available: item.available,
    }
}

/// Members see only what they can currently save toward; admins see the
/// full list including withdrawn items.
pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CatalogItemView>>, ServerError> {
    let items = state.engine.list_catalog(!user.is_admin).await?;
    Ok(Json(items.iter().map(view).collect()))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<CatalogItemNew>,
) -> Result<Json<CatalogItemView>, ServerError> {
    ensure_admin(&user)?;
    let item = state
        .engine
        .add_catalog_item(
            &payload.name,
            payload.price_minor,
            payload.description.as_deref(),
            payload.category.as_deref(),
        )
        .await?;
    Ok(Json(view(&item)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<CatalogItemNew>,
) -> Result<Json<CatalogItemView>, ServerError> {
    ensure_admin(&user)?;
    let item = state
        .engine
        .update_catalog_item(
            item_id,
            &payload.name,
            payload.price_minor,
            payload.description.as_deref(),
            payload.category.as_deref(),
            payload.available.unwrap_or(true),
        )
        .await?;
    Ok(Json(view(&item)))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    ensure_admin(&user)?;
    state.engine.remove_catalog_item(item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
