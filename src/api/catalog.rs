//! Item and category endpoints outside the generic resource routes

use super::{ApiState, require_admin};
use crate::core::auth::AuthContext;
use crate::core::error::{FieldErrors, RentalError, RentalResult};
use crate::core::query::{ListParams, SearchFilter};
use crate::core::service::with_deadline;
use crate::core::validation::{Params, Payload};
use crate::dispatch::parse_id;
use crate::entities::{Item, ItemStatus, Rental};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Body of `PUT /items/{id}/status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusChange {
    pub status: Option<ItemStatus>,
}

/// GET /items/{id}/rentals
pub async fn item_rentals(
    State(state): State<ApiState>,
    actor: AuthContext,
    Path(id): Path<String>,
) -> RentalResult<Json<Vec<Rental>>> {
    require_admin(&actor)?;
    let id = parse_id(&id, "item")?;

    state.lifecycle.rentals_of_item(&id).await.map(Json)
}

/// PUT /items/{id}/status
pub async fn set_item_status(
    State(state): State<ApiState>,
    actor: AuthContext,
    Path(id): Path<String>,
    Payload(change): Payload<StatusChange>,
) -> RentalResult<Json<Item>> {
    require_admin(&actor)?;
    let id = parse_id(&id, "item")?;

    let status = change.status.ok_or_else(|| {
        RentalError::Validation(FieldErrors::single("status", "This field is required."))
    })?;
    state
        .lifecycle
        .override_item_status(&id, status)
        .await
        .map(Json)
}

/// Items of one category, searched but not yet paginated
async fn items_in_category(
    state: &ApiState,
    raw_id: &str,
    params: &ListParams,
) -> RentalResult<Vec<Item>> {
    let category_id: Uuid = parse_id(raw_id, "category")?;
    with_deadline(state.timeout(), state.stores.categories.get(&category_id))
        .await?
        .ok_or_else(|| RentalError::not_found("category", category_id))?;

    let items: Vec<Item> = with_deadline(state.timeout(), state.stores.items.list())
        .await?
        .into_iter()
        .filter(|item| item.category == category_id)
        .collect();

    Ok(SearchFilter::indexed::<Item>().apply(items, params.search_term()))
}

/// GET /categories/{id}/items
pub async fn category_items(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Params(params): Params<ListParams>,
) -> RentalResult<Json<Vec<Item>>> {
    let items = items_in_category(&state, &id, &params).await?;

    Ok(Json(state.config.pagination().paginate(items, &params)))
}

/// GET /categories/{id}/items/count
pub async fn category_item_count(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Params(params): Params<ListParams>,
) -> RentalResult<Json<Value>> {
    let items = items_in_category(&state, &id, &params).await?;

    Ok(Json(json!({ "count": items.len() })))
}
