//! Rental requests and administrative transitions

use super::{ApiState, require_admin};
use crate::core::auth::AuthContext;
use crate::core::error::{RentalError, RentalResult};
use crate::core::validation::Payload;
use crate::dispatch::{WriteContext, WriteRepresentation, parse_id};
use crate::entities::{Rental, RentalPayload};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// POST /rentals/rent
///
/// Users rent for themselves; `user` defaults to the caller. Only an
/// administrator may file a request on someone else's behalf.
pub async fn rent(
    State(state): State<ApiState>,
    actor: AuthContext,
    Payload(mut payload): Payload<RentalPayload>,
) -> RentalResult<(StatusCode, Json<Rental>)> {
    let caller = actor.require_user()?;
    let user = *payload.user.get_or_insert(caller);
    if user != caller && !actor.is_admin() {
        return Err(RentalError::Forbidden);
    }

    payload.validate(&WriteContext::create(&actor)).into_result()?;
    let rental = state.lifecycle.request_rental(payload.create()).await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

/// POST /rentals/{id}/approve
pub async fn approve(
    State(state): State<ApiState>,
    actor: AuthContext,
    Path(id): Path<String>,
) -> RentalResult<Json<Rental>> {
    require_admin(&actor)?;
    let id = parse_id(&id, "rental")?;
    state.lifecycle.approve(&id).await.map(Json)
}

/// POST /rentals/{id}/reject
pub async fn reject(
    State(state): State<ApiState>,
    actor: AuthContext,
    Path(id): Path<String>,
) -> RentalResult<Json<Rental>> {
    require_admin(&actor)?;
    let id = parse_id(&id, "rental")?;
    state.lifecycle.reject(&id).await.map(Json)
}

/// POST /rentals/{id}/return
pub async fn return_rental(
    State(state): State<ApiState>,
    actor: AuthContext,
    Path(id): Path<String>,
) -> RentalResult<Json<Rental>> {
    require_admin(&actor)?;
    let id = parse_id(&id, "rental")?;
    state.lifecycle.return_rental(&id).await.map(Json)
}
