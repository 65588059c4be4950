//! Registration and the caller's own records

use super::ApiState;
use crate::accounts::RegistrationRequest;
use crate::core::auth::AuthContext;
use crate::core::error::{RentalError, RentalResult};
use crate::core::query::by_latest_update;
use crate::core::service::with_deadline;
use crate::core::validation::Payload;
use crate::dispatch::{WriteContext, WriteRepresentation};
use crate::entities::{Message, MessagePayload, Rental, User};
use axum::{Json, extract::State, http::StatusCode};

/// POST /registration
pub async fn register(
    State(state): State<ApiState>,
    Payload(request): Payload<RegistrationRequest>,
) -> RentalResult<(StatusCode, Json<User>)> {
    let user = state.registrar.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/me
pub async fn me(State(state): State<ApiState>, actor: AuthContext) -> RentalResult<Json<User>> {
    let user_id = actor.require_user()?;

    with_deadline(state.timeout(), state.stores.users.get(&user_id))
        .await?
        .map(Json)
        .ok_or_else(|| RentalError::not_found("user", user_id))
}

/// GET /users/me/rentals, most recently updated first
pub async fn my_rentals(
    State(state): State<ApiState>,
    actor: AuthContext,
) -> RentalResult<Json<Vec<Rental>>> {
    let user_id = actor.require_user()?;

    let mut rentals: Vec<Rental> = with_deadline(state.timeout(), state.stores.rentals.list())
        .await?
        .into_iter()
        .filter(|r| r.user == user_id)
        .collect();
    rentals.sort_by(by_latest_update);
    Ok(Json(rentals))
}

/// GET /users/me/messages
pub async fn my_messages(
    State(state): State<ApiState>,
    actor: AuthContext,
) -> RentalResult<Json<Vec<Message>>> {
    let user_id = actor.require_user()?;

    let messages = with_deadline(state.timeout(), state.stores.messages.list())
        .await?
        .into_iter()
        .filter(|m| m.user == user_id)
        .collect();
    Ok(Json(messages))
}

/// POST /users/me/messages; the author is always the caller
pub async fn post_message(
    State(state): State<ApiState>,
    actor: AuthContext,
    Payload(mut payload): Payload<MessagePayload>,
) -> RentalResult<(StatusCode, Json<Message>)> {
    let user_id = actor.require_user()?;
    if payload.user.is_some_and(|user| user != user_id) {
        return Err(RentalError::Forbidden);
    }
    payload.user = Some(user_id);

    payload.validate(&WriteContext::create(&actor)).into_result()?;
    let message = with_deadline(
        state.timeout(),
        state.stores.messages.create(payload.create()),
    )
    .await?;
    tracing::info!(message = %message.id, user = %user_id, "message posted");
    Ok((StatusCode::CREATED, Json(message)))
}
