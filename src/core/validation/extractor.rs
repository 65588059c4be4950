//! Axum extractors for write payloads and query strings
//!
//! `Payload<W>` reads a JSON body, runs the payload filters and
//! deserialises it into `W`. `Params<T>` does the same for the query
//! string. Malformed input becomes a validation error in the same
//! `{code, message, details}` shape as every other failure.

use super::filters::trim_strings;
use crate::core::error::{FieldErrors, NON_FIELD_ERRORS, RentalError, RentalResult};
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Axum extractor that filters and deserialises a request body
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn register(Payload(request): Payload<RegistrationRequest>) -> RentalResult<...> {
///     // request is trimmed and typed; field rules still need to run
/// }
/// ```
pub struct Payload<W>(pub W);

impl<W> Payload<W> {
    pub fn into_inner(self) -> W {
        self.0
    }
}

/// Deserialise a raw JSON value into a write representation
pub fn parse_payload<W: DeserializeOwned>(payload: Value) -> RentalResult<W> {
    if !payload.is_object() {
        return Err(RentalError::Validation(FieldErrors::single(
            NON_FIELD_ERRORS,
            "Invalid data. Expected a dictionary.",
        )));
    }

    serde_json::from_value(trim_strings(payload)).map_err(|e| {
        RentalError::Validation(FieldErrors::single(NON_FIELD_ERRORS, e.to_string()))
    })
}

/// Field deserialiser telling an explicit `null` apart from an absent field
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl<S, W> FromRequest<S> for Payload<W>
where
    S: Send + Sync,
    W: DeserializeOwned,
{
    type Rejection = RentalError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<Value> = Json::from_request(req, state).await.map_err(|e| {
            RentalError::Validation(FieldErrors::single(NON_FIELD_ERRORS, e.body_text()))
        })?;

        parse_payload(payload).map(Payload)
    }
}

/// Query-string extractor with the crate's error body
pub struct Params<T>(pub T);

impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = RentalError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e.body_text(), "rejected query string");
                RentalError::Validation(FieldErrors::single(
                    NON_FIELD_ERRORS,
                    "Invalid query parameters.",
                ))
            })?;

        Ok(Params(params))
    }
}
