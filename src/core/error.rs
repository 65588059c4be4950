//! Typed error handling for the rental backend
//!
//! Request-facing failures are expressed as [`RentalError`], which maps each
//! variant to an HTTP status and a `{code, message, details?}` body. Storage
//! adapters report [`StoreError`], converted with `From` so handlers can use
//! `?` throughout. Problems in how resources are wired at startup are a
//! separate type, [`RegistrationError`], and never reach a client.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn get_item(store: &dyn DataService<Item>, id: Uuid) -> RentalResult<Item> {
//!     store.get(&id).await?.ok_or_else(|| RentalError::not_found("item", id))
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Result alias for request-facing operations
pub type RentalResult<T> = Result<T, RentalError>;

/// Result alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Field name to list of messages, serialised as a plain JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

/// Key used for errors that are not tied to a single field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field error set
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Merge another error set into this one
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when empty, otherwise a validation error carrying every message
    pub fn into_result(self) -> RentalResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RentalError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Errors surfaced to API clients
#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    /// One or more fields failed validation
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// The addressed entity does not exist
    #[error("Not found.")]
    NotFound { entity_type: String, id: Uuid },

    /// The request lost a race or violates a state precondition
    #[error("{0}")]
    Conflict(String),

    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    /// A store call exceeded the configured request timeout
    #[error("The request timed out.")]
    Timeout,

    /// The store could not be reached; the detail is logged, never returned
    #[error("The service is temporarily unavailable.")]
    StoreUnavailable(String),

    #[error("Internal server error.")]
    Internal(String),
}

impl RentalError {
    pub fn not_found(entity_type: &str, id: Uuid) -> Self {
        RentalError::NotFound {
            entity_type: entity_type.to_string(),
            id,
        }
    }

    /// Conflict returned when a rental claim loses to a concurrent one
    pub fn item_unavailable() -> Self {
        RentalError::Conflict("item no longer available".to_string())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RentalError::Validation(_) => StatusCode::BAD_REQUEST,
            RentalError::NotFound { .. } => StatusCode::NOT_FOUND,
            RentalError::Conflict(_) => StatusCode::CONFLICT,
            RentalError::Unauthorized => StatusCode::UNAUTHORIZED,
            RentalError::Forbidden => StatusCode::FORBIDDEN,
            RentalError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            RentalError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RentalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            RentalError::Validation(_) => "VALIDATION_ERROR",
            RentalError::NotFound { .. } => "NOT_FOUND",
            RentalError::Conflict(_) => "CONFLICT",
            RentalError::Unauthorized => "UNAUTHORIZED",
            RentalError::Forbidden => "FORBIDDEN",
            RentalError::Timeout => "TIMEOUT",
            RentalError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            RentalError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Only validation errors carry details; not-found bodies stay generic
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            RentalError::Validation(errors) => Some(serde_json::json!({ "fields": errors })),
            _ => None,
        }
    }
}

impl IntoResponse for RentalError {
    fn into_response(self) -> Response {
        match &self {
            RentalError::StoreUnavailable(detail) => {
                tracing::error!(detail = %detail, "store unavailable");
            }
            RentalError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
            }
            RentalError::NotFound { entity_type, id } => {
                tracing::debug!(entity_type = %entity_type, id = %id, "entity not found");
            }
            _ => {}
        }

        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors reported by store adapters
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity_type} with id '{id}' not found")]
    NotFound { entity_type: String, id: Uuid },

    #[error("{entity_type} with id '{id}' already exists")]
    AlreadyExists { entity_type: String, id: Uuid },

    /// A reference field points at an entity that does not exist
    #[error("field '{field}' references missing {entity_type} '{id}'")]
    MissingReference {
        field: String,
        entity_type: String,
        id: Uuid,
    },

    /// A uniqueness or structural constraint on a field was violated
    #[error("constraint violated on '{field}': {message}")]
    Constraint { field: String, message: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity_type: &str, id: Uuid) -> Self {
        StoreError::NotFound {
            entity_type: entity_type.to_string(),
            id,
        }
    }

    pub fn missing_reference(field: &str, entity_type: &str, id: Uuid) -> Self {
        StoreError::MissingReference {
            field: field.to_string(),
            entity_type: entity_type.to_string(),
            id,
        }
    }

    pub fn constraint(field: &str, message: impl Into<String>) -> Self {
        StoreError::Constraint {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for RentalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity_type, id } => RentalError::NotFound { entity_type, id },
            StoreError::AlreadyExists { entity_type, id } => {
                RentalError::Conflict(format!("{} with id '{}' already exists", entity_type, id))
            }
            StoreError::MissingReference { field, id, .. } => RentalError::Validation(
                FieldErrors::single(&field, format!("Invalid pk \"{}\" - object does not exist.", id)),
            ),
            StoreError::Constraint { field, message } => {
                RentalError::Validation(FieldErrors::single(&field, message))
            }
            StoreError::Unavailable(detail) => RentalError::StoreUnavailable(detail),
        }
    }
}

// =============================================================================
// Registration Errors
// =============================================================================

/// Startup-time wiring errors, kept apart from request errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("resource '{resource}' has no entity service configured")]
    MissingService { resource: String },

    #[error("resource for entity type '{entity_type}' has an empty route path")]
    MissingPath { entity_type: String },

    #[error("route path '{path}' is registered more than once")]
    DuplicatePath { path: String },

    #[error("server has no store configured")]
    MissingStore,
}
