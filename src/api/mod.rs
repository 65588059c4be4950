//! HTTP surface beyond the generic resource routes
//!
//! [`resources`] declares the resource table served by the dispatcher.
//! The other modules hold the domain endpoints that do not fit the
//! create/read/update/delete pattern: rental transitions, per-category
//! listings, the caller's own records, reports and registration.

pub mod account;
pub mod catalog;
pub mod rentals;
pub mod reports;
pub mod resources;

use crate::accounts::Registrar;
use crate::config::RentalConfig;
use crate::core::auth::{AuthContext, AuthPolicy};
use crate::core::error::RentalResult;
use crate::lifecycle::RentalLifecycle;
use crate::server::host::{ServerHost, StoreHandles};
use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// State shared by the domain endpoints
#[derive(Clone)]
pub struct ApiState {
    pub stores: StoreHandles,
    pub lifecycle: RentalLifecycle,
    pub registrar: Registrar,
    pub config: Arc<RentalConfig>,
}

impl ApiState {
    pub fn from_host(host: &ServerHost) -> Self {
        Self {
            stores: host.stores.clone(),
            lifecycle: host.lifecycle.clone(),
            registrar: host.registrar.clone(),
            config: host.config.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.config.request_timeout()
    }
}

/// Fail early unless the caller is an administrator
pub(crate) fn require_admin(actor: &AuthContext) -> RentalResult<()> {
    AuthPolicy::AdminOnly.precheck(actor)
}

/// Domain routes, to be merged next to the resource routes
pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/registration", post(account::register))
        .route("/users/me", get(account::me))
        .route("/users/me/rentals", get(account::my_rentals))
        .route(
            "/users/me/messages",
            get(account::my_messages).post(account::post_message),
        )
        .route("/items/{id}/rentals", get(catalog::item_rentals))
        .route("/items/{id}/status", put(catalog::set_item_status))
        .route("/categories/{id}/items", get(catalog::category_items))
        .route(
            "/categories/{id}/items/count",
            get(catalog::category_item_count),
        )
        .route("/rentals/rent", post(rentals::rent))
        .route("/rentals/{id}/approve", post(rentals::approve))
        .route("/rentals/{id}/reject", post(rentals::reject))
        .route("/rentals/{id}/return", post(rentals::return_rental))
        .route("/reports/items.xlsx", post(reports::items))
        .route("/reports/rentals.xlsx", post(reports::rentals))
        .with_state(state)
}

/// Liveness routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "rental-rs"
    }))
}
