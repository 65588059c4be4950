//! ServerBuilder for fluent API to build HTTP servers

use super::entity_registry::EntityRegistry;
use super::host::{ServerHost, StoreHandles};
use crate::accounts::{Argon2Hasher, PasswordHasher};
use crate::api::{self, ApiState};
use crate::config::RentalConfig;
use crate::core::auth::{AuthProvider, HeaderAuthProvider, authenticate};
use crate::core::error::RegistrationError;
use crate::core::service::MarketplaceStore;
use anyhow::Result;
use axum::{Router, middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for the rental HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new(RentalConfig::default())
///     .with_store(InMemoryStore::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: RentalConfig,
    stores: Option<StoreHandles>,
    auth_provider: Arc<dyn AuthProvider>,
    hasher: Arc<dyn PasswordHasher>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    ///
    /// Identity comes from gateway headers and passwords are hashed with
    /// Argon2 unless replaced.
    pub fn new(config: RentalConfig) -> Self {
        Self {
            config,
            stores: None,
            auth_provider: Arc::new(HeaderAuthProvider),
            hasher: Arc::new(Argon2Hasher::new()),
            custom_routes: Vec::new(),
        }
    }

    /// Set the backing store (required)
    pub fn with_store<S: MarketplaceStore + 'static>(mut self, store: S) -> Self {
        self.stores = Some(StoreHandles::new(store));
        self
    }

    pub fn with_auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth_provider = Arc::new(provider);
        self
    }

    pub fn with_password_hasher(mut self, hasher: impl PasswordHasher + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Add custom routes to the server
    ///
    /// They sit behind the same authentication and tracing layers as the
    /// built-in routes.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the host: resolve the store and register every resource
    pub fn build_host(&mut self) -> Result<ServerHost, RegistrationError> {
        let stores = self.stores.take().ok_or(RegistrationError::MissingStore)?;

        let mut entity_registry = EntityRegistry::new();
        for resource in api::resources::resources(&stores, &self.config)? {
            entity_registry.register(resource)?;
        }

        Ok(ServerHost::from_builder_components(
            self.config.clone(),
            stores,
            self.auth_provider.clone(),
            self.hasher.clone(),
            entity_registry,
        ))
    }

    /// Build the final router
    ///
    /// Health routes, resource routes, domain routes and custom routes,
    /// wrapped in authentication, request tracing and optional CORS.
    pub fn build(mut self) -> Result<Router, RegistrationError> {
        let host = self.build_host()?;

        let mut app = api::health_routes()
            .merge(host.entity_registry.build_routes())
            .merge(api::routes(ApiState::from_host(&host)));
        for custom in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom);
        }

        let mut app = app
            .layer(middleware::from_fn_with_state(
                host.auth_provider.clone(),
                authenticate,
            ))
            .layer(TraceLayer::new_for_http());
        if host.config.server.permissive_cors {
            app = app.layer(CorsLayer::permissive());
        }

        tracing::info!(resources = ?host.entity_registry.paths(), "router built");
        Ok(app)
    }

    /// Serve the application on the configured address with graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.bind.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
