//! Server host holding the state shared by every route
//!
//! The host is assembled once by the [`ServerBuilder`](super::ServerBuilder)
//! and is the single source of truth for the running application: the
//! store, the domain services built on it and the registered resources.

use crate::accounts::{PasswordHasher, Registrar};
use crate::config::RentalConfig;
use crate::core::auth::AuthProvider;
use crate::core::service::{DataService, MarketplaceStore};
use crate::entities::{Category, Item, Message, Rental, SafeConduct, User};
use crate::lifecycle::{ReconciledItems, RentalLifecycle};
use crate::server::entity_registry::EntityRegistry;
use std::sync::Arc;

/// One backend seen through each of its service traits
#[derive(Clone)]
pub struct StoreHandles {
    pub marketplace: Arc<dyn MarketplaceStore>,
    pub users: Arc<dyn DataService<User>>,
    pub categories: Arc<dyn DataService<Category>>,
    /// Item reads go through reconciliation
    pub items: Arc<dyn DataService<Item>>,
    pub rentals: Arc<dyn DataService<Rental>>,
    pub safe_conducts: Arc<dyn DataService<SafeConduct>>,
    pub messages: Arc<dyn DataService<Message>>,
}

impl StoreHandles {
    pub fn new<S: MarketplaceStore + 'static>(store: S) -> Self {
        let store = Arc::new(store);
        let marketplace: Arc<dyn MarketplaceStore> = store.clone();

        Self {
            items: Arc::new(ReconciledItems::new(marketplace.clone())),
            marketplace,
            users: store.clone(),
            categories: store.clone(),
            rentals: store.clone(),
            safe_conducts: store.clone(),
            messages: store,
        }
    }
}

/// Host context containing all application state
pub struct ServerHost {
    pub config: Arc<RentalConfig>,

    pub stores: StoreHandles,

    /// Rental and item state transitions
    pub lifecycle: RentalLifecycle,

    /// Self-service user creation
    pub registrar: Registrar,

    /// Resolves the caller of each request
    pub auth_provider: Arc<dyn AuthProvider>,

    /// Registered resources and their routes
    pub entity_registry: EntityRegistry,
}

impl ServerHost {
    /// Build the host from builder components
    pub fn from_builder_components(
        config: RentalConfig,
        stores: StoreHandles,
        auth_provider: Arc<dyn AuthProvider>,
        hasher: Arc<dyn PasswordHasher>,
        entity_registry: EntityRegistry,
    ) -> Self {
        let timeout = config.request_timeout();

        Self {
            lifecycle: RentalLifecycle::new(stores.marketplace.clone(), timeout),
            registrar: Registrar::new(stores.marketplace.clone(), hasher, timeout),
            config: Arc::new(config),
            stores,
            auth_provider,
            entity_registry,
        }
    }

    /// Get entity types registered in the host
    pub fn entity_types(&self) -> Vec<&str> {
        self.entity_registry.entity_types()
    }
}
