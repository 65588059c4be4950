//! Entity registry collecting resource descriptors and their routes

use crate::core::error::RegistrationError;
use axum::Router;
use std::collections::BTreeMap;

/// Trait that describes how to build routes for a resource
///
/// Every [`Resource`](crate::dispatch::Resource) implements it, which is
/// how the dispatcher plugs into the server.
pub trait EntityDescriptor: Send + Sync {
    /// The entity type name (singular, e.g., "item")
    fn entity_type(&self) -> &str;

    /// Mount point of the collection (e.g., "/items")
    fn path(&self) -> &str;

    /// Build the routes for this resource
    ///
    /// Should return a stateless Router with routes like:
    /// - GET/POST {path}
    /// - GET/PUT/PATCH/DELETE {path}/{id}
    fn build_routes(&self) -> Router;
}

/// Registry for every resource in the application
///
/// Keyed by mount path, so two resources can never claim the same URL.
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: BTreeMap<String, Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, rejecting a path that is already taken
    pub fn register(
        &mut self,
        descriptor: Box<dyn EntityDescriptor>,
    ) -> Result<(), RegistrationError> {
        let path = descriptor.path().to_string();
        if self.descriptors.contains_key(&path) {
            return Err(RegistrationError::DuplicatePath { path });
        }

        tracing::debug!(
            entity_type = descriptor.entity_type(),
            path = %path,
            "registered resource"
        );
        self.descriptors.insert(path, descriptor);
        Ok(())
    }

    /// Build a router with all registered resource routes
    pub fn build_routes(&self) -> Router {
        self.descriptors
            .values()
            .fold(Router::new(), |router, descriptor| {
                router.merge(descriptor.build_routes())
            })
    }

    /// Get all registered entity types
    pub fn entity_types(&self) -> Vec<&str> {
        self.descriptors.values().map(|d| d.entity_type()).collect()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }
}
