//! # rental-rs
//!
//! Backend of a rental marketplace: users register, browse catalogued
//! items organised by category and request rentals that an administrator
//! approves, rejects or marks returned.
//!
//! ## Pieces
//!
//! - **Resource dispatcher** ([`dispatch`]): one generic `Resource<T, R, W>`
//!   per entity type serves list, create, retrieve, replace, partial update
//!   and delete, with optional pagination, search, ordering and a policy per
//!   operation.
//! - **Rental lifecycle** ([`lifecycle`]): the only code that changes an
//!   item's status, guaranteeing at most one active rental per item.
//! - **Storage contract** ([`core::service`]): `DataService<T>` plus the
//!   conditional updates of `RentalStore`; [`storage::InMemoryStore`]
//!   implements both.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rental::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     ServerBuilder::new(RentalConfig::load()?)
//!         .with_store(InMemoryStore::new())
//!         .serve()
//!         .await
//! }
//! ```

pub mod accounts;
pub mod api;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod entities;
pub mod lifecycle;
pub mod reports;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        auth::{AuthContext, AuthPolicy, AuthProvider, HeaderAuthProvider},
        entity::{Data, Entity},
        error::{FieldErrors, RegistrationError, RentalError, RentalResult, StoreError},
        field::{FieldFormat, FieldValue},
        query::{LimitOffsetPagination, ListParams, SearchFilter},
        service::{Claim, DataService, MarketplaceStore, RentalStore},
    };

    // === Macros ===
    pub use crate::impl_data_entity;

    // === Entities ===
    pub use crate::entities::{
        Category, Item, ItemStatus, Message, Rental, RentalStatus, SafeConduct, User,
    };

    // === Dispatch and lifecycle ===
    pub use crate::dispatch::{
        ReadRepresentation, Resource, ResourcePolicy, WriteContext, WriteRepresentation,
    };
    pub use crate::lifecycle::RentalLifecycle;

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryStore;

    // === Config ===
    pub use crate::config::RentalConfig;

    // === Server ===
    pub use crate::server::{EntityDescriptor, EntityRegistry, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, NaiveDate, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
