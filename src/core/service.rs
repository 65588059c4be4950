//! Service traits for the storage contract
//!
//! The crate never talks to a database directly. Every resource goes
//! through [`DataService`]; the rental lifecycle additionally needs the
//! conditional updates of [`RentalStore`]. A backend implementing both for
//! every entity type is a [`MarketplaceStore`].

use crate::core::entity::Data;
use crate::core::error::{RentalError, RentalResult, StoreResult};
use crate::entities::{Category, Item, ItemStatus, Message, Rental, RentalStatus, SafeConduct, User};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// Service trait for managing data entities
///
/// Implementations provide CRUD operations for a specific entity type.
/// Writes are durable once the returned future resolves. Deleting an
/// entity applies the cascades of the storage contract in the same call.
#[async_trait]
pub trait DataService<T: Data>: Send + Sync {
    /// Create a new entity; fails if a reference points at a missing entity
    async fn create(&self, entity: T) -> StoreResult<T>;

    /// Get an entity by ID
    async fn get(&self, id: &Uuid) -> StoreResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> StoreResult<Vec<T>>;

    /// Update an existing entity
    async fn update(&self, id: &Uuid, entity: T) -> StoreResult<T>;

    /// Delete an entity and everything that depends on it
    async fn delete(&self, id: &Uuid) -> StoreResult<()>;
}

/// Outcome of an atomic rental claim
#[derive(Debug, Clone)]
pub enum Claim {
    /// The item moved Available → Rented and the rental was stored
    Granted(Rental),
    /// The item was not Available; nothing was written
    Unavailable,
}

/// Conditional updates used by the rental lifecycle
#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Move the item from Available to Rented and insert the rental as one
    /// unit. If the insert fails the status change is rolled back.
    async fn claim_item(&self, rental: Rental) -> StoreResult<Claim>;

    /// Compare-and-set on an item's status; `false` when the current
    /// status is not `expected`
    async fn transition_item(
        &self,
        item_id: &Uuid,
        expected: ItemStatus,
        new: ItemStatus,
    ) -> StoreResult<bool>;

    /// Persist a new rental status
    async fn set_rental_status(&self, rental_id: &Uuid, status: RentalStatus)
    -> StoreResult<Rental>;

    /// Rentals in Awaiting or Not returned for the item
    async fn active_rentals(&self, item_id: &Uuid) -> StoreResult<Vec<Rental>>;

    /// Make the item's status agree with its rentals: Rented iff an active
    /// rental exists. Reserved items are left alone when nothing is active.
    /// Returns the item and whether it had to be repaired.
    async fn reconcile_item(&self, item_id: &Uuid) -> StoreResult<(Item, bool)>;
}

/// Everything the HTTP layer needs from a backend
pub trait MarketplaceStore:
    DataService<User>
    + DataService<Category>
    + DataService<Item>
    + DataService<Rental>
    + DataService<SafeConduct>
    + DataService<Message>
    + RentalStore
{
}

impl<S> MarketplaceStore for S where
    S: DataService<User>
        + DataService<Category>
        + DataService<Item>
        + DataService<Rental>
        + DataService<SafeConduct>
        + DataService<Message>
        + RentalStore
{
}

/// Bound a store call by the request timeout
///
/// Expiry yields [`RentalError::Timeout`]; store failures are converted
/// into their request-facing form.
pub async fn with_deadline<T, F>(timeout: Duration, call: F) -> RentalResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(RentalError::from),
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "store call timed out");
            Err(RentalError::Timeout)
        }
    }
}
