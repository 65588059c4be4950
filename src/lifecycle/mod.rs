//! Rental lifecycle controller
//!
//! Moves a [`Rental`] and its [`Item`] between states:
//!
//! | operation | rental after | item after |
//! |---|---|---|
//! | request | Awaiting (created) | Rented |
//! | approve | Not returned | unchanged |
//! | reject | Rejected | Available |
//! | return | Returned | Available |
//!
//! The request claims the item and inserts the rental in one conditional
//! store call, so two requests for the same item can never both succeed.
//! Closing a rental writes the rental first and then releases the item; if
//! the release fails the pair is left for [`reconcile_item`](RentalLifecycle::reconcile_item)
//! to repair, which [`ReconciledItems`] does on every read.

mod reconcile;

pub use reconcile::ReconciledItems;

use crate::core::error::{FieldErrors, RentalError, RentalResult};
use crate::core::service::{Claim, DataService, MarketplaceStore, RentalStore, with_deadline};
use crate::entities::{Item, ItemStatus, Rental, RentalStatus};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Domain operations over rentals and the items they occupy
#[derive(Clone)]
pub struct RentalLifecycle {
    store: Arc<dyn MarketplaceStore>,
    timeout: Duration,
}

impl RentalLifecycle {
    pub fn new(store: Arc<dyn MarketplaceStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &Arc<dyn MarketplaceStore> {
        &self.store
    }

    async fn rental(&self, id: &Uuid) -> RentalResult<Rental> {
        with_deadline(
            self.timeout,
            DataService::<Rental>::get(self.store.as_ref(), id),
        )
        .await?
        .ok_or_else(|| RentalError::not_found("rental", *id))
    }

    /// Claim the draft's item and store the rental as Awaiting
    ///
    /// The draft must already be validated. Losing the claim yields
    /// `Conflict("item no longer available")` and writes nothing. An item
    /// left Rented by an interrupted close is repaired and claimed again.
    pub async fn request_rental(&self, mut draft: Rental) -> RentalResult<Rental> {
        draft.status = RentalStatus::Awaiting;

        match self.claim(draft.clone()).await? {
            Claim::Granted(rental) => return Ok(self.granted(rental)),
            Claim::Unavailable => {}
        }

        let (_, repaired) = with_deadline(self.timeout, self.store.reconcile_item(&draft.item)).await?;
        if repaired {
            if let Claim::Granted(rental) = self.claim(draft.clone()).await? {
                return Ok(self.granted(rental));
            }
        }

        tracing::info!(item = %draft.item, user = %draft.user, "rental request lost the item");
        Err(RentalError::item_unavailable())
    }

    async fn claim(&self, draft: Rental) -> RentalResult<Claim> {
        with_deadline(self.timeout, self.store.claim_item(draft)).await
    }

    fn granted(&self, rental: Rental) -> Rental {
        tracing::info!(
            rental = %rental.id,
            item = %rental.item,
            user = %rental.user,
            "rental requested"
        );
        rental
    }

    /// Awaiting → Not returned; approving twice is a no-op
    pub async fn approve(&self, rental_id: &Uuid) -> RentalResult<Rental> {
        let rental = self.rental(rental_id).await?;

        match rental.status {
            RentalStatus::NotReturned => Ok(rental),
            RentalStatus::Awaiting => {
                let approved = with_deadline(
                    self.timeout,
                    self.store
                        .set_rental_status(rental_id, RentalStatus::NotReturned),
                )
                .await?;
                tracing::info!(rental = %rental_id, "rental approved");
                Ok(approved)
            }
            RentalStatus::Returned | RentalStatus::Rejected => Err(already_closed()),
        }
    }

    /// Close the rental as Rejected and free its item
    pub async fn reject(&self, rental_id: &Uuid) -> RentalResult<Rental> {
        self.close(rental_id, RentalStatus::Rejected).await
    }

    /// Close the rental as Returned and free its item
    pub async fn return_rental(&self, rental_id: &Uuid) -> RentalResult<Rental> {
        self.close(rental_id, RentalStatus::Returned).await
    }

    async fn close(&self, rental_id: &Uuid, outcome: RentalStatus) -> RentalResult<Rental> {
        let rental = self.rental(rental_id).await?;

        let closed = if rental.status == outcome {
            rental
        } else if rental.is_active() {
            let closed = with_deadline(
                self.timeout,
                self.store.set_rental_status(rental_id, outcome),
            )
            .await?;
            tracing::info!(rental = %rental_id, status = %outcome, "rental closed");
            closed
        } else {
            return Err(already_closed());
        };

        self.release(&closed.item).await;
        Ok(closed)
    }

    /// Put the item back to Available once nothing occupies it
    ///
    /// The rental is already closed at this point, so a failure here only
    /// delays the release until the next reconciliation.
    async fn release(&self, item_id: &Uuid) {
        match with_deadline(self.timeout, self.store.reconcile_item(item_id)).await {
            Ok((item, true)) => {
                tracing::debug!(item = %item_id, status = %item.status, "item released");
            }
            Ok((item, false)) => {
                tracing::debug!(item = %item_id, status = %item.status, "item already released");
            }
            Err(RentalError::NotFound { .. }) => {
                tracing::debug!(item = %item_id, "released item no longer exists");
            }
            Err(err) => {
                tracing::warn!(item = %item_id, error = %err, "item release deferred to reconciliation");
            }
        }
    }

    /// Make the item's status agree with its rentals
    pub async fn reconcile_item(&self, item_id: &Uuid) -> RentalResult<Item> {
        let (item, repaired) =
            with_deadline(self.timeout, self.store.reconcile_item(item_id)).await?;
        if repaired {
            tracing::warn!(item = %item_id, status = %item.status, "repaired divergent item status");
        }
        Ok(item)
    }

    /// Administrative status change, the only way to reach Reserved
    ///
    /// Refused while an active rental occupies the item. Rented can only be
    /// reached through a rental request.
    pub async fn override_item_status(
        &self,
        item_id: &Uuid,
        status: ItemStatus,
    ) -> RentalResult<Item> {
        if status == ItemStatus::Rented {
            return Err(RentalError::Validation(FieldErrors::single(
                "status",
                "Only a rental request can mark an item as rented.",
            )));
        }

        let item = with_deadline(
            self.timeout,
            DataService::<Item>::get(self.store.as_ref(), item_id),
        )
        .await?
        .ok_or_else(|| RentalError::not_found("item", *item_id))?;

        let active = with_deadline(self.timeout, self.store.active_rentals(item_id)).await?;
        if !active.is_empty() {
            return Err(RentalError::Conflict(
                "item is occupied by an active rental".to_string(),
            ));
        }
        if item.status == status {
            return Ok(item);
        }

        let changed = with_deadline(
            self.timeout,
            self.store.transition_item(item_id, item.status, status),
        )
        .await?;
        if !changed {
            return Err(RentalError::Conflict(
                "item status changed concurrently".to_string(),
            ));
        }

        tracing::info!(item = %item_id, from = %item.status, to = %status, "item status overridden");
        with_deadline(
            self.timeout,
            DataService::<Item>::get(self.store.as_ref(), item_id),
        )
        .await?
        .ok_or_else(|| RentalError::not_found("item", *item_id))
    }

    /// Every rental of one item, most recently updated first
    pub async fn rentals_of_item(&self, item_id: &Uuid) -> RentalResult<Vec<Rental>> {
        with_deadline(
            self.timeout,
            DataService::<Item>::get(self.store.as_ref(), item_id),
        )
        .await?
        .ok_or_else(|| RentalError::not_found("item", *item_id))?;

        let mut rentals: Vec<Rental> = with_deadline(
            self.timeout,
            DataService::<Rental>::list(self.store.as_ref()),
        )
        .await?
        .into_iter()
        .filter(|r| &r.item == item_id)
        .collect();
        rentals.sort_by(crate::core::query::by_latest_update);
        Ok(rentals)
    }
}

fn already_closed() -> RentalError {
    RentalError::Conflict("rental is already closed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Category, User};
    use crate::storage::InMemoryStore;
    use chrono::NaiveDate;
    use tokio::task::JoinSet;

    struct Fixture {
        store: InMemoryStore,
        lifecycle: RentalLifecycle,
        user: User,
        item: Item,
    }

    fn user(name: &str) -> User {
        User::new(
            name.into(),
            format!("{}@example.com", name),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            false,
            String::new(),
        )
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let user = DataService::<User>::create(&store, user("u1")).await.unwrap();
        let category = DataService::<Category>::create(&store, Category::new("Tools".into(), None))
            .await
            .unwrap();
        let item = DataService::<Item>::create(
            &store,
            Item::new(
                category.id,
                "Drill".into(),
                String::new(),
                None,
                None,
                Vec::new(),
                ItemStatus::Available,
            ),
        )
        .await
        .unwrap();
        let lifecycle = RentalLifecycle::new(Arc::new(store.clone()), Duration::from_secs(1));
        Fixture {
            store,
            lifecycle,
            user,
            item,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn draft(user: Uuid, item: Uuid) -> Rental {
        Rental::new(user, item, date(1), date(10), RentalStatus::Awaiting)
    }

    async fn item_status(f: &Fixture) -> ItemStatus {
        DataService::<Item>::get(&f.store, &f.item.id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_request_approve_return() {
        let f = fixture().await;

        let rental = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();
        assert_eq!(rental.status, RentalStatus::Awaiting);
        assert_eq!(item_status(&f).await, ItemStatus::Rented);

        let approved = f.lifecycle.approve(&rental.id).await.unwrap();
        assert_eq!(approved.status, RentalStatus::NotReturned);
        assert_eq!(item_status(&f).await, ItemStatus::Rented);

        let returned = f.lifecycle.return_rental(&rental.id).await.unwrap();
        assert_eq!(returned.status, RentalStatus::Returned);
        assert_eq!(item_status(&f).await, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_reject_awaiting_frees_item() {
        let f = fixture().await;
        let rental = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();

        let rejected = f.lifecycle.reject(&rental.id).await.unwrap();
        assert_eq!(rejected.status, RentalStatus::Rejected);
        assert_eq!(item_status(&f).await, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_reject_after_approve_frees_item() {
        let f = fixture().await;
        let rental = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();
        f.lifecycle.approve(&rental.id).await.unwrap();

        let rejected = f.lifecycle.reject(&rental.id).await.unwrap();
        assert_eq!(rejected.status, RentalStatus::Rejected);
        assert_eq!(item_status(&f).await, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_second_request_conflicts() {
        let f = fixture().await;
        f.lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();

        let err = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Conflict(ref m) if m == "item no longer available"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_have_one_winner() {
        let f = fixture().await;
        let mut tasks = JoinSet::new();
        for _ in 0..16 {
            let lifecycle = f.lifecycle.clone();
            let rental = draft(f.user.id, f.item.id);
            tasks.spawn(async move { lifecycle.request_rental(rental).await });
        }

        let mut granted = 0;
        let mut conflicts = 0;
        while let Some(outcome) = tasks.join_next().await {
            match outcome.unwrap() {
                Ok(_) => granted += 1,
                Err(RentalError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(granted, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(item_status(&f).await, ItemStatus::Rented);
        assert_eq!(f.store.active_rentals(&f.item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_rental_is_not_found() {
        let f = fixture().await;
        let missing = Uuid::new_v4();
        for result in [
            f.lifecycle.approve(&missing).await,
            f.lifecycle.reject(&missing).await,
            f.lifecycle.return_rental(&missing).await,
        ] {
            assert!(matches!(result, Err(RentalError::NotFound { .. })));
        }
    }

    #[tokio::test]
    async fn test_closed_rental_transitions() {
        let f = fixture().await;
        let rental = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();
        f.lifecycle.return_rental(&rental.id).await.unwrap();

        let again = f.lifecycle.return_rental(&rental.id).await.unwrap();
        assert_eq!(again.status, RentalStatus::Returned);

        assert!(matches!(
            f.lifecycle.reject(&rental.id).await,
            Err(RentalError::Conflict(_))
        ));
        assert!(matches!(
            f.lifecycle.approve(&rental.id).await,
            Err(RentalError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_closing_old_rental_keeps_new_claim() {
        let f = fixture().await;
        let first = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();
        f.lifecycle.return_rental(&first.id).await.unwrap();
        f.lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();

        f.lifecycle.return_rental(&first.id).await.unwrap();
        assert_eq!(item_status(&f).await, ItemStatus::Rented);
    }

    #[tokio::test]
    async fn test_request_repairs_orphaned_claim() {
        let f = fixture().await;
        f.store
            .transition_item(&f.item.id, ItemStatus::Available, ItemStatus::Rented)
            .await
            .unwrap();

        let rental = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();
        assert_eq!(rental.status, RentalStatus::Awaiting);
    }

    #[tokio::test]
    async fn test_request_for_unknown_user_is_validation_error() {
        let f = fixture().await;
        let err = f
            .lifecycle
            .request_rental(draft(Uuid::new_v4(), f.item.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Validation(ref e) if e.contains("user")));
        assert_eq!(item_status(&f).await, ItemStatus::Available);
    }

    #[tokio::test]
    async fn test_override_status() {
        let f = fixture().await;

        let reserved = f
            .lifecycle
            .override_item_status(&f.item.id, ItemStatus::Reserved)
            .await
            .unwrap();
        assert_eq!(reserved.status, ItemStatus::Reserved);

        let err = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Conflict(_)));

        let err = f
            .lifecycle
            .override_item_status(&f.item.id, ItemStatus::Rented)
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Validation(_)));

        f.lifecycle
            .override_item_status(&f.item.id, ItemStatus::Available)
            .await
            .unwrap();
        let rental = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();

        let err = f
            .lifecycle
            .override_item_status(&f.item.id, ItemStatus::Available)
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Conflict(_)));
        assert_eq!(rental.status, RentalStatus::Awaiting);
    }

    #[tokio::test]
    async fn test_rentals_of_item() {
        let f = fixture().await;
        let rental = f
            .lifecycle
            .request_rental(draft(f.user.id, f.item.id))
            .await
            .unwrap();

        let rentals = f.lifecycle.rentals_of_item(&f.item.id).await.unwrap();
        assert_eq!(rentals.len(), 1);
        assert_eq!(rentals[0].id, rental.id);

        assert!(matches!(
            f.lifecycle.rentals_of_item(&Uuid::new_v4()).await,
            Err(RentalError::NotFound { .. })
        ));
    }
}
