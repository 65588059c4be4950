//! In-memory implementation of the marketplace store
//!
//! All tables live behind one `RwLock`, so a single write guard covers a
//! whole logical unit: reference checks, the write itself and any cascade.
//! That is what makes the rental claim atomic here.

use crate::core::entity::{Data, Entity};
use crate::core::error::{StoreError, StoreResult};
use crate::core::query::by_creation;
use crate::core::service::{Claim, DataService, RentalStore};
use crate::entities::{Category, Item, ItemStatus, Message, Rental, RentalStatus, SafeConduct, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Every table of the store
#[derive(Debug, Default)]
pub struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    items: HashMap<Uuid, Item>,
    rentals: HashMap<Uuid, Rental>,
    safe_conducts: HashMap<Uuid, SafeConduct>,
    messages: HashMap<Uuid, Message>,
}

impl Tables {
    /// Remove matching rentals with their safe conducts, releasing the
    /// items of any that were still active
    fn remove_rentals_where(&mut self, predicate: impl Fn(&Rental) -> bool) {
        let doomed: Vec<Rental> = self
            .rentals
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect();

        for rental in doomed {
            self.rentals.remove(&rental.id);
            Rental::cascade(&rental, self);
        }
    }

    fn has_active_rental(&self, item_id: &Uuid) -> bool {
        self.rentals
            .values()
            .any(|r| &r.item == item_id && r.is_active())
    }
}

/// Per-entity table access and integrity rules
pub trait Stored: Data {
    fn table(tables: &Tables) -> &HashMap<Uuid, Self>;

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self>;

    /// Reference and uniqueness checks run before every write
    fn check(&self, _tables: &Tables) -> StoreResult<()> {
        Ok(())
    }

    /// Carry store-owned fields over from the stored version on update
    fn preserve(&mut self, _stored: &Self) {}

    /// Remove or detach whatever depends on a deleted entity
    fn cascade(_removed: &Self, _tables: &mut Tables) {}
}

fn require_ref<T>(table: &HashMap<Uuid, T>, field: &str, entity_type: &str, id: Uuid) -> StoreResult<()> {
    if table.contains_key(&id) {
        Ok(())
    } else {
        Err(StoreError::missing_reference(field, entity_type, id))
    }
}

impl Stored for User {
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.users
    }

    fn check(&self, tables: &Tables) -> StoreResult<()> {
        let taken = tables
            .users
            .values()
            .any(|u| u.id != self.id && u.username.eq_ignore_ascii_case(&self.username));
        if taken {
            return Err(StoreError::constraint(
                "username",
                "A user with that username already exists.",
            ));
        }
        Ok(())
    }

    fn cascade(removed: &Self, tables: &mut Tables) {
        tables.remove_rentals_where(|r| r.user == removed.id);
        tables.messages.retain(|_, m| m.user != removed.id);
    }
}

impl Stored for Category {
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.categories
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.categories
    }

    fn check(&self, tables: &Tables) -> StoreResult<()> {
        let Some(parent) = self.parent else {
            return Ok(());
        };
        require_ref(&tables.categories, "parent", "category", parent)?;

        // Walk up from the new parent; meeting ourselves means a cycle
        let mut cursor = Some(parent);
        let mut steps = 0;
        while let Some(id) = cursor {
            if id == self.id || steps > tables.categories.len() {
                return Err(StoreError::constraint(
                    "parent",
                    "A category cannot be its own ancestor.",
                ));
            }
            cursor = tables.categories.get(&id).and_then(|c| c.parent);
            steps += 1;
        }
        Ok(())
    }

    fn cascade(removed: &Self, tables: &mut Tables) {
        let doomed: Vec<Item> = tables
            .items
            .values()
            .filter(|i| i.category == removed.id)
            .cloned()
            .collect();
        for item in doomed {
            tables.items.remove(&item.id);
            Item::cascade(&item, tables);
        }

        for child in tables.categories.values_mut() {
            if child.parent == Some(removed.id) {
                child.parent = None;
                child.touch();
            }
        }
    }
}

impl Stored for Item {
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.items
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.items
    }

    fn check(&self, tables: &Tables) -> StoreResult<()> {
        require_ref(&tables.categories, "category", "category", self.category)
    }

    fn preserve(&mut self, stored: &Self) {
        self.status = stored.status;
    }

    fn cascade(removed: &Self, tables: &mut Tables) {
        tables.remove_rentals_where(|r| r.item == removed.id);
    }
}

impl Stored for Rental {
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.rentals
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.rentals
    }

    fn check(&self, tables: &Tables) -> StoreResult<()> {
        require_ref(&tables.users, "user", "user", self.user)?;
        require_ref(&tables.items, "item", "item", self.item)
    }

    fn preserve(&mut self, stored: &Self) {
        self.user = stored.user;
        self.item = stored.item;
        self.status = stored.status;
    }

    fn cascade(removed: &Self, tables: &mut Tables) {
        tables.safe_conducts.retain(|_, s| s.rental != removed.id);

        if removed.is_active() && !tables.has_active_rental(&removed.item) {
            if let Some(item) = tables.items.get_mut(&removed.item) {
                if item.status == ItemStatus::Rented {
                    item.status = ItemStatus::Available;
                    item.touch();
                }
            }
        }
    }
}

impl Stored for SafeConduct {
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.safe_conducts
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.safe_conducts
    }

    fn check(&self, tables: &Tables) -> StoreResult<()> {
        require_ref(&tables.rentals, "rental", "rental", self.rental)?;
        let taken = tables
            .safe_conducts
            .values()
            .any(|s| s.id != self.id && s.rental == self.rental);
        if taken {
            return Err(StoreError::constraint(
                "rental",
                "This rental already has a safe conduct.",
            ));
        }
        Ok(())
    }
}

impl Stored for Message {
    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.messages
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.messages
    }

    fn check(&self, tables: &Tables) -> StoreResult<()> {
        require_ref(&tables.users, "user", "user", self.user)
    }
}

/// In-memory marketplace store
///
/// Useful for testing and development. Cloning shares the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl<T: Stored> DataService<T> for InMemoryStore {
    async fn create(&self, entity: T) -> StoreResult<T> {
        let mut tables = self.write()?;

        if T::table(&tables).contains_key(&entity.id()) {
            return Err(StoreError::AlreadyExists {
                entity_type: T::resource_name_singular().to_string(),
                id: entity.id(),
            });
        }
        entity.check(&tables)?;

        T::table_mut(&mut tables).insert(entity.id(), entity.clone());

        Ok(entity)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<T>> {
        let tables = self.read()?;

        Ok(T::table(&tables).get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<T>> {
        let tables = self.read()?;

        let mut entities: Vec<T> = T::table(&tables).values().cloned().collect();
        entities.sort_by(by_creation);

        Ok(entities)
    }

    async fn update(&self, id: &Uuid, mut entity: T) -> StoreResult<T> {
        let mut tables = self.write()?;

        let stored = T::table(&tables)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(T::resource_name_singular(), *id))?;

        if entity.id() != *id {
            return Err(StoreError::constraint("id", "The id of an entity cannot change."));
        }
        entity.preserve(&stored);
        entity.check(&tables)?;

        T::table_mut(&mut tables).insert(*id, entity.clone());

        Ok(entity)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<()> {
        let mut tables = self.write()?;

        let removed = T::table_mut(&mut tables)
            .remove(id)
            .ok_or_else(|| StoreError::not_found(T::resource_name_singular(), *id))?;
        T::cascade(&removed, &mut tables);

        Ok(())
    }
}

#[async_trait]
impl RentalStore for InMemoryStore {
    async fn claim_item(&self, rental: Rental) -> StoreResult<Claim> {
        let mut tables = self.write()?;

        rental.check(&tables)?;
        if tables.rentals.contains_key(&rental.id) {
            return Err(StoreError::AlreadyExists {
                entity_type: "rental".to_string(),
                id: rental.id,
            });
        }

        let occupied = tables.has_active_rental(&rental.item);
        let Some(item) = tables.items.get_mut(&rental.item) else {
            return Err(StoreError::missing_reference("item", "item", rental.item));
        };
        if item.status != ItemStatus::Available || occupied {
            return Ok(Claim::Unavailable);
        }

        item.status = ItemStatus::Rented;
        item.touch();
        tables.rentals.insert(rental.id, rental.clone());

        Ok(Claim::Granted(rental))
    }

    async fn transition_item(
        &self,
        item_id: &Uuid,
        expected: ItemStatus,
        new: ItemStatus,
    ) -> StoreResult<bool> {
        let mut tables = self.write()?;

        let item = tables
            .items
            .get_mut(item_id)
            .ok_or_else(|| StoreError::not_found("item", *item_id))?;
        if item.status != expected {
            return Ok(false);
        }

        item.status = new;
        item.touch();
        Ok(true)
    }

    async fn set_rental_status(
        &self,
        rental_id: &Uuid,
        status: RentalStatus,
    ) -> StoreResult<Rental> {
        let mut tables = self.write()?;

        let rental = tables
            .rentals
            .get_mut(rental_id)
            .ok_or_else(|| StoreError::not_found("rental", *rental_id))?;
        rental.status = status;
        rental.touch();

        Ok(rental.clone())
    }

    async fn active_rentals(&self, item_id: &Uuid) -> StoreResult<Vec<Rental>> {
        let tables = self.read()?;

        Ok(tables
            .rentals
            .values()
            .filter(|r| &r.item == item_id && r.is_active())
            .cloned()
            .collect())
    }

    async fn reconcile_item(&self, item_id: &Uuid) -> StoreResult<(Item, bool)> {
        let mut tables = self.write()?;

        let occupied = tables.has_active_rental(item_id);
        let item = tables
            .items
            .get_mut(item_id)
            .ok_or_else(|| StoreError::not_found("item", *item_id))?;

        let repaired = match (item.status, occupied) {
            (ItemStatus::Rented, false) => Some(ItemStatus::Available),
            (ItemStatus::Available | ItemStatus::Reserved, true) => Some(ItemStatus::Rented),
            _ => None,
        };
        if let Some(status) = repaired {
            item.status = status;
            item.touch();
        }

        Ok((item.clone(), repaired.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

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

    fn item(category: Uuid) -> Item {
        Item::new(
            category,
            "Drill".into(),
            String::new(),
            None,
            None,
            vec![],
            ItemStatus::Available,
        )
    }

    fn rental(user: Uuid, item: Uuid) -> Rental {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        Rental::new(user, item, day, day, RentalStatus::Awaiting)
    }

    async fn seeded() -> (InMemoryStore, User, Category, Item) {
        let store = InMemoryStore::new();
        let u = store.create(user("anna")).await.unwrap();
        let c = store.create(Category::new("Tools".into(), None)).await.unwrap();
        let i = store.create(item(c.id)).await.unwrap();
        (store, u, c, i)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        let category = Category::new("Tools".into(), None);
        store.create(category.clone()).await.unwrap();

        let fetched: Option<Category> = store.get(&category.id).await.unwrap();
        assert_eq!(fetched, Some(category));
    }

    #[tokio::test]
    async fn test_missing_reference_rejected() {
        let store = InMemoryStore::new();
        let err = DataService::<Item>::create(&store, item(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference { ref field, .. } if field == "category"));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = InMemoryStore::new();
        store.create(user("anna")).await.unwrap();
        let err = store.create(user("ANNA")).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint { ref field, .. } if field == "username"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryStore::new();
        let category = Category::new("Tools".into(), None);
        let err = store.update(&category.id, category.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_preserves_item_status() {
        let (store, _, _, mut i) = seeded().await;
        store
            .transition_item(&i.id, ItemStatus::Available, ItemStatus::Rented)
            .await
            .unwrap();

        i.name = "Hammer drill".into();
        i.status = ItemStatus::Available;
        let updated = store.update(&i.id, i.clone()).await.unwrap();
        assert_eq!(updated.status, ItemStatus::Rented);
        assert_eq!(updated.name, "Hammer drill");
    }

    #[tokio::test]
    async fn test_category_cycle_rejected() {
        let store = InMemoryStore::new();
        let root = store.create(Category::new("Root".into(), None)).await.unwrap();
        let child = store
            .create(Category::new("Child".into(), Some(root.id)))
            .await
            .unwrap();

        let mut looped = root.clone();
        looped.parent = Some(child.id);
        let err = store.update(&root.id, looped).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint { ref field, .. } if field == "parent"));
    }

    #[tokio::test]
    async fn test_delete_category_cascades() {
        let (store, u, c, i) = seeded().await;
        let child = store
            .create(Category::new("Drills".into(), Some(c.id)))
            .await
            .unwrap();
        let claim = store.claim_item(rental(u.id, i.id)).await.unwrap();
        let Claim::Granted(r) = claim else {
            panic!("claim should succeed");
        };
        store
            .create(SafeConduct::new(r.id, "doc.pdf".into()))
            .await
            .unwrap();

        DataService::<Category>::delete(&store, &c.id).await.unwrap();

        assert!(DataService::<Item>::get(&store, &i.id).await.unwrap().is_none());
        assert!(DataService::<Rental>::list(&store).await.unwrap().is_empty());
        assert!(DataService::<SafeConduct>::list(&store).await.unwrap().is_empty());
        let child: Option<Category> = store.get(&child.id).await.unwrap();
        assert_eq!(child.map(|c| c.parent), Some(None));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let (store, u, _, i) = seeded().await;
        store.claim_item(rental(u.id, i.id)).await.unwrap();
        store.create(Message::new(u.id, "hi".into())).await.unwrap();

        DataService::<User>::delete(&store, &u.id).await.unwrap();

        assert!(DataService::<Rental>::list(&store).await.unwrap().is_empty());
        assert!(DataService::<Message>::list(&store).await.unwrap().is_empty());
        let item: Option<Item> = store.get(&i.id).await.unwrap();
        assert_eq!(item.map(|i| i.status), Some(ItemStatus::Available));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = DataService::<Message>::delete(&store, &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_claim_only_once() {
        let (store, u, _, i) = seeded().await;
        assert!(matches!(
            store.claim_item(rental(u.id, i.id)).await.unwrap(),
            Claim::Granted(_)
        ));
        assert!(matches!(
            store.claim_item(rental(u.id, i.id)).await.unwrap(),
            Claim::Unavailable
        ));
        assert_eq!(store.active_rentals(&i.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_with_unknown_user_writes_nothing() {
        let (store, _, _, i) = seeded().await;
        let err = store.claim_item(rental(Uuid::new_v4(), i.id)).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference { .. }));
        let item: Option<Item> = store.get(&i.id).await.unwrap();
        assert_eq!(item.map(|i| i.status), Some(ItemStatus::Available));
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let (store, _, _, i) = seeded().await;
        assert!(
            !store
                .transition_item(&i.id, ItemStatus::Rented, ItemStatus::Available)
                .await
                .unwrap()
        );
        assert!(
            store
                .transition_item(&i.id, ItemStatus::Available, ItemStatus::Reserved)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_reconcile_repairs_orphaned_claim() {
        let (store, _, _, i) = seeded().await;
        store
            .transition_item(&i.id, ItemStatus::Available, ItemStatus::Rented)
            .await
            .unwrap();

        let (item, repaired) = store.reconcile_item(&i.id).await.unwrap();
        assert!(repaired);
        assert_eq!(item.status, ItemStatus::Available);

        let (_, repaired) = store.reconcile_item(&i.id).await.unwrap();
        assert!(!repaired);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_creation() {
        let store = InMemoryStore::new();
        for name in ["a", "b", "c"] {
            store.create(Category::new(name.into(), None)).await.unwrap();
        }
        let listed: Vec<Category> = store.list().await.unwrap();
        let names: Vec<&str> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(listed.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }
}
