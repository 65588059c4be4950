//! Generic resource dispatcher
//!
//! A [`Resource`] bundles everything needed to serve one entity type over
//! HTTP: the entity service, its read and write representations, optional
//! pagination, search and ordering, and an access policy per operation.
//! Resources are assembled once at startup through [`ResourceBuilder`],
//! which reports wiring mistakes as [`RegistrationError`] instead of
//! failing at request time.
//!
//! # Example
//!
//! ```rust,ignore
//! let items = Resource::<Item, Item, ItemPayload>::builder("/items")
//!     .service(store.clone())
//!     .paginate(LimitOffsetPagination::new(20, 100))
//!     .search(SearchFilter::indexed::<Item>())
//!     .policy(ResourcePolicy::public_read_admin_write())
//!     .build()?;
//! ```

pub mod handlers;
pub mod representation;

pub use representation::{ReadRepresentation, WriteContext, WriteRepresentation};

use crate::core::auth::{AuthContext, AuthPolicy, Scope};
use crate::core::entity::Data;
use crate::core::error::{RegistrationError, RentalError, RentalResult};
use crate::core::query::{Comparator, LimitOffsetPagination, ListParams, SearchFilter};
use crate::core::service::{DataService, with_deadline};
use crate::core::validation::WriteMode;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default bound on a single store call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Operations a resource can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Retrieve,
    Replace,
    PartialUpdate,
    Delete,
}

/// Access policy per operation; `None` means the operation is not exposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    pub list: Option<AuthPolicy>,
    pub create: Option<AuthPolicy>,
    pub retrieve: Option<AuthPolicy>,
    /// Covers both replace and partial update
    pub update: Option<AuthPolicy>,
    pub delete: Option<AuthPolicy>,
}

impl ResourcePolicy {
    /// Anyone may read; only administrators write
    pub fn public_read_admin_write() -> Self {
        Self {
            list: Some(AuthPolicy::Public),
            create: Some(AuthPolicy::AdminOnly),
            retrieve: Some(AuthPolicy::Public),
            update: Some(AuthPolicy::AdminOnly),
            delete: Some(AuthPolicy::AdminOnly),
        }
    }

    pub fn admin_only() -> Self {
        Self {
            list: Some(AuthPolicy::AdminOnly),
            create: Some(AuthPolicy::AdminOnly),
            retrieve: Some(AuthPolicy::AdminOnly),
            update: Some(AuthPolicy::AdminOnly),
            delete: Some(AuthPolicy::AdminOnly),
        }
    }

    /// Administrators see everything; users see and edit their own records
    pub fn admin_or_owner() -> Self {
        Self {
            list: Some(AuthPolicy::AdminOrOwner),
            create: Some(AuthPolicy::AdminOrOwner),
            retrieve: Some(AuthPolicy::AdminOrOwner),
            update: Some(AuthPolicy::AdminOrOwner),
            delete: Some(AuthPolicy::AdminOrOwner),
        }
    }

    pub fn with_list(mut self, policy: Option<AuthPolicy>) -> Self {
        self.list = policy;
        self
    }

    pub fn with_create(mut self, policy: Option<AuthPolicy>) -> Self {
        self.create = policy;
        self
    }

    pub fn with_retrieve(mut self, policy: Option<AuthPolicy>) -> Self {
        self.retrieve = policy;
        self
    }

    pub fn get(&self, operation: Operation) -> Option<AuthPolicy> {
        match operation {
            Operation::List => self.list,
            Operation::Create => self.create,
            Operation::Retrieve => self.retrieve,
            Operation::Replace | Operation::PartialUpdate => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// Parse a path id; anything that is not a UUID cannot exist
pub fn parse_id(raw: &str, entity_type: &str) -> RentalResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| RentalError::NotFound {
        entity_type: entity_type.to_string(),
        id: Uuid::nil(),
    })
}

/// Per-resource configuration, shared read-only by every request
pub struct Resource<T: Data, R = T, W = R> {
    path: String,
    service: Arc<dyn DataService<T>>,
    pagination: Option<LimitOffsetPagination>,
    search: Option<SearchFilter>,
    ordering: Option<Comparator<T>>,
    policy: ResourcePolicy,
    countable: bool,
    timeout: Duration,
    _repr: PhantomData<fn() -> (R, W)>,
}

impl<T: Data, R, W> Clone for Resource<T, R, W> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            service: self.service.clone(),
            pagination: self.pagination,
            search: self.search.clone(),
            ordering: self.ordering,
            policy: self.policy,
            countable: self.countable,
            timeout: self.timeout,
            _repr: PhantomData,
        }
    }
}

impl<T: Data, R, W> Resource<T, R, W> {
    /// Start configuring a resource mounted at `path`
    pub fn builder(path: impl Into<String>) -> ResourceBuilder<T, R, W> {
        ResourceBuilder::new(path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn policy(&self) -> &ResourcePolicy {
        &self.policy
    }

    pub fn pagination(&self) -> Option<&LimitOffsetPagination> {
        self.pagination.as_ref()
    }

    pub fn is_countable(&self) -> bool {
        self.countable
    }

    pub fn service(&self) -> &Arc<dyn DataService<T>> {
        &self.service
    }
}

impl<T, R, W> Resource<T, R, W>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    fn policy_for(&self, operation: Operation) -> RentalResult<AuthPolicy> {
        self.policy.get(operation).ok_or(RentalError::Forbidden)
    }

    /// Load one entity or fail with `NotFound`
    async fn fetch(&self, id: &Uuid) -> RentalResult<T> {
        with_deadline(self.timeout, self.service.get(id))
            .await?
            .ok_or_else(|| RentalError::not_found(T::resource_name_singular(), *id))
    }

    /// Visible, searched and ordered entities, before pagination
    async fn filtered(&self, actor: &AuthContext, params: &ListParams) -> RentalResult<Vec<T>> {
        let scope = self.policy_for(Operation::List)?.scope(actor)?;

        let mut entities = with_deadline(self.timeout, self.service.list()).await?;

        if let Scope::OwnedBy(user_id) = scope {
            entities.retain(|e| e.owner_id() == Some(user_id));
        }
        if let Some(search) = &self.search {
            entities = search.apply(entities, params.search_term());
        }
        if let Some(ordering) = self.ordering {
            entities.sort_by(ordering);
        }
        Ok(entities)
    }

    /// List: search, then order, then paginate, then serialise
    pub async fn list(&self, actor: &AuthContext, params: &ListParams) -> RentalResult<Vec<R>> {
        let mut entities = self.filtered(actor, params).await?;

        if let Some(pagination) = &self.pagination {
            entities = pagination.paginate(entities, params);
        }
        Ok(entities.iter().map(R::from_entity).collect())
    }

    /// Number of records a listing with these parameters would page over
    pub async fn count(&self, actor: &AuthContext, params: &ListParams) -> RentalResult<usize> {
        Ok(self.filtered(actor, params).await?.len())
    }

    pub async fn create(&self, actor: &AuthContext, payload: W) -> RentalResult<R> {
        let policy = self.policy_for(Operation::Create)?;
        policy.precheck(actor)?;

        payload.validate(&WriteContext::create(actor)).into_result()?;
        let entity = payload.create();
        policy.authorize(actor, entity.owner_id())?;

        let created = with_deadline(self.timeout, self.service.create(entity)).await?;
        tracing::info!(
            entity_type = T::resource_name_singular(),
            id = %created.id(),
            "created"
        );
        Ok(R::from_entity(&created))
    }

    pub async fn retrieve(&self, actor: &AuthContext, id: &Uuid) -> RentalResult<R> {
        let policy = self.policy_for(Operation::Retrieve)?;
        policy.precheck(actor)?;

        let entity = self.fetch(id).await?;
        policy.authorize(actor, entity.owner_id())?;
        Ok(R::from_entity(&entity))
    }

    /// Full update: every required field must be supplied
    pub async fn replace(&self, actor: &AuthContext, id: &Uuid, payload: W) -> RentalResult<R> {
        self.update(actor, id, payload, WriteMode::Replace).await
    }

    /// Partial update: only supplied fields are validated and applied
    pub async fn partial_update(
        &self,
        actor: &AuthContext,
        id: &Uuid,
        payload: W,
    ) -> RentalResult<R> {
        self.update(actor, id, payload, WriteMode::Partial).await
    }

    async fn update(
        &self,
        actor: &AuthContext,
        id: &Uuid,
        payload: W,
        mode: WriteMode,
    ) -> RentalResult<R> {
        let operation = match mode {
            WriteMode::Partial => Operation::PartialUpdate,
            _ => Operation::Replace,
        };
        let policy = self.policy_for(operation)?;
        policy.precheck(actor)?;

        let current = self.fetch(id).await?;
        policy.authorize(actor, current.owner_id())?;

        payload
            .validate(&WriteContext::update(mode, &current, actor))
            .into_result()?;

        let mut entity = current.clone();
        payload.apply(&mut entity);
        entity.touch();
        // Owners may not hand their record to someone else
        policy.authorize(actor, entity.owner_id())?;

        let updated = with_deadline(self.timeout, self.service.update(id, entity)).await?;
        tracing::info!(
            entity_type = T::resource_name_singular(),
            id = %id,
            "updated"
        );
        Ok(R::from_entity(&updated))
    }

    pub async fn delete(&self, actor: &AuthContext, id: &Uuid) -> RentalResult<()> {
        let policy = self.policy_for(Operation::Delete)?;
        policy.precheck(actor)?;

        let entity = self.fetch(id).await?;
        policy.authorize(actor, entity.owner_id())?;

        with_deadline(self.timeout, self.service.delete(id)).await?;
        tracing::info!(
            entity_type = T::resource_name_singular(),
            id = %id,
            "deleted"
        );
        Ok(())
    }
}

/// Fluent configuration of a [`Resource`]
pub struct ResourceBuilder<T: Data, R = T, W = R> {
    path: String,
    service: Option<Arc<dyn DataService<T>>>,
    pagination: Option<LimitOffsetPagination>,
    search: Option<SearchFilter>,
    ordering: Option<Comparator<T>>,
    policy: ResourcePolicy,
    countable: bool,
    timeout: Duration,
    _repr: PhantomData<fn() -> (R, W)>,
}

impl<T: Data, R, W> ResourceBuilder<T, R, W> {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            service: None,
            pagination: None,
            search: None,
            ordering: None,
            policy: ResourcePolicy::admin_only(),
            countable: false,
            timeout: DEFAULT_TIMEOUT,
            _repr: PhantomData,
        }
    }

    /// Entity service backing the resource (required)
    pub fn service(mut self, service: Arc<dyn DataService<T>>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn paginate(mut self, pagination: LimitOffsetPagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn search(mut self, search: SearchFilter) -> Self {
        self.search = Some(search);
        self
    }

    pub fn order_by(mut self, ordering: Comparator<T>) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn policy(mut self, policy: ResourcePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Also expose `GET {path}/count`, guarded by the list policy
    pub fn countable(mut self) -> Self {
        self.countable = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Resource<T, R, W>, RegistrationError> {
        let trimmed = self.path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(RegistrationError::MissingPath {
                entity_type: T::resource_name_singular().to_string(),
            });
        }
        let path = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };

        let service = self.service.ok_or_else(|| RegistrationError::MissingService {
            resource: path.clone(),
        })?;

        Ok(Resource {
            path,
            service,
            pagination: self.pagination,
            search: self.search,
            ordering: self.ordering,
            policy: self.policy,
            countable: self.countable,
            timeout: self.timeout,
            _repr: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::by_latest_update;
    use crate::entities::{Category, CategoryPayload, Message, MessagePayload, User};
    use crate::storage::InMemoryStore;
    use chrono::{Duration as ChronoDuration, Utc};

    type Categories = Resource<Category, Category, CategoryPayload>;
    type Messages = Resource<Message, Message, MessagePayload>;

    fn admin() -> AuthContext {
        AuthContext::admin(Uuid::new_v4())
    }

    fn categories(store: &InMemoryStore) -> Categories {
        Resource::builder("categories/")
            .service(Arc::new(store.clone()))
            .search(SearchFilter::indexed::<Category>())
            .policy(ResourcePolicy::public_read_admin_write())
            .build()
            .unwrap()
    }

    fn named(name: &str) -> CategoryPayload {
        CategoryPayload {
            name: Some(name.into()),
            parent: None,
        }
    }

    async fn user(store: &InMemoryStore, name: &str) -> User {
        let user = User::new(
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
        );
        DataService::<User>::create(store, user).await.unwrap()
    }

    #[test]
    fn test_build_without_service_is_registration_error() {
        let err = Categories::builder("/categories").build().err().unwrap();
        assert!(matches!(err, RegistrationError::MissingService { .. }));
    }

    #[test]
    fn test_build_without_path_is_registration_error() {
        let store = InMemoryStore::new();
        let err = Categories::builder("  / ")
            .service(Arc::new(store))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RegistrationError::MissingPath { .. }));
    }

    #[test]
    fn test_path_is_normalised() {
        let store = InMemoryStore::new();
        assert_eq!(categories(&store).path(), "/categories");
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "item").unwrap(), id);
        assert!(matches!(
            parse_id("abc", "item").unwrap_err(),
            RentalError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_create_then_retrieve() {
        let store = InMemoryStore::new();
        let resource = categories(&store);
        let admin = admin();

        let created = resource.create(&admin, named("Tools")).await.unwrap();
        let fetched = resource
            .retrieve(&AuthContext::Anonymous, &created.id)
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_invalid_create_persists_nothing() {
        let store = InMemoryStore::new();
        let resource = categories(&store);

        let err = resource
            .create(&admin(), CategoryPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Validation(_)));
        let listed = resource
            .list(&AuthContext::Anonymous, &ListParams::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_retrieve_is_not_found() {
        let store = InMemoryStore::new();
        let resource = categories(&store);
        let admin = admin();
        let created = resource.create(&admin, named("Tools")).await.unwrap();

        resource.delete(&admin, &created.id).await.unwrap();
        let err = resource.retrieve(&admin, &created.id).await.unwrap_err();
        assert!(matches!(err, RentalError::NotFound { .. }));
        let err = resource.delete(&admin, &created.id).await.unwrap_err();
        assert!(matches!(err, RentalError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_write_requires_admin() {
        let store = InMemoryStore::new();
        let resource = categories(&store);

        let err = resource
            .create(&AuthContext::Anonymous, named("Tools"))
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Unauthorized));

        let err = resource
            .create(&AuthContext::user(Uuid::new_v4()), named("Tools"))
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Forbidden));
    }

    #[tokio::test]
    async fn test_search_matches_and_empty_result() {
        let store = InMemoryStore::new();
        let resource = categories(&store);
        let admin = admin();
        for name in ["Power tools", "Garden", "Hand tools"] {
            resource.create(&admin, named(name)).await.unwrap();
        }

        let params = ListParams {
            q: Some("TOOLS".into()),
            ..Default::default()
        };
        let found = resource.list(&admin, &params).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.name.to_lowercase().contains("tools")));

        let params = ListParams {
            q: Some("kayak".into()),
            ..Default::default()
        };
        assert!(resource.list(&admin, &params).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_requires_all_fields_partial_does_not() {
        let store = InMemoryStore::new();
        let resource = categories(&store);
        let admin = admin();
        let created = resource.create(&admin, named("Tools")).await.unwrap();

        let err = resource
            .replace(&admin, &created.id, CategoryPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Validation(_)));

        let patched = resource
            .partial_update(&admin, &created.id, CategoryPayload::default())
            .await
            .unwrap();
        assert_eq!(patched.name, "Tools");
        assert!(patched.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_pagination_happens_after_search_and_ordering() {
        let store = InMemoryStore::new();
        let resource: Categories = Resource::builder("/categories")
            .service(Arc::new(store.clone()))
            .search(SearchFilter::indexed::<Category>())
            .order_by(by_latest_update)
            .paginate(LimitOffsetPagination::new(2, 2))
            .policy(ResourcePolicy::public_read_admin_write())
            .build()
            .unwrap();

        let base = Utc::now() - ChronoDuration::hours(1);
        for (i, name) in ["tool a", "other", "tool b", "tool c"].iter().enumerate() {
            let mut category = Category::new((*name).into(), None);
            category.updated_at = base + ChronoDuration::minutes(i as i64);
            DataService::<Category>::create(&store, category).await.unwrap();
        }

        let params = ListParams {
            q: Some("tool".into()),
            limit: Some(50),
            offset: None,
        };
        let page: Vec<String> = resource
            .list(&AuthContext::Anonymous, &params)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(page, vec!["tool c", "tool b"]);
        assert_eq!(
            resource.count(&AuthContext::Anonymous, &params).await.unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_owner_scoped_listing_and_access() {
        let store = InMemoryStore::new();
        let resource: Messages = Resource::builder("/messages")
            .service(Arc::new(store.clone()))
            .policy(ResourcePolicy::admin_or_owner())
            .build()
            .unwrap();
        let anna = user(&store, "anna").await;
        let piotr = user(&store, "piotr").await;
        let as_anna = AuthContext::user(anna.id);
        let as_piotr = AuthContext::user(piotr.id);

        let mine = resource
            .create(
                &as_anna,
                MessagePayload {
                    user: Some(anna.id),
                    message: Some("hello".into()),
                },
            )
            .await
            .unwrap();

        let err = resource
            .create(
                &as_anna,
                MessagePayload {
                    user: Some(piotr.id),
                    message: Some("spoofed".into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Forbidden));

        assert_eq!(
            resource.list(&as_anna, &ListParams::default()).await.unwrap().len(),
            1
        );
        assert!(
            resource
                .list(&as_piotr, &ListParams::default())
                .await
                .unwrap()
                .is_empty()
        );

        let err = resource.retrieve(&as_piotr, &mine.id).await.unwrap_err();
        assert!(matches!(err, RentalError::Forbidden));

        let err = resource
            .partial_update(
                &as_anna,
                &mine.id,
                MessagePayload {
                    user: Some(piotr.id),
                    message: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RentalError::Forbidden));
    }
}
