//! Axum handlers shared by every resource
//!
//! Each handler is generic over the entity and its representations, so a
//! resource only has to be registered to get its routes.

use super::{Operation, ReadRepresentation, Resource, WriteRepresentation, parse_id};
use crate::core::auth::AuthContext;
use crate::core::entity::Data;
use crate::core::error::RentalResult;
use crate::core::query::ListParams;
use crate::core::validation::{Params, Payload};
use crate::server::entity_registry::EntityDescriptor;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{MethodRouter, get},
};
use serde_json::{Value, json};
use std::sync::Arc;

type Shared<T, R, W> = State<Arc<Resource<T, R, W>>>;

pub async fn list<T, R, W>(
    State(resource): Shared<T, R, W>,
    actor: AuthContext,
    Params(params): Params<ListParams>,
) -> RentalResult<Json<Vec<R>>>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    resource.list(&actor, &params).await.map(Json)
}

pub async fn count<T, R, W>(
    State(resource): Shared<T, R, W>,
    actor: AuthContext,
    Params(params): Params<ListParams>,
) -> RentalResult<Json<Value>>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    let count = resource.count(&actor, &params).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn create<T, R, W>(
    State(resource): Shared<T, R, W>,
    actor: AuthContext,
    Payload(payload): Payload<W>,
) -> RentalResult<(StatusCode, Json<R>)>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    let created = resource.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn retrieve<T, R, W>(
    State(resource): Shared<T, R, W>,
    actor: AuthContext,
    Path(id): Path<String>,
) -> RentalResult<Json<R>>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    let id = parse_id(&id, T::resource_name_singular())?;
    resource.retrieve(&actor, &id).await.map(Json)
}

pub async fn replace<T, R, W>(
    State(resource): Shared<T, R, W>,
    actor: AuthContext,
    Path(id): Path<String>,
    Payload(payload): Payload<W>,
) -> RentalResult<Json<R>>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    let id = parse_id(&id, T::resource_name_singular())?;
    resource.replace(&actor, &id, payload).await.map(Json)
}

pub async fn partial_update<T, R, W>(
    State(resource): Shared<T, R, W>,
    actor: AuthContext,
    Path(id): Path<String>,
    Payload(payload): Payload<W>,
) -> RentalResult<Json<R>>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    let id = parse_id(&id, T::resource_name_singular())?;
    resource.partial_update(&actor, &id, payload).await.map(Json)
}

pub async fn delete<T, R, W>(
    State(resource): Shared<T, R, W>,
    actor: AuthContext,
    Path(id): Path<String>,
) -> RentalResult<StatusCode>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    let id = parse_id(&id, T::resource_name_singular())?;
    resource.delete(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

impl<T, R, W> EntityDescriptor for Resource<T, R, W>
where
    T: Data,
    R: ReadRepresentation<T>,
    W: WriteRepresentation<T>,
{
    fn entity_type(&self) -> &str {
        T::resource_name_singular()
    }

    fn path(&self) -> &str {
        Resource::path(self)
    }

    /// Routes for the operations this resource exposes; disabled ones are
    /// simply not mounted and answer 405 or 404
    fn build_routes(&self) -> Router {
        let policy = self.policy();
        let state = Arc::new(self.clone());

        let mut collection: MethodRouter<Arc<Resource<T, R, W>>> = MethodRouter::new();
        if policy.get(Operation::List).is_some() {
            collection = collection.get(list::<T, R, W>);
        }
        if policy.get(Operation::Create).is_some() {
            collection = collection.post(create::<T, R, W>);
        }

        let mut member: MethodRouter<Arc<Resource<T, R, W>>> = MethodRouter::new();
        if policy.get(Operation::Retrieve).is_some() {
            member = member.get(retrieve::<T, R, W>);
        }
        if policy.get(Operation::Replace).is_some() {
            member = member
                .put(replace::<T, R, W>)
                .patch(partial_update::<T, R, W>);
        }
        if policy.get(Operation::Delete).is_some() {
            member = member.delete(delete::<T, R, W>);
        }

        let base = self.path();
        let mut router = Router::new()
            .route(base, collection)
            .route(&format!("{}/{{id}}", base), member);

        if self.is_countable() && policy.get(Operation::List).is_some() {
            router = router.route(&format!("{}/count", base), get(count::<T, R, W>));
        }

        router.with_state(state)
    }
}
