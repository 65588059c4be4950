//! Read and write representations of an entity
//!
//! A resource serialises entities through a read representation `R` and
//! accepts payloads through a write representation `W`. Entities that can
//! be shown as stored use themselves as their read representation.

use crate::core::auth::AuthContext;
use crate::core::entity::Data;
use crate::core::error::FieldErrors;
use crate::core::validation::WriteMode;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Everything a write representation may consult while validating
pub struct WriteContext<'a, T> {
    pub mode: WriteMode,
    /// The stored entity, for updates
    pub current: Option<&'a T>,
    /// The caller
    pub actor: &'a AuthContext,
}

impl<'a, T> WriteContext<'a, T> {
    pub fn create(actor: &'a AuthContext) -> Self {
        Self {
            mode: WriteMode::Create,
            current: None,
            actor,
        }
    }

    pub fn update(mode: WriteMode, current: &'a T, actor: &'a AuthContext) -> Self {
        Self {
            mode,
            current: Some(current),
            actor,
        }
    }
}

/// Shape returned to clients
pub trait ReadRepresentation<T>: Serialize + Send + Sync + 'static {
    fn from_entity(entity: &T) -> Self;
}

impl<T: Data + Serialize> ReadRepresentation<T> for T {
    fn from_entity(entity: &T) -> Self {
        entity.clone()
    }
}

/// Shape accepted from clients on create and update
///
/// Fields are optional so that one type serves create, replace and partial
/// update; [`validate`](WriteRepresentation::validate) decides which ones
/// are required for the mode at hand.
pub trait WriteRepresentation<T>: DeserializeOwned + Send + 'static {
    /// Every problem with the payload, keyed by field
    fn validate(&self, ctx: &WriteContext<'_, T>) -> FieldErrors;

    /// Build a new entity; only called after `validate` passed in create mode
    fn create(self) -> T;

    /// Copy the supplied fields onto an existing entity
    fn apply(self, entity: &mut T);
}
