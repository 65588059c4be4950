//! Entity traits defining the core abstraction for all stored types

use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Base trait for all entities in the system.
///
/// All entities have:
/// - id: Unique identifier, assigned at creation and never reused
/// - created_at: Creation timestamp
/// - updated_at: Last modification timestamp
pub trait Entity: Clone + Send + Sync + 'static {
    /// The plural resource name used in URLs (e.g., "items", "rentals")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "item", "rental")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;

    /// Mark the entity as modified now
    fn touch(&mut self);
}

/// Trait for data entities that represent concrete domain objects.
///
/// Data entities extend the base Entity with:
/// - indexed_fields: Fields that free-text search looks at by default
/// - field_value: Dynamic field access
/// - owner_id: The user that owns the record, when there is one
pub trait Data: Entity {
    /// List of fields that should be indexed for searching
    fn indexed_fields() -> &'static [&'static str];

    /// Get the value of a specific field by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// The user this record belongs to, used by owner-based policies
    fn owner_id(&self) -> Option<Uuid> {
        None
    }
}
