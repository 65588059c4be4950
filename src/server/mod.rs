//! Server module assembling the HTTP application
//!
//! The `ServerBuilder` registers:
//! - the generic routes of every resource in the resource table
//! - the domain routes (rental transitions, reports, registration)
//! - health routes

pub mod builder;
pub mod entity_registry;
pub mod host;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry};
pub use host::{ServerHost, StoreHandles};
