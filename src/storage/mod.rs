//! Storage implementations
//!
//! Persistent engines plug in by implementing [`DataService`](crate::core::DataService)
//! for every entity plus [`RentalStore`](crate::core::RentalStore).

#[cfg(feature = "in-memory")]
pub mod in_memory;

#[cfg(feature = "in-memory")]
pub use in_memory::InMemoryStore;
