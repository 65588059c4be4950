//! Marketplace entities and their write representations

pub mod macros;

pub mod category;
pub mod item;
pub mod message;
pub mod rental;
pub mod safe_conduct;
pub mod user;

pub use category::{Category, CategoryPayload};
pub use item::{Item, ItemPayload, ItemStatus};
pub use message::{Message, MessagePayload};
pub use rental::{Rental, RentalPayload, RentalStatus};
pub use safe_conduct::{SafeConduct, SafeConductPayload};
pub use user::{User, UserPayload};
