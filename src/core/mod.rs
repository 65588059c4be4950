//! Core module containing fundamental traits and types shared by every resource

pub mod auth;
pub mod entity;
pub mod error;
pub mod field;
pub mod query;
pub mod service;
pub mod validation;

pub use auth::{AuthContext, AuthPolicy, AuthProvider, HeaderAuthProvider, Scope};
pub use entity::{Data, Entity};
pub use error::{
    ErrorResponse, FieldErrors, RegistrationError, RentalError, RentalResult, StoreError,
    StoreResult,
};
pub use field::{FieldFormat, FieldValue};
pub use query::{LimitOffsetPagination, ListParams, SearchFilter};
pub use service::{Claim, DataService, MarketplaceStore, RentalStore, with_deadline};
pub use validation::{FieldValidator, Payload, WriteMode};
