//! Safe-conduct documents attached to rentals

use crate::core::error::FieldErrors;
use crate::core::validation::FieldValidator;
use crate::core::validation::validators::{max_length, not_blank};
use crate::dispatch::representation::{WriteContext, WriteRepresentation};
use crate::impl_data_entity;
use serde::Deserialize;
use uuid::Uuid;

impl_data_entity!(
    /// A document reference attached to exactly one rental
    SafeConduct,
    "safe_conduct",
    "safe-conducts",
    ["document"],
    {
        rental: Uuid,
        /// Reference into external document storage
        document: String,
    }
);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SafeConductPayload {
    pub rental: Option<Uuid>,
    pub document: Option<String>,
}

impl WriteRepresentation<SafeConduct> for SafeConductPayload {
    fn validate(&self, ctx: &WriteContext<'_, SafeConduct>) -> FieldErrors {
        let mut v = FieldValidator::new(ctx.mode);
        v.required("rental", self.rental.as_ref())
            .required("document", self.document.as_ref())
            .text(
                "document",
                self.document.as_deref(),
                &[&not_blank(), &max_length(255)],
            );
        v.finish()
    }

    fn create(self) -> SafeConduct {
        SafeConduct::new(
            self.rental.unwrap_or_default(),
            self.document.unwrap_or_default(),
        )
    }

    fn apply(self, conduct: &mut SafeConduct) {
        if let Some(rental) = self.rental {
            conduct.rental = rental;
        }
        if let Some(document) = self.document {
            conduct.document = document;
        }
    }
}
