//! Item categories

use crate::core::error::FieldErrors;
use crate::core::validation::FieldValidator;
use crate::core::validation::validators::{max_length, not_blank};
use crate::dispatch::representation::{WriteContext, WriteRepresentation};
use crate::impl_data_entity;
use serde::Deserialize;
use uuid::Uuid;

impl_data_entity!(
    /// A flat grouping of items
    ///
    /// `parent` is a deprecated hierarchy extension. The store rejects any
    /// parent that would make a category its own ancestor.
    Category,
    "category",
    "categories",
    ["name"],
    {
        name: String,
        parent: Option<Uuid>,
    }
);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPayload {
    pub name: Option<String>,
    pub parent: Option<Uuid>,
}

impl WriteRepresentation<Category> for CategoryPayload {
    fn validate(&self, ctx: &WriteContext<'_, Category>) -> FieldErrors {
        let mut v = FieldValidator::new(ctx.mode);
        v.required("name", self.name.as_ref())
            .text("name", self.name.as_deref(), &[&not_blank(), &max_length(50)]);

        if let (Some(parent), Some(current)) = (self.parent, ctx.current) {
            if parent == current.id {
                v.add("parent", "A category cannot be its own parent.");
            }
        }
        v.finish()
    }

    fn create(self) -> Category {
        Category::new(self.name.unwrap_or_default(), self.parent)
    }

    fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if self.parent.is_some() {
            category.parent = self.parent;
        }
    }
}
