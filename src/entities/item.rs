//! Catalogued items

use crate::core::error::FieldErrors;
use crate::core::field::FieldValue;
use crate::core::validation::{FieldValidator, nullable};
use crate::core::validation::validators::{max_length, non_negative, not_blank};
use crate::dispatch::representation::{WriteContext, WriteRepresentation};
use crate::impl_data_entity;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Availability of an item
///
/// Only the rental lifecycle changes this value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Available,
    Rented,
    Reserved,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Rented => "rented",
            ItemStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ItemStatus> for FieldValue {
    fn from(status: ItemStatus) -> Self {
        FieldValue::String(status.as_str().to_string())
    }
}

impl_data_entity!(
    /// An item that can be rented
    Item,
    "item",
    "items",
    ["name", "description", "serial_number"],
    {
        category: Uuid,
        name: String,
        description: String,
        serial_number: Option<String>,
        price: Option<f64>,
        /// References into external image storage
        images: Vec<String>,
        status: ItemStatus,
    }
);

/// Write representation of an item; `status` is deliberately not settable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPayload {
    pub category: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// `null` clears the serial number
    #[serde(default, deserialize_with = "nullable")]
    pub serial_number: Option<Option<String>>,
    /// `null` clears the price
    #[serde(default, deserialize_with = "nullable")]
    pub price: Option<Option<f64>>,
    pub images: Option<Vec<String>>,
    /// Accepted only so that attempts to set it get a field error
    pub status: Option<serde_json::Value>,
}

impl WriteRepresentation<Item> for ItemPayload {
    fn validate(&self, ctx: &WriteContext<'_, Item>) -> FieldErrors {
        let mut v = FieldValidator::new(ctx.mode);
        v.required("category", self.category.as_ref())
            .required("name", self.name.as_ref())
            .text("name", self.name.as_deref(), &[&not_blank(), &max_length(100)])
            .text(
                "serial_number",
                self.serial_number.as_ref().and_then(Option::as_deref),
                &[&max_length(50)],
            )
            .check("price", self.price.flatten(), non_negative());

        if let Some(images) = &self.images {
            if images.iter().any(|image| image.trim().is_empty()) {
                v.add("images", "Image references may not be blank.");
            }
        }

        if self.status.is_some() {
            v.add(
                "status",
                "Item status is managed by the rental lifecycle and cannot be written here.",
            );
        }
        v.finish()
    }

    fn create(self) -> Item {
        Item::new(
            self.category.unwrap_or_default(),
            self.name.unwrap_or_default(),
            self.description.unwrap_or_default(),
            self.serial_number.flatten(),
            self.price.flatten(),
            self.images.unwrap_or_default(),
            ItemStatus::Available,
        )
    }

    fn apply(self, item: &mut Item) {
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(serial_number) = self.serial_number {
            item.serial_number = serial_number;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(images) = self.images {
            item.images = images;
        }
    }
}
