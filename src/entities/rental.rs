//! Rentals and their status

use crate::core::error::FieldErrors;
use crate::core::field::FieldValue;
use crate::core::validation::{FieldValidator, WriteMode};
use crate::dispatch::representation::{WriteContext, WriteRepresentation};
use crate::impl_data_entity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Where a rental is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    /// Requested, waiting for an administrator
    #[default]
    Awaiting,
    /// Approved and handed over
    NotReturned,
    Returned,
    Rejected,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Awaiting => "awaiting",
            RentalStatus::NotReturned => "not_returned",
            RentalStatus::Returned => "returned",
            RentalStatus::Rejected => "rejected",
        }
    }

    /// Active rentals occupy their item
    pub fn is_active(&self) -> bool {
        matches!(self, RentalStatus::Awaiting | RentalStatus::NotReturned)
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RentalStatus> for FieldValue {
    fn from(status: RentalStatus) -> Self {
        FieldValue::String(status.as_str().to_string())
    }
}

impl_data_entity!(
    /// A user's rental of one item over a date range
    Rental,
    "rental",
    "rentals",
    ["status", "user", "item"],
    owner: user,
    {
        user: Uuid,
        item: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: RentalStatus,
    }
);

impl Rental {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Write representation of a rental
///
/// New rentals are only created through the lifecycle's rental request,
/// which validates this payload in create mode. Updates may move the dates
/// but never the user, the item or the status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RentalPayload {
    pub user: Option<Uuid>,
    pub item: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Accepted only so that attempts to set it get a field error
    pub status: Option<serde_json::Value>,
}

impl WriteRepresentation<Rental> for RentalPayload {
    fn validate(&self, ctx: &WriteContext<'_, Rental>) -> FieldErrors {
        let mut v = FieldValidator::new(ctx.mode);

        if ctx.mode == WriteMode::Create {
            v.required("user", self.user.as_ref())
                .required("item", self.item.as_ref());
        }
        v.required("start_date", self.start_date.as_ref())
            .required("end_date", self.end_date.as_ref());

        if let Some(current) = ctx.current {
            if self.user.is_some_and(|user| user != current.user) {
                v.add("user", "This field cannot be changed once the rental exists.");
            }
            if self.item.is_some_and(|item| item != current.item) {
                v.add("item", "This field cannot be changed once the rental exists.");
            }
        }

        let start = self.start_date.or(ctx.current.map(|r| r.start_date));
        let end = self.end_date.or(ctx.current.map(|r| r.end_date));
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                v.add("end_date", "End date must not be before start date.");
            }
        }

        if self.status.is_some() {
            v.add(
                "status",
                "Rental status is managed by the rental lifecycle and cannot be written here.",
            );
        }
        v.finish()
    }

    fn create(self) -> Rental {
        Rental::new(
            self.user.unwrap_or_default(),
            self.item.unwrap_or_default(),
            self.start_date.unwrap_or_default(),
            self.end_date.unwrap_or_default(),
            RentalStatus::Awaiting,
        )
    }

    fn apply(self, rental: &mut Rental) {
        if let Some(start_date) = self.start_date {
            rental.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            rental.end_date = end_date;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AuthContext;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rental() -> Rental {
        Rental::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            date("2025-06-01"),
            date("2025-06-07"),
            RentalStatus::Awaiting,
        )
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(RentalStatus::NotReturned).unwrap(),
            json!("not_returned")
        );
        assert!(RentalStatus::Awaiting.is_active());
        assert!(RentalStatus::NotReturned.is_active());
        assert!(!RentalStatus::Returned.is_active());
        assert!(!RentalStatus::Rejected.is_active());
    }

    #[test]
    fn test_owner_is_renting_user() {
        let r = rental();
        use crate::core::entity::Data;
        assert_eq!(r.owner_id(), Some(r.user));
    }

    #[test]
    fn test_create_requires_everything() {
        let actor = AuthContext::user(Uuid::new_v4());
        let errors = RentalPayload::default().validate(&WriteContext::create(&actor));
        for field in ["user", "item", "start_date", "end_date"] {
            assert!(errors.contains(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_end_before_start_rejected() {
        let actor = AuthContext::user(Uuid::new_v4());
        let payload = RentalPayload {
            user: Some(Uuid::new_v4()),
            item: Some(Uuid::new_v4()),
            start_date: Some(date("2025-06-07")),
            end_date: Some(date("2025-06-01")),
            status: None,
        };
        let errors = payload.validate(&WriteContext::create(&actor));
        assert!(errors.contains("end_date"));
    }

    #[test]
    fn test_partial_dates_checked_against_current() {
        let actor = AuthContext::admin(Uuid::new_v4());
        let current = rental();
        let payload = RentalPayload {
            end_date: Some(date("2025-05-01")),
            ..Default::default()
        };
        let errors = payload.validate(&WriteContext::update(WriteMode::Partial, &current, &actor));
        assert!(errors.contains("end_date"));
    }

    #[test]
    fn test_user_and_item_are_fixed() {
        let actor = AuthContext::admin(Uuid::new_v4());
        let current = rental();
        let payload = RentalPayload {
            user: Some(Uuid::new_v4()),
            item: Some(current.item),
            ..Default::default()
        };
        let errors = payload.validate(&WriteContext::update(WriteMode::Partial, &current, &actor));
        assert!(errors.contains("user"));
        assert!(!errors.contains("item"));
    }

    #[test]
    fn test_create_is_awaiting() {
        let r = RentalPayload {
            user: Some(Uuid::new_v4()),
            item: Some(Uuid::new_v4()),
            start_date: Some(date("2025-06-01")),
            end_date: Some(date("2025-06-01")),
            status: None,
        }
        .create();
        assert_eq!(r.status, RentalStatus::Awaiting);
    }
}
