//! Self-service account registration
//!
//! A [`RegistrationRequest`] is checked with the same profile rules as the
//! user resource, plus the credential rules. Every profile field is
//! mandatory here. The password is hashed off the async runtime before the
//! user is stored.

mod password;

pub use password::{Argon2Hasher, PasswordHasher};

use crate::core::error::{RentalError, RentalResult};
use crate::core::service::{DataService, MarketplaceStore, with_deadline};
use crate::core::validation::validators::{email, not_blank};
use crate::core::validation::{FieldValidator, WriteMode};
use crate::core::FieldErrors;
use crate::entities::User;
use crate::entities::user::{ProfileFields, check_profile, check_username};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl RegistrationRequest {
    fn profile(&self) -> ProfileFields<'_> {
        ProfileFields {
            first_name: self.first_name.as_deref(),
            last_name: self.last_name.as_deref(),
            phone_number: self.phone_number.as_deref(),
            address: self.address.as_deref(),
            city: self.city.as_deref(),
            state: self.state.as_deref(),
            zip_code: self.zip_code.as_deref(),
        }
    }

    fn mandatory(&self) -> [(&'static str, Option<&str>); 11] {
        [
            ("username", self.username.as_deref()),
            ("email", self.email.as_deref()),
            ("password1", self.password1.as_deref()),
            ("password2", self.password2.as_deref()),
            ("first_name", self.first_name.as_deref()),
            ("last_name", self.last_name.as_deref()),
            ("phone_number", self.phone_number.as_deref()),
            ("address", self.address.as_deref()),
            ("city", self.city.as_deref()),
            ("state", self.state.as_deref()),
            ("zip_code", self.zip_code.as_deref()),
        ]
    }

    /// Every problem with the request, keyed by field
    pub fn validate(&self) -> FieldErrors {
        let mut v = FieldValidator::new(WriteMode::Create);

        for (field, value) in self.mandatory() {
            v.required(field, value.as_ref())
                .text(field, value, &[&not_blank()]);
        }

        check_username(&mut v, self.username.as_deref());
        v.text("email", self.email.as_deref(), &[&email()]);
        check_profile(&mut v, &self.profile());

        v.check("password1", self.password1.as_deref(), |password: &str| {
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                Err(format!(
                    "This password is too short. It must contain at least {} characters.",
                    MIN_PASSWORD_LENGTH
                ))
            } else {
                Ok(())
            }
        });

        if let (Some(p1), Some(p2)) = (&self.password1, &self.password2) {
            if p1 != p2 {
                v.add("password2", "The two password fields didn't match.");
            }
        }
        v.finish()
    }
}

/// Creates users from registration requests
#[derive(Clone)]
pub struct Registrar {
    store: Arc<dyn MarketplaceStore>,
    hasher: Arc<dyn PasswordHasher>,
    timeout: Duration,
}

impl Registrar {
    pub fn new(
        store: Arc<dyn MarketplaceStore>,
        hasher: Arc<dyn PasswordHasher>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            timeout,
        }
    }

    /// Validate, hash the password and store a regular (non-admin) user
    pub async fn register(&self, request: RegistrationRequest) -> RentalResult<User> {
        request.validate().into_result()?;

        let password = request.password1.clone().unwrap_or_default();
        let hasher = self.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| RentalError::Internal(format!("password hashing task failed: {}", e)))??;

        let user = User::new(
            request.username.unwrap_or_default(),
            request.email.unwrap_or_default(),
            request.first_name.unwrap_or_default(),
            request.last_name.unwrap_or_default(),
            request.phone_number.unwrap_or_default(),
            request.address.unwrap_or_default(),
            request.city.unwrap_or_default(),
            request.state.unwrap_or_default(),
            request.zip_code.unwrap_or_default(),
            false,
            password_hash,
        );

        let user = with_deadline(
            self.timeout,
            DataService::<User>::create(self.store.as_ref(), user),
        )
        .await?;
        tracing::info!(user = %user.id, username = %user.username, "user registered");
        Ok(user)
    }
}
