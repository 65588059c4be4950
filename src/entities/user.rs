//! User accounts

use crate::core::auth::AuthContext;
use crate::core::error::FieldErrors;
use crate::core::field::FieldFormat;
use crate::core::validation::validators::{email, format, max_length, not_blank};
use crate::core::validation::FieldValidator;
use crate::dispatch::representation::{WriteContext, WriteRepresentation};
use crate::impl_data_entity;
use serde::Deserialize;

impl_data_entity!(
    /// A registered account
    ///
    /// Users own their own record, so the owner-based policies let a user
    /// read and edit their profile.
    User,
    "user",
    "users",
    ["username", "email", "first_name", "last_name"],
    owner: id,
    {
        username: String,
        email: String,
        first_name: String,
        last_name: String,
        phone_number: String,
        address: String,
        city: String,
        state: String,
        zip_code: String,
        is_admin: bool,
        /// Never serialised
        #[serde(skip_serializing, default)]
        password_hash: String,
    }
);

/// Borrowed view of the profile fields shared by registration and updates
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileFields<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub zip_code: Option<&'a str>,
}

/// Format and length rules for profile fields
pub fn check_profile(v: &mut FieldValidator, profile: &ProfileFields<'_>) {
    v.text(
        "first_name",
        profile.first_name,
        &[
            &max_length(50),
            &format(FieldFormat::PersonName, "Invalid first name"),
        ],
    )
    .text(
        "last_name",
        profile.last_name,
        &[
            &max_length(50),
            &format(FieldFormat::PersonName, "Invalid last name"),
        ],
    )
    .text(
        "phone_number",
        profile.phone_number,
        &[
            &max_length(10),
            &format(FieldFormat::Phone, "Phone number must be numeric"),
        ],
    )
    .text(
        "address",
        profile.address,
        &[
            &max_length(100),
            &format(FieldFormat::Address, "Invalid address"),
        ],
    )
    .text(
        "city",
        profile.city,
        &[&max_length(50), &format(FieldFormat::Address, "Invalid city")],
    )
    .text(
        "state",
        profile.state,
        &[&max_length(50), &format(FieldFormat::Address, "Invalid state")],
    )
    .text(
        "zip_code",
        profile.zip_code,
        &[
            &max_length(10),
            &format(FieldFormat::ZipCode, "Invalid zip code"),
        ],
    );
}

/// Rules for the login name
pub fn check_username(v: &mut FieldValidator, username: Option<&str>) {
    v.text("username", username, &[&not_blank(), &max_length(150)]);
}

/// Administrative write representation of a user
///
/// Passwords are not writable here; they are set through registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserPayload {
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
}

impl WriteRepresentation<User> for UserPayload {
    fn validate(&self, ctx: &WriteContext<'_, User>) -> FieldErrors {
        let mut v = FieldValidator::new(ctx.mode);
        v.required("username", self.username.as_ref())
            .required("email", self.email.as_ref());
        check_username(&mut v, self.username.as_deref());
        v.text("email", self.email.as_deref(), &[&email()]);
        check_profile(&mut v, &self.profile());

        if self.is_admin.is_some() && !matches!(ctx.actor, AuthContext::Admin { .. }) {
            v.add("is_admin", "Only administrators may change this field.");
        }
        v.finish()
    }

    fn create(self) -> User {
        User::new(
            self.username.unwrap_or_default(),
            self.email.unwrap_or_default(),
            self.first_name.unwrap_or_default(),
            self.last_name.unwrap_or_default(),
            self.phone_number.unwrap_or_default(),
            self.address.unwrap_or_default(),
            self.city.unwrap_or_default(),
            self.state.unwrap_or_default(),
            self.zip_code.unwrap_or_default(),
            self.is_admin.unwrap_or(false),
            String::new(),
        )
    }

    fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(phone_number) = self.phone_number {
            user.phone_number = phone_number;
        }
        if let Some(address) = self.address {
            user.address = address;
        }
        if let Some(city) = self.city {
            user.city = city;
        }
        if let Some(state) = self.state {
            user.state = state;
        }
        if let Some(zip_code) = self.zip_code {
            user.zip_code = zip_code;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
    }
}
