//! Reusable field validators
//!
//! Each validator is a closure checking one string value and returning the
//! message to attach to the field on failure.

use crate::core::field::FieldFormat;
use validator::ValidateEmail;

/// Borrowed validator, as accepted by [`FieldValidator::text`](super::FieldValidator::text)
pub type Rule<'a> = &'a dyn Fn(&str) -> Result<(), String>;

/// Validator: string must contain something other than whitespace
pub fn not_blank() -> impl Fn(&str) -> Result<(), String> + Send + Sync + Clone {
    |value: &str| {
        if value.trim().is_empty() {
            Err("This field may not be blank.".to_string())
        } else {
            Ok(())
        }
    }
}

/// Validator: string must not exceed `max` characters
pub fn max_length(max: usize) -> impl Fn(&str) -> Result<(), String> + Send + Sync + Clone {
    move |value: &str| {
        if value.chars().count() > max {
            Err(format!(
                "Ensure this field has no more than {} characters.",
                max
            ))
        } else {
            Ok(())
        }
    }
}

/// Validator: string must match a field format
pub fn format(
    format: FieldFormat,
    message: &'static str,
) -> impl Fn(&str) -> Result<(), String> + Send + Sync + Clone {
    move |value: &str| {
        if format.matches(value) {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }
}

/// Validator: well-formed e-mail address
pub fn email() -> impl Fn(&str) -> Result<(), String> + Send + Sync + Clone {
    |value: &str| {
        if value.validate_email() {
            Ok(())
        } else {
            Err("Enter a valid email address.".to_string())
        }
    }
}

/// Validator: number must not be negative
pub fn non_negative() -> impl Fn(f64) -> Result<(), String> + Send + Sync + Clone {
    |value: f64| {
        if value < 0.0 || value.is_nan() {
            Err("Ensure this value is greater than or equal to 0.".to_string())
        } else {
            Ok(())
        }
    }
}
