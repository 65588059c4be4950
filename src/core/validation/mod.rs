//! Validation and filtering system
//!
//! Write payloads are filtered (see [`filters`]), deserialised by the
//! [`Payload`] extractor and then checked field by field with a
//! [`FieldValidator`], which collects every failure instead of stopping
//! at the first one.

pub mod extractor;
pub mod filters;
pub mod validators;

pub use extractor::{Params, Payload, nullable, parse_payload};
pub use validators::Rule;

use crate::core::error::FieldErrors;

/// Kind of write being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    /// Full update: every required field must be present
    Replace,
    /// Partial update: only supplied fields are checked
    Partial,
}

impl WriteMode {
    pub fn requires_all(&self) -> bool {
        !matches!(self, WriteMode::Partial)
    }
}

/// Accumulates field errors for one payload
#[derive(Debug)]
pub struct FieldValidator {
    mode: WriteMode,
    errors: FieldErrors,
}

impl FieldValidator {
    pub fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            errors: FieldErrors::new(),
        }
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Flag a missing field when the mode needs every required field
    pub fn required<V>(&mut self, field: &str, value: Option<&V>) -> &mut Self {
        if value.is_none() && self.mode.requires_all() {
            self.errors.add(field, "This field is required.");
        }
        self
    }

    /// Run string rules against a supplied value
    pub fn text(&mut self, field: &str, value: Option<&str>, rules: &[Rule<'_>]) -> &mut Self {
        if let Some(value) = value {
            for rule in rules {
                if let Err(message) = rule(value) {
                    self.errors.add(field, message);
                }
            }
        }
        self
    }

    /// Run a single check against any supplied value
    pub fn check<V>(
        &mut self,
        field: &str,
        value: Option<V>,
        rule: impl Fn(V) -> Result<(), String>,
    ) -> &mut Self {
        if let Some(value) = value {
            if let Err(message) = rule(value) {
                self.errors.add(field, message);
            }
        }
        self
    }

    /// Record a field error directly
    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.add(field, message);
        self
    }

    pub fn finish(self) -> FieldErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::validators::{max_length, not_blank};
    use super::*;

    #[test]
    fn test_required_depends_on_mode() {
        let missing: Option<&String> = None;

        let mut create = FieldValidator::new(WriteMode::Create);
        create.required("name", missing);
        assert!(create.finish().contains("name"));

        let mut partial = FieldValidator::new(WriteMode::Partial);
        partial.required("name", missing);
        assert!(partial.finish().is_empty());
    }

    #[test]
    fn test_text_collects_every_failure() {
        let mut v = FieldValidator::new(WriteMode::Create);
        v.text("name", Some("   "), &[&not_blank(), &max_length(2)]);
        let errors = v.finish();
        assert_eq!(errors.get("name").map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_check_skips_absent_values() {
        let mut v = FieldValidator::new(WriteMode::Replace);
        v.check("price", None::<f64>, |_| Err("never".into()));
        v.check("price", Some(-1.0), |p: f64| {
            if p < 0.0 { Err("negative".into()) } else { Ok(()) }
        });
        assert_eq!(v.finish().get("price"), Some(&["negative".to_string()][..]));
    }
}
