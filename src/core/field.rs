//! Field value types and format patterns

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// A polymorphic field value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a UUID if possible
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            FieldValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Textual form used by search filters
    pub fn search_text(&self) -> String {
        match self {
            FieldValue::String(s) => s.clone(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Uuid(u) => u.to_string(),
            FieldValue::Date(d) => d.to_string(),
            FieldValue::DateTime(dt) => dt.to_rfc3339(),
            FieldValue::Null => String::new(),
        }
    }

    /// Case-insensitive substring match against the textual form
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.search_text()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value)
    }
}

/// Lists are flattened into one comma-separated string
impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::String(value.join(", "))
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Field formats recognised by the account and catalogue validators
#[derive(Debug, Clone)]
pub enum FieldFormat {
    /// Letters (including Polish diacritics), whitespace and commas
    PersonName,
    /// Letters, digits, whitespace and commas
    Address,
    Phone,
    /// Polish postal code, `NN-NNN`
    ZipCode,
    Custom(Regex),
}

impl FieldFormat {
    /// Check a raw string against this format
    pub fn matches(&self, value: &str) -> bool {
        match self {
            FieldFormat::PersonName => Self::person_name_regex().is_match(value),
            FieldFormat::Address => Self::address_regex().is_match(value),
            FieldFormat::Phone => Self::phone_regex().is_match(value),
            FieldFormat::ZipCode => Self::zip_code_regex().is_match(value),
            FieldFormat::Custom(regex) => regex.is_match(value),
        }
    }

    fn person_name_regex() -> &'static Regex {
        static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
        NAME_REGEX.get_or_init(|| Regex::new(r"^[a-ząćęłńóśźżA-ZĄĘŁŃÓŚŹŻ\s,]*$").unwrap())
    }

    fn address_regex() -> &'static Regex {
        static ADDRESS_REGEX: OnceLock<Regex> = OnceLock::new();
        ADDRESS_REGEX.get_or_init(|| Regex::new(r"^[a-ząćęłńóśźżA-ZĄĘŁŃÓŚŹŻ0-9\s,]*$").unwrap())
    }

    fn phone_regex() -> &'static Regex {
        static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
        PHONE_REGEX.get_or_init(|| {
            Regex::new(r"^[+]*[(]{0,1}[0-9]{1,4}[)]{0,1}[-\s\./0-9]*$").unwrap()
        })
    }

    fn zip_code_regex() -> &'static Regex {
        static ZIP_REGEX: OnceLock<Regex> = OnceLock::new();
        ZIP_REGEX.get_or_init(|| Regex::new(r"^[0-9]{2}-[0-9]{3}$").unwrap())
    }
}
