//! Query parameters, search and pagination utilities
//!
//! Every listing request builds its own view over the stored entities:
//! search first, then ordering, then the limit/offset window. Nothing here
//! holds state between requests.

use crate::core::entity::Data;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Query parameters accepted by list endpoints
///
/// # Example
/// ```text
/// GET /items?q=drill
/// GET /items?limit=10&offset=20
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// Free-text search term
    pub q: Option<String>,

    /// Page size; clamped to the paginator's maximum
    #[serde(deserialize_with = "lenient_number")]
    pub limit: Option<usize>,

    /// Number of records to skip
    #[serde(deserialize_with = "lenient_number")]
    pub offset: Option<usize>,
}

/// Unparseable numbers read as absent, so the paginator's default applies
fn lenient_number<'de, D, N>(deserializer: D) -> Result<Option<N>, D::Error>
where
    D: Deserializer<'de>,
    N: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

impl ListParams {
    /// The trimmed search term, if a non-empty one was supplied
    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Limit/offset pagination with a server-side maximum page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOffsetPagination {
    /// Page size used when the request does not supply `limit`
    pub default_limit: usize,

    /// Upper bound on `limit`
    pub max_limit: usize,
}

impl Default for LimitOffsetPagination {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl LimitOffsetPagination {
    pub fn new(default_limit: usize, max_limit: usize) -> Self {
        Self {
            default_limit,
            max_limit,
        }
    }

    /// Effective page size; zero falls back to the default
    pub fn limit(&self, params: &ListParams) -> usize {
        params
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }

    pub fn offset(&self, params: &ListParams) -> usize {
        params.offset.unwrap_or(0)
    }

    /// Cut the requested window out of an already filtered and ordered list
    pub fn paginate<T>(&self, items: Vec<T>, params: &ListParams) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset(params))
            .take(self.limit(params))
            .collect()
    }
}

/// OR of case-insensitive substring matches over a set of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    fields: Vec<&'static str>,
}

impl SearchFilter {
    pub fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }

    /// Search over the entity's indexed fields
    pub fn indexed<T: Data>() -> Self {
        Self::new(T::indexed_fields())
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn matches<T: Data>(&self, entity: &T, term: &str) -> bool {
        self.fields.iter().any(|field| {
            entity
                .field_value(field)
                .is_some_and(|value| value.contains_ignore_case(term))
        })
    }

    /// Keep only matching entities; a blank term keeps everything
    pub fn apply<T: Data>(&self, entities: Vec<T>, term: Option<&str>) -> Vec<T> {
        match term {
            Some(term) => entities
                .into_iter()
                .filter(|e| self.matches(e, term))
                .collect(),
            None => entities,
        }
    }
}

/// Comparator used to order listings
pub type Comparator<T> = fn(&T, &T) -> Ordering;

/// Oldest first, ties broken by id so listings are stable
pub fn by_creation<T: Data>(a: &T, b: &T) -> Ordering {
    a.created_at()
        .cmp(&b.created_at())
        .then_with(|| a.id().cmp(&b.id()))
}

/// Most recently updated first
pub fn by_latest_update<T: Data>(a: &T, b: &T) -> Ordering {
    b.updated_at()
        .cmp(&a.updated_at())
        .then_with(|| a.id().cmp(&b.id()))
}
