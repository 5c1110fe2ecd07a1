//! List response normalization.
//!
//! Depending on its pagination settings the backend answers a list endpoint
//! with either a bare array or a `{ "results": [...], "count": n }` envelope.
//! [`Listing`] accepts both so no caller has to care.

use serde::Deserialize;

/// An ordered list of records, with the backend's total count when it sent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub count: Option<u64>,
}

/// Wire shapes of a list response.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Bare(Vec<T>),
    Page {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
    },
}

impl<T> From<ListPayload<T>> for Listing<T> {
    fn from(payload: ListPayload<T>) -> Self {
        match payload {
            ListPayload::Bare(items) => Self { items, count: None },
            ListPayload::Page { results, count } => Self {
                items: results,
                count,
            },
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Listing<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ListPayload::deserialize(deserializer).map(Into::into)
    }
}

impl<T> Listing<T> {
    /// Number of records in this response.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the response held no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Backend total when given, else the number of records received.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.count.unwrap_or(self.items.len() as u64)
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Take the records, dropping the count.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: None,
        }
    }
}

impl<T> IntoIterator for Listing<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Listing<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
