use serde::Serialize;

use super::AppInfo;
use crate::api::{ClientError, ParseError};

/// A failure confined to one item of a collection.
#[derive(Debug, Serialize)]
#[serde(bound(serialize = "E: std::fmt::Display"))]
pub struct ItemError<E = ParseError> {
    /// Position of the item in the upstream collection.
    pub index: usize,
    /// Record identifier, when it could be read.
    pub id: Option<String>,
    #[serde(serialize_with = "serialize_display")]
    pub error: E,
}

impl<E> ItemError<E> {
    pub fn new(index: usize, id: Option<String>, error: E) -> Self {
        Self { index, id, error }
    }

    pub fn map<F>(self, f: impl FnOnce(E) -> F) -> ItemError<F> {
        ItemError {
            index: self.index,
            id: self.id,
            error: f(self.error),
        }
    }
}

fn serialize_display<E: std::fmt::Display, S: serde::Serializer>(
    error: &E,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// The records that parsed, alongside the ones that did not.
#[derive(Debug, Serialize)]
#[serde(bound(serialize = "T: Serialize, E: std::fmt::Display"))]
pub struct Partial<T, E = ParseError> {
    pub records: Vec<T>,
    pub errors: Vec<ItemError<E>>,
}

impl<T, E> Default for Partial<T, E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T, E> Partial<T, E> {
    pub fn push(&mut self, index: usize, result: Result<T, (Option<String>, E)>) {
        match result {
            Ok(record) => self.records.push(record),
            Err((id, error)) => self.errors.push(ItemError::new(index, id, error)),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One page of apps discovered in a subcategory.
#[derive(Debug, Serialize)]
pub struct AppPage {
    pub apps: Vec<AppInfo>,
    pub errors: Vec<ItemError<ClientError>>,
    /// Listing pages that failed to load or parse; their apps are missing
    /// from `apps`. `index` is the position among the listing's pages.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub page_errors: Vec<ItemError<ClientError>>,
    /// Store-relative URL of the following page; `None` when exhausted.
    pub next_page_url: Option<String>,
    /// Category id the apps were discovered under.
    pub category: Option<String>,
}

impl AppPage {
    pub fn from_partial(
        partial: Partial<AppInfo>,
        next_page_url: Option<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            apps: partial.records,
            errors: partial
                .errors
                .into_iter()
                .map(|e| e.map(ClientError::from))
                .collect(),
            page_errors: Vec::new(),
            next_page_url,
            category,
        }
    }

    /// True when neither an app nor a listing page failed.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.page_errors.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.next_page_url.is_some()
    }
}
