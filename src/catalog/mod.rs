//! BiblioCommons catalog integration.
//!
//! # Components
//!
//! - [`QueryBuilder`] - Turns a batch of wanted books into a `custom_query`
//! - [`CatalogApi`] - Transport seam for the two catalog endpoints
//! - [`BiblioCommonsApi`] - HTTP implementation of [`CatalogApi`]
//! - [`CatalogMatcher`] - Two-phase search with the per-item call number fallback
//!
//! Search results come back as RSS; a record missing its call number is
//! completed from the item's full record page.

mod api;
mod http_client;
mod matcher;
mod parse;
mod query;
pub(crate) mod utils;

use async_trait::async_trait;

use crate::error::CatalogError;

pub use api::BiblioCommonsApi;
pub use http_client::{HttpTimeouts, build_catalog_http_client};
pub use matcher::{
    BatchFailure, CatalogMatcher, FallbackFailure, FallbackOutcome, MAX_IN_FLIGHT_LIMIT,
    MatchOptions, MatchReport, SearchOutcome,
};
pub use parse::{
    CALL_NUMBER_TEST_ID, ITEM_PATH_PREFIX, extract_item_id, parse_call_number,
    parse_search_response, record_from_item,
};
pub use query::{BATCH_SIZE, CatalogQuery, QueryBuilder, partition_batches};

/// A catalog match for a wanted book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub title: String,
    pub author: Option<String>,
    /// Empty when the result carries no description.
    pub description: String,
    /// Shelf location. `None` until resolved.
    pub call_number: Option<String>,
    pub cover_image: Option<String>,
    /// Absolute link to the item's full record page.
    pub full_record_link: Option<String>,
}

impl CatalogRecord {
    /// A record with only a title, everything else absent.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            description: String::new(),
            call_number: None,
            cover_image: None,
            full_record_link: None,
        }
    }

    /// Sets the call number found by a later lookup. A record that already has
    /// one keeps it; returns whether the value was taken.
    pub fn resolve_call_number(&mut self, call_number: String) -> bool {
        if self.call_number.is_some() {
            return false;
        }
        self.call_number = Some(call_number);
        true
    }

    /// True once the record carries a call number.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.call_number.is_some()
    }
}

/// The two catalog endpoints this tool depends on.
///
/// Implementations return raw bodies; parsing stays in [`parse`] so fakes
/// can serve canned documents.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Runs one RSS search and returns the response body.
    async fn search(&self, query: &CatalogQuery) -> Result<String, CatalogError>;

    /// Fetches the full record for `item_id` and returns the response body.
    async fn full_record(&self, item_id: u64) -> Result<String, CatalogError>;
}
