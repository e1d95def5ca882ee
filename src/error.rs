//! Error types for catalog operations.
//!
//! Messages follow the What/Why/Fix layout used across the project: what went
//! wrong, the offending value, and a suggestion for the operator.

use thiserror::Error;

/// Errors that can occur while searching the catalog or resolving call numbers.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// A URL or document contract assumed by this tool no longer holds.
    ///
    /// Not retryable: the integration is stale and needs updating.
    #[error("catalog API contract changed: {reason} (got '{value}')\n  Suggestion: {suggestion}")]
    UnstableApi {
        /// The raw value that failed the contract
        value: String,
        /// Which assumption no longer holds
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// A search response could not be read as an RSS channel of results.
    #[error("malformed search response for {context}: {reason}")]
    MalformedResponse {
        /// Which request produced the response
        context: String,
        /// Why the document was rejected
        reason: String,
    },

    /// A full-record response lacked the structure holding the call number.
    #[error("malformed full record for item {item_id}: {reason}\n  Suggestion: {suggestion}")]
    MalformedDetailResponse {
        /// Item identifier the lookup was issued for
        item_id: u64,
        /// Which part of the structure was missing
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The catalog answered with a non-success HTTP status.
    #[error("catalog returned HTTP {status} for '{url}'")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The request could not be sent or its body could not be read.
    #[error("network error for '{url}': {reason}\n  Suggestion: Check network connectivity and retry")]
    Network {
        /// Requested URL
        url: String,
        /// Underlying transport failure
        reason: String,
    },

    /// A request did not complete within its time budget.
    #[error("{context} timed out after {secs}s\n  Suggestion: Raise --timeout or retry later")]
    Timeout {
        /// Which request timed out
        context: String,
        /// The budget that elapsed
        secs: u64,
    },

    /// More books were handed to a single query than the search endpoint accepts.
    #[error("a catalog query accepts at most {max} books, got {count}")]
    TooManyBooks {
        /// Books supplied
        count: usize,
        /// Endpoint ceiling
        max: usize,
    },

    /// None of a batch's books produced a search clause, so there is nothing to send.
    #[error("no searchable title or ISBN among {count} books in this batch")]
    EmptyQuery {
        /// Books in the batch
        count: usize,
    },

    /// The catalog root URL could not be formed from the configured library.
    #[error("invalid catalog URL '{value}': {reason}\n  Suggestion: Check --biblio (e.g. sfpl, seattle)")]
    InvalidCatalogUrl {
        /// The rejected subdomain or base URL
        value: String,
        /// Why the URL was rejected
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    ClientBuild {
        /// Why construction failed
        reason: String,
    },
}

impl CatalogError {
    /// Creates an `UnstableApi` error for a value that broke a hardcoded assumption.
    #[must_use]
    pub fn unstable_api(value: &str, reason: &str) -> Self {
        Self::UnstableApi {
            value: value.to_string(),
            reason: reason.to_string(),
            suggestion: "The catalog's undocumented API has changed; update bibliophile"
                .to_string(),
        }
    }

    /// Creates a `MalformedResponse` error.
    #[must_use]
    pub fn malformed_response(context: &str, reason: &str) -> Self {
        Self::MalformedResponse {
            context: context.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `MalformedDetailResponse` error.
    #[must_use]
    pub fn malformed_detail(item_id: u64, reason: &str) -> Self {
        Self::MalformedDetailResponse {
            item_id,
            reason: reason.to_string(),
            suggestion: "The full record layout may have changed; check the item page in a browser"
                .to_string(),
        }
    }

    /// Creates a `Network` error.
    #[must_use]
    pub fn network(url: &str, reason: &str) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `InvalidCatalogUrl` error.
    #[must_use]
    pub fn invalid_catalog_url(value: &str, reason: &str) -> Self {
        Self::InvalidCatalogUrl {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `Timeout` error.
    #[must_use]
    pub fn timeout(context: &str, secs: u64) -> Self {
        Self::Timeout {
            context: context.to_string(),
            secs,
        }
    }

    /// Returns true for the stale-integration class that should be reported distinctly.
    #[must_use]
    pub fn is_unstable_api(&self) -> bool {
        matches!(self, Self::UnstableApi { .. })
    }
}
