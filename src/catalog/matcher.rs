//! Two-phase catalog matching.
//!
//! Phase 1 searches every batch of wanted books concurrently. Phase 2 starts
//! only after phase 1 has fully drained and looks up the full record of every
//! result that came back without a call number.
//!
//! Requests in both phases run through `buffer_unordered`, sized to the whole
//! queue unless a cap is configured, so responses are consumed in completion
//! order. Every future returns its own correlation data
//! (the batch number, or the record it was issued for), which keeps the
//! matcher free of shared mutable state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, instrument};

use crate::diagnostics::Diagnostics;
use crate::error::CatalogError;
use crate::wishlist::WantedBook;

use super::parse::{extract_item_id, parse_call_number, parse_search_response};
use super::query::{QueryBuilder, partition_batches};
use super::{CatalogApi, CatalogRecord};

/// Upper bound accepted for an explicit [`MatchOptions::max_in_flight`] cap.
pub const MAX_IN_FLIGHT_LIMIT: usize = 100;
/// Default per-request time budget.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning for one matching run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOptions {
    /// Branch passed to the `available:` filter; `None` searches every branch.
    pub branch: Option<String>,
    /// ISO 639-2 language code; `None` for any language.
    pub language: Option<String>,
    /// Optional cap on concurrent requests per phase, clamped to
    /// `1..=MAX_IN_FLIGHT_LIMIT`. `None` issues every queued request at once.
    pub max_in_flight: Option<usize>,
    pub request_timeout: Duration,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            branch: None,
            language: None,
            max_in_flight: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// A search batch that produced no records.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    /// 1-based batch number, in wishlist order.
    pub batch: usize,
    pub error: CatalogError,
}

/// Result of phase 1.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Every parsed record, batches in completion order, items in document order.
    pub records: Vec<CatalogRecord>,
    /// Number of batches the wishlist was split into.
    pub batches: usize,
    pub failed_batches: Vec<BatchFailure>,
}

/// A record whose call number could not be looked up.
#[derive(Debug, Clone)]
pub struct FallbackFailure {
    pub title: String,
    pub error: CatalogError,
}

/// Result of phase 2.
#[derive(Debug, Clone, Default)]
pub struct FallbackOutcome {
    /// Same records as the input, in the same order.
    pub records: Vec<CatalogRecord>,
    /// Full record requests issued.
    pub requests: usize,
    pub failures: Vec<FallbackFailure>,
}

/// Everything a matching run produced.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub records: Vec<CatalogRecord>,
    pub searched_batches: usize,
    pub failed_batches: Vec<BatchFailure>,
    pub fallback_requests: usize,
    pub fallback_failures: Vec<FallbackFailure>,
}

impl MatchReport {
    /// Records that ended with a call number.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_complete()).count()
    }

    /// Records that are still missing a call number.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.records.len() - self.resolved_count()
    }

    /// True when any failure means the catalog's undocumented contract changed.
    #[must_use]
    pub fn saw_unstable_api(&self) -> bool {
        self.failed_batches
            .iter()
            .map(|failure| &failure.error)
            .chain(self.fallback_failures.iter().map(|failure| &failure.error))
            .any(CatalogError::is_unstable_api)
    }
}

/// Finds wanted books in the catalog and fills in missing call numbers.
pub struct CatalogMatcher {
    api: Arc<dyn CatalogApi>,
    diagnostics: Arc<dyn Diagnostics>,
    options: MatchOptions,
}

impl CatalogMatcher {
    /// Creates a matcher. An explicit `options.max_in_flight` cap is clamped into range.
    #[must_use]
    pub fn new(
        api: Arc<dyn CatalogApi>,
        diagnostics: Arc<dyn Diagnostics>,
        mut options: MatchOptions,
    ) -> Self {
        options.max_in_flight = options
            .max_in_flight
            .map(|cap| cap.clamp(1, MAX_IN_FLIGHT_LIMIT));
        Self {
            api,
            diagnostics,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Buffer size for a phase with `queued` requests.
    fn in_flight_limit(&self, queued: usize) -> usize {
        self.options.max_in_flight.unwrap_or(queued).max(1)
    }

    /// Runs both phases: search, then call number lookups for incomplete records.
    #[instrument(skip(self, books), fields(books = books.len()))]
    pub async fn run(&self, books: &[WantedBook]) -> MatchReport {
        let search = self.search(books).await;
        let fallback = self.resolve_call_numbers(search.records).await;

        MatchReport {
            records: fallback.records,
            searched_batches: search.batches,
            failed_batches: search.failed_batches,
            fallback_requests: fallback.requests,
            fallback_failures: fallback.failures,
        }
    }

    /// Phase 1: one search per batch of up to ten books, all batches concurrently.
    ///
    /// A batch that fails (transport, status, malformed RSS, timeout) is logged
    /// and recorded in [`SearchOutcome::failed_batches`]; the other batches are
    /// unaffected.
    pub async fn search(&self, books: &[WantedBook]) -> SearchOutcome {
        let branch = self.options.branch.as_deref();
        let language = self.options.language.as_deref();

        let mut failed_batches = Vec::new();
        let mut queries = Vec::new();
        for (index, batch) in partition_batches(books).into_iter().enumerate() {
            match QueryBuilder::build(batch, branch, language) {
                Ok(query) => queries.push((index + 1, query)),
                Err(error) => {
                    self.diagnostics
                        .error(&format!("Skipping search batch {}: {error}", index + 1));
                    failed_batches.push(BatchFailure {
                        batch: index + 1,
                        error,
                    });
                }
            }
        }
        let batches = queries.len() + failed_batches.len();
        debug!(batches, "Issuing catalog searches");

        let request_timeout = self.options.request_timeout;
        let limit = self.in_flight_limit(queries.len());
        let mut responses = stream::iter(queries)
            .map(|(batch, query)| async move {
                let context = format!("search batch {batch}");
                let body = with_timeout(request_timeout, &context, self.api.search(&query)).await;
                (batch, context, body)
            })
            .buffer_unordered(limit);

        let mut records = Vec::new();
        while let Some((batch, context, body)) = responses.next().await {
            let parsed = body.and_then(|body| {
                parse_search_response(&body, &context, self.diagnostics.as_ref())
            });
            match parsed {
                Ok(found) => {
                    debug!(batch, records = found.len(), "Search batch parsed");
                    records.extend(found);
                }
                Err(error) => {
                    self.diagnostics
                        .error(&format!("Skipping {context}: {error}"));
                    failed_batches.push(BatchFailure { batch, error });
                }
            }
        }
        failed_batches.sort_by_key(|failure| failure.batch);

        if records.is_empty()
            && failed_batches.len() < batches
            && let Some(branch) = branch
        {
            self.diagnostics.warn(&format!(
                "No books found at branch \"{branch}\"; check the branch name is spelled exactly as the catalog lists it"
            ));
        }

        SearchOutcome {
            records,
            batches,
            failed_batches,
        }
    }

    /// Phase 2: look up the call number of every incomplete record with a link.
    ///
    /// Complete records pass through untouched. Records without a link, with an
    /// unrecognisable link, or whose lookup fails stay incomplete. The returned
    /// records are in input order regardless of completion order.
    pub async fn resolve_call_numbers(&self, records: Vec<CatalogRecord>) -> FallbackOutcome {
        let total = records.len();
        let mut settled: Vec<(usize, CatalogRecord)> = Vec::with_capacity(total);
        let mut pending = Vec::new();
        let mut failures = Vec::new();

        for (position, record) in records.into_iter().enumerate() {
            if record.is_complete() {
                settled.push((position, record));
                continue;
            }
            let Some(link) = record.full_record_link.as_deref() else {
                self.diagnostics.warn(&format!(
                    "No link given for {}, can't get call #",
                    record.title
                ));
                settled.push((position, record));
                continue;
            };
            match extract_item_id(link) {
                Ok(item_id) => pending.push((position, item_id, record)),
                Err(error) => {
                    self.diagnostics.error(&format!(
                        "Can't get call # for {}: {error}",
                        record.title
                    ));
                    failures.push(FallbackFailure {
                        title: record.title.clone(),
                        error,
                    });
                    settled.push((position, record));
                }
            }
        }

        let requests = pending.len();
        debug!(requests, "Looking up missing call numbers");

        let request_timeout = self.options.request_timeout;
        let limit = self.in_flight_limit(requests);
        let mut lookups = stream::iter(pending)
            .map(|(position, item_id, record)| async move {
                let context = format!("full record {item_id}");
                let call_number =
                    with_timeout(request_timeout, &context, self.api.full_record(item_id))
                        .await
                        .and_then(|body| parse_call_number(&body, item_id));
                (position, record, call_number)
            })
            .buffer_unordered(limit);

        while let Some((position, mut record, call_number)) = lookups.next().await {
            match call_number {
                Ok(call_number) => {
                    record.resolve_call_number(call_number);
                }
                Err(error) => {
                    self.diagnostics.error(&format!(
                        "Can't get call # for {}: {error}",
                        record.title
                    ));
                    failures.push(FallbackFailure {
                        title: record.title.clone(),
                        error,
                    });
                }
            }
            settled.push((position, record));
        }

        settled.sort_by_key(|(position, _)| *position);
        debug_assert_eq!(settled.len(), total);

        FallbackOutcome {
            records: settled.into_iter().map(|(_, record)| record).collect(),
            requests,
            failures,
        }
    }
}

impl std::fmt::Debug for CatalogMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogMatcher")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

async fn with_timeout<F>(limit: Duration, context: &str, request: F) -> Result<String, CatalogError>
where
    F: Future<Output = Result<String, CatalogError>>,
{
    tokio::time::timeout(limit, request)
        .await
        .unwrap_or_else(|_| Err(CatalogError::timeout(context, limit.as_secs())))
}
