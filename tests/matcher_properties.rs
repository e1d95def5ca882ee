//! Behavioural properties of the two-phase matcher, driven through a scripted catalog.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bibliophile_core::catalog::{CatalogApi, CatalogQuery, CatalogRecord, MatchOptions};
use bibliophile_core::{CapturedDiagnostics, CatalogError, CatalogMatcher};
use tracing::Level;

mod support;
use support::fixtures::{ResultItem, full_record_response, rss_response, wanted_books};

/// Tracks how many requests are running and the most seen at once.
#[derive(Default)]
struct InFlightGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightGauge {
    fn enter(&self) -> InFlightGuard<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(&self.current)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Decrements on drop, so requests cancelled by a timeout still leave.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted catalog: the first batch answers slowly, the second quickly, and
/// full records answer in the reverse order they were requested.
struct ScriptedCatalog {
    searches_started: AtomicUsize,
    searches_finished: AtomicUsize,
    searches_finished_at_first_lookup: Mutex<Option<usize>>,
    queries: Mutex<Vec<String>>,
    full_record_requests: Mutex<Vec<u64>>,
    searches_in_flight: InFlightGauge,
    lookups_in_flight: InFlightGauge,
}

impl ScriptedCatalog {
    fn new() -> Self {
        Self {
            searches_started: AtomicUsize::new(0),
            searches_finished: AtomicUsize::new(0),
            searches_finished_at_first_lookup: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
            full_record_requests: Mutex::new(Vec::new()),
            searches_in_flight: InFlightGauge::default(),
            lookups_in_flight: InFlightGauge::default(),
        }
    }

    fn requested_ids(&self) -> Vec<u64> {
        let mut ids = self.full_record_requests.lock().unwrap().clone();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl CatalogApi for ScriptedCatalog {
    async fn search(&self, query: &CatalogQuery) -> Result<String, CatalogError> {
        let _guard = self.searches_in_flight.enter();
        self.searches_started.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.as_str().to_string());
        let first_batch = query.as_str().contains("9780000000000");
        let body = if first_batch {
            tokio::time::sleep(Duration::from_millis(80)).await;
            rss_response(&[
                ResultItem::new("Book 0").call_number("FIC ZERO"),
                ResultItem::new("Book 1").link("https://sfpl.bibliocommons.com/item/show/101_book_1"),
                ResultItem::new("Book 2"),
                ResultItem::new("Book 3").link("/item/show/103_book_3"),
            ])
        } else {
            tokio::time::sleep(Duration::from_millis(10)).await;
            rss_response(&[
                ResultItem::new("Book 10").link("/item/show/110_book_10"),
                ResultItem::new("Book 11").call_number("FIC ELEVEN"),
            ])
        };
        self.searches_finished.fetch_add(1, Ordering::SeqCst);
        Ok(body)
    }

    async fn full_record(&self, item_id: u64) -> Result<String, CatalogError> {
        let _guard = self.lookups_in_flight.enter();
        {
            let mut first = self.searches_finished_at_first_lookup.lock().unwrap();
            if first.is_none() {
                *first = Some(self.searches_finished.load(Ordering::SeqCst));
            }
        }
        self.full_record_requests.lock().unwrap().push(item_id);
        // Earlier ids answer later so completion order differs from issue order.
        let delay = match item_id {
            101 => 90,
            103 => 45,
            _ => 15,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(full_record_response(&format!("CN-{item_id}")))
    }
}

fn matcher(catalog: Arc<ScriptedCatalog>, diagnostics: Arc<CapturedDiagnostics>) -> CatalogMatcher {
    CatalogMatcher::new(
        catalog,
        diagnostics,
        MatchOptions {
            branch: Some("*MAIN".to_string()),
            language: Some("eng".to_string()),
            ..MatchOptions::default()
        },
    )
}

#[tokio::test]
async fn test_twelve_books_two_batches_end_to_end() {
    let catalog = Arc::new(ScriptedCatalog::new());
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    let report = matcher(catalog.clone(), diagnostics.clone())
        .run(&wanted_books(12))
        .await;

    assert_eq!(catalog.searches_started.load(Ordering::SeqCst), 2);
    assert_eq!(report.searched_batches, 2);
    assert!(report.failed_batches.is_empty());

    // Phase-1 record count is preserved through phase 2.
    assert_eq!(report.records.len(), 6);

    // Complete records bypass phase 2; the link-less record issues nothing.
    assert_eq!(catalog.requested_ids(), vec![101, 103, 110]);
    assert_eq!(report.fallback_requests, 3);
    assert!(report.fallback_failures.is_empty());
}

#[tokio::test]
async fn test_both_batches_carry_branch_and_language_filters() {
    let catalog = Arc::new(ScriptedCatalog::new());
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    matcher(catalog.clone(), diagnostics).run(&wanted_books(12)).await;

    let queries = catalog.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 2);
    for query in &queries {
        assert!(query.contains(" available:\"*MAIN\""), "missing branch filter: {query}");
        assert!(query.ends_with(" language:eng"), "missing language filter: {query}");
    }
    assert_eq!(
        queries
            .iter()
            .filter(|query| query.contains("identifier:(9780000000011)"))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_search_batches_are_in_flight_together() {
    let catalog = Arc::new(ScriptedCatalog::new());
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    matcher(catalog.clone(), diagnostics).run(&wanted_books(12)).await;

    assert!(
        catalog.searches_in_flight.peak() >= 2,
        "searches ran one at a time (peak {})",
        catalog.searches_in_flight.peak()
    );
}

#[tokio::test]
async fn test_every_lookup_is_in_flight_at_once_by_default() {
    let catalog = Arc::new(ScriptedCatalog::new());
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    let report = matcher(catalog.clone(), diagnostics).run(&wanted_books(12)).await;

    assert_eq!(catalog.lookups_in_flight.peak(), report.fallback_requests);
    assert_eq!(report.fallback_requests, 3);
}

#[tokio::test]
async fn test_out_of_order_responses_attach_to_their_own_records() {
    let catalog = Arc::new(ScriptedCatalog::new());
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    let report = matcher(catalog, diagnostics).run(&wanted_books(12)).await;

    let by_title: HashMap<&str, Option<&str>> = report
        .records
        .iter()
        .map(|record| (record.title.as_str(), record.call_number.as_deref()))
        .collect();

    assert_eq!(by_title["Book 0"], Some("FIC ZERO"));
    assert_eq!(by_title["Book 1"], Some("CN-101"));
    assert_eq!(by_title["Book 2"], None);
    assert_eq!(by_title["Book 3"], Some("CN-103"));
    assert_eq!(by_title["Book 10"], Some("CN-110"));
    assert_eq!(by_title["Book 11"], Some("FIC ELEVEN"));
    assert_eq!(report.resolved_count(), 5);
    assert_eq!(report.unresolved_count(), 1);
}

#[tokio::test]
async fn test_phase_two_starts_after_every_search_finished() {
    let catalog = Arc::new(ScriptedCatalog::new());
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    matcher(catalog.clone(), diagnostics).run(&wanted_books(12)).await;

    assert_eq!(
        *catalog.searches_finished_at_first_lookup.lock().unwrap(),
        Some(2)
    );
}

#[tokio::test]
async fn test_linkless_record_warns_once_by_title() {
    let catalog = Arc::new(ScriptedCatalog::new());
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    matcher(catalog, diagnostics.clone()).run(&wanted_books(12)).await;

    assert_eq!(
        diagnostics.at_level(Level::WARN),
        vec!["No link given for Book 2, can't get call #".to_string()]
    );
}

#[tokio::test]
async fn test_single_request_in_flight_still_completes() {
    let catalog = Arc::new(ScriptedCatalog::new());
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    let matcher = CatalogMatcher::new(
        catalog.clone(),
        diagnostics,
        MatchOptions {
            max_in_flight: Some(1),
            ..MatchOptions::default()
        },
    );
    let report = matcher.run(&wanted_books(12)).await;
    assert_eq!(report.records.len(), 6);
    assert_eq!(report.resolved_count(), 5);
    assert_eq!(catalog.searches_in_flight.peak(), 1);
    assert_eq!(catalog.lookups_in_flight.peak(), 1);
}

/// One full record never answers in time; the rest answer promptly.
struct StalledLookupCatalog {
    lookups_in_flight: InFlightGauge,
}

#[async_trait]
impl CatalogApi for StalledLookupCatalog {
    async fn search(&self, _query: &CatalogQuery) -> Result<String, CatalogError> {
        Ok(rss_response(&[]))
    }

    async fn full_record(&self, item_id: u64) -> Result<String, CatalogError> {
        let _guard = self.lookups_in_flight.enter();
        let delay = if item_id == 2 { 5_000 } else { 20 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(full_record_response(&format!("CN-{item_id}")))
    }
}

#[tokio::test]
async fn test_stalled_lookup_times_out_alone() {
    let catalog = Arc::new(StalledLookupCatalog {
        lookups_in_flight: InFlightGauge::default(),
    });
    let diagnostics = Arc::new(CapturedDiagnostics::new());
    let matcher = CatalogMatcher::new(
        catalog.clone(),
        diagnostics.clone(),
        MatchOptions {
            request_timeout: Duration::from_millis(300),
            ..MatchOptions::default()
        },
    );
    let records: Vec<CatalogRecord> = (1..=4)
        .map(|id| CatalogRecord {
            full_record_link: Some(format!("/item/show/{id}_book_{id}")),
            ..CatalogRecord::titled(format!("Book {id}"))
        })
        .collect();

    let started = Instant::now();
    let outcome = matcher.resolve_call_numbers(records).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(catalog.lookups_in_flight.peak(), 4);
    let call_numbers: Vec<Option<&str>> = outcome
        .records
        .iter()
        .map(|record| record.call_number.as_deref())
        .collect();
    assert_eq!(
        call_numbers,
        vec![Some("CN-1"), None, Some("CN-3"), Some("CN-4")]
    );
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].title, "Book 2");
    assert!(matches!(outcome.failures[0].error, CatalogError::Timeout { .. }));
    assert_eq!(diagnostics.at_level(Level::ERROR).len(), 1);
}
