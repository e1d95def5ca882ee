//! Bibliophile Core Library
//!
//! Reconciles a reading wishlist against a BiblioCommons library catalog and
//! reports which wanted titles the library holds and under which call number.
//!
//! # Architecture
//!
//! - [`wishlist`] - Wanted books and where they come from
//! - [`catalog`] - Query building, response parsing, and the two-phase matcher
//! - [`cover`] - Thumbnail to large cover image rewriting
//! - [`diagnostics`] - Injected leveled message sink
//! - [`report`] - Match lines, CSV export, and run summary
//! - [`config`] - Configuration file defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod cover;
pub mod diagnostics;
pub mod error;
pub mod report;
pub mod wishlist;
mod user_agent;

// Re-export commonly used types
pub use catalog::{
    BiblioCommonsApi, CatalogApi, CatalogMatcher, CatalogQuery, CatalogRecord, HttpTimeouts,
    MatchOptions, MatchReport, QueryBuilder,
};
pub use diagnostics::{CapturedDiagnostics, Diagnostics, TracingDiagnostics};
pub use error::CatalogError;
pub use wishlist::{ShelfExport, StaticWishlist, WantedBook, WishlistError, WishlistSource};
