//! Books the reader wants to read, and where they come from.
//!
//! - [`WantedBook`] - One wishlist entry
//! - [`WishlistSource`] - Anything that can produce the wishlist
//! - [`StaticWishlist`] - An in-memory list
//! - [`ShelfExport`] - A Goodreads "Export Library" CSV filtered by shelf

mod export;

pub use export::{NO_PHOTO_COVER, ShelfExport};

use thiserror::Error;

/// A title on the reader's wishlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WantedBook {
    /// Plain ISBN. Missing for some entries, e.g. e-books.
    pub isbn: Option<String>,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Cover URL; a "nophoto" placeholder when no cover exists.
    pub cover_image: String,
}

impl WantedBook {
    /// Creates a wanted book with no description and the placeholder cover.
    #[must_use]
    pub fn new(isbn: Option<&str>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            isbn: isbn.map(str::to_string),
            title: title.into(),
            author: author.into(),
            description: String::new(),
            cover_image: NO_PHOTO_COVER.to_string(),
        }
    }
}

/// Errors raised while reading the wishlist.
#[derive(Debug, Error)]
pub enum WishlistError {
    /// The export file could not be opened or read
    #[error("cannot read shelf export '{path}': {source}\n  Suggestion: Check the path passed as EXPORT")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be decoded as CSV
    #[error("invalid shelf export: {0}")]
    Csv(#[from] csv::Error),

    /// A column this reader depends on is absent from the header
    #[error("shelf export is missing the '{column}' column\n  Suggestion: Use the CSV produced by Goodreads' \"Export Library\"")]
    MissingColumn { column: String },
}

/// Produces the reader's wishlist.
pub trait WishlistSource {
    /// Returns every wanted book, in source order. An empty shelf is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError`] when the underlying source cannot be read.
    fn wanted_books(&self) -> Result<Vec<WantedBook>, WishlistError>;
}

/// A wishlist held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticWishlist {
    books: Vec<WantedBook>,
}

impl StaticWishlist {
    #[must_use]
    pub fn new(books: Vec<WantedBook>) -> Self {
        Self { books }
    }
}

impl WishlistSource for StaticWishlist {
    fn wanted_books(&self) -> Result<Vec<WantedBook>, WishlistError> {
        Ok(self.books.clone())
    }
}
