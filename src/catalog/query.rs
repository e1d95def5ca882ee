//! Catalog search queries built from batches of wanted books.

use crate::error::CatalogError;
use crate::wishlist::WantedBook;

/// The search endpoint silently ignores identifiers past the tenth.
pub const BATCH_SIZE: usize = 10;

/// Splits the wishlist into ordered batches of at most [`BATCH_SIZE`] books.
#[must_use]
pub fn partition_batches(books: &[WantedBook]) -> Vec<&[WantedBook]> {
    books.chunks(BATCH_SIZE).collect()
}

/// A `custom_query` value for the RSS search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    text: String,
    book_count: usize,
}

impl CatalogQuery {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of wanted books this query looks for.
    #[must_use]
    pub fn book_count(&self) -> usize {
        self.book_count
    }
}

impl std::fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Builds BiblioCommons `custom_query` strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    /// Builds one query matching any of `books`, optionally restricted to a
    /// branch and an ISO 639-2 language code. Filters are passed through verbatim.
    ///
    /// Books with an ISBN match on `identifier`; the rest fall back to title
    /// and contributor.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TooManyBooks`] for more than [`BATCH_SIZE`] books,
    /// or [`CatalogError::EmptyQuery`] when no book has an ISBN or a usable title.
    pub fn build(
        books: &[WantedBook],
        branch: Option<&str>,
        language: Option<&str>,
    ) -> Result<CatalogQuery, CatalogError> {
        if books.len() > BATCH_SIZE {
            return Err(CatalogError::TooManyBooks {
                count: books.len(),
                max: BATCH_SIZE,
            });
        }

        let clauses: Vec<String> = books.iter().filter_map(book_clause).collect();
        if clauses.is_empty() {
            return Err(CatalogError::EmptyQuery { count: books.len() });
        }
        let mut text = format!("({})", clauses.join(" OR "));
        if let Some(branch) = branch {
            text.push_str(&format!(" available:\"{branch}\""));
        }
        if let Some(language) = language {
            text.push_str(&format!(" language:{language}"));
        }

        Ok(CatalogQuery {
            text,
            book_count: books.len(),
        })
    }
}

fn book_clause(book: &WantedBook) -> Option<String> {
    if let Some(isbn) = book.isbn.as_deref().map(str::trim).filter(|isbn| !isbn.is_empty()) {
        return Some(format!("identifier:({isbn})"));
    }

    let title = search_terms(&book.title);
    if title.is_empty() {
        return None;
    }
    let author = search_terms(&book.author);
    if author.is_empty() {
        Some(format!("title:({title})"))
    } else {
        Some(format!("(title:({title}) AND contributor:({author}))"))
    }
}

/// Drops characters that carry meaning in the query grammar and collapses whitespace.
fn search_terms(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '(' | ')' | '"' | ':') { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
