//! Reader for the CSV produced by Goodreads' "Export Library" feature.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use super::{WantedBook, WishlistError, WishlistSource};

/// Cover served by Goodreads for books without artwork.
pub const NO_PHOTO_COVER: &str =
    "https://s.gr-assets.com/assets/nophoto/book/111x148-bcc042a9c91a29c1d680899eff700a03.png";

const TITLE_COLUMN: &str = "Title";
const AUTHOR_COLUMN: &str = "Author";
const ISBN_COLUMN: &str = "ISBN";
const EXCLUSIVE_SHELF_COLUMN: &str = "Exclusive Shelf";
const BOOKSHELVES_COLUMN: &str = "Bookshelves";

/// The books on one shelf of a Goodreads library export.
#[derive(Debug, Clone)]
pub struct ShelfExport {
    path: PathBuf,
    shelf: String,
}

impl ShelfExport {
    /// Reads `shelf` (e.g. `to-read`) from the export at `path`.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>, shelf: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            shelf: shelf.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn shelf(&self) -> &str {
        &self.shelf
    }

    /// Parses an export from any reader, keeping rows on `shelf`.
    ///
    /// # Errors
    ///
    /// Returns [`WishlistError::MissingColumn`] when a required header is absent
    /// and [`WishlistError::Csv`] for undecodable rows.
    pub fn read_books<R: Read>(reader: R, shelf: &str) -> Result<Vec<WantedBook>, WishlistError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns = ExportColumns::locate(reader.headers()?)?;

        let mut books = Vec::new();
        for row in reader.records() {
            let row = row?;
            if !columns.on_shelf(&row, shelf) {
                continue;
            }
            let title = columns.field(&row, columns.title);
            if title.is_empty() {
                continue;
            }
            books.push(WantedBook {
                isbn: clean_isbn(columns.field(&row, columns.isbn)),
                title: title.to_string(),
                author: columns.field(&row, columns.author).to_string(),
                description: String::new(),
                cover_image: NO_PHOTO_COVER.to_string(),
            });
        }
        Ok(books)
    }
}

impl WishlistSource for ShelfExport {
    fn wanted_books(&self) -> Result<Vec<WantedBook>, WishlistError> {
        let file = File::open(&self.path).map_err(|source| WishlistError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Self::read_books(file, &self.shelf)
    }
}

struct ExportColumns {
    title: usize,
    author: usize,
    isbn: usize,
    exclusive_shelf: usize,
    bookshelves: Option<usize>,
}

impl ExportColumns {
    fn locate(headers: &StringRecord) -> Result<Self, WishlistError> {
        let position = |name: &str| headers.iter().position(|header| header.trim() == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| WishlistError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(Self {
            title: required(TITLE_COLUMN)?,
            author: required(AUTHOR_COLUMN)?,
            isbn: required(ISBN_COLUMN)?,
            exclusive_shelf: required(EXCLUSIVE_SHELF_COLUMN)?,
            bookshelves: position(BOOKSHELVES_COLUMN),
        })
    }

    fn field<'r>(&self, row: &'r StringRecord, index: usize) -> &'r str {
        row.get(index).map_or("", str::trim)
    }

    fn on_shelf(&self, row: &StringRecord, shelf: &str) -> bool {
        if self.field(row, self.exclusive_shelf) == shelf {
            return true;
        }
        self.bookshelves.is_some_and(|index| {
            self.field(row, index)
                .split(',')
                .any(|name| name.trim() == shelf)
        })
    }
}

/// Strips the spreadsheet guard Goodreads wraps ISBNs in (`="0142437247"`).
fn clean_isbn(raw: &str) -> Option<String> {
    let isbn = raw.trim().trim_start_matches('=').trim_matches('"').trim();
    (!isbn.is_empty()).then(|| isbn.to_string())
}
