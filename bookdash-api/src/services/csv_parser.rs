//! Goodreads CSV export parser
//!
//! Turns the raw export into validated candidate records. Structural faults
//! (missing file, empty file, missing required columns) are fatal to the
//! whole run; individual bad rows are skipped with a warning.

use bookdash_common::{Error, ReadingStatus, Result};
use chrono::NaiveDate;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Goodreads export date format for the "Date Read" column
const DATE_READ_FORMAT: &str = "%Y/%m/%d";

/// Columns that must be present in the export header
const REQUIRED_COLUMNS: [&str; 5] = ["Title", "Author", "Book Id", "Exclusive Shelf", "Date Read"];

/// One validated row of the Goodreads export, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct CsvBook {
    pub goodreads_id: String,
    pub title: String,
    pub author: String,
    pub additional_authors: Option<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub num_pages: Option<i64>,
    pub status: ReadingStatus,
    pub finish_date: Option<NaiveDate>,
}

/// Parse a Goodreads library export into candidate records.
///
/// Returns one `CsvBook` per valid row, preserving source order. Rows with
/// a missing Book Id, Title, or Author are skipped (warned, non-fatal).
pub fn parse_goodreads_csv(path: &Path) -> Result<Vec<CsvBook>> {
    info!("Parsing Goodreads CSV export from {}", path.display());

    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::CsvFormat(format!("cannot read {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::CsvFormat(format!("cannot read CSV headers: {}", e)))?
        .clone();

    if headers.is_empty() {
        return Err(Error::CsvFormat(
            "CSV file appears to be empty or has no headers".to_string(),
        ));
    }

    let column = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| column(name).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(Error::CsvFormat(format!(
            "missing required columns in CSV: {}",
            missing.join(", ")
        )));
    }

    // Required columns verified present above
    let title_col = column("Title").unwrap();
    let author_col = column("Author").unwrap();
    let id_col = column("Book Id").unwrap();
    let shelf_col = column("Exclusive Shelf").unwrap();
    let date_col = column("Date Read").unwrap();
    let isbn10_col = column("ISBN");
    let isbn13_col = column("ISBN13");
    let pages_col = column("Number of Pages");
    let add_authors_col = column("Additional Authors");

    let mut books = Vec::new();

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed CSV row: {}", e);
                continue;
            }
        };

        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let optional_field =
            |idx: Option<usize>| idx.map(|i| field(i)).filter(|s| !s.is_empty());

        let goodreads_id = field(id_col);
        let title = field(title_col);
        let author = field(author_col);

        if goodreads_id.is_empty() {
            warn!("Skipping row with no Goodreads ID: {:?}", record);
            continue;
        }
        if title.is_empty() || author.is_empty() {
            warn!("Skipping row with missing title or author: {:?}", record);
            continue;
        }

        let status = parse_shelf(field(shelf_col), goodreads_id);
        let finish_date = parse_date_read(field(date_col));
        let isbn_10 = optional_field(isbn10_col).and_then(clean_isbn);
        let isbn_13 = optional_field(isbn13_col).and_then(clean_isbn);
        let num_pages = optional_field(pages_col).and_then(|s| s.parse::<i64>().ok());
        let additional_authors = optional_field(add_authors_col).map(str::to_string);

        books.push(CsvBook {
            goodreads_id: goodreads_id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            additional_authors,
            isbn_10,
            isbn_13,
            num_pages,
            status,
            finish_date,
        });
    }

    info!("Parsed {} books from CSV", books.len());
    Ok(books)
}

/// Map the "Exclusive Shelf" value to a status, defaulting unknown or
/// missing shelves to to-read.
fn parse_shelf(shelf: &str, goodreads_id: &str) -> ReadingStatus {
    match ReadingStatus::from_str(shelf) {
        Ok(status) => status,
        Err(_) => {
            if !shelf.is_empty() {
                warn!(
                    "Unknown shelf '{}' for Goodreads ID {}; treating as to-read",
                    shelf, goodreads_id
                );
            }
            ReadingStatus::ToRead
        }
    }
}

/// Parse the "Date Read" column; unparseable dates are absent, not fatal
fn parse_date_read(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_READ_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("Invalid date format in Date Read: {}", raw);
            None
        }
    }
}

/// Strip Goodreads' Excel-guard artifacts (`="0345391802"`) from ISBN fields
fn clean_isbn(raw: &str) -> Option<String> {
    let cleaned = raw.trim_matches(|c| c == '=' || c == '"').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
