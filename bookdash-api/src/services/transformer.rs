//! Record merger
//!
//! Combines one parsed CSV row with its optional Google Books match into a
//! single insert payload. Pure and deterministic; no I/O.

use crate::db::books::NewBook;
use crate::services::csv_parser::CsvBook;
use crate::services::google_books::VolumeMatch;
use bookdash_common::{Error, Result};

/// Assemble the canonical insert record for one book.
///
/// With a match: the CSV page count wins over Google's, Google's title wins
/// unless empty, and Google's author list wins unless empty. Without a
/// match the record is built from the CSV row alone and all enrichment-only
/// fields stay absent.
pub fn transform_book(book: &CsvBook, volume: Option<VolumeMatch>) -> Result<NewBook> {
    let merged = match volume {
        Some(volume) => {
            let title = match volume.title.filter(|t| !t.trim().is_empty()) {
                Some(title) => title,
                None => book.title.clone(),
            };
            let authors = match volume.authors.filter(|a| !a.is_empty()) {
                Some(authors) => authors,
                None => vec![book.author.clone()],
            };

            NewBook {
                goodreads_id: book.goodreads_id.clone(),
                title,
                authors,
                genre: volume.genre,
                page_count: book.num_pages.or(volume.page_count),
                year_published: volume.year_published,
                published_date: volume.published_date,
                categories: volume.categories,
                description: volume.description,
                isbn_10: volume.isbn_10,
                isbn_13: volume.isbn_13,
                small_thumbnail: volume.small_thumbnail,
                thumbnail: volume.thumbnail,
                google_books_id: Some(volume.google_books_id),
                google_books_link: volume.google_books_link,
                status: book.status,
                finish_date: book.finish_date,
            }
        }
        None => NewBook {
            goodreads_id: book.goodreads_id.clone(),
            title: book.title.clone(),
            authors: vec![book.author.clone()],
            genre: None,
            page_count: book.num_pages,
            year_published: None,
            published_date: None,
            categories: None,
            description: None,
            isbn_10: book.isbn_10.clone(),
            isbn_13: book.isbn_13.clone(),
            small_thumbnail: None,
            thumbnail: None,
            google_books_id: None,
            google_books_link: None,
            status: book.status,
            finish_date: book.finish_date,
        },
    };

    validate(&merged)?;
    Ok(merged)
}

/// Defensive required-field check; upstream guarantees should make this
/// unreachable for parser-produced rows.
fn validate(book: &NewBook) -> Result<()> {
    if book.goodreads_id.trim().is_empty() {
        return Err(Error::Validation("merged record has empty goodreads_id".into()));
    }
    if book.title.trim().is_empty() {
        return Err(Error::Validation(format!(
            "merged record {} has empty title",
            book.goodreads_id
        )));
    }
    if book.authors.is_empty() || book.authors.iter().all(|a| a.trim().is_empty()) {
        return Err(Error::Validation(format!(
            "merged record {} has no authors",
            book.goodreads_id
        )));
    }
    Ok(())
}
