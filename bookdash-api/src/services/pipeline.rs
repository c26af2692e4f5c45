//! CSV-to-database sync pipeline
//!
//! Drives one full reconciliation run: parse the export, update changed
//! statuses, delete removed rows, then enrich and insert new books. One bad
//! record does not abort the run; its failure is collected and reported.
//! CSV structure faults and database faults are fatal.

use crate::db::books::{insert_books, NewBook};
use crate::services::csv_parser::{parse_goodreads_csv, CsvBook};
use crate::services::google_books::GoogleBooksClient;
use crate::services::reconciler::{delete_removed, find_new, update_statuses};
use crate::services::transformer::transform_book;
use bookdash_common::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Rows per insert transaction, bounding transaction size so earlier
/// batches survive a later failure
const INSERT_BATCH_SIZE: usize = 100;

/// Pause between Google Books calls for distinct records
const ENRICHMENT_DELAY: Duration = Duration::from_millis(500);

/// Goodreads appends series info in parentheses; strip it before searching
static SERIES_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("series suffix pattern is valid"));

/// Counts and per-record failures from one sync run
#[derive(Debug, Serialize)]
pub struct SyncSummary {
    pub parsed: usize,
    pub updated: u64,
    pub deleted: u64,
    pub new: usize,
    pub transformed: usize,
    pub failed: usize,
    pub failures: Vec<String>,
}

/// Run the full CSV-to-database pipeline for one export file.
pub async fn sync_csv_to_db(
    pool: &SqlitePool,
    client: &GoogleBooksClient,
    csv_path: &Path,
) -> Result<SyncSummary> {
    info!("Starting CSV sync for {}", csv_path.display());

    let books = parse_goodreads_csv(csv_path)?;
    if books.is_empty() {
        // The export is truth: an empty export deletes every stored row
        warn!(
            "Parsed 0 books from {}; every stored book will be deleted",
            csv_path.display()
        );
    }

    let updated = update_statuses(pool, &books).await?;
    let deleted = delete_removed(pool, &books).await?;

    // New-record detection only runs once both mutating passes committed
    let new_books = find_new(pool, &books).await?;
    info!(
        "Reconciled {} incoming books: {} updated, {} deleted, {} new",
        books.len(),
        updated,
        deleted,
        new_books.len()
    );

    let mut transformed: Vec<NewBook> = Vec::with_capacity(new_books.len());
    let mut failures: Vec<String> = Vec::new();

    for (i, book) in new_books.iter().copied().enumerate() {
        match enrich_and_transform(client, book).await {
            Ok(record) => transformed.push(record),
            Err(e) => {
                error!(
                    "Failed to process book '{}' by {} (Goodreads ID: {}): {}",
                    book.title, book.author, book.goodreads_id, e
                );
                failures.push(format!(
                    "{} by {} (Goodreads ID: {}): {}",
                    book.title, book.author, book.goodreads_id, e
                ));
            }
        }

        if i + 1 < new_books.len() {
            sleep(ENRICHMENT_DELAY).await;
        }
    }

    info!(
        "Successfully transformed {} books, {} failed",
        transformed.len(),
        failures.len()
    );
    if !failures.is_empty() {
        warn!("Failed books: {:?}", failures);
    }

    for batch in transformed.chunks(INSERT_BATCH_SIZE) {
        insert_books(pool, batch).await?;
        info!("Ingested batch of {} books", batch.len());
    }

    let summary = SyncSummary {
        parsed: books.len(),
        updated,
        deleted,
        new: new_books.len(),
        transformed: transformed.len(),
        failed: failures.len(),
        failures,
    };

    info!(
        "Sync complete. Total parsed: {}, new books: {}, ingested: {}, failed: {}, updated: {}, deleted: {}",
        summary.parsed, summary.new, summary.transformed, summary.failed, summary.updated, summary.deleted
    );

    Ok(summary)
}

/// Enrich one new book and merge it into an insert payload.
async fn enrich_and_transform(client: &GoogleBooksClient, book: &CsvBook) -> Result<NewBook> {
    let clean_title = SERIES_SUFFIX.replace_all(&book.title, "").trim().to_string();
    let volume = client
        .lookup(
            &clean_title,
            &book.author,
            book.isbn_10.as_deref(),
            book.isbn_13.as_deref(),
        )
        .await?;
    transform_book(book, volume)
}
