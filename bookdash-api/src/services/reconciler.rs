//! CSV-to-database reconciliation passes
//!
//! The incoming export is the source of truth for membership and status.
//! Three passes run in fixed order: status update, delete, then new-record
//! detection. Each mutating pass runs in its own transaction with a single
//! commit at pass end; any database fault rolls the pass back and aborts
//! the run.

use crate::services::csv_parser::CsvBook;
use bookdash_common::Result;
use sqlx::{Row, SqlitePool};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Chunk size for `IN (...)` binds, kept under SQLite's parameter limit
const BIND_CHUNK: usize = 500;

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Pass 1: update stored statuses that differ from the incoming value.
///
/// One commit at pass end; an unchanged input performs zero writes.
/// Returns the number of rows changed.
pub async fn update_statuses(pool: &SqlitePool, books: &[CsvBook]) -> Result<u64> {
    if books.is_empty() {
        info!("No books passed for status update evaluation");
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    // Current stored status for every incoming id
    let mut stored: HashMap<String, String> = HashMap::new();
    let ids: Vec<&str> = books.iter().map(|b| b.goodreads_id.as_str()).collect();
    for chunk in ids.chunks(BIND_CHUNK) {
        let sql = format!(
            "SELECT goodreads_id, status FROM books WHERE goodreads_id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        for row in query.fetch_all(&mut *tx).await? {
            stored.insert(row.get("goodreads_id"), row.get("status"));
        }
    }

    let mut count = 0u64;
    for book in books {
        let differs = stored
            .get(&book.goodreads_id)
            .map(|current| current != book.status.as_str())
            .unwrap_or(false);
        if differs {
            sqlx::query(
                "UPDATE books SET status = ?, updated_at = CURRENT_TIMESTAMP \
                 WHERE goodreads_id = ?",
            )
            .bind(book.status.as_str())
            .bind(&book.goodreads_id)
            .execute(&mut *tx)
            .await?;
            info!(
                "Status for goodreads_id {} changed from {} to {}",
                book.goodreads_id,
                stored.get(&book.goodreads_id).map(String::as_str).unwrap_or(""),
                book.status
            );
            count += 1;
        }
    }

    tx.commit().await?;
    Ok(count)
}

/// Pass 2: delete stored rows whose goodreads_id is absent from the
/// incoming set.
///
/// An empty incoming set deletes every stored row; the export is truth and
/// callers guard against accidentally-empty sources upstream. One commit at
/// pass end. Returns the number of rows deleted.
pub async fn delete_removed(pool: &SqlitePool, books: &[CsvBook]) -> Result<u64> {
    let incoming: HashSet<&str> = books.iter().map(|b| b.goodreads_id.as_str()).collect();

    let mut tx = pool.begin().await?;

    let rows = sqlx::query("SELECT goodreads_id, title FROM books")
        .fetch_all(&mut *tx)
        .await?;

    let mut count = 0u64;
    for row in rows {
        let goodreads_id: String = row.get("goodreads_id");
        if !incoming.contains(goodreads_id.as_str()) {
            let title: String = row.get("title");
            sqlx::query("DELETE FROM books WHERE goodreads_id = ?")
                .bind(&goodreads_id)
                .execute(&mut *tx)
                .await?;
            info!("Deleting entry for {}", title);
            count += 1;
        }
    }

    tx.commit().await?;
    Ok(count)
}

/// Pass 3: return the incoming candidates not yet stored, in source order.
///
/// Runs after the update and delete passes so the membership baseline is
/// settled; callers must not invoke it when an earlier pass has faulted.
pub async fn find_new<'a>(pool: &SqlitePool, books: &'a [CsvBook]) -> Result<Vec<&'a CsvBook>> {
    let mut existing: HashSet<String> = HashSet::new();
    let ids: Vec<&str> = books.iter().map(|b| b.goodreads_id.as_str()).collect();
    for chunk in ids.chunks(BIND_CHUNK) {
        let sql = format!(
            "SELECT goodreads_id FROM books WHERE goodreads_id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        for row in query.fetch_all(pool).await? {
            existing.insert(row.get("goodreads_id"));
        }
    }

    Ok(books
        .iter()
        .filter(|b| !existing.contains(&b.goodreads_id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::books::{insert_books, list_books, BookFilter};
    use crate::db::init_tables;
    use crate::services::transformer::transform_book;
    use bookdash_common::ReadingStatus;

    fn csv_book(goodreads_id: &str, status: ReadingStatus) -> CsvBook {
        CsvBook {
            goodreads_id: goodreads_id.to_string(),
            title: format!("Book {}", goodreads_id),
            author: "Some Author".to_string(),
            additional_authors: None,
            isbn_10: None,
            isbn_13: None,
            num_pages: Some(100),
            status,
            finish_date: None,
        }
    }

    async fn setup_store(stored: &[CsvBook]) -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        init_tables(&pool).await.unwrap();
        let rows: Vec<_> = stored
            .iter()
            .map(|b| transform_book(b, None).unwrap())
            .collect();
        insert_books(&pool, &rows).await.unwrap();
        pool
    }

    async fn stored_ids(pool: &SqlitePool) -> HashSet<String> {
        list_books(pool, &BookFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.goodreads_id)
            .collect()
    }

    #[tokio::test]
    async fn test_empty_store_all_incoming_are_new() {
        let pool = setup_store(&[]).await;
        let incoming = vec![
            csv_book("1", ReadingStatus::Read),
            csv_book("2", ReadingStatus::ToRead),
            csv_book("3", ReadingStatus::CurrentlyReading),
        ];

        assert_eq!(update_statuses(&pool, &incoming).await.unwrap(), 0);
        assert_eq!(delete_removed(&pool, &incoming).await.unwrap(), 0);
        let new = find_new(&pool, &incoming).await.unwrap();
        assert_eq!(new.len(), 3);
        // Source order preserved
        assert_eq!(new[0].goodreads_id, "1");
        assert_eq!(new[2].goodreads_id, "3");
    }

    #[tokio::test]
    async fn test_status_change_updates_and_excludes_from_new() {
        let pool = setup_store(&[csv_book("42", ReadingStatus::ToRead)]).await;
        let incoming = vec![csv_book("42", ReadingStatus::Read)];

        assert_eq!(update_statuses(&pool, &incoming).await.unwrap(), 1);
        let books = list_books(&pool, &BookFilter::default()).await.unwrap();
        assert_eq!(books[0].status, ReadingStatus::Read);

        assert!(find_new(&pool, &incoming).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_input_writes_nothing() {
        let pool = setup_store(&[csv_book("42", ReadingStatus::Read)]).await;
        let incoming = vec![csv_book("42", ReadingStatus::Read)];

        assert_eq!(update_statuses(&pool, &incoming).await.unwrap(), 0);
        // Re-run stays at zero
        assert_eq!(update_statuses(&pool, &incoming).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_rows_absent_from_incoming() {
        let pool = setup_store(&[
            csv_book("1", ReadingStatus::Read),
            csv_book("2", ReadingStatus::Read),
            csv_book("3", ReadingStatus::Read),
        ])
        .await;
        let incoming = vec![
            csv_book("1", ReadingStatus::Read),
            csv_book("3", ReadingStatus::Read),
        ];

        assert_eq!(delete_removed(&pool, &incoming).await.unwrap(), 1);
        let ids = stored_ids(&pool).await;
        assert_eq!(ids, HashSet::from(["1".to_string(), "3".to_string()]));
    }

    #[tokio::test]
    async fn test_empty_incoming_deletes_everything() {
        let pool = setup_store(&[
            csv_book("1", ReadingStatus::Read),
            csv_book("2", ReadingStatus::Read),
        ])
        .await;

        assert_eq!(delete_removed(&pool, &[]).await.unwrap(), 2);
        assert!(stored_ids(&pool).await.is_empty());
    }

    #[tokio::test]
    async fn test_store_fault_surfaces_as_database_error() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        let incoming = vec![csv_book("1", ReadingStatus::Read)];

        let err = update_statuses(&pool, &incoming).await.unwrap_err();
        assert!(matches!(err, bookdash_common::Error::Database(_)));

        let err = delete_removed(&pool, &incoming).await.unwrap_err();
        assert!(matches!(err, bookdash_common::Error::Database(_)));
    }

    #[tokio::test]
    async fn test_membership_invariant_after_all_passes() {
        let pool = setup_store(&[
            csv_book("1", ReadingStatus::ToRead),
            csv_book("2", ReadingStatus::Read),
        ])
        .await;
        let incoming = vec![
            csv_book("1", ReadingStatus::Read),
            csv_book("3", ReadingStatus::ToRead),
        ];

        update_statuses(&pool, &incoming).await.unwrap();
        delete_removed(&pool, &incoming).await.unwrap();
        let new: Vec<_> = find_new(&pool, &incoming)
            .await
            .unwrap()
            .into_iter()
            .map(|b| transform_book(b, None).unwrap())
            .collect();
        insert_books(&pool, &new).await.unwrap();

        let ids = stored_ids(&pool).await;
        let incoming_ids: HashSet<String> =
            incoming.iter().map(|b| b.goodreads_id.clone()).collect();
        assert_eq!(ids, incoming_ids);
    }
}
