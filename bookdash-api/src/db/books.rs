//! Book persistence
//!
//! Insert, lookup, and aggregate queries over the `books` table. List-valued
//! fields (authors, categories) are stored as JSON text columns.

use bookdash_common::{Error, ReadingStatus, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

/// Insert payload for a book, as assembled by the record merger or posted
/// to the ingest endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub goodreads_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub genre: Option<String>,
    pub page_count: Option<i64>,
    pub year_published: Option<i64>,
    pub published_date: Option<String>,
    pub categories: Option<Vec<String>>,
    pub description: Option<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
    pub google_books_id: Option<String>,
    pub google_books_link: Option<String>,
    pub status: ReadingStatus,
    pub finish_date: Option<NaiveDate>,
}

/// Full book row as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: i64,
    pub goodreads_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub genre: Option<String>,
    pub page_count: Option<i64>,
    pub year_published: Option<i64>,
    pub published_date: Option<String>,
    pub categories: Option<Vec<String>>,
    pub description: Option<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
    pub google_books_id: Option<String>,
    pub google_books_link: Option<String>,
    pub status: ReadingStatus,
    pub finish_date: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

const SELECT_COLUMNS: &str = "id, goodreads_id, title, authors, genre, page_count, \
     year_published, published_date, categories, description, isbn_10, isbn_13, \
     small_thumbnail, thumbnail, google_books_id, google_books_link, status, \
     finish_date, created_at, updated_at";

fn row_to_book(row: &SqliteRow) -> Result<Book> {
    let authors_json: String = row.get("authors");
    let authors: Vec<String> = serde_json::from_str(&authors_json)
        .map_err(|e| Error::Validation(format!("stored authors not valid JSON: {}", e)))?;

    let categories: Option<Vec<String>> = match row.get::<Option<String>, _>("categories") {
        Some(json) => Some(
            serde_json::from_str(&json)
                .map_err(|e| Error::Validation(format!("stored categories not valid JSON: {}", e)))?,
        ),
        None => None,
    };

    let status_str: String = row.get("status");
    let status = ReadingStatus::from_str(&status_str)?;

    Ok(Book {
        id: row.get("id"),
        goodreads_id: row.get("goodreads_id"),
        title: row.get("title"),
        authors,
        genre: row.get("genre"),
        page_count: row.get("page_count"),
        year_published: row.get("year_published"),
        published_date: row.get("published_date"),
        categories,
        description: row.get("description"),
        isbn_10: row.get("isbn_10"),
        isbn_13: row.get("isbn_13"),
        small_thumbnail: row.get("small_thumbnail"),
        thumbnail: row.get("thumbnail"),
        google_books_id: row.get("google_books_id"),
        google_books_link: row.get("google_books_link"),
        status,
        finish_date: row.get("finish_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Insert a batch of books in a single transaction.
///
/// The UNIQUE constraint on goodreads_id rejects duplicates; any constraint
/// violation rolls back the whole batch.
pub async fn insert_books(pool: &SqlitePool, books: &[NewBook]) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let mut inserted = 0u64;
    for book in books {
        let authors_json = serde_json::to_string(&book.authors)
            .map_err(|e| Error::Validation(format!("authors not serializable: {}", e)))?;
        let categories_json = match &book.categories {
            Some(categories) => Some(
                serde_json::to_string(categories)
                    .map_err(|e| Error::Validation(format!("categories not serializable: {}", e)))?,
            ),
            None => None,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO books (
                goodreads_id, title, authors, genre, page_count, year_published,
                published_date, categories, description, isbn_10, isbn_13,
                small_thumbnail, thumbnail, google_books_id, google_books_link,
                status, finish_date
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.goodreads_id)
        .bind(&book.title)
        .bind(&authors_json)
        .bind(&book.genre)
        .bind(book.page_count)
        .bind(book.year_published)
        .bind(&book.published_date)
        .bind(&categories_json)
        .bind(&book.description)
        .bind(&book.isbn_10)
        .bind(&book.isbn_13)
        .bind(&book.small_thumbnail)
        .bind(&book.thumbnail)
        .bind(&book.google_books_id)
        .bind(&book.google_books_link)
        .bind(book.status.as_str())
        .bind(book.finish_date)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;

    Ok(inserted)
}

/// Load one book by database id
pub async fn get_book(pool: &SqlitePool, id: i64) -> Result<Option<Book>> {
    let row = sqlx::query(&format!("SELECT {} FROM books WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(row_to_book(&row)?)),
        None => Ok(None),
    }
}

/// Optional list filters, all AND-combined
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookFilter {
    pub status: Option<ReadingStatus>,
    pub genre: Option<String>,
    pub year: Option<i64>,
}

/// List books with optional status/genre/publication-year filters
pub async fn list_books(pool: &SqlitePool, filter: &BookFilter) -> Result<Vec<Book>> {
    let mut sql = format!("SELECT {} FROM books WHERE 1=1", SELECT_COLUMNS);
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if filter.genre.is_some() {
        sql.push_str(" AND genre = ?");
    }
    if filter.year.is_some() {
        sql.push_str(" AND year_published = ?");
    }
    sql.push_str(" ORDER BY id");

    let mut query = sqlx::query(&sql);
    if let Some(status) = filter.status {
        query = query.bind(status.as_str());
    }
    if let Some(genre) = &filter.genre {
        query = query.bind(genre);
    }
    if let Some(year) = filter.year {
        query = query.bind(year);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(row_to_book).collect()
}

/// Delete one book by database id; returns whether a row was removed
pub async fn delete_book(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Change the status of one book by database id; returns whether a row matched
pub async fn set_status(pool: &SqlitePool, id: i64, status: ReadingStatus) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE books SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Per-genre slice of the stats report
#[derive(Debug, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub books_count: i64,
    pub pages_count: i64,
}

/// Aggregate reading statistics over books with status `read`
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub total_pages_read: i64,
    pub total_books_read: i64,
    pub avg_pages_per_book: f64,
    pub genre_breakdown: Vec<GenreCount>,
}

/// Compute aggregate statistics over read books
pub async fn reading_stats(pool: &SqlitePool) -> Result<StatsReport> {
    let totals = sqlx::query(
        "SELECT COALESCE(SUM(page_count), 0) AS pages, COUNT(*) AS books \
         FROM books WHERE status = 'read'",
    )
    .fetch_one(pool)
    .await?;

    let total_pages_read: i64 = totals.get("pages");
    let total_books_read: i64 = totals.get("books");
    let avg_pages_per_book = if total_books_read > 0 {
        total_pages_read as f64 / total_books_read as f64
    } else {
        0.0
    };

    let rows = sqlx::query(
        "SELECT genre, COUNT(*) AS books, COALESCE(SUM(page_count), 0) AS pages \
         FROM books WHERE status = 'read' AND genre IS NOT NULL \
         GROUP BY genre ORDER BY books DESC, genre",
    )
    .fetch_all(pool)
    .await?;

    let genre_breakdown = rows
        .iter()
        .map(|row| GenreCount {
            genre: row.get("genre"),
            books_count: row.get("books"),
            pages_count: row.get("pages"),
        })
        .collect();

    Ok(StatsReport {
        total_pages_read,
        total_books_read,
        avg_pages_per_book,
        genre_breakdown,
    })
}

/// One period/genre bucket of the trends report
#[derive(Debug, Serialize)]
pub struct TrendRow {
    pub year_read: String,
    pub month_read: String,
    pub pages_read: i64,
    pub books_read: i64,
    pub genre: String,
}

/// Pages and books finished per year/month/genre, oldest first
pub async fn reading_trends(pool: &SqlitePool) -> Result<Vec<TrendRow>> {
    let rows = sqlx::query(
        "SELECT strftime('%Y', finish_date) AS year_read, \
                strftime('%m', finish_date) AS month_read, \
                COALESCE(SUM(page_count), 0) AS pages, \
                COUNT(*) AS books, \
                COALESCE(genre, '') AS genre \
         FROM books \
         WHERE status = 'read' AND finish_date IS NOT NULL \
         GROUP BY year_read, month_read, genre \
         ORDER BY year_read, month_read, genre",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| TrendRow {
            year_read: row.get("year_read"),
            month_read: row.get("month_read"),
            pages_read: row.get("pages"),
            books_read: row.get("books"),
            genre: row.get("genre"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        init_tables(&pool).await.unwrap();
        pool
    }

    fn sample_book(goodreads_id: &str, status: ReadingStatus) -> NewBook {
        NewBook {
            goodreads_id: goodreads_id.to_string(),
            title: format!("Book {}", goodreads_id),
            authors: vec!["Some Author".to_string()],
            genre: Some("Fiction".to_string()),
            page_count: Some(200),
            year_published: Some(1979),
            published_date: Some("1979-10-12".to_string()),
            categories: Some(vec!["Fiction".to_string()]),
            description: None,
            isbn_10: None,
            isbn_13: None,
            small_thumbnail: None,
            thumbnail: None,
            google_books_id: None,
            google_books_link: None,
            status,
            finish_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_round_trip() {
        let pool = setup_test_db().await;
        let count = insert_books(&pool, &[sample_book("42", ReadingStatus::Read)])
            .await
            .unwrap();
        assert_eq!(count, 1);

        let books = list_books(&pool, &BookFilter::default()).await.unwrap();
        assert_eq!(books.len(), 1);
        let book = &books[0];
        assert_eq!(book.goodreads_id, "42");
        assert_eq!(book.authors, vec!["Some Author".to_string()]);
        assert_eq!(book.status, ReadingStatus::Read);
        assert_eq!(book.finish_date, NaiveDate::from_ymd_opt(2024, 3, 1));

        let by_id = get_book(&pool, book.id).await.unwrap().unwrap();
        assert_eq!(by_id.goodreads_id, "42");
    }

    #[tokio::test]
    async fn test_insert_count_matches_rows_written() {
        let pool = setup_test_db().await;
        assert_eq!(insert_books(&pool, &[]).await.unwrap(), 0);

        let count = insert_books(
            &pool,
            &[
                sample_book("1", ReadingStatus::Read),
                sample_book("2", ReadingStatus::ToRead),
                sample_book("3", ReadingStatus::CurrentlyReading),
            ],
        )
        .await
        .unwrap();
        assert_eq!(count, 3);

        let stored = list_books(&pool, &BookFilter::default()).await.unwrap();
        assert_eq!(stored.len() as u64, count);
    }

    #[tokio::test]
    async fn test_duplicate_goodreads_id_rejected() {
        let pool = setup_test_db().await;
        insert_books(&pool, &[sample_book("42", ReadingStatus::Read)])
            .await
            .unwrap();

        let result = insert_books(&pool, &[sample_book("42", ReadingStatus::ToRead)]).await;
        assert!(result.is_err());

        // Failed batch must not leave partial rows behind
        let books = list_books(&pool, &BookFilter::default()).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].status, ReadingStatus::Read);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let pool = setup_test_db().await;
        insert_books(
            &pool,
            &[
                sample_book("1", ReadingStatus::Read),
                sample_book("2", ReadingStatus::ToRead),
            ],
        )
        .await
        .unwrap();

        let filter = BookFilter {
            status: Some(ReadingStatus::Read),
            ..Default::default()
        };
        let books = list_books(&pool, &filter).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].goodreads_id, "1");

        let filter = BookFilter {
            genre: Some("Nonexistent".to_string()),
            ..Default::default()
        };
        assert!(list_books(&pool, &filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_status_and_delete() {
        let pool = setup_test_db().await;
        insert_books(&pool, &[sample_book("7", ReadingStatus::ToRead)])
            .await
            .unwrap();
        let book = &list_books(&pool, &BookFilter::default()).await.unwrap()[0];

        assert!(set_status(&pool, book.id, ReadingStatus::Read).await.unwrap());
        let updated = get_book(&pool, book.id).await.unwrap().unwrap();
        assert_eq!(updated.status, ReadingStatus::Read);

        assert!(delete_book(&pool, book.id).await.unwrap());
        assert!(get_book(&pool, book.id).await.unwrap().is_none());
        assert!(!delete_book(&pool, book.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_stats_over_read_books() {
        let pool = setup_test_db().await;
        let mut unread = sample_book("3", ReadingStatus::ToRead);
        unread.page_count = Some(999);
        insert_books(
            &pool,
            &[
                sample_book("1", ReadingStatus::Read),
                sample_book("2", ReadingStatus::Read),
                unread,
            ],
        )
        .await
        .unwrap();

        let stats = reading_stats(&pool).await.unwrap();
        assert_eq!(stats.total_books_read, 2);
        assert_eq!(stats.total_pages_read, 400);
        assert!((stats.avg_pages_per_book - 200.0).abs() < f64::EPSILON);
        assert_eq!(stats.genre_breakdown.len(), 1);
        assert_eq!(stats.genre_breakdown[0].genre, "Fiction");
        assert_eq!(stats.genre_breakdown[0].books_count, 2);
    }

    #[tokio::test]
    async fn test_trends_group_by_month() {
        let pool = setup_test_db().await;
        let mut a = sample_book("1", ReadingStatus::Read);
        a.finish_date = NaiveDate::from_ymd_opt(2024, 3, 10);
        let mut b = sample_book("2", ReadingStatus::Read);
        b.finish_date = NaiveDate::from_ymd_opt(2024, 3, 20);
        let mut c = sample_book("3", ReadingStatus::Read);
        c.finish_date = NaiveDate::from_ymd_opt(2023, 12, 1);
        insert_books(&pool, &[a, b, c]).await.unwrap();

        let trends = reading_trends(&pool).await.unwrap();
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].year_read, "2023");
        assert_eq!(trends[0].books_read, 1);
        assert_eq!(trends[1].year_read, "2024");
        assert_eq!(trends[1].month_read, "03");
        assert_eq!(trends[1].books_read, 2);
        assert_eq!(trends[1].pages_read, 400);
    }
}
