//! Database access for bookdash-api
//!
//! Single SQLite database holding the `books` table. The pool is created
//! once at startup and shared by the HTTP handlers and the sync pipeline.

pub mod books;

use bookdash_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the books database, creating the file if missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the books table if it does not exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            goodreads_id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            authors TEXT NOT NULL,
            genre TEXT,
            page_count INTEGER,
            year_published INTEGER,
            published_date TEXT,
            categories TEXT,
            description TEXT,
            isbn_10 TEXT,
            isbn_13 TEXT,
            small_thumbnail TEXT,
            thumbnail TEXT,
            google_books_id TEXT,
            google_books_link TEXT,
            status TEXT NOT NULL,
            finish_date TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_status ON books(status)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (books)");

    Ok(())
}
