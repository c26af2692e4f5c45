//! bookdash-api - Personal Reading Dashboard backend
//!
//! Two entry points: `serve` runs the HTTP API, `sync` runs one CSV
//! reconciliation against the configured database and prints the summary.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use bookdash_api::config::{Config, ConfigOverrides};
use bookdash_api::services::{sync_csv_to_db, GoogleBooksClient};
use bookdash_api::{build_router, AppState};

#[derive(Parser)]
#[command(name = "bookdash-api", version, about = "Personal reading dashboard backend")]
struct Cli {
    /// TOML config file (defaults to ./bookdash.toml when present)
    #[arg(long, env = "BOOKDASH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "BOOKDASH_DB", global = true)]
    database: Option<PathBuf>,

    /// API key required on protected endpoints (unset disables auth)
    #[arg(long, env = "BOOKDASH_API_KEY", global = true)]
    api_key: Option<String>,

    /// Alternate Google Books endpoint
    #[arg(long, env = "BOOKDASH_GOOGLE_BOOKS_URL", global = true)]
    google_books_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Bind address for the HTTP server
        #[arg(long, env = "BOOKDASH_BIND")]
        bind: Option<String>,
    },
    /// Reconcile one Goodreads CSV export against the database
    Sync {
        /// Path to the Goodreads CSV export
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting bookdash-api v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let (bind_override, command) = match cli.command {
        Command::Serve { bind } => (bind, None),
        Command::Sync { csv } => (None, Some(csv)),
    };

    let config = Config::resolve(ConfigOverrides {
        config_file: cli.config,
        database: cli.database,
        bind: bind_override,
        api_key: cli.api_key,
        google_books_url: cli.google_books_url,
    })?;

    let pool = bookdash_api::db::init_database_pool(&config.database).await?;
    info!("Database connection established");

    match command {
        Some(csv) => {
            let client = match &config.google_books_url {
                Some(url) => GoogleBooksClient::with_base_url(url),
                None => GoogleBooksClient::new(),
            };
            let summary = sync_csv_to_db(&pool, &client, &csv).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        None => {
            let bind = config.bind.clone();
            let state = AppState::new(pool, config);
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("bookdash-api listening on http://{}", bind);
            info!("Health check: http://{}/healthy", bind);

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
