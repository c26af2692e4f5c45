//! Sync pipeline services
//!
//! Parse → reconcile → enrich → merge → insert, in that order. Each module
//! covers one stage; `pipeline` sequences them for a full run.

pub mod csv_parser;
pub mod google_books;
pub mod pipeline;
pub mod reconciler;
pub mod transformer;

pub use csv_parser::{parse_goodreads_csv, CsvBook};
pub use google_books::{GoogleBooksClient, VolumeMatch};
pub use pipeline::{sync_csv_to_db, SyncSummary};
pub use transformer::transform_book;
