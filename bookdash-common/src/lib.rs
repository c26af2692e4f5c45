//! # BookDash Common Library
//!
//! Shared code for the BookDash reading-tracker backend:
//! - Error types used across the sync pipeline and HTTP API
//! - Reading status domain enum

pub mod error;
pub mod status;

pub use error::{Error, Result};
pub use status::ReadingStatus;
