//! Reading status domain enum
//!
//! Mirrors the Goodreads "Exclusive Shelf" values. Stored as TEXT in the
//! books table and carried verbatim over the HTTP API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exclusive reading state of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingStatus {
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "currently-reading")]
    CurrentlyReading,
    #[serde(rename = "to-read")]
    ToRead,
}

impl ReadingStatus {
    /// String form as stored in the database and CSV export
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Read => "read",
            ReadingStatus::CurrentlyReading => "currently-reading",
            ReadingStatus::ToRead => "to-read",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(ReadingStatus::Read),
            "currently-reading" => Ok(ReadingStatus::CurrentlyReading),
            "to-read" => Ok(ReadingStatus::ToRead),
            other => Err(crate::Error::Validation(format!(
                "unknown reading status: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_statuses() {
        for status in [
            ReadingStatus::Read,
            ReadingStatus::CurrentlyReading,
            ReadingStatus::ToRead,
        ] {
            assert_eq!(status.as_str().parse::<ReadingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("want-to-read".parse::<ReadingStatus>().is_err());
        assert!("".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn test_serde_rename() {
        let json = serde_json::to_string(&ReadingStatus::CurrentlyReading).unwrap();
        assert_eq!(json, "\"currently-reading\"");
    }
}
