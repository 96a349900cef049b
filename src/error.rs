use chrono::NaiveDate;
use thiserror::Error;

/// Ways a call against the remote API can fail. None of them abort a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP 403: invalid API key or rate limit exceeded, check your API key")]
    Forbidden,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response as JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum RangeError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("end date {end} is before start date {start}")]
    Reversed { start: NaiveDate, end: NaiveDate },

    #[error("range spans {days} days, the feed allows at most {max}")]
    TooWide { days: i64, max: i64 },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write table: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
}
