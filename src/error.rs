use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SeriesError {
    #[error("download from {url} failed with HTTP status {status}")]
    #[diagnostic(help("only a 200 response is accepted; nothing was written to the cache"))]
    Download { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("unexpected layout in {path}: {reason}")]
    Format { path: Utf8PathBuf, reason: String },

    #[error("cannot parse {field} on line {line} of {path}")]
    Parse {
        path: Utf8PathBuf,
        line: usize,
        field: String,
    },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("start date {start} must be earlier than end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid month key: {0}")]
    InvalidMonthKey(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl SeriesError {
    pub(crate) fn format(path: &Utf8Path, reason: impl Into<String>) -> Self {
        SeriesError::Format {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(path: &Utf8Path, line: usize, field: impl Into<String>) -> Self {
        SeriesError::Parse {
            path: path.to_owned(),
            line,
            field: field.into(),
        }
    }
}
