use std::time::Duration;

use camino::Utf8Path;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::SeriesError;
use crate::store::Store;

pub trait Fetcher {
    /// Retrieves `url` once and stores the body verbatim at `destination`.
    fn fetch(&self, url: &str, destination: &Utf8Path) -> Result<(), SeriesError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `timeout` of `None` lets a request block until the server answers.
    pub fn new(timeout: Option<Duration>) -> Result<Self, SeriesError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            user_agent(&format!("geospace/{}", env!("CARGO_PKG_VERSION")))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| client_error(err.to_string()))?;
        Ok(Self { client })
    }

    fn check_status(url: &str, status: StatusCode) -> Result<(), SeriesError> {
        if status == StatusCode::OK {
            return Ok(());
        }
        Err(SeriesError::Download {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn user_agent(value: &str) -> Result<HeaderValue, SeriesError> {
    HeaderValue::from_str(value)
        .map_err(|err| client_error(format!("invalid user agent {value:?}: {err}")))
}

fn client_error(message: String) -> SeriesError {
    SeriesError::Http {
        url: String::new(),
        message: format!("building HTTP client: {message}"),
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, destination: &Utf8Path) -> Result<(), SeriesError> {
        tracing::info!(%url, %destination, "downloading");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| SeriesError::Http {
                url: url.to_string(),
                message: err.to_string(),
            })?;
        Self::check_status(url, response.status())?;
        let body = response.bytes().map_err(|err| SeriesError::Http {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        Store::write_bytes_atomic(destination, &body)?;
        tracing::info!(%destination, bytes = body.len(), "downloaded");
        Ok(())
    }
}
