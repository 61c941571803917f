// HTTP fetch-and-parse helper.
//
// One GET per call, body decoded as JSON. No retries and no caching; the
// caller decides what to do with a failure.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::HttpConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL `{url}`: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Reusable HTTP client configured from `[http]`.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: reqwest::Client,
    fail_on_error_status: bool,
}

impl Fetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            http,
            fail_on_error_status: config.fail_on_error_status,
        })
    }

    /// GET `url` and decode the body into `T`.
    ///
    /// A non-2xx response is decoded like any other unless the fetcher was
    /// configured with `fail_on_error_status`, in which case it becomes
    /// [`FetchError::Status`] and the body is not read.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let target = parse_url(url)?;
        debug!(%target, "sending GET");

        let response = self
            .http
            .get(target)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            if self.fail_on_error_status {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            warn!(url, %status, "non-success status, decoding body anyway");
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;
        debug!(url, %status, bytes = body.len(), "response received");

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// GET `url` and decode the body as untyped JSON.
    pub async fn fetch_data(&self, url: &str) -> Result<Value, FetchError> {
        self.fetch_json(url).await
    }
}

/// One-shot fetch with a default-configured client.
pub async fn fetch_data(url: &str) -> Result<Value, FetchError> {
    Fetcher::new(&HttpConfig::default())?.fetch_data(url).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse `url`, accepting only `http` and `https`.
pub(crate) fn parse_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported scheme `{other}`"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
