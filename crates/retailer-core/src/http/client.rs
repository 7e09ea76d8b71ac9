//! HTTP client for catalogue fetches.
//!
//! A thin wrapper around `reqwest` adding:
//! - Automatic retry with exponential backoff on 5xx and 429
//! - Conditional requests (`If-Modified-Since`)
//! - A retailer User-Agent and sane timeouts

use std::time::Duration;

use reqwest::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;

const USER_AGENT: &str = concat!("retailer/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },
}

/// Body of a conditional GET that returned fresh content.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub body: Vec<u8>,
    pub last_modified: Option<String>,
}

pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }

    /// GET unless the resource is unchanged since `last_modified`.
    ///
    /// Returns `Ok(None)` on `304 Not Modified`.
    ///
    /// ```no_run
    /// use retailer_core::http::{HttpClient, HttpClientConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = HttpClient::with_config(HttpClientConfig::new())?;
    /// let url = "https://parts.example.com/packages.json";
    /// if let Some(fetched) = client.get_if_modified(url, None).await? {
    ///     println!("{} bytes, last modified {:?}", fetched.body.len(), fetched.last_modified);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_if_modified(
        &self,
        url: &str,
        last_modified: Option<&str>,
    ) -> Result<Option<FetchedBody>, HttpError> {
        let response = self.get_with_retries(url, last_modified).await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(Some(FetchedBody { body, last_modified }))
    }

    async fn get_with_retries(
        &self,
        url: &str,
        last_modified: Option<&str>,
    ) -> Result<Response, HttpError> {
        let mut attempt = 0;

        loop {
            let error = match self.execute_get(url, last_modified).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() || status == StatusCode::NOT_MODIFIED {
                        return Ok(response);
                    }

                    let error = HttpError::HttpStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    };
                    // Only server errors and rate limits are worth retrying
                    if !status.is_server_error() && status != StatusCode::TOO_MANY_REQUESTS {
                        return Err(error);
                    }
                    error
                }
                Err(e) => e,
            };

            if attempt >= self.max_retries {
                return Err(error);
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = RETRY_DELAY * 2_u32.pow(attempt);
            log::debug!("Retrying {} in {:?} (attempt {}): {}", url, delay, attempt + 1, error);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn execute_get(&self, url: &str, last_modified: Option<&str>) -> Result<Response, HttpError> {
        let mut request = self.client.get(url).header("Accept-Encoding", "gzip");

        if let Some(last_modified) = last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified);
        }

        Ok(request.send().await?)
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}
