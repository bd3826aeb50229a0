//! HTTP client shared by the registry adapters
//!
//! Wraps reqwest with a timeout, a User-Agent and bounded retry with
//! exponential backoff for transient failures and rate limiting.

use crate::error::AdapterError;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default timeout for registry requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("depbot/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings
    pub fn new() -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|err| AdapterError::HttpClient {
                message: err.to_string(),
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Sets the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Performs a GET request and parses the JSON response
    ///
    /// Transport errors and HTTP 429 are retried with exponential backoff;
    /// 404 maps to `PackageNotFound`, every other non-success status to a
    /// registry error.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<T, AdapterError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(AdapterError::registry(
                            package,
                            registry,
                            "rate limit exceeded",
                        ));
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            delay *= 2;
                        }
                        continue;
                    }

                    if response.status() == StatusCode::NOT_FOUND {
                        return Err(AdapterError::PackageNotFound {
                            package: package.to_string(),
                            registry: registry.to_string(),
                        });
                    }

                    if !response.status().is_success() {
                        return Err(AdapterError::registry(
                            package,
                            registry,
                            format!("HTTP {}", response.status()),
                        ));
                    }

                    return response.json::<T>().await.map_err(|err| {
                        AdapterError::registry(
                            package,
                            registry,
                            format!("failed to parse JSON: {}", err),
                        )
                    });
                }
                Err(err) => {
                    last_error = Some(AdapterError::registry(package, registry, err.to_string()));
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AdapterError::registry(package, registry, "unknown error")))
    }
}
