//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry on transport failures
//! - Status mapping: 404 → not found, 429 → rate limited, other non-2xx → error

use crate::config::HttpSettings;
use crate::error::RegistryError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    backoff_base: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::from_settings(&HttpSettings::default())
    }

    /// Create a new HTTP client from configuration
    pub fn from_settings(settings: &HttpSettings) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| RegistryError::NetworkError {
                package: String::new(),
                registry: "HTTP client".to_string(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            max_retries: settings.max_retries,
            backoff_base: settings.backoff_base(),
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first backoff delay
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Perform a GET request with retry logic and error context
    pub async fn get_with_context(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<Response, RegistryError> {
        self.send_with_retry(|| self.client.get(url), url, package, registry)
            .await
    }

    /// Sends the request built by `build`, retrying transport failures only
    ///
    /// A response with any status ends the loop: the registry answered, so
    /// asking again would not change the answer.
    async fn send_with_retry<F>(
        &self,
        build: F,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<Response, RegistryError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut delay = self.backoff_base;
        let mut attempt = 0;

        loop {
            debug!(url, attempt, "registry request");
            let error = match build().send().await {
                Ok(response) => return check_status(response, package, registry),
                Err(e) if e.is_timeout() => RegistryError::timeout(package, registry),
                Err(e) => RegistryError::network_error(package, registry, e.to_string()),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }
            debug!(url, attempt, error = %error, delay_ms = delay.as_millis() as u64, "retrying");
            tokio::time::sleep(delay).await;
            delay *= 2;
            attempt += 1;
        }
    }

    /// Perform a GET request and parse the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<T, RegistryError> {
        let response = self.get_with_context(url, package, registry).await?;
        parse_json(response, package, registry).await
    }

    /// Perform a GET request and return the body as text
    pub async fn get_text(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<String, RegistryError> {
        let response = self.get_with_context(url, package, registry).await?;
        response.text().await.map_err(|e| {
            RegistryError::invalid_response(
                package,
                registry,
                format!("failed to read response body: {}", e),
            )
        })
    }

    /// Perform a POST request with a JSON body and parse the JSON response
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        body: &B,
        package: &str,
        registry: &str,
    ) -> Result<T, RegistryError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|e| {
            RegistryError::invalid_response(package, registry, format!("unencodable body: {}", e))
        })?;
        let response = self
            .send_with_retry(
                || {
                    self.client
                        .post(url)
                        .header(reqwest::header::CONTENT_TYPE, "application/json")
                        .body(payload.clone())
                },
                url,
                package,
                registry,
            )
            .await?;
        parse_json(response, package, registry).await
    }
}

fn check_status(
    response: Response,
    package: &str,
    registry: &str,
) -> Result<Response, RegistryError> {
    match response.status() {
        StatusCode::NOT_FOUND => Err(RegistryError::package_not_found(package, registry)),
        StatusCode::TOO_MANY_REQUESTS => Err(RegistryError::rate_limit_exceeded(registry)),
        status if !status.is_success() => Err(RegistryError::network_error(
            package,
            registry,
            format!("HTTP {}", status),
        )),
        _ => Ok(response),
    }
}

async fn parse_json<T: DeserializeOwned>(
    response: Response,
    package: &str,
    registry: &str,
) -> Result<T, RegistryError> {
    response.json::<T>().await.map_err(|e| {
        RegistryError::invalid_response(package, registry, format!("failed to parse JSON: {}", e))
    })
}
