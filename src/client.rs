//! HTTP access to the photo API
//!
//! `ResourceSource` is the seam the fetcher talks to; `HttpResourceClient`
//! is the production implementation over a pooled `reqwest::Client`.

use crate::{Config, FetchError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Anything that can resolve a URL to a JSON document
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// Reusable HTTP client with a fixed timeout and identifying User-Agent
///
/// Cloning is cheap and clones share the connection pool, so one instance
/// serves every worker task of a process.
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpResourceClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(config.max_concurrent)
            .build()
            .map_err(|e| FetchError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout: config.request_timeout,
        })
    }

    fn send_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ResourceSource for HttpResourceClient {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let err = self.send_error(url, e);
            debug!("Request to {} failed: {}", url, err);
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!("Request to {} returned {}", url, status);
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.send_error(url, e)
            } else {
                FetchError::MalformedResponse {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}
