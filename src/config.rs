//! Configuration management with serde serialization/deserialization
//!
//! This module provides the immutable settings value threaded into every
//! component: API location, per-request timeout, pool bounds and the
//! comparison harness knobs.

use crate::{validate_url, FetchError, PhotoId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public JSONPlaceholder deployment used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Main configuration structure for the photo fetcher
///
/// The same value is cloned into worker tasks and serialized into worker
/// processes, so it carries no handles or runtime state.
///
/// # Examples
///
/// ```rust
/// use photo_fetcher::Config;
///
/// // Use default configuration
/// let config = Config::default();
///
/// // Point at a local mirror with a tighter pool
/// let config = Config {
///     base_url: "http://localhost:3000".to_string(),
///     max_concurrent: 10,
///     ..Default::default()
/// };
/// assert_eq!(config.photo_url(7), "http://localhost:3000/photos/7");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Root of the REST API (default: JSONPlaceholder)
    pub base_url: String,

    /// Timeout for each individual HTTP request (default: 10 seconds)
    ///
    /// Applies per call, never to a batch as a whole.
    pub request_timeout: Duration,

    /// Upper bound on workers for the thread and process pools (default: 50)
    ///
    /// Also used as the idle connection cap of the HTTP client.
    pub max_concurrent: usize,

    /// Batch size used when the photo listing cannot be fetched (default: 5000)
    pub default_photo_count: usize,

    /// User-Agent header sent with every request (default: PhotoFetcher/1.0)
    pub user_agent: String,

    /// Pause between strategies in compare mode (default: 2 seconds)
    pub compare_cooldown: Duration,

    /// Maximum number of photos used in compare mode (default: 100)
    pub compare_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            max_concurrent: 50,
            default_photo_count: 5000,
            user_agent: "PhotoFetcher/1.0".to_string(),
            compare_cooldown: Duration::from_secs(2),
            compare_limit: 100,
        }
    }
}

impl Config {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// URL of the full photo listing
    pub fn photos_url(&self) -> String {
        format!("{}/photos", self.base())
    }

    pub fn photo_url(&self, id: PhotoId) -> String {
        format!("{}/photos/{}", self.base(), id)
    }

    pub fn album_url(&self, album_id: u64) -> String {
        format!("{}/albums/{}", self.base(), album_id)
    }

    /// Reject settings that would make every run fail or hang
    pub fn validate(&self) -> Result<(), FetchError> {
        validate_url(&self.base_url)?;

        if self.max_concurrent == 0 {
            return Err(FetchError::Configuration(
                "max concurrent workers must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(FetchError::Configuration(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        if self.compare_limit == 0 {
            return Err(FetchError::Configuration(
                "compare limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Pool size for a batch: never more workers than items
pub fn worker_count(max_concurrent: usize, limit: usize) -> usize {
    max_concurrent.min(limit)
}

/// Largest batch a caller may request
pub const MAX_PHOTO_COUNT: usize = 1_000_000;

/// Validate a caller supplied batch size: `1..=MAX_PHOTO_COUNT`
///
/// # Examples
///
/// ```rust
/// use photo_fetcher::{validate_photo_count, MAX_PHOTO_COUNT};
///
/// assert_eq!(validate_photo_count(25).unwrap(), 25);
/// assert!(validate_photo_count(0).is_err());
/// assert!(validate_photo_count(-5).is_err());
/// assert!(validate_photo_count(MAX_PHOTO_COUNT as i64 + 1).is_err());
/// ```
pub fn validate_photo_count(requested: i64) -> Result<usize, FetchError> {
    if requested <= 0 {
        return Err(FetchError::Validation(format!(
            "photo count must be a positive number, got {requested}"
        )));
    }

    match usize::try_from(requested) {
        Ok(count) if count <= MAX_PHOTO_COUNT => Ok(count),
        _ => Err(FetchError::Validation(format!(
            "photo count {requested} exceeds the maximum of {MAX_PHOTO_COUNT}"
        ))),
    }
}
