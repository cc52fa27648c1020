//! Two-hop photo fetching and total count discovery
//!
//! `PhotoFetcher` turns one photo id into one `ResultItem`: the photo is
//! fetched first, then the album named by its `albumId`. Any failure on
//! either hop is contained in an `ErrorRecord` so batches never abort.

use crate::{
    metrics, AlbumResponse, Config, FetchError, HttpResourceClient, PhotoId, PhotoRecord,
    PhotoResponse, ResourceSource, ResultItem,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Fetches photos joined with their album
///
/// # Examples
///
/// ```rust,no_run
/// use photo_fetcher::{Config, PhotoFetcher, ResultItem};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let fetcher = PhotoFetcher::new(Config::default())?;
///
///     match fetcher.fetch_photo_with_album(1).await {
///         ResultItem::Photo(photo) => println!("{} in album {}", photo.title, photo.album.title),
///         ResultItem::Error(failure) => println!("photo {} failed: {}", failure.id, failure.error),
///     }
///     Ok(())
/// }
/// ```
pub struct PhotoFetcher<S = HttpResourceClient> {
    source: S,
    config: Config,
}

impl PhotoFetcher<HttpResourceClient> {
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let source = HttpResourceClient::new(&config)?;
        Ok(Self::with_source(source, config))
    }
}

impl<S: ResourceSource> PhotoFetcher<S> {
    pub fn with_source(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch one photo and its album. Never fails: errors become `ResultItem::Error`.
    pub async fn fetch_photo_with_album(&self, id: PhotoId) -> ResultItem {
        let start = Instant::now();

        match self.try_fetch(id).await {
            Ok(record) => {
                metrics::record_fetch(start.elapsed(), true);
                debug!("Fetched photo {} from album {}", id, record.album.id);
                ResultItem::Photo(record)
            }
            Err(e) => {
                metrics::record_fetch(start.elapsed(), false);
                metrics::record_error(e.kind());
                error!("Error processing photo {}: {}", id, e);
                ResultItem::failed(id, e)
            }
        }
    }

    async fn try_fetch(&self, id: PhotoId) -> Result<PhotoRecord, FetchError> {
        let photo_url = self.config.photo_url(id);
        let photo: PhotoResponse = decode(&photo_url, self.source.fetch(&photo_url).await?)?;

        let album_url = self.config.album_url(photo.album_id);
        let album: AlbumResponse = decode(&album_url, self.source.fetch(&album_url).await?)?;

        Ok(PhotoRecord::assemble(id, photo, album))
    }

    /// Number of photos the API currently lists, or the configured default
    pub async fn discover_total_count(&self) -> usize {
        match self.fetch_listing_len().await {
            Ok(count) => {
                info!("API lists {} photos", count);
                count
            }
            Err(e) => {
                warn!(
                    "{}; using default photo count {}",
                    e, self.config.default_photo_count
                );
                self.config.default_photo_count
            }
        }
    }

    async fn fetch_listing_len(&self) -> Result<usize, FetchError> {
        let url = self.config.photos_url();
        let listing = self
            .source
            .fetch(&url)
            .await
            .map_err(|e| FetchError::ListingUnavailable(e.to_string()))?;

        match listing {
            Value::Array(photos) => Ok(photos.len()),
            other => Err(FetchError::ListingUnavailable(format!(
                "expected a JSON array from {url}, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|e| FetchError::MalformedResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
