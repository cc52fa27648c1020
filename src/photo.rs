//! Photo, album and batch result types
//!
//! Wire structs mirror the API's JSON; record types are what the fetcher
//! produces and what worker processes stream back to the parent.

use crate::Strategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 1-based identifier assigned by the remote API
pub type PhotoId = u64;

/// `GET /photos/{id}` response body
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoResponse {
    pub id: PhotoId,
    pub title: String,
    pub url: String,
    #[serde(rename = "albumId")]
    pub album_id: u64,
}

/// `GET /albums/{id}` response body
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumResponse {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: u64,
    pub title: String,
}

/// A photo joined with the album it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub title: String,
    pub url: String,
    pub album: AlbumSummary,
}

impl PhotoRecord {
    /// Join both hops. The record keeps the id that was asked for.
    pub fn assemble(id: PhotoId, photo: PhotoResponse, album: AlbumResponse) -> Self {
        Self {
            id,
            title: photo.title,
            url: photo.url,
            album: AlbumSummary {
                id: album.id,
                title: album.title,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: PhotoId,
    pub error: String,
}

/// Outcome for one id: exactly one of a record or an error
///
/// Serialized untagged, so the JSON is either `{id, title, url, album}`
/// or `{id, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultItem {
    Photo(PhotoRecord),
    Error(ErrorRecord),
}

impl ResultItem {
    pub fn failed(id: PhotoId, error: impl ToString) -> Self {
        ResultItem::Error(ErrorRecord {
            id,
            error: error.to_string(),
        })
    }

    pub fn id(&self) -> PhotoId {
        match self {
            ResultItem::Photo(record) => record.id,
            ResultItem::Error(record) => record.id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultItem::Photo(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ResultItem]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

/// Wall-clock time of one strategy run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingResult {
    pub strategy: Strategy,
    pub elapsed: Duration,
}

impl TimingResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}
