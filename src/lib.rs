//! # Photo Fetcher
//!
//! Retrieves photo records and the album each one belongs to from a
//! paginated JSON REST API (JSONPlaceholder by default) and compares three
//! ways of fanning the work out: one request at a time, a bounded pool of
//! worker tasks sharing one HTTP client, and a bounded pool of worker
//! processes that each build their own client.
//!
//! Every strategy runs the same unit of work, [`PhotoFetcher::fetch_photo_with_album`],
//! over ids `1..=limit` and returns one [`ResultItem`] per id. Per-photo
//! failures are data, never aborts.
//!
//! ## Benchmarks
//!
//! ```bash
//! # Unit benchmarks only (no network)
//! cargo bench
//!
//! # Include a live sequential run against the configured API
//! cargo bench --features integration_benchmarks
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use photo_fetcher::{Config, PhotoFetcher, SequentialStrategy, ExecutionStrategy};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Arc::new(PhotoFetcher::new(Config::default())?);
//!     let outcome = SequentialStrategy::new(fetcher).run(10).await;
//!
//!     let summary = outcome.summary();
//!     println!("{} ok, {} errors", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! photo-fetcher --mode sequential --photos 100
//! photo-fetcher --mode threads --log-level DEBUG
//! photo-fetcher --mode compare --photos 50 --log-file run.log
//! ```

/// Configuration and settings for the photo fetcher
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// Wire and result types for photos and albums
pub mod photo;

/// HTTP access to the remote API
pub mod client;

/// The per-photo unit of work and total-count discovery
pub mod fetcher;

/// Strategy trait and the sequential baseline
pub mod strategy;

/// Worker task pool backing the thread pool strategy
pub mod worker;

/// Worker process pool backing the process pool strategy
pub mod process_pool;

/// Side-by-side timing of all strategies
pub mod harness;

/// Command-line interface implementation
pub mod cli;

/// Fetch and batch metrics
pub mod metrics;

/// Utility functions and helpers
pub mod utils;


pub use cli::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use fetcher::*;
pub use harness::*;
pub use photo::*;
pub use process_pool::*;
pub use strategy::*;
pub use utils::*;
pub use worker::*;
