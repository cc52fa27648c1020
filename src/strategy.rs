//! Interchangeable execution strategies
//!
//! Every strategy maps "fetch photo i" over ids `1..=limit`, returns all
//! results and the wall-clock time from just before dispatch to just after
//! the last result is collected.

use crate::{
    metrics, BatchSummary, HttpResourceClient, PhotoFetcher, ResourceSource, ResultItem,
    TimingResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// One fetch at a time, results in id order
    Sequential,
    /// Bounded pool of worker tasks sharing one client, results in completion order
    Threads,
    /// Bounded pool of worker processes with their own clients, results in id order
    Processes,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Sequential, Strategy::Threads, Strategy::Processes];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Sequential => "Sequential",
            Strategy::Threads => "Threads",
            Strategy::Processes => "Processes",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything one strategy run produced
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub strategy: Strategy,
    pub results: Vec<ResultItem>,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_results(&self.results)
    }

    pub fn timing(&self) -> TimingResult {
        TimingResult {
            strategy: self.strategy,
            elapsed: self.elapsed,
        }
    }

    /// Log the completion line and record batch metrics
    pub(crate) fn finish(self) -> Self {
        let summary = self.summary();
        metrics::record_batch(self.strategy, self.elapsed, &summary);
        info!(
            "{} run finished: {} ok, {} errors in {:.2}s",
            self.strategy,
            summary.succeeded,
            summary.failed,
            self.elapsed.as_secs_f64()
        );
        self
    }
}

/// Results reserved up front; larger batches grow as they go
const PREALLOCATED_RESULTS: usize = 4096;

pub(crate) fn result_capacity(limit: usize) -> usize {
    limit.min(PREALLOCATED_RESULTS)
}

#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    fn kind(&self) -> Strategy;

    async fn run(&self, limit: usize) -> BatchOutcome;
}

/// Baseline strategy: ids `1..=limit` fetched in order, one at a time
pub struct SequentialStrategy<S = HttpResourceClient> {
    fetcher: Arc<PhotoFetcher<S>>,
}

impl<S: ResourceSource> SequentialStrategy<S> {
    pub fn new(fetcher: Arc<PhotoFetcher<S>>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<S: ResourceSource + 'static> ExecutionStrategy for SequentialStrategy<S> {
    fn kind(&self) -> Strategy {
        Strategy::Sequential
    }

    async fn run(&self, limit: usize) -> BatchOutcome {
        info!("Starting sequential mode ({} photos)...", limit);
        let start = Instant::now();

        let mut results = Vec::with_capacity(result_capacity(limit));
        for id in 1..=limit as u64 {
            results.push(self.fetcher.fetch_photo_with_album(id).await);
        }

        BatchOutcome {
            strategy: Strategy::Sequential,
            results,
            elapsed: start.elapsed(),
        }
        .finish()
    }
}
