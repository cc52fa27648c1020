//! Back-to-back strategy comparison
//!
//! Runs each strategy over the same batch size with a cooldown between
//! runs and reports wall-clock timings. Result correctness is not
//! inspected here.

use crate::{format_duration, format_seconds, ExecutionStrategy, TimingResult};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Comparison {
    pub limit: usize,
    /// In run order
    pub timings: Vec<TimingResult>,
}

impl Comparison {
    /// Timings from fastest to slowest
    pub fn ranked(&self) -> Vec<TimingResult> {
        let mut ranked = self.timings.clone();
        ranked.sort_by(|a, b| a.elapsed.cmp(&b.elapsed));
        ranked
    }

    pub fn fastest(&self) -> Option<TimingResult> {
        self.timings.iter().copied().min_by_key(|t| t.elapsed)
    }

    /// Strategy name to elapsed seconds
    pub fn as_map(&self) -> BTreeMap<String, f64> {
        self.timings
            .iter()
            .map(|t| (t.strategy.name().to_string(), t.elapsed_seconds()))
            .collect()
    }

    pub fn log_report(&self) {
        info!("{}", "═".repeat(50));
        info!("COMPARISON FOR {} PHOTOS:", self.limit);
        for timing in self.ranked() {
            info!("{:<12}: {}", timing.strategy.name(), format_seconds(timing.elapsed));
        }

        if let Some(fastest) = self.fastest() {
            info!(
                "Fastest mode: {} ({})",
                fastest.strategy,
                format_seconds(fastest.elapsed)
            );
        }
        info!("{}", "═".repeat(50));
    }
}

pub struct ComparisonHarness {
    strategies: Vec<Box<dyn ExecutionStrategy>>,
    cooldown: Duration,
}

impl ComparisonHarness {
    pub fn new(strategies: Vec<Box<dyn ExecutionStrategy>>, cooldown: Duration) -> Self {
        Self {
            strategies,
            cooldown,
        }
    }

    pub async fn compare(&self, limit: usize) -> Comparison {
        let mut timings = Vec::with_capacity(self.strategies.len());

        for (index, strategy) in self.strategies.iter().enumerate() {
            info!("Running {} mode...", strategy.kind());
            let outcome = strategy.run(limit).await;
            timings.push(outcome.timing());

            let is_last = index + 1 == self.strategies.len();
            if !is_last && !self.cooldown.is_zero() {
                info!("Cooling down for {}", format_duration(self.cooldown));
                sleep(self.cooldown).await;
            }
        }

        Comparison { limit, timings }
    }
}
