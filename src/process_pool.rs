//! Isolated-memory fan-out over child processes
//!
//! The parent re-executes a binary exposing the hidden `worker`
//! subcommand once per pool slot. Each child receives one [`WorkerJob`] as
//! JSON on stdin, builds its own HTTP client from the job's config, and
//! streams one JSON [`ResultItem`] per line on stdout. Chunks are
//! contiguous, so joining the children in spawn order restores
//! submission order.

use crate::{
    worker_count, BatchOutcome, Config, ExecutionStrategy, FetchError, LogLevel, PhotoFetcher,
    PhotoId, ResultItem, Strategy,
};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Work order handed to one worker process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerJob {
    pub job_id: Uuid,
    pub config: Config,
    pub ids: Vec<PhotoId>,
}

/// Split ids `1..=limit` into at most `workers` contiguous, near-equal chunks
///
/// # Examples
///
/// ```rust
/// use photo_fetcher::partition_ids;
///
/// assert_eq!(partition_ids(5, 2), vec![vec![1, 2, 3], vec![4, 5]]);
/// assert!(partition_ids(0, 4).is_empty());
/// ```
pub fn partition_ids(limit: usize, workers: usize) -> Vec<Vec<PhotoId>> {
    if limit == 0 || workers == 0 {
        return Vec::new();
    }

    let workers = workers.min(limit);
    let base = limit / workers;
    let extra = limit % workers;

    let mut chunks = Vec::with_capacity(workers);
    let mut next: PhotoId = 1;
    for i in 0..workers {
        let size = base + usize::from(i < extra);
        let chunk: Vec<PhotoId> = (next..next + size as u64).collect();
        next += size as u64;
        chunks.push(chunk);
    }
    chunks
}

pub struct ProcessPool {
    config: Config,
    program: PathBuf,
    log_level: Option<LogLevel>,
}

impl ProcessPool {
    /// Pool whose workers are the currently running executable
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let program = std::env::current_exe()?;
        Ok(Self::with_program(config, program))
    }

    pub fn with_program(config: Config, program: impl Into<PathBuf>) -> Self {
        Self {
            config,
            program: program.into(),
            log_level: None,
        }
    }

    /// Forward a log level to every worker process
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Fetch ids `1..=limit` across the pool, results in id order
    pub async fn fetch_all(&self, limit: usize) -> Vec<ResultItem> {
        let workers = worker_count(self.config.max_concurrent, limit);
        let jobs = partition_ids(limit, workers).into_iter().map(|ids| WorkerJob {
            job_id: Uuid::new_v4(),
            config: self.config.clone(),
            ids,
        });

        join_all(jobs.map(|job| self.run_job(job)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn run_job(&self, job: WorkerJob) -> Vec<ResultItem> {
        let ids = job.ids.clone();

        match self.spawn_and_collect(&job).await {
            Ok(reported) => reconcile(job.job_id, &ids, reported),
            Err(e) => {
                error!("Worker job {} failed: {}", job.job_id, e);
                ids.iter().map(|&id| ResultItem::failed(id, &e)).collect()
            }
        }
    }

    async fn spawn_and_collect(&self, job: &WorkerJob) -> Result<Vec<ResultItem>, FetchError> {
        let mut command = Command::new(&self.program);
        if let Some(level) = self.log_level {
            command.arg("--log-level").arg(level.as_arg());
        }
        command
            .arg("worker")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            FetchError::Worker(format!("failed to spawn {}: {}", self.program.display(), e))
        })?;
        debug!(
            "Spawned worker {:?} for job {} ({} photos)",
            child.id(),
            job.job_id,
            job.ids.len()
        );

        let payload = serde_json::to_vec(job)?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| FetchError::Worker("worker stdin was not captured".to_string()))?;
        stdin.write_all(&payload).await?;
        stdin.shutdown().await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            warn!("Worker for job {} exited with {}", job.job_id, output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut reported = Vec::with_capacity(job.ids.len());
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<ResultItem>(line) {
                Ok(item) => reported.push(item),
                Err(e) => warn!("Discarding unreadable worker output line: {}", e),
            }
        }

        if reported.is_empty() && !job.ids.is_empty() && !output.status.success() {
            return Err(FetchError::Worker(format!(
                "worker exited with {} before reporting any result",
                output.status
            )));
        }

        Ok(reported)
    }
}

/// Exactly one result per requested id, in request order
fn reconcile(job_id: Uuid, ids: &[PhotoId], reported: Vec<ResultItem>) -> Vec<ResultItem> {
    let mut by_id: HashMap<PhotoId, ResultItem> = HashMap::with_capacity(reported.len());
    for item in reported {
        by_id.entry(item.id()).or_insert(item);
    }

    ids.iter()
        .map(|&id| {
            by_id.remove(&id).unwrap_or_else(|| {
                ResultItem::failed(
                    id,
                    FetchError::Worker(format!("job {job_id} returned no result for photo {id}")),
                )
            })
        })
        .collect()
}

/// Body of the `worker` subcommand: read one job, stream results
///
/// Returns the number of results written.
pub async fn serve_worker<R, W>(mut input: R, mut output: W) -> Result<usize, FetchError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = String::new();
    input.read_to_string(&mut raw).await?;
    let job: WorkerJob = serde_json::from_str(&raw)?;

    debug!(
        "Worker {} starting job {} ({} photos)",
        std::process::id(),
        job.job_id,
        job.ids.len()
    );

    let fetcher = PhotoFetcher::new(job.config)?;
    let mut written = 0;
    for id in job.ids {
        let item = fetcher.fetch_photo_with_album(id).await;
        let mut line = serde_json::to_vec(&item)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        written += 1;
    }
    output.flush().await?;

    Ok(written)
}

/// Isolated-memory fan-out: `min(max_concurrent, limit)` worker processes
pub struct ProcessPoolStrategy {
    pool: ProcessPool,
}

impl ProcessPoolStrategy {
    pub fn new(pool: ProcessPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionStrategy for ProcessPoolStrategy {
    fn kind(&self) -> Strategy {
        Strategy::Processes
    }

    async fn run(&self, limit: usize) -> BatchOutcome {
        info!(
            "Starting process pool mode ({} photos, {} processes)...",
            limit,
            worker_count(self.pool.config.max_concurrent, limit)
        );
        let start = Instant::now();
        let results = self.pool.fetch_all(limit).await;

        BatchOutcome {
            strategy: Strategy::Processes,
            results,
            elapsed: start.elapsed(),
        }
        .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_ids_is_contiguous_and_complete() {
        let chunks = partition_ids(103, 50);
        assert_eq!(chunks.len(), 50);
        assert_eq!(chunks[0], vec![1, 2, 3]);
        assert_eq!(chunks[3], vec![10, 11]);

        let flat: Vec<PhotoId> = chunks.into_iter().flatten().collect();
        assert_eq!(flat, (1..=103).collect::<Vec<PhotoId>>());
    }

    #[test]
    fn test_partition_ids_never_exceeds_limit() {
        let chunks = partition_ids(3, 50);
        assert_eq!(chunks, vec![vec![1], vec![2], vec![3]]);
        assert!(partition_ids(10, 0).is_empty());
    }

    #[test]
    fn test_reconcile_fills_gaps_and_drops_duplicates() {
        let job_id = Uuid::new_v4();
        let reported = vec![
            ResultItem::failed(3, "boom"),
            ResultItem::failed(1, "first"),
            ResultItem::failed(1, "duplicate"),
            ResultItem::failed(42, "not requested"),
        ];

        let items = reconcile(job_id, &[1, 2, 3], reported);
        let ids: Vec<PhotoId> = items.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        match &items[0] {
            ResultItem::Error(record) => assert_eq!(record.error, "first"),
            other => panic!("unexpected {other:?}"),
        }
        match &items[1] {
            ResultItem::Error(record) => assert!(record.error.contains("no result for photo 2")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_worker_binary_yields_error_records() {
        let pool = ProcessPool::with_program(Config::default(), "/nonexistent/photo-fetcher");
        let results = pool.fetch_all(4).await;

        let ids: Vec<PhotoId> = results.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(results.iter().all(|r| !r.is_success()));
    }

    #[tokio::test]
    async fn test_zero_limit_spawns_no_process() {
        let strategy = ProcessPoolStrategy::new(ProcessPool::with_program(
            Config::default(),
            "/nonexistent/photo-fetcher",
        ));
        let outcome = strategy.run(0).await;

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.strategy, Strategy::Processes);
        assert!(outcome.elapsed < std::time::Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_serve_worker_rejects_garbage_job() {
        let mut out = Vec::new();
        let result = serve_worker(&b"not json"[..], &mut out).await;

        assert!(matches!(result, Err(FetchError::Serialization(_))));
        assert!(out.is_empty());
    }
}
