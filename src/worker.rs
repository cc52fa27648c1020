use crate::strategy::result_capacity;
use crate::{
    worker_count, BatchOutcome, ExecutionStrategy, HttpResourceClient, PhotoFetcher, PhotoId,
    ResourceSource, ResultItem, Strategy,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub struct PhotoWorker<S = HttpResourceClient> {
    id: usize,
    fetcher: Arc<PhotoFetcher<S>>,
    is_running: Arc<AtomicBool>,
    processed_count: Arc<AtomicUsize>,
    error_count: Arc<AtomicUsize>,
}

impl<S: ResourceSource + 'static> PhotoWorker<S> {
    pub fn new(id: usize, fetcher: Arc<PhotoFetcher<S>>) -> Self {
        Self {
            id,
            fetcher,
            is_running: Arc::new(AtomicBool::new(false)),
            processed_count: Arc::new(AtomicUsize::new(0)),
            error_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn run_with_shared_receiver(
        &self,
        requests: Arc<Mutex<mpsc::Receiver<PhotoId>>>,
        results: mpsc::Sender<ResultItem>,
    ) {
        debug!("Starting photo worker {}", self.id);
        self.is_running.store(true, Ordering::Relaxed);

        loop {
            // Hold the lock only while waiting for the next id
            let request = {
                let mut receiver = requests.lock().await;
                receiver.recv().await
            };

            let Some(photo_id) = request else { break };

            let result = self.fetcher.fetch_photo_with_album(photo_id).await;

            if result.is_success() {
                self.processed_count.fetch_add(1, Ordering::Relaxed);
            } else {
                self.error_count.fetch_add(1, Ordering::Relaxed);
                debug!("Worker {} recorded a failure for photo {}", self.id, photo_id);
            }

            if let Err(e) = results.send(result).await {
                error!("Worker {} failed to send result: {}", self.id, e);
                break;
            }
        }

        self.is_running.store(false, Ordering::Relaxed);
        debug!("Photo worker {} stopped", self.id);
    }

    pub fn get_stats(&self) -> WorkerStats {
        WorkerStats {
            id: self.id,
            is_running: self.is_running.load(Ordering::Relaxed),
            processed_count: self.processed_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub fn processed_count(&self) -> usize {
        self.processed_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }
}

impl<S> Clone for PhotoWorker<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fetcher: self.fetcher.clone(),
            is_running: self.is_running.clone(),
            processed_count: self.processed_count.clone(),
            error_count: self.error_count.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerStats {
    pub id: usize,
    pub is_running: bool,
    pub processed_count: usize,
    pub error_count: usize,
}

/// Queued ids and undelivered results allowed per worker
const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// Fixed set of worker tasks pulling ids from one shared queue
pub struct WorkerPool<S = HttpResourceClient> {
    workers: Vec<PhotoWorker<S>>,
    request_sender: Option<mpsc::Sender<PhotoId>>,
    result_receiver: mpsc::Receiver<ResultItem>,
    handles: Vec<JoinHandle<()>>,
}

impl<S: ResourceSource + 'static> WorkerPool<S> {
    /// Spawn `worker_count` workers behind bounded request and result queues
    ///
    /// Both queues hold `QUEUE_DEPTH_PER_WORKER` items per worker, so ids
    /// must be submitted while results are being collected.
    pub fn new(worker_count: usize, fetcher: Arc<PhotoFetcher<S>>) -> Self {
        let capacity = (worker_count * QUEUE_DEPTH_PER_WORKER).max(1);
        let (request_sender, request_receiver) = mpsc::channel(capacity);
        let (result_sender, result_receiver) = mpsc::channel(capacity);

        let workers: Vec<PhotoWorker<S>> = (0..worker_count)
            .map(|i| PhotoWorker::new(i, fetcher.clone()))
            .collect();

        let shared_receiver = Arc::new(Mutex::new(request_receiver));

        let handles = workers
            .iter()
            .map(|worker| {
                let worker = worker.clone();
                let rx = shared_receiver.clone();
                let tx = result_sender.clone();

                tokio::spawn(async move {
                    worker.run_with_shared_receiver(rx, tx).await;
                })
            })
            .collect();

        Self {
            workers,
            request_sender: Some(request_sender),
            result_receiver,
            handles,
        }
    }

    pub async fn submit(&self, photo_id: PhotoId) -> bool {
        match &self.request_sender {
            Some(sender) => sender.send(photo_id).await.is_ok(),
            None => false,
        }
    }

    /// Handle for feeding ids from another future
    pub fn request_sender(&self) -> Option<mpsc::Sender<PhotoId>> {
        self.request_sender.clone()
    }

    /// Stop accepting ids; workers exit once the queue drains
    pub fn close(&mut self) {
        self.request_sender.take();
    }

    pub async fn next_result(&mut self) -> Option<ResultItem> {
        self.result_receiver.recv().await
    }

    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Photo worker task ended abnormally: {}", e);
            }
        }
    }

    pub fn get_worker_stats(&self) -> Vec<WorkerStats> {
        self.workers.iter().map(|w| w.get_stats()).collect()
    }

    pub fn total_processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed_count()).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.workers.iter().map(|w| w.error_count()).sum()
    }

    pub fn active_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.is_running()).count()
    }
}

/// Shared-memory fan-out: `min(max_concurrent, limit)` workers, one client
pub struct ThreadPoolStrategy<S = HttpResourceClient> {
    fetcher: Arc<PhotoFetcher<S>>,
}

impl<S: ResourceSource + 'static> ThreadPoolStrategy<S> {
    pub fn new(fetcher: Arc<PhotoFetcher<S>>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<S: ResourceSource + 'static> ExecutionStrategy for ThreadPoolStrategy<S> {
    fn kind(&self) -> Strategy {
        Strategy::Threads
    }

    async fn run(&self, limit: usize) -> BatchOutcome {
        let workers = worker_count(self.fetcher.config().max_concurrent, limit);
        info!("Starting thread pool mode ({} photos, {} workers)...", limit, workers);
        let start = Instant::now();

        if workers == 0 {
            return BatchOutcome {
                strategy: Strategy::Threads,
                results: Vec::new(),
                elapsed: start.elapsed(),
            }
            .finish();
        }

        let mut pool = WorkerPool::new(workers, self.fetcher.clone());
        let requests = pool.request_sender();
        pool.close();

        let submit = async move {
            let Some(requests) = requests else { return };
            for photo_id in 1..=limit as u64 {
                if requests.send(photo_id).await.is_err() {
                    error!("Failed to submit photo {}", photo_id);
                    break;
                }
            }
        };

        // Ends once every worker has exited and dropped its result sender
        let collect = async {
            let mut results = Vec::with_capacity(result_capacity(limit));
            while let Some(result) = pool.next_result().await {
                results.push(result);
            }
            results
        };

        let ((), results) = tokio::join!(submit, collect);

        let elapsed = start.elapsed();
        debug!(
            "Thread pool processed {} ok, {} errors, {} workers still active",
            pool.total_processed(),
            pool.total_errors(),
            pool.active_workers()
        );
        pool.join().await;

        BatchOutcome {
            strategy: Strategy::Threads,
            results,
            elapsed,
        }
        .finish()
    }
}
