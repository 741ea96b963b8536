//! Worker pool
//!
//! Spawns one tokio task per worker. Each task loops on `WorkQueue::take`
//! until the queue closes or the pool is stopped. Cancellation closes the
//! queue, which releases anyone still waiting in `add` or `take`.

use crate::crawler::fetcher::ClientFactory;
use crate::crawler::queue::WorkQueue;
use crate::crawler::worker::{Worker, WorkerContext, WorkerStats};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

pub struct WorkerPool;

impl WorkerPool {
    /// Starts `workers` workers pulling from `queue`
    ///
    /// # Arguments
    ///
    /// * `workers` - Number of worker tasks (at least one is started)
    /// * `queue` - The shared work queue; workers add follow-on work to it
    /// * `clients` - Supplies the HTTP client for each worker slot
    /// * `ctx` - Settings, policies and the result channel
    ///
    /// # Returns
    ///
    /// A handle for stopping the pool and awaiting its tasks
    pub fn start(
        workers: usize,
        queue: Arc<WorkQueue>,
        clients: &dyn ClientFactory,
        ctx: WorkerContext,
    ) -> PoolHandle {
        Self::start_with_token(workers, queue, clients, ctx, CancellationToken::new())
    }

    /// Like [`WorkerPool::start`], stopping when `token` is cancelled
    pub fn start_with_token(
        workers: usize,
        queue: Arc<WorkQueue>,
        clients: &dyn ClientFactory,
        ctx: WorkerContext,
        token: CancellationToken,
    ) -> PoolHandle {
        let workers = workers.max(1);
        tracing::info!("Starting {} workers", workers);

        let tasks = (0..workers)
            .map(|id| {
                let worker = Worker::new(id, clients.client_for(id), ctx.clone(), queue.clone());
                tokio::spawn(run_worker(worker, queue.clone(), token.clone()))
            })
            .collect();

        PoolHandle {
            token,
            queue,
            tasks,
        }
    }
}

async fn run_worker(mut worker: Worker, queue: Arc<WorkQueue>, token: CancellationToken) -> WorkerStats {
    loop {
        let candidate = tokio::select! {
            biased;
            _ = token.cancelled() => {
                queue.close();
                break;
            }
            next = queue.take() => match next {
                Some(candidate) => candidate,
                None => break,
            },
        };
        worker.handle(candidate).await;
    }

    tracing::debug!("Worker {} exiting", worker.id());
    worker.stats()
}

/// Handle to a running pool
pub struct PoolHandle {
    token: CancellationToken,
    queue: Arc<WorkQueue>,
    tasks: Vec<JoinHandle<WorkerStats>>,
}

impl PoolHandle {
    /// Stops every worker after its current item and closes the queue
    ///
    /// Safe to call more than once.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Stopping worker pool");
        }
        self.token.cancel();
        self.queue.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A token that stops the pool when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for all workers to exit and sums their counters
    pub async fn join(self) -> Result<WorkerStats, JoinError> {
        let mut total = WorkerStats::default();
        for task in self.tasks {
            total += task.await?;
        }
        Ok(total)
    }
}
