use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::orchestrator::{ExecuteOutcome, ScanOrchestrator};

/// Fixed-size pool of tasks pulling scan jobs off the orchestrator queue.
#[derive(Debug)]
pub struct WorkerPool {
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `orchestrator.config().workers` workers on the current runtime.
    pub fn spawn(orchestrator: Arc<ScanOrchestrator>) -> Self {
        let shutdown = CancellationToken::new();
        let count = orchestrator.config().workers.max(1);
        let handles = (0..count)
            .map(|index| {
                let worker_id = format!("scan-w{index}");
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&orchestrator),
                    shutdown.clone(),
                ))
            })
            .collect();

        info!(target: "aiden::queue", workers = count, "scan workers started");
        Self { shutdown, handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop the workers once the queue is empty. Close the queue first so
    /// already accepted jobs are drained; waits up to `grace` per worker.
    /// Jobs still queued after that stay `pending` and are picked up by
    /// [`ScanOrchestrator::recover`] on the next start.
    pub async fn shutdown(self, grace: Duration) {
        info!(target: "aiden::queue", "stopping scan workers");
        self.shutdown.cancel();

        for handle in self.handles {
            match tokio::time::timeout(grace, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(target: "aiden::queue", "worker task failed: {e}")
                }
                Err(_) => warn!(
                    target: "aiden::queue",
                    "worker did not stop within the grace period"
                ),
            }
        }
    }
}

async fn run_worker(
    worker_id: String,
    orchestrator: Arc<ScanOrchestrator>,
    shutdown: CancellationToken,
) {
    let queue = Arc::clone(orchestrator.queue());
    loop {
        // Queued jobs win over shutdown; cancellation only stops an idle
        // worker, after a last non-blocking look at the queue.
        let job = tokio::select! {
            biased;
            job = queue.dequeue() => job,
            _ = shutdown.cancelled() => queue.try_dequeue(),
        };
        let Some(job) = job else {
            break;
        };

        match orchestrator.execute(job.scan_id).await {
            Ok(ExecuteOutcome::Finished { findings }) => info!(
                target: "aiden::queue",
                worker = %worker_id,
                job_id = %job.id,
                scan_id = %job.scan_id,
                findings,
                "job completed"
            ),
            Ok(ExecuteOutcome::Failed { reason }) => warn!(
                target: "aiden::queue",
                worker = %worker_id,
                job_id = %job.id,
                scan_id = %job.scan_id,
                %reason,
                "job failed"
            ),
            Ok(ExecuteOutcome::Skipped) => {}
            Err(err) => error!(
                target: "aiden::queue",
                worker = %worker_id,
                job_id = %job.id,
                scan_id = %job.scan_id,
                error = %err,
                "job could not be recorded"
            ),
        }
    }
    info!(target: "aiden::queue", worker = %worker_id, "worker stopped");
}
