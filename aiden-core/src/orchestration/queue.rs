use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use super::job::ScanJob;
use crate::error::{AidenError, Result};

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Fails when the queue is closed or full.
    async fn enqueue(&self, job: ScanJob) -> Result<()>;

    /// Like [`TaskQueue::enqueue`] but waits for room instead of failing
    /// when full. Still fails once the queue is closed.
    async fn enqueue_wait(&self, job: ScanJob) -> Result<()> {
        self.enqueue(job).await
    }

    /// Next job, waiting if the queue supports it. `None` once the queue is
    /// closed and drained, or immediately when a non-blocking queue is
    /// empty.
    async fn dequeue(&self) -> Option<ScanJob>;

    /// Next job without waiting.
    fn try_dequeue(&self) -> Option<ScanJob>;

    /// Refuse further jobs. Already queued jobs remain available.
    fn close(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded in-process queue backed by a tokio channel.
#[derive(Debug)]
pub struct ChannelQueue {
    sender: StdMutex<Option<mpsc::Sender<ScanJob>>>,
    receiver: Mutex<mpsc::Receiver<ScanJob>>,
    capacity: usize,
    /// Jobs sent but not yet received. Kept apart from the sender so it
    /// stays accurate after `close` drops it.
    depth: AtomicUsize,
}

impl ChannelQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            sender: StdMutex::new(Some(tx)),
            receiver: Mutex::new(rx),
            capacity: capacity.max(1),
            depth: AtomicUsize::new(0),
        }
    }

    fn sender(&self) -> Option<mpsc::Sender<ScanJob>> {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn note_dequeued(&self, received: bool) {
        if received {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl TaskQueue for ChannelQueue {
    async fn enqueue(&self, job: ScanJob) -> Result<()> {
        let sender = self
            .sender()
            .ok_or_else(|| AidenError::Internal("scan queue is closed".into()))?;
        self.depth.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = sender.try_send(job) {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(match err {
                mpsc::error::TrySendError::Full(_) => AidenError::Internal(
                    format!("scan queue is full ({} jobs)", self.capacity),
                ),
                mpsc::error::TrySendError::Closed(_) => {
                    AidenError::Internal("scan queue is closed".into())
                }
            });
        }
        debug!(target: "aiden::queue", depth = self.len(), "job enqueued");
        Ok(())
    }

    async fn enqueue_wait(&self, job: ScanJob) -> Result<()> {
        let sender = self
            .sender()
            .ok_or_else(|| AidenError::Internal("scan queue is closed".into()))?;
        self.depth.fetch_add(1, Ordering::SeqCst);
        if sender.send(job).await.is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(AidenError::Internal("scan queue is closed".into()));
        }
        Ok(())
    }

    async fn dequeue(&self) -> Option<ScanJob> {
        let job = self.receiver.lock().await.recv().await;
        self.note_dequeued(job.is_some());
        job
    }

    fn try_dequeue(&self) -> Option<ScanJob> {
        let job = self.receiver.try_lock().ok()?.try_recv().ok();
        self.note_dequeued(job.is_some());
        job
    }

    fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }

    fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Queue drained explicitly by the caller. Never blocks.
#[derive(Debug, Default)]
pub struct ManualQueue {
    state: StdMutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    jobs: VecDeque<ScanJob>,
    closed: bool,
}

impl ManualQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ManualState) -> T) -> T {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }
}

#[async_trait]
impl TaskQueue for ManualQueue {
    async fn enqueue(&self, job: ScanJob) -> Result<()> {
        self.with_state(|state| {
            if state.closed {
                return Err(AidenError::Internal("scan queue is closed".into()));
            }
            state.jobs.push_back(job);
            Ok(())
        })
    }

    async fn dequeue(&self) -> Option<ScanJob> {
        self.try_dequeue()
    }

    fn try_dequeue(&self) -> Option<ScanJob> {
        self.with_state(|state| state.jobs.pop_front())
    }

    fn close(&self) {
        self.with_state(|state| state.closed = true);
    }

    fn len(&self) -> usize {
        self.with_state(|state| state.jobs.len())
    }
}
