//! Asynchronous scan pipeline: job queue, worker pool and the orchestrator
//! that owns the scan state machine.

pub mod config;
pub mod job;
pub mod orchestrator;
pub mod queue;
pub mod worker;

pub use config::{OrchestratorConfig, RetryConfig};
pub use job::{JobId, ScanJob};
pub use orchestrator::{
    ExecuteOutcome, INTERRUPTED_REASON, RecoveryReport, ScanOrchestrator,
    ScanResults,
};
pub use queue::{ChannelQueue, ManualQueue, TaskQueue};
pub use worker::WorkerPool;
