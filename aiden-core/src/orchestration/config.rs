use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ranking::RankingPolicy;

/// Tuning knobs for the scan pipeline.
///
/// Every field has a default so partial configuration files are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Number of concurrent scan workers.
    pub workers: usize,
    /// Maximum queued scans before new requests are refused.
    pub queue_capacity: usize,
    /// Findings forwarded to the content generator per scan email.
    pub email_top_n: usize,
    /// Scoring weights applied to collector findings.
    pub ranking: RankingPolicy,
    /// Retry policy for collector calls.
    pub retry: RetryConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
            email_top_n: 20,
            ranking: RankingPolicy::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".into());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1".into());
        }
        if self.email_top_n == 0 {
            return Err("email_top_n must be at least 1".into());
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".into());
        }
        self.ranking.validate()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total collector attempts per scan; 1 disables retries.
    pub max_attempts: u16,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_base_ms: 2_000,
            backoff_max_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`
    /// capped at `backoff_max_ms`.
    pub fn delay_for(&self, attempt: u16) -> Duration {
        let exponent = u32::from(attempt.saturating_sub(1)).min(32);
        let millis = self
            .backoff_base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.backoff_max_ms);
        Duration::from_millis(millis)
    }
}
