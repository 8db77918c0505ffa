use aiden_model::OsintStatus;
use chrono::{DateTime, Duration, Utc};

/// Window in which a completed OSINT lookup is reused instead of calling the
/// collector again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    window: Duration,
}

impl Default for FreshnessWindow {
    fn default() -> Self {
        Self::hours(24)
    }
}

impl FreshnessWindow {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Fresh iff the lookup completed and `now - last_run < window`. An entry
    /// exactly at the edge is stale.
    pub fn is_fresh(
        &self,
        status: OsintStatus,
        last_run: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        match (status, last_run) {
            (OsintStatus::Completed, Some(at)) => now - at < self.window,
            _ => false,
        }
    }
}
