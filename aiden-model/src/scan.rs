use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::ModelError,
    ids::{FindingId, ScanId},
};

/// Lifecycle of a scan request.
///
/// `Pending` is the initial state; `Finished` and `Error` are terminal. The
/// only edges are `Pending -> Running`, `Running -> Finished`,
/// `Running -> Error`, plus `Pending -> Error` when a freshly created request
/// could not be handed to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Running,
    Finished,
    Error,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Finished => "finished",
            ScanStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Finished | ScanStatus::Error)
    }

    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (ScanStatus::Pending, ScanStatus::Running)
                | (ScanStatus::Pending, ScanStatus::Error)
                | (ScanStatus::Running, ScanStatus::Finished)
                | (ScanStatus::Running, ScanStatus::Error)
        )
    }

    /// Validate an edge, returning the target state on success.
    pub fn transition(
        self,
        next: ScanStatus,
    ) -> Result<ScanStatus, ModelError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ModelError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "running" => Ok(ScanStatus::Running),
            "finished" => Ok(ScanStatus::Finished),
            "error" => Ok(ScanStatus::Error),
            other => Err(ModelError::UnknownVariant {
                kind: "scan status",
                value: other.to_string(),
            }),
        }
    }
}

/// One OSINT scan against a single subject email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub id: ScanId,
    pub email: String,
    pub consent: bool,
    pub status: ScanStatus,
    /// Diagnostic cause recorded when the scan ends in `error`.
    pub failure_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted finding. `data` holds whatever the caller is allowed to see:
/// ciphertext when read straight from storage, plaintext once decrypted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: FindingId,
    pub scan_id: ScanId,
    pub module: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
    pub date_found: Option<DateTime<Utc>>,
    pub corroboration: u32,
    pub score: f64,
}

impl Finding {
    /// Descending score, ascending id for ties.
    pub fn rank_order(a: &Finding, b: &Finding) -> std::cmp::Ordering {
        b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_have_no_exits() {
        for terminal in [ScanStatus::Finished, ScanStatus::Error] {
            for next in [
                ScanStatus::Pending,
                ScanStatus::Running,
                ScanStatus::Finished,
                ScanStatus::Error,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn forward_edges_are_allowed() {
        assert_eq!(
            ScanStatus::Pending.transition(ScanStatus::Running),
            Ok(ScanStatus::Running)
        );
        assert!(ScanStatus::Running.can_transition_to(ScanStatus::Finished));
        assert!(ScanStatus::Running.can_transition_to(ScanStatus::Error));
    }

    #[test]
    fn skipping_running_is_rejected() {
        let err = ScanStatus::Pending
            .transition(ScanStatus::Finished)
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidTransition {
                from: "pending".into(),
                to: "finished".into()
            }
        );
        assert!(!ScanStatus::Running.can_transition_to(ScanStatus::Pending));
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ScanStatus::Pending,
            ScanStatus::Running,
            ScanStatus::Finished,
            ScanStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<ScanStatus>(), Ok(status));
        }
        assert!("done".parse::<ScanStatus>().is_err());
    }

    #[test]
    fn rank_order_breaks_ties_by_id() {
        let base = Finding {
            id: FindingId(2),
            scan_id: ScanId(1),
            module: "m".into(),
            kind: "email".into(),
            data: "x".into(),
            date_found: None,
            corroboration: 1,
            score: 1.0,
        };
        let mut tied = base.clone();
        tied.id = FindingId(1);
        let mut higher = base.clone();
        higher.id = FindingId(3);
        higher.score = 2.0;

        let mut rows = vec![base, tied, higher];
        rows.sort_by(Finding::rank_order);
        let ids: Vec<i64> = rows.iter().map(|f| f.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
