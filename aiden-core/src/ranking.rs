use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::external::RawFinding;

/// Weights for scoring collector findings.
///
/// ```text
/// score = type_weight(type) * ( corroboration_weight * ln(1 + corroboration)
///                             + recency_weight * 0.5^(age_hours / half_life) )
/// ```
///
/// Undated findings contribute no recency; future dates count as age zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingPolicy {
    /// Multiplier on the log-scaled corroboration count.
    pub corroboration_weight: f64,
    /// Multiplier on the recency decay term.
    pub recency_weight: f64,
    /// Age in hours at which the recency term halves.
    pub recency_half_life_hours: f64,
    /// Per finding type multipliers. Unlisted types use 1.0.
    pub type_weights: HashMap<String, f64>,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            corroboration_weight: 1.0,
            recency_weight: 1.0,
            recency_half_life_hours: 24.0 * 30.0,
            type_weights: HashMap::new(),
        }
    }
}

/// A collector finding paired with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFinding {
    pub finding: RawFinding,
    pub score: f64,
}

impl RankingPolicy {
    /// Rejects weights that would break monotonicity.
    pub fn validate(&self) -> Result<(), String> {
        let finite_non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be a non-negative number"))
            }
        };

        finite_non_negative("corroboration_weight", self.corroboration_weight)?;
        finite_non_negative("recency_weight", self.recency_weight)?;
        if !(self.recency_half_life_hours.is_finite()
            && self.recency_half_life_hours > 0.0)
        {
            return Err("recency_half_life_hours must be positive".into());
        }
        for (kind, weight) in &self.type_weights {
            finite_non_negative(&format!("type_weights.{kind}"), *weight)?;
        }
        Ok(())
    }

    pub fn type_weight(&self, kind: &str) -> f64 {
        self.type_weights.get(kind).copied().unwrap_or(1.0)
    }

    pub fn score(&self, finding: &RawFinding, now: DateTime<Utc>) -> f64 {
        let corroboration = self.corroboration_weight
            * (1.0 + f64::from(finding.corroboration)).ln();

        let recency = finding.date_found.map_or(0.0, |found| {
            let age_ms = (now - found).num_milliseconds().max(0) as f64;
            let age_hours = age_ms / 3_600_000.0;
            self.recency_weight
                * 0.5_f64.powf(age_hours / self.recency_half_life_hours)
        });

        self.type_weight(&finding.kind) * (corroboration + recency)
    }

    /// Scores every finding, keeping the collector's order.
    pub fn rank(
        &self,
        findings: Vec<RawFinding>,
        now: DateTime<Utc>,
    ) -> Vec<RankedFinding> {
        findings
            .into_iter()
            .map(|finding| {
                let score = self.score(&finding, now);
                RankedFinding { finding, score }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn finding(
        corroboration: u32,
        date_found: Option<DateTime<Utc>>,
    ) -> RawFinding {
        RawFinding {
            module: "sfp_test".into(),
            kind: "EMAILADDR".into(),
            data: "a@b.com".into(),
            date_found,
            corroboration,
        }
    }

    #[test]
    fn score_grows_with_corroboration() {
        let policy = RankingPolicy::default();
        let now = Utc::now();
        let mut previous = f64::NEG_INFINITY;
        for count in [0, 1, 2, 5, 40, 1_000] {
            let score = policy.score(&finding(count, None), now);
            assert!(score >= previous, "{count}: {score} < {previous}");
            previous = score;
        }
    }

    #[test]
    fn score_grows_with_recency() {
        let policy = RankingPolicy::default();
        let now = Utc::now();
        let old = policy.score(&finding(1, Some(now - Duration::days(90))), now);
        let recent = policy.score(&finding(1, Some(now - Duration::hours(1))), now);
        let undated = policy.score(&finding(1, None), now);
        assert!(recent > old);
        assert!(old > undated);
    }

    #[test]
    fn future_dates_count_as_now() {
        let policy = RankingPolicy::default();
        let now = Utc::now();
        let future = policy.score(&finding(0, Some(now + Duration::days(3))), now);
        let present = policy.score(&finding(0, Some(now)), now);
        assert!((future - present).abs() < 1e-12);
        assert!((present - 1.0).abs() < 1e-12);
    }

    #[test]
    fn half_life_halves_recency() {
        let policy = RankingPolicy {
            corroboration_weight: 0.0,
            recency_half_life_hours: 10.0,
            ..RankingPolicy::default()
        };
        let now = Utc::now();
        let score =
            policy.score(&finding(3, Some(now - Duration::hours(10))), now);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn type_weights_scale_scores() {
        let mut policy = RankingPolicy::default();
        policy.type_weights.insert("EMAILADDR".into(), 2.0);
        let now = Utc::now();
        let base = RankingPolicy::default().score(&finding(4, None), now);
        assert!((policy.score(&finding(4, None), now) - 2.0 * base).abs() < 1e-12);
        assert_eq!(policy.type_weight("DOMAIN"), 1.0);
    }

    #[test]
    fn validate_rejects_negative_weights() {
        let mut policy = RankingPolicy::default();
        assert!(policy.validate().is_ok());
        policy.recency_weight = -1.0;
        assert!(policy.validate().is_err());

        let mut policy = RankingPolicy::default();
        policy.recency_half_life_hours = 0.0;
        assert!(policy.validate().is_err());

        let mut policy = RankingPolicy::default();
        policy.type_weights.insert("DOMAIN".into(), f64::NAN);
        assert!(policy.validate().is_err());
    }
}
