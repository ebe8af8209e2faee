use crate::checklist::{ChecklistSweep, Severity};
use cadre_core::Payload;
use serde::{Deserialize, Serialize};

/// Turns a checklist sweep into a quality score in `[0, 1]`.
///
/// The QA agent rejects any score outside that range as a broken scorer.
pub trait QualityScorer: Send + Sync {
    fn score(&self, sweep: &ChecklistSweep, task_data: &Payload, result: &Payload) -> f64;
}

/// Pass counts behind a [`WeightedSeverityScorer`] score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub high_total: usize,
    pub high_passed: usize,
    pub base_total: usize,
    pub base_passed: usize,
}

impl ScoreBreakdown {
    pub fn from_sweep(sweep: &ChecklistSweep) -> Self {
        let mut breakdown = Self::default();
        for check in &sweep.checks {
            let passed = usize::from(check.outcome.passed);
            if check.outcome.severity == Severity::High {
                breakdown.high_total += 1;
                breakdown.high_passed += passed;
            } else {
                breakdown.base_total += 1;
                breakdown.base_passed += passed;
            }
        }
        breakdown
    }

    /// Pass ratio of the low/medium checks; 1.0 when there are none.
    pub fn base_score(&self) -> f64 {
        if self.base_total == 0 {
            1.0
        } else {
            self.base_passed as f64 / self.base_total as f64
        }
    }

    /// Pass ratio of the high-severity checks, if any ran.
    pub fn high_score(&self) -> Option<f64> {
        (self.high_total > 0).then(|| self.high_passed as f64 / self.high_total as f64)
    }
}

/// Default scorer: `0.4 * base + 0.6 * high`, or `base` alone when no
/// high-severity check ran. Clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSeverityScorer {
    pub base_weight: f64,
    pub high_weight: f64,
}

impl Default for WeightedSeverityScorer {
    fn default() -> Self {
        Self {
            base_weight: 0.4,
            high_weight: 0.6,
        }
    }
}

impl QualityScorer for WeightedSeverityScorer {
    fn score(&self, sweep: &ChecklistSweep, _task_data: &Payload, _result: &Payload) -> f64 {
        let breakdown = ScoreBreakdown::from_sweep(sweep);
        let base = breakdown.base_score();
        let score = match breakdown.high_score() {
            Some(high) => base * self.base_weight + high * self.high_weight,
            None => base,
        };
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::CheckOutcome;

    fn sweep(checks: &[(Severity, bool)]) -> ChecklistSweep {
        let mut sweep = ChecklistSweep::default();
        for (i, (severity, passed)) in checks.iter().enumerate() {
            sweep.record(
                "cat",
                &format!("item-{i}"),
                CheckOutcome::check(*passed, *severity, "check"),
            );
        }
        sweep
    }

    fn score(checks: &[(Severity, bool)]) -> f64 {
        WeightedSeverityScorer::default().score(&sweep(checks), &Payload::new(), &Payload::new())
    }

    #[test]
    fn test_no_checks_scores_one() {
        assert_eq!(score(&[]), 1.0);
    }

    #[test]
    fn test_half_high_passes_scores_point_seven() {
        let s = score(&[
            (Severity::High, true),
            (Severity::High, false),
            (Severity::Low, true),
            (Severity::Medium, true),
            (Severity::Low, true),
        ]);
        assert!((s - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_all_high_passes_scores_one() {
        let s = score(&[
            (Severity::High, true),
            (Severity::High, true),
            (Severity::Low, true),
            (Severity::Medium, true),
            (Severity::Low, true),
        ]);
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_base_only() {
        let s = score(&[(Severity::Low, true), (Severity::Medium, false)]);
        assert!((s - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_high_only_uses_vacuous_base() {
        let s = score(&[(Severity::High, false), (Severity::High, true)]);
        assert!((s - (0.4 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_counts() {
        let breakdown = ScoreBreakdown::from_sweep(&sweep(&[
            (Severity::High, true),
            (Severity::High, false),
            (Severity::Low, false),
        ]));
        assert_eq!(breakdown.high_total, 2);
        assert_eq!(breakdown.high_passed, 1);
        assert_eq!(breakdown.base_total, 1);
        assert_eq!(breakdown.base_passed, 0);
        assert_eq!(breakdown.base_score(), 0.0);
        assert_eq!(breakdown.high_score(), Some(0.5));
    }
}
