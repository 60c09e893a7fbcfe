//! Metric scoring
//!
//! Pure actual-vs-goal calculations shared by the KPI analyzer.

use serde::{Deserialize, Serialize};

/// Status bucket for a scored metric.
///
/// The upstream feed declares an `above-target` tier but nothing ever
/// produces it; anything at or over the 95% line is reported as on-target.
/// That collapse is kept as-is pending a product decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricStatus {
    OnTarget,
    BelowTarget,
}

/// A single metric's actual, goal, and derived performance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMetric {
    pub actual: f64,
    pub goal: f64,
    /// Percentage of goal achieved (100 = exactly on goal).
    pub performance: f64,
    pub status: MetricStatus,
    /// Shortfall against the goal; 0 when the goal is met or beaten.
    pub gap: f64,
}

/// On-target threshold, in percent.
pub const ON_TARGET_THRESHOLD: f64 = 95.0;

/// Score a higher-is-better metric.
///
/// Goals are validated positive at configuration time; a non-positive goal
/// that slips through scores 100 when the actual is also non-positive and 0
/// otherwise, so the ratio never divides by zero.
pub fn score_metric(actual: f64, goal: f64) -> ScoredMetric {
    let performance = if goal <= 0.0 {
        if actual <= 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        actual / goal * 100.0
    };
    let status = status_for(performance);
    // An on-target metric reports no gap even when the actual is slightly
    // under goal; only below-target shortfalls are surfaced.
    let gap = if status == MetricStatus::BelowTarget && actual < goal {
        goal - actual
    } else {
        0.0
    };
    ScoredMetric {
        actual,
        goal,
        performance,
        status,
        gap,
    }
}

/// Score a lower-is-better metric (no-shows, cancellations).
///
/// At or under goal is full performance; over goal scales down by the
/// inverse ratio and the gap is the overshoot.
pub fn score_metric_inverse(actual: f64, goal: f64) -> ScoredMetric {
    let (performance, gap) = if actual <= goal {
        (100.0, 0.0)
    } else {
        // actual > goal >= validated-positive, so the ratio is defined
        (goal / actual * 100.0, actual - goal)
    };
    ScoredMetric {
        actual,
        goal,
        performance,
        status: status_for(performance),
        gap,
    }
}

fn status_for(performance: f64) -> MetricStatus {
    if performance >= ON_TARGET_THRESHOLD {
        MetricStatus::OnTarget
    } else {
        MetricStatus::BelowTarget
    }
}
