//! KPI analysis
//!
//! Scores the eight practice KPIs against their goals, partitions them into
//! top performers and improvement areas, and renders the narrative summary.

use crate::metrics::{Metric, MetricGoals, PracticeMetricSet};
use crate::scoring::{score_metric, score_metric_inverse, ScoredMetric};
use serde::{Deserialize, Serialize};

/// Performance at or above this percentage counts as a top performer.
pub const TOP_PERFORMER_THRESHOLD: f64 = 95.0;
/// Performance below this percentage is flagged for improvement.
/// Metrics between the two thresholds are scored but not flagged either way.
pub const IMPROVEMENT_THRESHOLD: f64 = 80.0;

/// Full analysis of one timeframe's KPIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiAnalysis {
    pub timeframe: String,
    /// Scored metrics in `Metric::ALL` order.
    pub metrics: Vec<(Metric, ScoredMetric)>,
    pub top_performers: Vec<Metric>,
    pub areas_for_improvement: Vec<Metric>,
    pub summary: String,
}

impl KpiAnalysis {
    pub fn scored(&self, metric: Metric) -> Option<&ScoredMetric> {
        self.metrics.iter().find(|(m, _)| *m == metric).map(|(_, s)| s)
    }

    /// Highest-performance metric, ties broken by `Metric::ALL` order.
    pub fn best_metric(&self) -> Option<(Metric, &ScoredMetric)> {
        let mut best: Option<(Metric, &ScoredMetric)> = None;
        for (metric, scored) in &self.metrics {
            match best {
                Some((_, b)) if scored.performance <= b.performance => {}
                _ => best = Some((*metric, scored)),
            }
        }
        best
    }
}

/// Score every KPI in the set against the supplied goals.
pub fn analyze_kpis(metrics: &PracticeMetricSet, goals: &MetricGoals) -> KpiAnalysis {
    let scored: Vec<(Metric, ScoredMetric)> = Metric::ALL
        .into_iter()
        .map(|metric| {
            let actual = metrics.value(metric);
            let goal = goals.value(metric);
            let scored = if metric.lower_is_better() {
                score_metric_inverse(actual, goal)
            } else {
                score_metric(actual, goal)
            };
            (metric, scored)
        })
        .collect();

    let top_performers: Vec<Metric> = scored
        .iter()
        .filter(|(_, s)| s.performance >= TOP_PERFORMER_THRESHOLD)
        .map(|(m, _)| *m)
        .collect();

    let areas_for_improvement: Vec<Metric> = scored
        .iter()
        .filter(|(_, s)| s.performance < IMPROVEMENT_THRESHOLD)
        .map(|(m, _)| *m)
        .collect();

    let summary = build_summary(
        &metrics.timeframe,
        &scored,
        &top_performers,
        &areas_for_improvement,
    );

    KpiAnalysis {
        timeframe: metrics.timeframe.clone(),
        metrics: scored,
        top_performers,
        areas_for_improvement,
        summary,
    }
}

fn build_summary(
    timeframe: &str,
    scored: &[(Metric, ScoredMetric)],
    top: &[Metric],
    areas: &[Metric],
) -> String {
    let mut summary = format!("KPI analysis for {}. ", timeframe);

    if !top.is_empty() {
        let names: Vec<&str> = top.iter().map(Metric::label).collect();
        summary.push_str(&format!("Strong performance in: {}. ", names.join(", ")));
    }
    if !areas.is_empty() {
        let names: Vec<&str> = areas.iter().map(Metric::label).collect();
        summary.push_str(&format!("Areas needing attention: {}. ", names.join(", ")));
    }

    // Production and hygiene always get a closing sentence.
    for metric in [Metric::Production, Metric::Hygiene] {
        if let Some((_, s)) = scored.iter().find(|(m, _)| *m == metric) {
            if s.gap > 0.0 {
                summary.push_str(&format!(
                    "{} is {} below goal at {:.1}% of target. ",
                    capitalize(metric.label()),
                    format_currency(s.gap),
                    s.performance
                ));
            } else {
                summary.push_str(&format!(
                    "{} is meeting goal at {:.1}% of target. ",
                    capitalize(metric.label()),
                    s.performance
                ));
            }
        }
    }

    summary.trim_end().to_string()
}

/// US-style currency with thousands separators and no cents.
pub fn format_currency(amount: f64) -> String {
    let whole = amount.round() as i64;
    let negative = whole < 0;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::MetricStatus;

    fn sample_metrics() -> PracticeMetricSet {
        PracticeMetricSet {
            timeframe: "January 2025".to_string(),
            production: 150_000.0,
            collections: 145_000.0,
            hygiene: 75_000.0,
            new_patients: 42.0,
            active_patients: 1_750.0,
            recall_confirmations: 78.0,
            no_shows: 15.0,
            cancellations: 11.0,
        }
    }

    #[test]
    fn scores_all_eight_metrics_in_order() {
        let analysis = analyze_kpis(&sample_metrics(), &MetricGoals::default());
        let order: Vec<Metric> = analysis.metrics.iter().map(|(m, _)| *m).collect();
        assert_eq!(order, Metric::ALL.to_vec());
    }

    #[test]
    fn no_shows_over_goal_is_flagged_for_improvement() {
        let analysis = analyze_kpis(&sample_metrics(), &MetricGoals::default());
        let no_shows = analysis.scored(Metric::NoShows).unwrap();
        assert!((no_shows.performance - 66.666).abs() < 0.001);
        assert_eq!(no_shows.status, MetricStatus::BelowTarget);
        assert_eq!(no_shows.gap, 5.0);
        assert!(analysis.areas_for_improvement.contains(&Metric::NoShows));
    }

    #[test]
    fn middle_band_appears_in_neither_list() {
        // recallConfirmations: 78/85 ≈ 91.8%, between the 80 and 95 lines
        let analysis = analyze_kpis(&sample_metrics(), &MetricGoals::default());
        let recalls = analysis.scored(Metric::RecallConfirmations).unwrap();
        assert!(recalls.performance > 80.0 && recalls.performance < 95.0);
        assert!(!analysis.top_performers.contains(&Metric::RecallConfirmations));
        assert!(!analysis
            .areas_for_improvement
            .contains(&Metric::RecallConfirmations));
    }

    #[test]
    fn boundary_at_exactly_95_and_80() {
        let metrics = PracticeMetricSet {
            production: 147_250.0, // 95% of the 155k goal
            hygiene: 62_400.0,     // 80% of the 78k goal
            ..sample_metrics()
        };
        let analysis = analyze_kpis(&metrics, &MetricGoals::default());
        // exactly 95 → top performer
        assert!(analysis.top_performers.contains(&Metric::Production));
        // exactly 80 → not an improvement area
        assert!(!analysis.areas_for_improvement.contains(&Metric::Hygiene));
    }

    #[test]
    fn summary_reports_on_target_production_as_meeting_goal() {
        let analysis = analyze_kpis(&sample_metrics(), &MetricGoals::default());
        assert!(analysis.summary.contains("KPI analysis for January 2025"));
        assert!(analysis.summary.contains("Production is meeting goal"));
    }

    #[test]
    fn summary_formats_below_target_gap_as_currency() {
        let metrics = PracticeMetricSet {
            production: 100_000.0,
            ..sample_metrics()
        };
        let analysis = analyze_kpis(&metrics, &MetricGoals::default());
        assert!(analysis.summary.contains("$55,000"));
    }

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(5_000.0), "$5,000");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(0.0), "$0");
    }

    #[test]
    fn best_metric_breaks_ties_by_declaration_order() {
        let mut metrics = sample_metrics();
        // collections and hygiene both exactly on goal
        metrics.collections = 150_000.0;
        metrics.hygiene = 78_000.0;
        let analysis = analyze_kpis(&metrics, &MetricGoals::default());
        let (best, _) = analysis.best_metric().unwrap();
        // both at 100%; cancellations also 100% (11 <= 12) but later in order
        assert_eq!(best, Metric::Collections);
    }
}
