//! Recommendation generation
//!
//! Pre-authored playbooks keyed by metric. Content is static apart from the
//! interpolated performance percentage and gap; no inference happens here.

use crate::analysis::{format_currency, KpiAnalysis};
use crate::metrics::Metric;
use crate::scoring::ScoredMetric;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// How quickly acting on the recommendation should show up in the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Impact {
    Immediate,
    ShortTerm,
    LongTerm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: String,
    pub title: String,
    pub description: String,
    pub action_items: Vec<String>,
    pub priority: Priority,
    pub impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

/// Build recommendations for every flagged improvement area.
///
/// Metrics with no authored playbook (currently only collections) are skipped
/// without comment. When at most one area-specific recommendation applies, a
/// general recommendation citing the practice's best metric is appended so
/// the caller always has something actionable.
pub fn generate_recommendations(analysis: &KpiAnalysis) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = analysis
        .areas_for_improvement
        .iter()
        .filter_map(|metric| {
            analysis
                .scored(*metric)
                .and_then(|scored| recommendation_for(*metric, scored))
        })
        .collect();

    if recommendations.len() <= 1 {
        if let Some((best, scored)) = analysis.best_metric() {
            recommendations.push(general_recommendation(best, scored));
        }
    }

    recommendations
}

fn recommendation_for(metric: Metric, scored: &ScoredMetric) -> Option<Recommendation> {
    let rec = match metric {
        Metric::Production => Recommendation {
            category: "production".to_string(),
            title: "Increase treatment acceptance".to_string(),
            description: format!(
                "Production is at {:.1}% of goal with a {} shortfall. Focus on \
                 same-day treatment and closing outstanding treatment plans.",
                scored.performance,
                format_currency(scored.gap)
            ),
            action_items: vec![
                "Review unscheduled treatment plans from the last 90 days".to_string(),
                "Offer same-day treatment when chair time allows".to_string(),
                "Present financing options at case presentation".to_string(),
            ],
            priority: Priority::High,
            impact: Impact::ShortTerm,
            resources: Some(vec!["Case acceptance training module".to_string()]),
        },
        Metric::Hygiene => Recommendation {
            category: "hygiene".to_string(),
            title: "Grow hygiene department revenue".to_string(),
            description: format!(
                "Hygiene revenue is at {:.1}% of goal ({} below target). \
                 Perio therapy and fluoride acceptance are the usual levers.",
                scored.performance,
                format_currency(scored.gap)
            ),
            action_items: vec![
                "Audit perio charting for undiagnosed therapy candidates".to_string(),
                "Standardize fluoride and sealant offers at every recall visit".to_string(),
                "Fill open hygiene slots from the overdue-recall list".to_string(),
            ],
            priority: Priority::High,
            impact: Impact::ShortTerm,
            resources: Some(vec!["Hygiene department scorecard".to_string()]),
        },
        Metric::NewPatients => Recommendation {
            category: "newPatients".to_string(),
            title: "Boost new patient flow".to_string(),
            description: format!(
                "New patient count is at {:.1}% of goal. Referral and online \
                 presence programs move this number fastest.",
                scored.performance
            ),
            action_items: vec![
                "Launch a patient referral incentive".to_string(),
                "Request reviews from satisfied patients at checkout".to_string(),
                "Verify local listings and hours are current".to_string(),
            ],
            priority: Priority::Medium,
            impact: Impact::LongTerm,
            resources: None,
        },
        Metric::ActivePatients => Recommendation {
            category: "activePatients".to_string(),
            title: "Reactivate dormant patients".to_string(),
            description: format!(
                "Active patient base is at {:.1}% of goal. Patients unseen in \
                 18+ months are the largest recoverable segment.",
                scored.performance
            ),
            action_items: vec![
                "Pull the 18-month unseen patient list".to_string(),
                "Run a reactivation outreach sequence (text, then call)".to_string(),
                "Flag lapsed patients with unfinished treatment first".to_string(),
            ],
            priority: Priority::Medium,
            impact: Impact::LongTerm,
            resources: None,
        },
        Metric::RecallConfirmations => Recommendation {
            category: "recallConfirmations".to_string(),
            title: "Tighten recall confirmations".to_string(),
            description: format!(
                "Recall confirmation rate is at {:.1}% of goal. Confirmation \
                 timing and channel mix usually explain the shortfall.",
                scored.performance
            ),
            action_items: vec![
                "Confirm at 2 weeks, 2 days, and 2 hours before the visit".to_string(),
                "Enable two-way text confirmation".to_string(),
                "Pre-book the next recall before the patient leaves".to_string(),
            ],
            priority: Priority::Medium,
            impact: Impact::ShortTerm,
            resources: None,
        },
        Metric::NoShows => Recommendation {
            category: "noShows".to_string(),
            title: "Reduce no-shows".to_string(),
            description: format!(
                "No-shows are running {:.0} over goal ({:.1}% performance). \
                 Deposits and a short-notice list contain the damage.",
                scored.gap, scored.performance
            ),
            action_items: vec![
                "Take deposits for appointments over 90 minutes".to_string(),
                "Keep a same-day short-notice fill list".to_string(),
                "Call chronic no-show patients personally to reschedule".to_string(),
            ],
            priority: Priority::Medium,
            impact: Impact::Immediate,
            resources: None,
        },
        Metric::Cancellations => Recommendation {
            category: "cancellations".to_string(),
            title: "Cut late cancellations".to_string(),
            description: format!(
                "Cancellations are {:.0} over goal ({:.1}% performance). A \
                 firm 48-hour policy with consistent scripting brings this down.",
                scored.gap, scored.performance
            ),
            action_items: vec![
                "State the 48-hour cancellation policy at booking".to_string(),
                "Offer to move, not cancel, when patients call".to_string(),
                "Track cancellation reasons weekly to spot patterns".to_string(),
            ],
            priority: Priority::Medium,
            impact: Impact::Immediate,
            resources: None,
        },
        // No authored playbook for collections; it is tracked but the
        // collections workflow lives with the billing service.
        Metric::Collections => return None,
    };
    Some(rec)
}

fn general_recommendation(best: Metric, scored: &ScoredMetric) -> Recommendation {
    Recommendation {
        category: "general".to_string(),
        title: "Maintain momentum".to_string(),
        description: format!(
            "Overall performance is solid; {} leads at {:.1}% of goal. Keep \
             the current systems in place and review KPIs at the weekly huddle.",
            best.label(),
            scored.performance
        ),
        action_items: vec![
            "Review KPI dashboard at the Monday huddle".to_string(),
            "Recognize the team behind the strongest metric".to_string(),
        ],
        priority: Priority::Low,
        impact: Impact::LongTerm,
        resources: None,
    }
}
