//! Lab case tracking
//!
//! Classifies outstanding lab work into overdue / due-soon / ready buckets
//! and derives the follow-up task list for the front desk. Cases arrive
//! pre-partitioned from the data source; ingestion pins each case to an
//! explicit lifecycle stage so a malformed feed cannot double-count one.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::recommendations::Priority;

/// How far ahead a pending due date counts as "due soon", in days.
pub const DUE_SOON_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabStage {
    Pending,
    Received,
    Completed,
}

/// A lab case as supplied by the data source, before staging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabCaseRecord {
    pub id: String,
    pub patient_name: String,
    pub case_type: String,
    pub lab_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    pub status: String,
}

/// A staged lab case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabCase {
    #[serde(flatten)]
    pub record: LabCaseRecord,
    pub stage: LabStage,
}

/// Pre-partitioned case lists as delivered by the data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabCaseBuckets {
    pub pending: Vec<LabCaseRecord>,
    pub received: Vec<LabCaseRecord>,
    pub completed: Vec<LabCaseRecord>,
}

impl LabCaseBuckets {
    /// Assign each record its lifecycle stage. If a case id appears in more
    /// than one bucket the first stage encountered wins and the duplicate is
    /// dropped with a warning.
    pub fn ingest(self) -> Vec<LabCase> {
        let mut seen: HashMap<String, LabStage> = HashMap::new();
        let mut cases = Vec::new();
        let staged = [
            (LabStage::Pending, self.pending),
            (LabStage::Received, self.received),
            (LabStage::Completed, self.completed),
        ];
        for (stage, records) in staged {
            for record in records {
                if let Some(first) = seen.get(&record.id) {
                    warn!(
                        case_id = %record.id,
                        first_stage = ?first,
                        duplicate_stage = ?stage,
                        "lab case present in multiple buckets, keeping first stage"
                    );
                    continue;
                }
                seen.insert(record.id.clone(), stage);
                cases.push(LabCase { record, stage });
            }
        }
        cases
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    CallLab,
    CheckStatus,
    CallPatient,
}

/// A follow-up task derived from the current case set. Regenerated on every
/// classification pass, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTask {
    pub id: Uuid,
    pub task_type: TaskType,
    pub description: String,
    pub due_date: NaiveDate,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabCaseAnalysis {
    pub total: usize,
    pub pending_count: usize,
    pub received_count: usize,
    pub completed_count: usize,
    /// Ids of pending cases past their due date.
    pub overdue: Vec<String>,
    /// Ids of pending cases due within the next week.
    pub due_soon: Vec<String>,
    pub tasks: Vec<LabTask>,
    pub by_type: HashMap<String, usize>,
    pub by_lab: HashMap<String, usize>,
    pub by_status: HashMap<String, usize>,
    pub summary: String,
}

/// Classify staged cases relative to `today`.
pub fn classify_lab_cases(cases: &[LabCase], today: NaiveDate) -> LabCaseAnalysis {
    let tomorrow = today + Duration::days(1);
    let due_soon_cutoff = today + Duration::days(DUE_SOON_WINDOW_DAYS);

    let mut overdue = Vec::new();
    let mut due_soon = Vec::new();
    let mut tasks = Vec::new();

    // Overdue first, then due-soon, so the task list leads with the urgent
    // calls. Cases without a due date land in neither bucket.
    for case in cases.iter().filter(|c| c.stage == LabStage::Pending) {
        let Some(due) = case.record.due_date else {
            continue;
        };
        if due < today {
            overdue.push(case.record.id.clone());
            tasks.push(LabTask {
                id: Uuid::new_v4(),
                task_type: TaskType::CallLab,
                description: format!(
                    "Call {} about overdue {} for {}",
                    case.record.lab_name, case.record.case_type, case.record.patient_name
                ),
                due_date: tomorrow,
                priority: Priority::High,
            });
        } else if due <= due_soon_cutoff {
            due_soon.push(case.record.id.clone());
            tasks.push(LabTask {
                id: Uuid::new_v4(),
                task_type: TaskType::CheckStatus,
                description: format!(
                    "Check status of {} for {} (due {})",
                    case.record.case_type, case.record.patient_name, due
                ),
                due_date: tomorrow,
                priority: Priority::Medium,
            });
        }
    }

    for case in cases.iter().filter(|c| c.stage == LabStage::Received) {
        tasks.push(LabTask {
            id: Uuid::new_v4(),
            task_type: TaskType::CallPatient,
            description: format!(
                "Call {} to schedule delivery of {}",
                case.record.patient_name, case.record.case_type
            ),
            due_date: tomorrow,
            priority: Priority::Medium,
        });
    }

    let mut by_type: HashMap<String, usize> = HashMap::new();
    let mut by_lab: HashMap<String, usize> = HashMap::new();
    let mut by_status: HashMap<String, usize> = HashMap::new();
    for case in cases {
        tally(&mut by_type, &case.record.case_type);
        tally(&mut by_lab, &case.record.lab_name);
        tally(&mut by_status, &case.record.status);
    }

    let pending_count = cases.iter().filter(|c| c.stage == LabStage::Pending).count();
    let received_count = cases.iter().filter(|c| c.stage == LabStage::Received).count();
    let completed_count = cases.iter().filter(|c| c.stage == LabStage::Completed).count();

    let summary = build_summary(
        cases.len(),
        pending_count,
        received_count,
        completed_count,
        overdue.len(),
        due_soon.len(),
    );

    LabCaseAnalysis {
        total: cases.len(),
        pending_count,
        received_count,
        completed_count,
        overdue,
        due_soon,
        tasks,
        by_type,
        by_lab,
        by_status,
        summary,
    }
}

// Empty field values get no bucket rather than an "unknown" tally.
fn tally(counts: &mut HashMap<String, usize>, key: &str) {
    if key.is_empty() {
        return;
    }
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

fn build_summary(
    total: usize,
    pending: usize,
    received: usize,
    completed: usize,
    overdue: usize,
    due_soon: usize,
) -> String {
    let mut summary = format!(
        "Tracking {} lab cases: {} pending, {} ready for delivery, {} completed. ",
        total, pending, received, completed
    );
    if overdue > 0 {
        summary.push_str(&format!(
            "{} case(s) are overdue and need a call to the lab. ",
            overdue
        ));
    }
    if due_soon > 0 {
        summary.push_str(&format!("{} case(s) are due within the next week. ", due_soon));
    }
    if received > 0 {
        summary.push_str(&format!(
            "{} case(s) are ready; schedule patient delivery visits. ",
            received
        ));
    }
    summary.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, due: Option<NaiveDate>) -> LabCaseRecord {
        LabCaseRecord {
            id: id.to_string(),
            patient_name: "Dana Whitfield".to_string(),
            case_type: "crown".to_string(),
            lab_name: "Summit Dental Lab".to_string(),
            sent_date: NaiveDate::from_ymd_opt(2025, 1, 2),
            due_date: due,
            received_date: None,
            completed_date: None,
            status: "in fabrication".to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn overdue_case_yields_one_high_call_lab_task_due_tomorrow() {
        let yesterday = today() - Duration::days(1);
        let buckets = LabCaseBuckets {
            pending: vec![record("LC001", Some(yesterday))],
            ..Default::default()
        };
        let analysis = classify_lab_cases(&buckets.ingest(), today());

        assert_eq!(analysis.overdue, vec!["LC001".to_string()]);
        assert!(analysis.due_soon.is_empty());
        assert_eq!(analysis.tasks.len(), 1);
        let task = &analysis.tasks[0];
        assert_eq!(task.task_type, TaskType::CallLab);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, today() + Duration::days(1));
    }

    #[test]
    fn case_due_in_three_days_is_due_soon() {
        let buckets = LabCaseBuckets {
            pending: vec![record("LC002", Some(today() + Duration::days(3)))],
            ..Default::default()
        };
        let analysis = classify_lab_cases(&buckets.ingest(), today());

        assert_eq!(analysis.due_soon, vec!["LC002".to_string()]);
        assert_eq!(analysis.tasks.len(), 1);
        assert_eq!(analysis.tasks[0].task_type, TaskType::CheckStatus);
        assert_eq!(analysis.tasks[0].priority, Priority::Medium);
    }

    #[test]
    fn due_soon_window_boundaries() {
        let buckets = LabCaseBuckets {
            pending: vec![
                record("today", Some(today())),
                record("day7", Some(today() + Duration::days(7))),
                record("day8", Some(today() + Duration::days(8))),
            ],
            ..Default::default()
        };
        let analysis = classify_lab_cases(&buckets.ingest(), today());
        assert_eq!(analysis.due_soon, vec!["today".to_string(), "day7".to_string()]);
        assert!(analysis.overdue.is_empty());
    }

    #[test]
    fn missing_due_date_is_skipped_silently() {
        let buckets = LabCaseBuckets {
            pending: vec![record("LC003", None)],
            ..Default::default()
        };
        let analysis = classify_lab_cases(&buckets.ingest(), today());
        assert!(analysis.overdue.is_empty());
        assert!(analysis.due_soon.is_empty());
        assert!(analysis.tasks.is_empty());
        assert_eq!(analysis.pending_count, 1);
    }

    #[test]
    fn received_cases_get_call_patient_tasks() {
        let buckets = LabCaseBuckets {
            received: vec![record("LC004", Some(today()))],
            ..Default::default()
        };
        let analysis = classify_lab_cases(&buckets.ingest(), today());
        assert_eq!(analysis.tasks.len(), 1);
        assert_eq!(analysis.tasks[0].task_type, TaskType::CallPatient);
        assert_eq!(analysis.tasks[0].priority, Priority::Medium);
    }

    #[test]
    fn duplicate_bucket_membership_keeps_first_stage() {
        let buckets = LabCaseBuckets {
            pending: vec![record("LC005", Some(today() + Duration::days(2)))],
            received: vec![record("LC005", Some(today() + Duration::days(2)))],
            ..Default::default()
        };
        let cases = buckets.ingest();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].stage, LabStage::Pending);
    }

    #[test]
    fn distributions_skip_empty_fields() {
        let mut blank_lab = record("LC006", None);
        blank_lab.lab_name = String::new();
        let buckets = LabCaseBuckets {
            pending: vec![record("LC007", None), blank_lab],
            ..Default::default()
        };
        let analysis = classify_lab_cases(&buckets.ingest(), today());
        assert_eq!(analysis.by_lab.get("Summit Dental Lab"), Some(&1));
        assert_eq!(analysis.by_lab.len(), 1);
        assert_eq!(analysis.by_type.get("crown"), Some(&2));
    }

    #[test]
    fn summary_mentions_counts_only_when_nonzero() {
        let buckets = LabCaseBuckets {
            pending: vec![record("LC008", Some(today() - Duration::days(2)))],
            received: vec![record("LC009", None)],
            completed: vec![record("LC010", None)],
        };
        let analysis = classify_lab_cases(&buckets.ingest(), today());
        assert!(analysis.summary.contains("Tracking 3 lab cases"));
        assert!(analysis.summary.contains("overdue"));
        assert!(!analysis.summary.contains("due within"));
        assert!(analysis.summary.contains("ready"));
    }
}
