//! End-to-end orchestrator flow over canned data and an offline knowledge
//! store: retrieval, routing, both sub-pipelines, and section assembly.

use chrono::{Duration, NaiveDate};
use practice_brain::data_source::{PracticeDataSource, StaticDataSource};
use practice_brain::error::Result;
use practice_brain::lab_cases::{LabCaseBuckets, TaskType};
use practice_brain::metrics::{Metric, MetricGoals, PracticeMetricSet};
use practice_brain::orchestrator::{Orchestrator, ResponseSection};
use practice_brain::recommendations::{Impact, Priority};
use practice_brain::retrieval::{InMemoryKnowledgeStore, KnowledgeDocument};
use std::sync::Arc;

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

fn knowledge_store() -> InMemoryKnowledgeStore {
    let mut store = InMemoryKnowledgeStore::new();
    store.add_document(KnowledgeDocument::new(
        "Monthly production goal benchmarks: two-doctor practices average $160k monthly",
    ));
    store.add_document(KnowledgeDocument::new(
        "Summit Dental Lab turnaround on crown cases averages 12 days",
    ));
    store
}

fn build_orchestrator() -> Orchestrator {
    Orchestrator::new(
        Arc::new(knowledge_store()),
        Arc::new(StaticDataSource::new(fixed_today())),
        MetricGoals::default(),
    )
    .with_today(fixed_today())
}

#[tokio::test]
async fn kpi_query_flags_no_shows_and_recommends_reduction() {
    let orchestrator = build_orchestrator();
    let response = orchestrator.handle_query("how is production trending").await;

    let analysis = response
        .sections
        .iter()
        .find_map(|s| match s {
            ResponseSection::KpiAnalysis(a) => Some(a),
            _ => None,
        })
        .expect("kpi section present");

    // production 150k vs 155k: on-target, no reported gap
    let production = analysis.scored(Metric::Production).unwrap();
    assert!((production.performance - 96.77).abs() < 0.01);
    assert_eq!(production.gap, 0.0);

    // hygiene 75k vs 78k: on-target
    let hygiene = analysis.scored(Metric::Hygiene).unwrap();
    assert!((hygiene.performance - 96.15).abs() < 0.01);

    // no-shows 15 vs 10 (inverse): below target, flagged
    let no_shows = analysis.scored(Metric::NoShows).unwrap();
    assert!((no_shows.performance - 66.67).abs() < 0.01);
    assert_eq!(no_shows.gap, 5.0);
    assert!(analysis.areas_for_improvement.contains(&Metric::NoShows));

    let recommendations = response
        .sections
        .iter()
        .find_map(|s| match s {
            ResponseSection::Recommendations(r) => Some(r),
            _ => None,
        })
        .expect("recommendations section present");
    let no_show_rec = recommendations
        .iter()
        .find(|r| r.category == "noShows")
        .expect("no-show recommendation present");
    assert_eq!(no_show_rec.priority, Priority::Medium);
    assert_eq!(no_show_rec.impact, Impact::Immediate);
}

#[tokio::test]
async fn lab_query_produces_tasks_for_every_active_case() {
    let orchestrator = build_orchestrator();
    let response = orchestrator
        .handle_query("what's our lab case status for crowns")
        .await;

    let lab = response
        .sections
        .iter()
        .find_map(|s| match s {
            ResponseSection::LabCases(l) => Some(l),
            _ => None,
        })
        .expect("lab section present");

    assert_eq!(lab.total, 4);
    assert_eq!(lab.overdue, vec!["LC001".to_string()]);
    assert_eq!(lab.due_soon, vec!["LC002".to_string()]);

    // one call-lab (overdue), one check-status (due soon), one call-patient
    // (ready for delivery); the completed case generates nothing
    assert_eq!(lab.tasks.len(), 3);
    assert_eq!(lab.tasks[0].task_type, TaskType::CallLab);
    assert_eq!(lab.tasks[0].priority, Priority::High);
    assert_eq!(lab.tasks[1].task_type, TaskType::CheckStatus);
    assert_eq!(lab.tasks[2].task_type, TaskType::CallPatient);
    for task in &lab.tasks {
        assert_eq!(task.due_date, fixed_today() + Duration::days(1));
    }

    assert!(response.answer.contains("Tracking 4 lab cases"));
}

#[tokio::test]
async fn sections_follow_fixed_assembly_order() {
    // A query matching both topics dispatches both pipelines; sections come
    // back lab first, then analysis, then recommendations, then context.
    let orchestrator = build_orchestrator();
    let response = orchestrator
        .handle_query("review crown lab cases and production performance")
        .await;

    let kinds: Vec<&str> = response
        .sections
        .iter()
        .map(|s| match s {
            ResponseSection::LabCases(_) => "lab-cases",
            ResponseSection::KpiAnalysis(_) => "kpi-analysis",
            ResponseSection::Recommendations(_) => "recommendations",
            ResponseSection::KnowledgeContext(_) => "knowledge-context",
            ResponseSection::Error(_) => "error",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["lab-cases", "kpi-analysis", "recommendations", "knowledge-context"]
    );
    assert_eq!(response.sources, Some(vec!["practice knowledge base".to_string()]));
}

struct HealthyPracticeSource;

#[async_trait::async_trait]
impl PracticeDataSource for HealthyPracticeSource {
    async fn fetch_metrics(&self, _query: &str) -> Result<PracticeMetricSet> {
        Ok(PracticeMetricSet {
            timeframe: "the current month".to_string(),
            production: 158_000.0,
            collections: 151_000.0,
            hygiene: 80_000.0,
            new_patients: 48.0,
            active_patients: 1_850.0,
            recall_confirmations: 88.0,
            no_shows: 7.0,
            cancellations: 9.0,
        })
    }

    async fn fetch_lab_cases(&self, _query: &str) -> Result<LabCaseBuckets> {
        Ok(LabCaseBuckets::default())
    }
}

#[tokio::test]
async fn healthy_metrics_skip_the_recommendations_section() {
    let orchestrator = Orchestrator::new(
        Arc::new(knowledge_store()),
        Arc::new(HealthyPracticeSource),
        MetricGoals::default(),
    )
    .with_today(fixed_today());

    let response = orchestrator.handle_query("how is production trending").await;
    assert!(!response
        .sections
        .iter()
        .any(|s| matches!(s, ResponseSection::Recommendations(_))));
    let analysis = response
        .sections
        .iter()
        .find_map(|s| match s {
            ResponseSection::KpiAnalysis(a) => Some(a),
            _ => None,
        })
        .unwrap();
    assert!(analysis.areas_for_improvement.is_empty());
    assert_eq!(analysis.top_performers.len(), 8);
}
