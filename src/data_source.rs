//! Practice data access
//!
//! The orchestrator pulls metric sets and lab-case buckets through this
//! trait; persistence lives with the backend service, not here. The static
//! implementation carries the demo dataset used by the CLI's offline mode
//! and the integration tests.

use crate::error::Result;
use crate::lab_cases::{LabCaseBuckets, LabCaseRecord};
use crate::metrics::PracticeMetricSet;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

#[async_trait]
pub trait PracticeDataSource: Send + Sync {
    /// Fetch the metric set relevant to a free-text query.
    async fn fetch_metrics(&self, query: &str) -> Result<PracticeMetricSet>;

    /// Fetch the current lab-case buckets relevant to a free-text query.
    async fn fetch_lab_cases(&self, query: &str) -> Result<LabCaseBuckets>;
}

/// Canned data source: one month of metrics and a small lab-case board,
/// anchored to a supplied "today" so classifications stay deterministic.
pub struct StaticDataSource {
    today: NaiveDate,
}

impl StaticDataSource {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

#[async_trait]
impl PracticeDataSource for StaticDataSource {
    async fn fetch_metrics(&self, _query: &str) -> Result<PracticeMetricSet> {
        Ok(PracticeMetricSet {
            timeframe: "the current month".to_string(),
            production: 150_000.0,
            collections: 145_500.0,
            hygiene: 75_000.0,
            new_patients: 42.0,
            active_patients: 1_770.0,
            recall_confirmations: 78.0,
            no_shows: 15.0,
            cancellations: 11.0,
        })
    }

    async fn fetch_lab_cases(&self, _query: &str) -> Result<LabCaseBuckets> {
        let case = |id: &str, patient: &str, case_type: &str, lab: &str, status: &str| {
            LabCaseRecord {
                id: id.to_string(),
                patient_name: patient.to_string(),
                case_type: case_type.to_string(),
                lab_name: lab.to_string(),
                sent_date: Some(self.today - Duration::days(12)),
                due_date: None,
                received_date: None,
                completed_date: None,
                status: status.to_string(),
            }
        };

        let mut overdue_crown = case(
            "LC001",
            "Margaret Olsen",
            "crown",
            "Summit Dental Lab",
            "in fabrication",
        );
        overdue_crown.due_date = Some(self.today - Duration::days(2));

        let mut due_soon_bridge = case(
            "LC002",
            "Raul Ibanez",
            "bridge",
            "Summit Dental Lab",
            "in fabrication",
        );
        due_soon_bridge.due_date = Some(self.today + Duration::days(3));

        let mut ready_denture = case(
            "LC003",
            "Elaine Fox",
            "denture",
            "Crestview Prosthetics",
            "ready for delivery",
        );
        ready_denture.due_date = Some(self.today - Duration::days(1));
        ready_denture.received_date = Some(self.today);

        let mut delivered_guard = case(
            "LC004",
            "Peter Shah",
            "night guard",
            "Crestview Prosthetics",
            "delivered",
        );
        delivered_guard.received_date = Some(self.today - Duration::days(5));
        delivered_guard.completed_date = Some(self.today - Duration::days(3));

        Ok(LabCaseBuckets {
            pending: vec![overdue_crown, due_soon_bridge],
            received: vec![ready_denture],
            completed: vec![delivered_guard],
        })
    }
}
