//! Practice KPI metadata
//!
//! Typed identifiers for the eight tracked KPIs, the per-timeframe
//! observation set, and the configurable goal table.

use crate::error::{PracticeError, Result};
use serde::{Deserialize, Serialize};

/// The eight KPIs the practice tracks.
///
/// `ALL` fixes the encounter order used everywhere a tie-break or report
/// ordering depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Production,
    Collections,
    Hygiene,
    NewPatients,
    ActivePatients,
    RecallConfirmations,
    NoShows,
    Cancellations,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Production,
        Metric::Collections,
        Metric::Hygiene,
        Metric::NewPatients,
        Metric::ActivePatients,
        Metric::RecallConfirmations,
        Metric::NoShows,
        Metric::Cancellations,
    ];

    /// camelCase key, matching the upstream data feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Production => "production",
            Metric::Collections => "collections",
            Metric::Hygiene => "hygiene",
            Metric::NewPatients => "newPatients",
            Metric::ActivePatients => "activePatients",
            Metric::RecallConfirmations => "recallConfirmations",
            Metric::NoShows => "noShows",
            Metric::Cancellations => "cancellations",
        }
    }

    /// Human-readable name for summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Production => "production",
            Metric::Collections => "collections",
            Metric::Hygiene => "hygiene revenue",
            Metric::NewPatients => "new patients",
            Metric::ActivePatients => "active patients",
            Metric::RecallConfirmations => "recall confirmations",
            Metric::NoShows => "no-shows",
            Metric::Cancellations => "cancellations",
        }
    }

    /// No-shows and cancellations score inversely: staying at or under the
    /// goal is full performance.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Metric::NoShows | Metric::Cancellations)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timeframe's worth of observed KPI values.
///
/// Immutable once fetched; identity is the timeframe label only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeMetricSet {
    pub timeframe: String,
    pub production: f64,
    pub collections: f64,
    pub hygiene: f64,
    pub new_patients: f64,
    pub active_patients: f64,
    pub recall_confirmations: f64,
    pub no_shows: f64,
    pub cancellations: f64,
}

impl PracticeMetricSet {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Production => self.production,
            Metric::Collections => self.collections,
            Metric::Hygiene => self.hygiene,
            Metric::NewPatients => self.new_patients,
            Metric::ActivePatients => self.active_patients,
            Metric::RecallConfirmations => self.recall_confirmations,
            Metric::NoShows => self.no_shows,
            Metric::Cancellations => self.cancellations,
        }
    }
}

/// Per-practice goal table, passed explicitly into the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricGoals {
    pub production: f64,
    pub collections: f64,
    pub hygiene: f64,
    pub new_patients: f64,
    pub active_patients: f64,
    pub recall_confirmations: f64,
    pub no_shows: f64,
    pub cancellations: f64,
}

impl Default for MetricGoals {
    fn default() -> Self {
        Self {
            production: 155_000.0,
            collections: 150_000.0,
            hygiene: 78_000.0,
            new_patients: 45.0,
            active_patients: 1_800.0,
            recall_confirmations: 85.0,
            no_shows: 10.0,
            cancellations: 12.0,
        }
    }
}

impl MetricGoals {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Production => self.production,
            Metric::Collections => self.collections,
            Metric::Hygiene => self.hygiene,
            Metric::NewPatients => self.new_patients,
            Metric::ActivePatients => self.active_patients,
            Metric::RecallConfirmations => self.recall_confirmations,
            Metric::NoShows => self.no_shows,
            Metric::Cancellations => self.cancellations,
        }
    }

    /// Every goal must be strictly positive; a zero goal would make the
    /// performance ratio undefined.
    pub fn validate(&self) -> Result<()> {
        for metric in Metric::ALL {
            let goal = self.value(metric);
            if goal <= 0.0 {
                return Err(PracticeError::Config(format!(
                    "Goal for {} must be positive, got {}",
                    metric, goal
                )));
            }
        }
        Ok(())
    }

    /// Load goals from a JSON file, falling back to compiled-in defaults
    /// when the file is absent.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let goals = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                serde_json::from_str(&raw)?
            }
            None => Self::default(),
        };
        goals.validate()?;
        Ok(goals)
    }
}
